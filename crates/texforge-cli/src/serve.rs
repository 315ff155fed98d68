//! Serve command implementation.

use texforge_core::EngineConfig;
use texforge_server::ServerConfig;

/// Start the HTTP compile service.
pub async fn execute(host: String, port: u16) -> anyhow::Result<()> {
    let engine_config = EngineConfig::from_env();

    println!("texforge server");
    println!("{}", "─".repeat(50));
    println!("  ◆ Address:  http://{}:{}", host, port);
    println!("  ◆ Render:   {}", engine_config.xelatex_program);
    println!("  ◆ Convert:  {}", engine_config.pandoc_program);
    println!("  ◆ Spool:    {}", engine_config.spool_dir.display());
    println!("  ◆ Jobs:     {} concurrent", engine_config.max_concurrent_jobs);
    println!("{}", "─".repeat(50));
    println!("Press Ctrl+C to stop");
    println!();

    let server_config = ServerConfig { host, port };
    texforge_server::serve(server_config, engine_config).await?;

    Ok(())
}
