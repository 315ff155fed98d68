//! Check command implementation.
//!
//! Verifies the same startup condition the server enforces: both
//! engine binaries must be locatable.

use texforge_core::{EngineConfig, Toolchain};

/// Verify the external toolchain is reachable and print versions.
pub fn execute() -> anyhow::Result<()> {
    let config = EngineConfig::from_env();
    let toolchain = Toolchain::resolve(&config)?;

    let render_version = Toolchain::probe_version(&toolchain.xelatex)
        .unwrap_or_else(|| "(version unavailable)".to_string());
    let convert_version = Toolchain::probe_version(&toolchain.pandoc)
        .unwrap_or_else(|| "(version unavailable)".to_string());

    println!("render engine:  {}", toolchain.xelatex.display());
    println!("                {}", render_version);
    println!("convert engine: {}", toolchain.pandoc.display());
    println!("                {}", convert_version);

    Ok(())
}
