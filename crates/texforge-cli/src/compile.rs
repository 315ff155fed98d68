//! One-shot compile command implementation.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;

use texforge_core::{
    CompilationOutcome, CompilationRequest, CompileService, EngineConfig, OutputKind, Toolchain,
};

/// Compile a single source to an artifact on disk.
///
/// On failure the full diagnostic is printed to stderr and the
/// process exits non-zero.
pub async fn execute(
    input: &str,
    output_kind: OutputKind,
    output: Option<&str>,
    entry: String,
) -> anyhow::Result<()> {
    let source_text = read_source(input)?;

    let config = EngineConfig::from_env();
    let toolchain = Toolchain::resolve(&config)?;
    let service = CompileService::new(config, toolchain)?;

    let request = CompilationRequest {
        source_text,
        entry_filename: entry,
        output_kind,
    };

    let job = service.compile(&request).await?;

    match &job.outcome {
        CompilationOutcome::Success { artifact_path } => {
            let destination = output
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(output_kind.download_filename()));

            // Copy out before the workspace goes away.
            fs::copy(artifact_path, &destination)
                .with_context(|| format!("failed to write {}", destination.display()))?;
            job.dispose();

            println!("wrote {}", destination.display());
            Ok(())
        }
        CompilationOutcome::Failure(diagnostic) => {
            eprintln!("{}", diagnostic.render_text());
            job.dispose();
            anyhow::bail!("compilation failed");
        }
    }
}

/// Read the source text from a file, or stdin when `input` is `-`.
fn read_source(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        Ok(text)
    } else {
        fs::read_to_string(input).with_context(|| format!("failed to read {}", input))
    }
}
