//! Fixed invocation recipes for the external engines.
//!
//! The driver knows the invocation shape and pass-count policy for
//! each output kind and decides success purely from (exit status,
//! artifact presence). The render engine is known to sometimes exit 0
//! without producing output, and to exit non-zero on mere warnings
//! while still producing a usable artifact, so artifact presence is
//! the authoritative half of the criterion.

use std::fs;
use std::path::Path;

use crate::config::{EngineConfig, Toolchain};
use crate::error::Result;

use super::log_scan::{
    self, DEFAULT_CONTEXT_CHARS, DEFAULT_SNIPPET_RADIUS,
};
use super::runner::{self, ProcessResult};
use super::types::{entry_stem, CompilationOutcome, DiagnosticBundle, OutputKind, DOCX_OUTPUT};
use super::workspace::Workspace;

/// Stream tail bound for render diagnostics.
const PDF_STREAM_TAIL: usize = 1200;

/// Stream tail bound for conversion diagnostics (no structured log
/// exists, so the raw streams carry more weight).
const DOCX_STREAM_TAIL: usize = 6000;

/// Drives the external engines against a workspace.
#[derive(Debug, Clone)]
pub struct CompilerDriver {
    toolchain: Toolchain,
    config: EngineConfig,
}

impl CompilerDriver {
    /// Create a driver from a resolved toolchain.
    pub fn new(toolchain: Toolchain, config: EngineConfig) -> Self {
        Self { toolchain, config }
    }

    /// Compile the entry file according to the requested output kind.
    pub async fn drive(
        &self,
        workspace: &Workspace,
        entry_filename: &str,
        output_kind: OutputKind,
    ) -> Result<CompilationOutcome> {
        match output_kind {
            OutputKind::Pdf => self.render_pdf(workspace, entry_filename).await,
            OutputKind::Docx => self.convert_docx(workspace, entry_filename).await,
        }
    }

    /// Render a fixed-layout document.
    ///
    /// Invokes the render engine non-interactively up to
    /// `render_passes` times (the second pass resolves
    /// cross-references); a non-zero exit skips the remaining passes
    /// since a failed first pass is unrecoverable for pass two.
    pub async fn render_pdf(
        &self,
        workspace: &Workspace,
        entry_filename: &str,
    ) -> Result<CompilationOutcome> {
        let args = ["-interaction=nonstopmode", "-halt-on-error", entry_filename];

        let passes = self.config.render_passes.max(1);
        let mut last: Option<ProcessResult> = None;
        for pass in 1..=passes {
            tracing::debug!(pass, entry = entry_filename, "render pass");
            let result = runner::run(
                &self.toolchain.xelatex,
                &args,
                workspace.root(),
                self.config.timeout,
            )
            .await?;

            let failed = !result.success();
            last = Some(result);
            if failed {
                break;
            }
        }

        // passes >= 1, so a result always exists.
        let result = last.unwrap_or(ProcessResult {
            exit_code: runner::NO_EXIT_CODE,
            stdout: String::new(),
            stderr: String::new(),
            timed_out: false,
        });

        let artifact = workspace.resolve(&OutputKind::Pdf.artifact_name(entry_filename));
        if result.success() && artifact.exists() {
            return Ok(CompilationOutcome::Success {
                artifact_path: artifact,
            });
        }

        tracing::info!(
            entry = entry_filename,
            exit_code = result.exit_code,
            timed_out = result.timed_out,
            artifact_exists = artifact.exists(),
            "render failed"
        );

        let log_path = workspace.resolve(&format!("{}.log", entry_stem(entry_filename)));
        let log_text = read_lossy(&log_path);
        let source_text = read_lossy(&workspace.resolve(entry_filename));

        Ok(CompilationOutcome::Failure(DiagnosticBundle {
            exit_code: result.exit_code,
            timed_out: result.timed_out,
            log_excerpt: log_scan::extract_fatal_error(&log_text, DEFAULT_CONTEXT_CHARS),
            source_snippet: log_scan::extract_source_snippet(
                &source_text,
                &log_text,
                DEFAULT_SNIPPET_RADIUS,
            ),
            file_listing: workspace.file_listing(),
            stdout_tail: log_scan::tail(&result.stdout, PDF_STREAM_TAIL).to_string(),
            stderr_tail: log_scan::tail(&result.stderr, PDF_STREAM_TAIL).to_string(),
        }))
    }

    /// Convert to an editable document via the conversion engine,
    /// invoked exactly once.
    ///
    /// There is no structured log for this path; on failure the
    /// diagnostic is built from the raw streams and the workspace
    /// file listing.
    pub async fn convert_docx(
        &self,
        workspace: &Workspace,
        entry_filename: &str,
    ) -> Result<CompilationOutcome> {
        let args = [entry_filename, "-s", "-o", DOCX_OUTPUT];

        let result = runner::run(
            &self.toolchain.pandoc,
            &args,
            workspace.root(),
            self.config.timeout,
        )
        .await?;

        let artifact = workspace.resolve(DOCX_OUTPUT);
        if result.success() && artifact.exists() {
            return Ok(CompilationOutcome::Success {
                artifact_path: artifact,
            });
        }

        tracing::info!(
            entry = entry_filename,
            exit_code = result.exit_code,
            timed_out = result.timed_out,
            "conversion failed"
        );

        Ok(CompilationOutcome::Failure(DiagnosticBundle {
            exit_code: result.exit_code,
            timed_out: result.timed_out,
            log_excerpt: String::new(),
            source_snippet: None,
            file_listing: workspace.file_listing(),
            stdout_tail: log_scan::tail(&result.stdout, DOCX_STREAM_TAIL).to_string(),
            stderr_tail: log_scan::tail(&result.stderr, DOCX_STREAM_TAIL).to_string(),
        }))
    }
}

/// Read a file as lossy UTF-8, or empty if it does not exist.
///
/// The engine log can contain arbitrary bytes; an absent log means
/// the engine crashed before producing one, which downstream treats
/// as "no structured error available".
fn read_lossy(path: &Path) -> String {
    match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => String::new(),
    }
}
