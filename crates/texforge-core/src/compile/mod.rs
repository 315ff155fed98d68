//! Compilation pipeline for texforge documents.
//!
//! This module provides:
//! - Workspace management (isolated per-request spool directories)
//! - Process running (timeout-bounded external invocations)
//! - Engine driving (pass-count policy and success criteria per kind)
//! - Log mining (fatal-error excerpts and source snippets)
//! - Orchestration (one linear pipeline per request)
//!
//! # Architecture
//!
//! ```text
//! CompilationRequest
//!     │
//!     └── CompileService ──► Workspace (spool/compile_<uuid>/)
//!                │
//!                ├── CompilerDriver ──► xelatex ×2 / pandoc ×1
//!                │         │
//!                │         └── artifact present?  ──► Success
//!                │
//!                └── log_scan ──► DiagnosticBundle ──► Failure
//! ```

mod driver;
pub mod log_scan;
mod orchestrator;
mod runner;
mod types;
mod workspace;

pub use driver::CompilerDriver;
pub use orchestrator::{CompileJob, CompileService};
pub use runner::{run, ProcessResult, NO_EXIT_CODE};
pub use types::{
    entry_stem, CompilationOutcome, CompilationRequest, DiagnosticBundle, OutputKind,
    DEFAULT_ENTRY, DOCX_OUTPUT, SOURCE_EXTENSION,
};
pub use workspace::{validate_entry_filename, Workspace, WorkspaceManager};
