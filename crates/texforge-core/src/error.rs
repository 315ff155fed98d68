//! Error types for texforge-core.
//!
//! Only true system conditions live here. A failed compilation is a
//! normal business outcome and is represented as
//! [`crate::compile::CompilationOutcome::Failure`], never as an error.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for texforge-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in texforge-core.
#[derive(Debug, Error)]
pub enum Error {
    /// Could not allocate or write a compilation workspace.
    #[error("workspace resource error at {path}: {message}")]
    Resource { path: PathBuf, message: String },

    /// A required external tool binary could not be located.
    ///
    /// Surfaced once at startup; the service must refuse to start
    /// rather than fail per-request.
    #[error("required tool '{tool}' not found (looked for '{program}')")]
    ToolUnavailable { tool: &'static str, program: String },

    /// Entry filename failed validation (path traversal, absolute
    /// path, or excessive nesting).
    #[error("invalid entry filename: {0}")]
    InvalidEntryName(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
