//! Core engine for the texforge document compilation service.
//!
//! This crate provides:
//! - Toolchain resolution (external engine discovery, fail-fast)
//! - Workspace management (ephemeral per-request directories)
//! - Compiler driving (fixed recipes per output kind)
//! - Log diagnostics (fatal-error mining from engine logs)
//! - Compilation orchestration (one stateless pipeline per request)
//!
//! The HTTP layer lives in `texforge-server`; nothing in this crate
//! knows about requests, responses, or routes.

pub mod compile;
pub mod config;
pub mod error;

pub use compile::{
    CompilationOutcome, CompilationRequest, CompileJob, CompileService, DiagnosticBundle,
    OutputKind, Workspace, WorkspaceManager,
};
pub use config::{EngineConfig, Toolchain};
pub use error::{Error, Result};
