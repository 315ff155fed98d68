//! Per-request compilation pipeline.
//!
//! Linear state machine, no branching back:
//! validate -> workspace created -> source written -> engine driven ->
//! artifact verified or diagnostic assembled. A failed compilation is
//! terminal for the request; a resubmission gets a fresh workspace.

use crate::config::{EngineConfig, Toolchain};
use crate::error::Result;

use super::driver::CompilerDriver;
use super::types::{CompilationOutcome, CompilationRequest};
use super::workspace::{validate_entry_filename, Workspace, WorkspaceManager};

/// Composes workspace allocation, source writing, and engine driving
/// for independent, stateless compilation requests.
///
/// Safe to share across concurrent requests: every call gets its own
/// [`Workspace`] and there is no mutable state.
#[derive(Debug, Clone)]
pub struct CompileService {
    manager: WorkspaceManager,
    driver: CompilerDriver,
}

/// One finished compilation: the outcome plus the workspace that owns
/// any artifact.
///
/// The workspace must be disposed by the caller, strictly after the
/// artifact (if any) has been fully handed off; disposing earlier
/// truncates the artifact on filesystems with deferred deletes.
#[derive(Debug)]
pub struct CompileJob {
    /// The workspace holding source, log, and artifact files.
    pub workspace: Workspace,

    /// Success with artifact path, or the diagnostic bundle.
    pub outcome: CompilationOutcome,
}

impl CompileJob {
    /// Dispose the underlying workspace.
    pub fn dispose(self) {
        self.workspace.dispose();
    }
}

impl CompileService {
    /// Create a service from a config and an already-resolved toolchain.
    pub fn new(config: EngineConfig, toolchain: Toolchain) -> Result<Self> {
        let manager = WorkspaceManager::new(config.spool_dir.clone())?;
        let driver = CompilerDriver::new(toolchain, config);
        Ok(Self { manager, driver })
    }

    /// The workspace manager (for orphan sweeps).
    pub fn manager(&self) -> &WorkspaceManager {
        &self.manager
    }

    /// Run one compilation request to completion.
    ///
    /// # Errors
    ///
    /// Only system conditions error here: an invalid entry filename,
    /// a workspace that cannot be allocated, or an engine binary that
    /// cannot be spawned. A failing compilation returns
    /// `Ok` with [`CompilationOutcome::Failure`].
    pub async fn compile(&self, request: &CompilationRequest) -> Result<CompileJob> {
        // Reject bad names before allocating anything.
        validate_entry_filename(&request.entry_filename)?;

        let workspace = self.manager.create()?;

        let written = workspace.write_entry(&request.entry_filename, &request.source_text);
        if let Err(e) = written {
            workspace.dispose();
            return Err(e);
        }

        match self
            .driver
            .drive(&workspace, &request.entry_filename, request.output_kind)
            .await
        {
            Ok(outcome) => Ok(CompileJob { workspace, outcome }),
            Err(e) => {
                workspace.dispose();
                Err(e)
            }
        }
    }
}
