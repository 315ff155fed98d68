//! texforge HTTP compile service.
//!
//! A thin shim over `texforge-core`: four routes, admission control,
//! and artifact hand-off. All compilation semantics live in the core
//! crate.
//!
//! # Architecture
//!
//! - **Routes**: `/`, `/health`, `/compile/pdf`, `/compile/docx`
//! - **Admission**: a semaphore sized to `max_concurrent_jobs`;
//!   excess requests get a retry-later rejection
//! - **Cleanup**: workspaces are disposed after the artifact is fully
//!   read, with a periodic sweep for anything leaked by a crash

pub mod error;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use texforge_core::{CompileService, EngineConfig, Toolchain};

pub use error::{ApiError, ApiResult};
pub use routes::{create_router, AppState};

/// How often the orphan sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Age beyond which a workspace is considered leaked.
const ORPHAN_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Server error type for startup and shutdown.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Core error (including missing engine binaries at startup).
    #[error("core error: {0}")]
    Core(#[from] texforge_core::Error),

    /// IO error (bind failure, serve failure).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed bind address.
    #[error("invalid address: {0}")]
    Address(String),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Start the compile service.
///
/// Resolves the toolchain first and refuses to start if either engine
/// binary is missing; a broken deployment fails here, not on the
/// first request.
pub async fn serve(server_config: ServerConfig, engine_config: EngineConfig) -> ServerResult<()> {
    let toolchain = Toolchain::resolve(&engine_config)?;

    if let Some(version) = Toolchain::probe_version(&toolchain.xelatex) {
        tracing::info!(engine = "render", %version, "engine ready");
    }
    if let Some(version) = Toolchain::probe_version(&toolchain.pandoc) {
        tracing::info!(engine = "convert", %version, "engine ready");
    }

    let max_jobs = engine_config.max_concurrent_jobs;
    let service = CompileService::new(engine_config, toolchain)?;

    // Sweep workspaces leaked by earlier crashes, then periodically.
    let sweeper = service.manager().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match sweeper.sweep_orphans(ORPHAN_MAX_AGE) {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "swept orphaned workspaces"),
                Err(e) => tracing::warn!("orphan sweep failed: {}", e),
            }
        }
    });

    let state = Arc::new(AppState {
        service,
        jobs: Arc::new(Semaphore::new(max_jobs)),
    });

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", server_config.host, server_config.port)
        .parse()
        .map_err(|_| {
            ServerError::Address(format!(
                "{}:{}",
                server_config.host, server_config.port
            ))
        })?;

    tracing::info!("starting texforge server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("received shutdown signal");
            }
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn test_bad_address_is_rejected() {
        let err: Result<SocketAddr, _> = "not-a-host:0".parse();
        assert!(err.is_err());
    }
}
