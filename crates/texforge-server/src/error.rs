//! Error types for the texforge server.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use texforge_core::DiagnosticBundle;

/// Server error type.
///
/// A failed compilation is an expected business outcome and maps to a
/// client-error status carrying the full diagnostic; only resource
/// and IO conditions become internal errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Compilation failed; the bundle carries everything the user
    /// needs to self-diagnose.
    #[error("compilation failed (rc={})", .0.exit_code)]
    Compile(DiagnosticBundle),

    /// All job slots are taken; the caller should retry later.
    #[error("server busy, all compile slots in use")]
    Busy,

    /// Core error (resource allocation, invalid entry name, IO).
    #[error("core error: {0}")]
    Core(#[from] texforge_core::Error),

    /// Artifact produced but could not be read back.
    #[error("failed to read artifact: {0}")]
    ArtifactRead(std::io::Error),

    /// The spawned compile task died before reporting a result.
    #[error("compile task failed")]
    TaskFailed,
}

/// Result type for server handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Seconds suggested to a rejected caller before retrying.
const RETRY_AFTER_SECS: &str = "5";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Compile(bundle) => {
                let body = serde_json::json!({
                    "status": "failed",
                    "detail": bundle.render_text(),
                    "diagnostic": bundle,
                });
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            Self::Busy => (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, RETRY_AFTER_SECS)],
                "all compile slots are in use, retry later",
            )
                .into_response(),
            Self::Core(texforge_core::Error::InvalidEntryName(name)) => (
                StatusCode::BAD_REQUEST,
                format!("invalid entry filename: {}", name),
            )
                .into_response(),
            Self::Core(e) => {
                tracing::error!("internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
            Self::ArtifactRead(e) => {
                tracing::error!("artifact read failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
            Self::TaskFailed => {
                tracing::error!("compile task died before reporting a result");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> DiagnosticBundle {
        DiagnosticBundle {
            exit_code: 1,
            timed_out: false,
            log_excerpt: "! Undefined control sequence.".to_string(),
            source_snippet: None,
            file_listing: vec!["main.log".to_string()],
            stdout_tail: String::new(),
            stderr_tail: String::new(),
        }
    }

    #[test]
    fn test_compile_failure_is_client_error() {
        let response = ApiError::Compile(bundle()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_busy_carries_retry_after() {
        let response = ApiError::Busy.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap(),
            RETRY_AFTER_SECS
        );
    }

    #[test]
    fn test_invalid_entry_is_client_error() {
        let err = ApiError::Core(texforge_core::Error::InvalidEntryName("../x".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_resource_error_is_internal() {
        let err = ApiError::Core(texforge_core::Error::Resource {
            path: "/spool".into(),
            message: "disk full".to_string(),
        });
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
