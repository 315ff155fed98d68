//! HTTP routes for the texforge server.

use std::sync::Arc;

use axum::{
    extract::{Form, State},
    http::header,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tokio::sync::{oneshot, Semaphore};
use tower_http::cors::CorsLayer;

use texforge_core::{
    CompilationOutcome, CompilationRequest, CompileService, OutputKind,
};

use crate::error::{ApiError, ApiResult};

/// Application state shared across handlers.
pub struct AppState {
    /// Stateless compile pipeline; safe to share across requests.
    pub service: CompileService,

    /// Admission control: one permit per concurrently running
    /// compilation. The external engines are resource-heavy, so
    /// requests beyond the bound are rejected with a retry-later
    /// status instead of queued.
    pub jobs: Arc<Semaphore>,
}

/// Create the router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/compile/pdf", post(compile_pdf_handler))
        .route("/compile/docx", post(compile_docx_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Form payload for both compile endpoints.
#[derive(Debug, Deserialize)]
pub struct CompileForm {
    /// The markup source to compile.
    pub tex_text: String,

    /// Entry filename the engine is pointed at.
    #[serde(default = "default_entry")]
    pub main: String,
}

fn default_entry() -> String {
    texforge_core::compile::DEFAULT_ENTRY.to_string()
}

/// Minimal built-in page describing the API.
async fn index_handler() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>texforge</title>
    <style>
        body { font-family: system-ui, sans-serif; margin: 2rem; max-width: 50rem; }
        textarea { width: 100%; height: 14rem; font-family: monospace; }
        pre { background: #f3f4f6; padding: 1rem; border-radius: 0.5rem; }
    </style>
</head>
<body>
    <h1>texforge</h1>
    <p>Compile TeX sources to PDF or DOCX.</p>
    <form method="post" action="/compile/pdf">
        <textarea name="tex_text">\documentclass{article}
\begin{document}
Hello, world.
\end{document}</textarea>
        <p>
            <button formaction="/compile/pdf">Compile PDF</button>
            <button formaction="/compile/docx">Export DOCX</button>
        </p>
    </form>
    <p>API endpoints:</p>
    <ul>
        <li><code>GET /health</code> - Health check</li>
        <li><code>POST /compile/pdf</code> - Form fields <code>tex_text</code>, <code>main</code></li>
        <li><code>POST /compile/docx</code> - Form fields <code>tex_text</code>, <code>main</code></li>
    </ul>
</body>
</html>"#,
    )
}

/// Health check handler.
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Compile to a fixed-layout PDF.
async fn compile_pdf_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CompileForm>,
) -> ApiResult<impl IntoResponse> {
    compile(state, form, OutputKind::Pdf).await
}

/// Convert to an editable DOCX.
async fn compile_docx_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CompileForm>,
) -> ApiResult<impl IntoResponse> {
    compile(state, form, OutputKind::Docx).await
}

/// Shared compile path for both endpoints.
///
/// The compilation runs in a spawned task holding the admission
/// permit, so a client disconnect neither interrupts the engine
/// mid-run nor leaks the workspace: if the handler is gone when the
/// task finishes, the task disposes the workspace itself.
async fn compile(
    state: Arc<AppState>,
    form: CompileForm,
    output_kind: OutputKind,
) -> ApiResult<impl IntoResponse> {
    let permit = state
        .jobs
        .clone()
        .try_acquire_owned()
        .map_err(|_| ApiError::Busy)?;

    let request = CompilationRequest {
        source_text: form.tex_text,
        entry_filename: form.main,
        output_kind,
    };

    let service = state.service.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let _permit = permit;
        let result = service.compile(&request).await;
        if let Err(result) = tx.send(result) {
            if let Ok(job) = result {
                tracing::debug!("caller went away, disposing workspace");
                job.dispose();
            }
        }
    });

    let job = match rx.await {
        Ok(result) => result?,
        // Sender dropped without sending: the compile task panicked.
        Err(_) => return Err(ApiError::TaskFailed),
    };

    match job.outcome {
        CompilationOutcome::Success { ref artifact_path } => {
            // Read the artifact fully before disposing the workspace;
            // deleting while the file is still being read truncates
            // the response on deferred-delete filesystems.
            let bytes = tokio::fs::read(artifact_path).await;
            job.workspace.dispose();
            let bytes = bytes.map_err(ApiError::ArtifactRead)?;

            tracing::info!(
                kind = ?output_kind,
                size = bytes.len(),
                "compiled artifact delivered"
            );

            Ok((
                [
                    (header::CONTENT_TYPE, output_kind.media_type().to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!(
                            "attachment; filename=\"{}\"",
                            output_kind.download_filename()
                        ),
                    ),
                ],
                bytes,
            ))
        }
        CompilationOutcome::Failure(diagnostic) => {
            job.workspace.dispose();
            Err(ApiError::Compile(diagnostic))
        }
    }
}
