// Web front end: the submission form, job status lookups and a health probe.

pub mod page;

use crate::core::queue::JobQueue;
use crate::core::JobId;
use crate::domain::model::SubmitForm;
use crate::utils::error::{MashupError, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Form, Router,
};
use serde_json::json;
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    queue: JobQueue,
}

pub fn router(queue: JobQueue) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/jobs/{id}", get(job_status))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { queue })
}

/// Serves until `shutdown` resolves, then lets in-flight requests finish.
pub async fn serve<F>(listener: TcpListener, queue: JobQueue, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("🌐 Listening on http://{}", addr);
    axum::serve(listener, router(queue))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
async fn index() -> Html<String> {
    Html(page::render_index(None))
}

/// POST / - validate the form and queue a mashup job
async fn submit(State(state): State<AppState>, Form(form): Form<SubmitForm>) -> impl IntoResponse {
    let request = match form.into_request() {
        Ok(request) => request,
        Err(rejection) => {
            let e = MashupError::from(rejection);
            tracing::debug!("Form rejected: {}", e);
            let message = e.user_friendly_message();
            return (StatusCode::OK, Html(page::render_index(Some(message.as_str()))));
        }
    };

    match state.queue.submit(request).await {
        Ok(id) => {
            let msg = format!("Submitted ✅ Job ID: {}. Check email soon.", id);
            (StatusCode::OK, Html(page::render_index(Some(&msg))))
        }
        Err(e) => {
            tracing::error!("❌ Failed to queue job: {}", e);
            let status = match &e {
                MashupError::QueueFull { .. } | MashupError::QueueClosed => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Html(page::render_index(Some(&e.user_friendly_message()))))
        }
    }
}

/// GET /jobs/{id}
async fn job_status(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let record = match JobId::parse(&id) {
        Some(job_id) => state.queue.status(job_id).await,
        None => None,
    };

    match record {
        Some(record) => Json(record).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("job {} not found", id) })),
        )
            .into_response(),
    }
}

/// GET /health
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
