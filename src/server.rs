//! HTTP trigger host — accepts submission events over REST.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::{DispatchError, Error, InputError};
use crate::form::SubmissionEvent;
use crate::relay::Relay;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

/// Build the Axum router with the submission and health routes.
pub fn relay_routes(relay: Arc<Relay>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/submissions", post(submit))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { relay })
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "complaint-relay"
    }))
}

// ── Submissions ─────────────────────────────────────────────────────────

/// Malformed events answer with the same `{ "error": ... }` shape as any
/// other failure, not the extractor's plain-text rejection.
async fn submit(State(state): State<AppState>, body: Bytes) -> Response {
    let event = match std::str::from_utf8(&body)
        .map_err(|e| InputError::Read {
            path: "request body".into(),
            reason: e.to_string(),
        })
        .and_then(SubmissionEvent::from_json)
    {
        Ok(event) => event,
        Err(e) => return error_response(e.into()),
    };

    match state.relay.process(&event).await {
        Ok(outcome) => {
            info!(complaint_id = %outcome.complaint_id, "Submission accepted");
            (StatusCode::ACCEPTED, Json(outcome)).into_response()
        }
        Err(e) => error_response(e),
    }
}

fn error_response(err: Error) -> Response {
    let status = match &err {
        Error::Precondition(_) | Error::Input(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Dispatch(_) => StatusCode::BAD_GATEWAY,
        Error::Config(_) | Error::Status(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!(status = status.as_u16(), error = %err, "Submission failed");

    let body = match &err {
        Error::Dispatch(DispatchError::Rejected {
            status: upstream,
            body,
        }) => json!({
            "error": err.to_string(),
            "upstream_status": upstream,
            "upstream_body": body,
        }),
        _ => json!({ "error": err.to_string() }),
    };
    (status, Json(body)).into_response()
}
