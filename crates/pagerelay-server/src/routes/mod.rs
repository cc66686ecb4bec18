//! HTTP route handlers and the agent socket endpoint.

pub mod agent_socket;
pub mod convert;
pub mod status;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use pagerelay_core::Error;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(convert::routes())
        .merge(agent_socket::routes())
        .merge(status::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Terminal failure as `{"error": reason, "message": text}` with its status.
pub(crate) fn error_response(err: &Error) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(serde_json::json!({
            "error": err.reason(),
            "message": err.public_message(),
        })),
    )
        .into_response()
}
