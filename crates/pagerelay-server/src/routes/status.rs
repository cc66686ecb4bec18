//! Broker status — connection and in-flight counts only.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(get_status))
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    agents: usize,
    pending: usize,
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        agents: state.agents.len(),
        pending: state.pending.len(),
    })
}
