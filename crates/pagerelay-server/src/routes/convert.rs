//! Conversion route — `GET /convert?url=...&is_news=...`.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use pagerelay_broker::ConversionRequest;
use pagerelay_core::Error;
use serde::Deserialize;
use tracing::{debug, info};

use super::error_response;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/convert", get(convert))
}

#[derive(Debug, Deserialize)]
struct ConvertQuery {
    url: Option<String>,
    is_news: Option<String>,
}

/// Accepts `true/1/yes/on` in any case; everything else is off.
fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        )
    })
}

async fn convert(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConvertQuery>,
) -> Response {
    let Some(url) = query.url.filter(|u| !u.trim().is_empty()) else {
        return error_response(&Error::MissingUrl);
    };
    let sanitize = parse_flag(query.is_news.as_deref());
    info!("Convert request: {} (sanitize={})", url, sanitize);

    let request = ConversionRequest::new(url).sanitized(sanitize);
    match state.orchestrator.convert(&request).await {
        Ok(markdown) => {
            debug!("Returning {} chars for {}", markdown.len(), request.url);
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
                markdown,
            )
                .into_response()
        }
        Err(e) => {
            info!("Convert failed for {}: {}", request.url, e);
            error_response(&e)
        }
    }
}
