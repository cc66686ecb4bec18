//! Agent socket — `/ws`, where browser extensions connect.
//!
//! Each connection becomes an agent in the registry. Outbound commands are
//! queued on an mpsc channel and pumped into the socket by a writer task;
//! inbound `htmlResponse` frames are routed into the correlation table.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use pagerelay_broker::protocol::preview;
use pagerelay_broker::{AgentHandle, AgentId, WireMessage};
use pagerelay_core::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::error_response;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/ws", get(upgrade))
}

async fn upgrade(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    // No Origin header means a non-browser client; those are let through.
    if let Some(origin) = headers.get(header::ORIGIN) {
        let origin = String::from_utf8_lossy(origin.as_bytes());
        if !state.config.origin_allowed(&origin) {
            let err = Error::OriginRejected(origin.into_owned());
            warn!("{}", err);
            return error_response(&err);
        }
    }

    ws.on_upgrade(move |socket| serve_agent(socket, state))
}

async fn serve_agent(socket: WebSocket, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WireMessage>();
    let agent = state.agents.register(AgentHandle::new(tx));

    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = match msg.encode() {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to encode command for agent {}: {}", agent, e);
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => handle_frame(&state, agent, text.as_str()),
            Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => handle_frame(&state, agent, text),
                Err(_) => warn!("Agent {} sent a non-UTF-8 binary frame", agent),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("Socket error from agent {}: {}", agent, e);
                break;
            }
        }
    }

    // The outbound queue is closed before the agent leaves the registry, so a
    // handle picked just before the disconnect can no longer accept commands
    // once its slots are abandoned.
    writer.abort();
    let _ = writer.await;
    state.agents.unregister(agent);
    state.pending.abandon_agent(agent);
}

fn handle_frame(state: &AppState, agent: AgentId, text: &str) {
    debug!("Agent {} sent: {}", agent, preview(text, 200));

    match WireMessage::decode(text) {
        Ok(WireMessage::HtmlResponse {
            request_id,
            content,
        }) => {
            state.pending.fulfill(request_id.as_str(), content);
        }
        Ok(WireMessage::Extract { .. }) => {
            warn!("Agent {} sent an extract command; ignoring", agent);
        }
        Err(e) => warn!("Agent {}: {}", agent, e),
    }
}
