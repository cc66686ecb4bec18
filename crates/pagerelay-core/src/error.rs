//! Error types for PageRelay.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing url parameter")]
    MissingUrl,

    #[error("No agent connected")]
    NoAgentConnected,

    #[error("Dispatch failed: {0}")]
    DispatchFailed(String),

    #[error("Agent disconnected before replying")]
    AgentDisconnected,

    #[error("Correlation timeout after {0:?}")]
    CorrelationTimeout(Duration),

    #[error("Duplicate request id: {0}")]
    DuplicateRequest(String),

    #[error("Sanitization unavailable: {0}")]
    SanitizationUnavailable(String),

    #[error("Conversion failed: {0}")]
    ConversionFailed(String),

    #[error("Protocol decode error: {0}")]
    ProtocolDecode(String),

    #[error("Origin rejected: {0}")]
    OriginRejected(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl Error {
    /// Short machine-readable reason, safe to put in a response body.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingUrl => "missing_url",
            Self::NoAgentConnected => "no_agent_connected",
            Self::DispatchFailed(_) => "dispatch_failed",
            Self::AgentDisconnected => "agent_disconnected",
            Self::CorrelationTimeout(_) => "request_timeout",
            Self::DuplicateRequest(_) => "duplicate_request",
            Self::SanitizationUnavailable(_) => "sanitization_unavailable",
            Self::ConversionFailed(_) => "conversion_failed",
            Self::ProtocolDecode(_) => "protocol_decode_error",
            Self::OriginRejected(_) => "origin_rejected",
            Self::Json(_) | Self::Http(_) => "internal_error",
        }
    }

    /// HTTP status a terminal failure is reported with.
    ///
    /// A lost agent reports 500; `reason()` tells those cases apart.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::MissingUrl => 400,
            Self::NoAgentConnected => 503,
            Self::CorrelationTimeout(_) => 504,
            Self::OriginRejected(_) => 403,
            _ => 500,
        }
    }

    /// Fixed human-readable message. Never carries ids or upstream detail.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MissingUrl => "Missing url parameter",
            Self::NoAgentConnected => "No browser connected",
            Self::DispatchFailed(_) => "Browser connection was lost before the request was sent",
            Self::AgentDisconnected => "Browser disconnected before replying",
            Self::CorrelationTimeout(_) => "Request timeout",
            Self::ConversionFailed(_) => "Failed to convert page content",
            Self::OriginRejected(_) => "Origin not allowed",
            _ => "Internal server error",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
