//! Wire messages exchanged with browser agents over the socket.
//!
//! Both directions are JSON objects tagged by `type`:
//! `{"type":"extract","url":...,"requestId":...}` goes out,
//! `{"type":"htmlResponse","requestId":...,"content":...}` comes back.

use std::borrow::Borrow;
use std::fmt;

use pagerelay_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Correlation identity linking an extract command to its reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Mint a fresh 128-bit random identity.
    pub fn mint() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for RequestId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message on the agent socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WireMessage {
    /// Ask the agent to open `url` and extract its markup.
    #[serde(rename = "extract")]
    Extract {
        url: String,
        #[serde(rename = "requestId")]
        request_id: RequestId,
    },
    /// Extracted markup for an earlier `Extract`.
    #[serde(rename = "htmlResponse")]
    HtmlResponse {
        #[serde(rename = "requestId")]
        request_id: RequestId,
        content: String,
    },
}

impl WireMessage {
    pub fn extract(url: impl Into<String>, request_id: RequestId) -> Self {
        Self::Extract {
            url: url.into(),
            request_id,
        }
    }

    /// Serialize to the JSON text frame sent on the socket.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse an inbound text frame.
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::ProtocolDecode(e.to_string()))
    }
}

/// Truncate a frame for logging without splitting a UTF-8 character.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
