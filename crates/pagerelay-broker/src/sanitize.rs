//! Client for the readability service that strips page boilerplate.

use std::time::Duration;

use pagerelay_core::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ReaderResponse {
    content: Option<String>,
}

/// HTTP client for `POST {base}/html_reader`.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    client: Client,
    endpoint: String,
}

impl Sanitizer {
    /// Build a client for the service at `base_url` with its own timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/html_reader", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send raw markup and return the cleaned markup.
    ///
    /// Every failure is reported as [`Error::SanitizationUnavailable`]; the
    /// caller decides whether to fall back.
    pub async fn sanitize(&self, html: &str, url: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "content": html, "url": url }))
            .send()
            .await
            .map_err(|e| Error::SanitizationUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::SanitizationUnavailable(format!(
                "reader returned {}",
                status
            )));
        }

        let body: ReaderResponse = response
            .json()
            .await
            .map_err(|e| Error::SanitizationUnavailable(format!("unreadable reply: {}", e)))?;

        match body.content {
            Some(content) if !content.trim().is_empty() => {
                debug!(
                    "Sanitized {} -> {} chars",
                    html.len(),
                    content.len()
                );
                Ok(content)
            }
            _ => Err(Error::SanitizationUnavailable(
                "reply has no usable content".into(),
            )),
        }
    }
}
