//! Orchestrator — drives one conversion from agent dispatch to Markdown.
//!
//! Flow per request: pick an agent, open a correlation slot, send the
//! extract command, wait for the reply under the deadline, optionally run
//! the page through the sanitizer (falling back to the raw markup on any
//! sanitizer failure), then convert to Markdown on the blocking pool.

use std::sync::Arc;
use std::time::Duration;

use pagerelay_core::{Error, RelayConfig, Result};
use tracing::{debug, error, info, warn};

use crate::agents::AgentRegistry;
use crate::convert::{Html2TextConverter, MarkdownConverter};
use crate::pending::PendingRequests;
use crate::protocol::{RequestId, WireMessage};
use crate::sanitize::Sanitizer;

/// A single `/convert` call.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub url: String,
    /// Run the extracted markup through the sanitizer first.
    pub sanitize: bool,
}

impl ConversionRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            sanitize: false,
        }
    }

    pub fn sanitized(mut self, sanitize: bool) -> Self {
        self.sanitize = sanitize;
        self
    }
}

/// Coordinates agents, the correlation table, and the collaborators.
pub struct Orchestrator {
    agents: Arc<AgentRegistry>,
    pending: Arc<PendingRequests>,
    sanitizer: Option<Sanitizer>,
    converter: Arc<dyn MarkdownConverter>,
    reply_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        agents: Arc<AgentRegistry>,
        pending: Arc<PendingRequests>,
        converter: Arc<dyn MarkdownConverter>,
        reply_timeout: Duration,
    ) -> Self {
        Self {
            agents,
            pending,
            sanitizer: None,
            converter,
            reply_timeout,
        }
    }

    /// Build from configuration with the default converter.
    pub fn from_config(
        config: &RelayConfig,
        agents: Arc<AgentRegistry>,
        pending: Arc<PendingRequests>,
    ) -> Result<Self> {
        let converter: Arc<dyn MarkdownConverter> =
            Arc::new(Html2TextConverter::new(config.wrap_width));
        let sanitizer = match &config.sanitizer_url {
            Some(url) => Some(Sanitizer::new(url, config.sanitizer_timeout)?),
            None => None,
        };

        info!(
            "Orchestrator initialized: reply_timeout={:?}, sanitizer={}",
            config.reply_timeout,
            sanitizer.as_ref().map_or("disabled", |s| s.endpoint())
        );

        Ok(Self::new(agents, pending, converter, config.reply_timeout).with_sanitizer(sanitizer))
    }

    pub fn with_sanitizer(mut self, sanitizer: Option<Sanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn reply_timeout(&self) -> Duration {
        self.reply_timeout
    }

    /// Run one conversion to completion.
    pub async fn convert(&self, request: &ConversionRequest) -> Result<String> {
        let html = self.extract(&request.url).await?;

        let html = if request.sanitize {
            self.sanitize_or_fallback(html, &request.url).await
        } else {
            html
        };

        self.to_markdown(html).await
    }

    /// Dispatch an extract command and wait for the correlated reply.
    async fn extract(&self, url: &str) -> Result<String> {
        let agent = self.agents.pick_any().ok_or(Error::NoAgentConnected)?;

        // The slot exists before the command leaves so a fast reply is never
        // missed. Every return below drops it, which clears the table entry.
        let slot = self.pending.create_slot(RequestId::mint(), agent.id())?;
        let request_id = slot.id().clone();

        debug!("Dispatching extract {} for {} to agent {}", request_id, url, agent.id());
        agent.send(WireMessage::extract(url, request_id.clone()))?;

        match slot.await_reply(self.reply_timeout).await {
            Ok(html) => {
                debug!("Reply for {}: {} chars", request_id, html.len());
                Ok(html)
            }
            Err(e) => {
                error!("Request {} failed: {}", request_id, e);
                Err(e)
            }
        }
    }

    async fn sanitize_or_fallback(&self, html: String, url: &str) -> String {
        let Some(sanitizer) = &self.sanitizer else {
            warn!("Sanitization requested but no sanitizer is configured; using raw markup");
            return html;
        };

        match sanitizer.sanitize(&html, url).await {
            Ok(clean) => clean,
            Err(e) => {
                warn!("{}; using raw markup", e);
                html
            }
        }
    }

    async fn to_markdown(&self, html: String) -> Result<String> {
        let converter = Arc::clone(&self.converter);
        let markdown = tokio::task::spawn_blocking(move || converter.convert(&html))
            .await
            .map_err(|e| Error::ConversionFailed(format!("converter task failed: {}", e)))??;
        debug!("Converted to {} chars of Markdown", markdown.len());
        Ok(markdown)
    }
}
