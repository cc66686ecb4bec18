//! Relay configuration from environment variables and defaults.

use std::time::Duration;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_REPLY_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SANITIZER_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_SANITIZER_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_WRAP_WIDTH: usize = 120;

/// Origin prefixes accepted on the agent socket when none are configured.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "chrome-extension://",
    "http://localhost:",
    "http://127.0.0.1:",
];

/// Top-level PageRelay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Listen address for both the HTTP API and the agent socket.
    pub addr: String,
    /// How long a conversion waits for the agent's reply.
    pub reply_timeout: Duration,
    /// Base URL of the sanitization service. `None` disables sanitization.
    pub sanitizer_url: Option<String>,
    /// Budget for a single sanitization call.
    pub sanitizer_timeout: Duration,
    /// Origin prefixes allowed to open an agent connection.
    pub allowed_origins: Vec<String>,
    /// Text width handed to the Markdown converter.
    pub wrap_width: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.into(),
            reply_timeout: Duration::from_secs(DEFAULT_REPLY_TIMEOUT_SECS),
            sanitizer_url: Some(DEFAULT_SANITIZER_URL.into()),
            sanitizer_timeout: Duration::from_secs(DEFAULT_SANITIZER_TIMEOUT_SECS),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
            wrap_width: DEFAULT_WRAP_WIDTH,
        }
    }
}

impl RelayConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let addr = lookup("PAGERELAY_ADDR")
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or(defaults.addr);

        let reply_timeout = lookup("PAGERELAY_REPLY_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.reply_timeout);

        // Present-but-empty disables the sanitizer entirely.
        let sanitizer_url = match lookup("PAGERELAY_SANITIZER_URL") {
            Some(url) if url.trim().is_empty() => None,
            Some(url) => Some(url.trim().trim_end_matches('/').to_string()),
            None => defaults.sanitizer_url,
        };

        let sanitizer_timeout = lookup("PAGERELAY_SANITIZER_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.sanitizer_timeout);

        let allowed_origins = lookup("PAGERELAY_ALLOWED_ORIGINS")
            .map(|list| {
                list.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.allowed_origins);

        let wrap_width = lookup("PAGERELAY_WRAP_WIDTH")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|&w| w >= 20)
            .unwrap_or(defaults.wrap_width);

        Self {
            addr,
            reply_timeout,
            sanitizer_url,
            sanitizer_timeout,
            allowed_origins,
            wrap_width,
        }
    }

    /// Whether an agent connection from `origin` may be upgraded.
    pub fn origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins
            .iter()
            .any(|prefix| origin.starts_with(prefix.as_str()))
    }
}
