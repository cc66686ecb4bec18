//! HTML to Markdown conversion.

use std::io::Cursor;

use pagerelay_core::{Error, Result};

/// Turns extracted markup into Markdown text.
///
/// Implementations are synchronous; the orchestrator runs them on the
/// blocking pool.
pub trait MarkdownConverter: Send + Sync {
    fn convert(&self, html: &str) -> Result<String>;
}

/// Converter backed by `html2text`'s Markdown-flavoured renderer.
#[derive(Debug, Clone)]
pub struct Html2TextConverter {
    width: usize,
}

impl Html2TextConverter {
    pub fn new(width: usize) -> Self {
        Self { width }
    }
}

impl Default for Html2TextConverter {
    fn default() -> Self {
        Self::new(pagerelay_core::config::DEFAULT_WRAP_WIDTH)
    }
}

impl MarkdownConverter for Html2TextConverter {
    fn convert(&self, html: &str) -> Result<String> {
        html2text::from_read(Cursor::new(html.as_bytes()), self.width)
            .map_err(|e| Error::ConversionFailed(e.to_string()))
    }
}
