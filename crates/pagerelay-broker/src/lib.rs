//! PageRelay broker — correlates HTTP conversion requests with replies from
//! browser agents connected over a WebSocket.
//!
//! The HTTP side never talks to a socket directly: it asks the
//! [`Orchestrator`], which picks an agent from the [`AgentRegistry`], parks a
//! slot in [`PendingRequests`], and waits for the socket side to fulfill it.

pub mod agents;
pub mod convert;
pub mod orchestrator;
pub mod pending;
pub mod protocol;
pub mod sanitize;

#[cfg(test)]
mod test_support;

pub use agents::{AgentHandle, AgentId, AgentRegistry};
pub use convert::{Html2TextConverter, MarkdownConverter};
pub use orchestrator::{ConversionRequest, Orchestrator};
pub use pending::{PendingRequests, PendingSlot};
pub use protocol::{RequestId, WireMessage};
pub use sanitize::Sanitizer;
