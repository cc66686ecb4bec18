//! Agent registry — the browser agents currently connected to the socket.

use std::collections::HashMap;
use std::fmt;

use pagerelay_core::{Error, Result};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::protocol::WireMessage;

/// Opaque per-connection identity, unique for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentId(uuid::Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Routing handle for one agent.
///
/// The socket task owns the connection; this only holds the sending side of
/// its outbound queue. Once the socket task exits, sends fail.
#[derive(Debug, Clone)]
pub struct AgentHandle {
    id: AgentId,
    outbound: mpsc::UnboundedSender<WireMessage>,
}

impl AgentHandle {
    pub fn new(outbound: mpsc::UnboundedSender<WireMessage>) -> Self {
        Self {
            id: AgentId::new(),
            outbound,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Queue a message for the agent's socket.
    pub fn send(&self, msg: WireMessage) -> Result<()> {
        self.outbound
            .send(msg)
            .map_err(|_| Error::DispatchFailed(format!("agent {} is no longer connected", self.id)))
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

/// Process-wide set of connected agents.
#[derive(Default)]
pub struct AgentRegistry {
    agents: RwLock<HashMap<AgentId, AgentHandle>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agent and return its identity.
    pub fn register(&self, handle: AgentHandle) -> AgentId {
        let id = handle.id();
        let total = {
            let mut agents = self.agents.write();
            agents.insert(id, handle);
            agents.len()
        };
        info!("Agent connected: {} ({} total)", id, total);
        id
    }

    /// Remove an agent. Returns false if it was not registered.
    pub fn unregister(&self, id: AgentId) -> bool {
        let (removed, total) = {
            let mut agents = self.agents.write();
            let removed = agents.remove(&id).is_some();
            (removed, agents.len())
        };
        if removed {
            info!("Agent disconnected: {} ({} remaining)", id, total);
        } else {
            debug!("Unregister for unknown agent {}", id);
        }
        removed
    }

    /// Pick any connected agent. No load or capability awareness.
    pub fn pick_any(&self) -> Option<AgentHandle> {
        let agents = self.agents.read();
        // Prefer a live handle; a closed one is about to be unregistered.
        agents
            .values()
            .find(|h| !h.is_closed())
            .or_else(|| agents.values().next())
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.agents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.read().is_empty()
    }
}
