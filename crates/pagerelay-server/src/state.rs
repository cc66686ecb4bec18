//! Shared application state.

use std::sync::Arc;

use pagerelay_broker::{AgentRegistry, Orchestrator, PendingRequests};
use pagerelay_core::{RelayConfig, Result};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: RelayConfig,
    pub agents: Arc<AgentRegistry>,
    pub pending: Arc<PendingRequests>,
    pub orchestrator: Orchestrator,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Result<Self> {
        let agents = Arc::new(AgentRegistry::new());
        let pending = Arc::new(PendingRequests::new());
        let orchestrator = Orchestrator::from_config(&config, agents.clone(), pending.clone())?;

        Ok(Self {
            config,
            agents,
            pending,
            orchestrator,
        })
    }
}
