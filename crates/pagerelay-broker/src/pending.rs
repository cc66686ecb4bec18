//! Correlation table — outstanding extract commands awaiting a reply.
//!
//! Each entry is a single-use completion slot keyed by [`RequestId`]. The
//! requester holds a [`PendingSlot`]; dropping it removes the entry, so the
//! table is cleaned up on every exit path including cancellation of the
//! awaiting future.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use pagerelay_core::{Error, Result};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::agents::AgentId;
use crate::protocol::RequestId;

struct Slot {
    agent: AgentId,
    reply: oneshot::Sender<String>,
}

/// Table of in-flight requests.
#[derive(Default)]
pub struct PendingRequests {
    slots: Mutex<HashMap<RequestId, Slot>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a slot for `id`, owned by the agent the command goes to.
    ///
    /// At most one slot may exist per id.
    pub fn create_slot(self: &Arc<Self>, id: RequestId, agent: AgentId) -> Result<PendingSlot> {
        let (tx, rx) = oneshot::channel();
        {
            let mut slots = self.slots.lock();
            if slots.contains_key(&id) {
                return Err(Error::DuplicateRequest(id.to_string()));
            }
            slots.insert(id.clone(), Slot { agent, reply: tx });
        }
        debug!("Slot opened for request {}", id);
        Ok(PendingSlot {
            id,
            table: Arc::clone(self),
            reply: rx,
        })
    }

    /// Deliver a reply. Returns false for a late, unknown, or repeated reply;
    /// those are logged and dropped.
    pub fn fulfill(&self, id: &str, content: String) -> bool {
        let slot = self.slots.lock().remove(id);
        match slot {
            Some(slot) => {
                if slot.reply.send(content).is_err() {
                    debug!("Requester for {} went away before the reply landed", id);
                    return false;
                }
                debug!("Request {} fulfilled", id);
                true
            }
            None => {
                warn!("Dropping reply for unknown or expired request {}", id);
                false
            }
        }
    }

    /// Remove a slot without fulfilling it. Returns false if it was absent.
    pub fn discard(&self, id: &str) -> bool {
        self.slots.lock().remove(id).is_some()
    }

    /// Drop every slot whose command went to `agent`. Awaiting requesters
    /// observe [`Error::AgentDisconnected`].
    pub fn abandon_agent(&self, agent: AgentId) -> usize {
        let mut slots = self.slots.lock();
        let before = slots.len();
        slots.retain(|_, slot| slot.agent != agent);
        let dropped = before - slots.len();
        if dropped > 0 {
            warn!("Agent {} left {} request(s) unanswered", agent, dropped);
        }
        dropped
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

/// Requester side of a slot. Removes its table entry on drop.
pub struct PendingSlot {
    id: RequestId,
    table: Arc<PendingRequests>,
    reply: oneshot::Receiver<String>,
}

impl PendingSlot {
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// Wait for the reply until `deadline` elapses.
    ///
    /// Never resolves with a timeout before `deadline`.
    pub async fn await_reply(mut self, deadline: Duration) -> Result<String> {
        match tokio::time::timeout(deadline, &mut self.reply).await {
            Ok(Ok(content)) => Ok(content),
            Ok(Err(_)) => Err(Error::AgentDisconnected),
            Err(_) => Err(Error::CorrelationTimeout(deadline)),
        }
    }
}

impl Drop for PendingSlot {
    fn drop(&mut self) {
        if self.table.discard(self.id.as_str()) {
            debug!("Slot for request {} discarded", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::time::Instant;

    fn table() -> Arc<PendingRequests> {
        Arc::new(PendingRequests::new())
    }

    #[tokio::test]
    async fn test_fulfill_then_await() {
        let table = table();
        let slot = table.create_slot(RequestId::from("r1"), AgentId::new()).unwrap();
        assert!(table.contains("r1"));

        assert!(table.fulfill("r1", "<html>hi</html>".into()));
        let content = slot.await_reply(Duration::from_secs(1)).await.unwrap();
        assert_eq!(content, "<html>hi</html>");
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_second_fulfill_is_noop() {
        let table = table();
        let slot = table.create_slot(RequestId::from("r1"), AgentId::new()).unwrap();

        assert!(table.fulfill("r1", "first".into()));
        assert!(!table.fulfill("r1", "second".into()));

        let content = slot.await_reply(Duration::from_secs(1)).await.unwrap();
        assert_eq!(content, "first");
    }

    #[test]
    fn test_unknown_reply_is_dropped() {
        let table = table();
        assert!(!table.fulfill("nobody", "x".into()));
        assert!(table.is_empty());
    }

    #[test]
    fn test_duplicate_slot_rejected() {
        let table = table();
        let _slot = table.create_slot(RequestId::from("dup"), AgentId::new()).unwrap();
        let err = table
            .create_slot(RequestId::from("dup"), AgentId::new())
            .err()
            .unwrap();
        assert!(matches!(err, Error::DuplicateRequest(_)));
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_fires_no_earlier_than_deadline() {
        let table = table();
        let slot = table.create_slot(RequestId::from("slow"), AgentId::new()).unwrap();
        let deadline = Duration::from_millis(80);

        let started = Instant::now();
        let err = slot.await_reply(deadline).await.unwrap_err();
        assert!(started.elapsed() >= deadline);
        assert!(matches!(err, Error::CorrelationTimeout(d) if d == deadline));
        assert!(!table.contains("slow"));
    }

    #[tokio::test]
    async fn test_late_reply_does_not_touch_other_requests() {
        let table = table();
        let expired = table.create_slot(RequestId::from("old"), AgentId::new()).unwrap();
        let _ = expired.await_reply(Duration::from_millis(10)).await;

        let live = table.create_slot(RequestId::from("new"), AgentId::new()).unwrap();
        assert!(!table.fulfill("old", "late".into()));
        assert!(!table.contains("old"));
        assert!(table.contains("new"));

        assert!(table.fulfill("new", "fresh".into()));
        assert_eq!(live.await_reply(Duration::from_secs(1)).await.unwrap(), "fresh");
    }

    #[test]
    fn test_drop_discards_slot() {
        let table = table();
        let slot = table.create_slot(RequestId::from("gone"), AgentId::new()).unwrap();
        drop(slot);
        assert!(!table.contains("gone"));
    }

    #[tokio::test]
    async fn test_cancelled_await_discards_slot() {
        let table = table();
        let slot = table.create_slot(RequestId::from("cancel"), AgentId::new()).unwrap();
        let task = tokio::spawn(slot.await_reply(Duration::from_secs(30)));
        tokio::task::yield_now().await;
        task.abort();
        let _ = task.await;
        assert!(!table.contains("cancel"));
    }

    #[tokio::test]
    async fn test_abandon_agent_wakes_requester() {
        let table = table();
        let agent = AgentId::new();
        let other = AgentId::new();
        let slot = table.create_slot(RequestId::from("a"), agent).unwrap();
        let _kept = table.create_slot(RequestId::from("b"), other).unwrap();

        assert_eq!(table.abandon_agent(agent), 1);
        let err = slot.await_reply(Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, Error::AgentDisconnected));
        assert!(table.contains("b"));
    }

    proptest! {
        #[test]
        fn minted_slots_never_collide(n in 1usize..200) {
            let table = table();
            let agent = AgentId::new();
            let mut ids = HashSet::new();
            let mut slots = Vec::with_capacity(n);
            for _ in 0..n {
                let slot = table.create_slot(RequestId::mint(), agent).unwrap();
                prop_assert!(ids.insert(slot.id().clone()));
                slots.push(slot);
            }
            prop_assert_eq!(table.len(), n);
            drop(slots);
            prop_assert!(table.is_empty());
        }
    }
}
