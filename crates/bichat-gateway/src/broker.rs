use std::collections::HashSet;

use dashmap::DashMap;
use tokio::sync::broadcast;

use bichat_core::types::{ConversationId, Role};

const ROOM_CAPACITY: usize = 256;

/// Conversation-scoped pub/sub, split into a `cid:clients` and a
/// `cid:agents` room per conversation so agent-only payloads (e.g. a
/// `suggest_zh` hint) never reach the customer's own connection. Each room
/// is created lazily on first join.
pub struct Broker {
    clients: DashMap<ConversationId, broadcast::Sender<String>>,
    agents: DashMap<ConversationId, broadcast::Sender<String>>,
}

impl Broker {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
            agents: DashMap::new(),
        }
    }

    pub fn join(&self, cid: &ConversationId, role: Role) -> broadcast::Receiver<String> {
        let room = match role {
            Role::Agent => &self.agents,
            Role::Client | Role::Bot => &self.clients,
        };
        room.entry(cid.clone())
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Sends to the customer-facing room only. No-op if nobody is listening.
    pub fn publish_clients(&self, cid: &ConversationId, payload: String) {
        if let Some(room) = self.clients.get(cid) {
            let _ = room.send(payload);
        }
    }

    /// Sends to the agent-facing room only. No-op if nobody is listening.
    pub fn publish_agents(&self, cid: &ConversationId, payload: String) {
        if let Some(room) = self.agents.get(cid) {
            let _ = room.send(payload);
        }
    }

    /// Sends the same payload to both rooms, for events with nothing to hide.
    pub fn publish_all(&self, cid: &ConversationId, payload: String) {
        self.publish_clients(cid, payload.clone());
        self.publish_agents(cid, payload);
    }

    pub fn room_count(&self) -> usize {
        let mut cids: HashSet<ConversationId> = self.clients.iter().map(|e| e.key().clone()).collect();
        cids.extend(self.agents.iter().map(|e| e.key().clone()));
        cids.len()
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}
