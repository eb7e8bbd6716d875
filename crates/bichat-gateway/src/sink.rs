use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use bichat_core::types::ConversationId;
use bichat_coordinator::EventSink;
use bichat_protocol::OutboundEvent;

use crate::broker::Broker;

/// Bridges the coordinator's abstract event sink onto the broker's
/// per-conversation broadcast channels.
pub struct BrokerSink {
    broker: Arc<Broker>,
}

impl BrokerSink {
    pub fn new(broker: Arc<Broker>) -> Self {
        Self { broker }
    }
}

#[async_trait]
impl EventSink for BrokerSink {
    async fn publish(&self, cid: &ConversationId, event: OutboundEvent) {
        // suggest_zh is an agent-only hint; strip it before it reaches the
        // customer's own room.
        if let OutboundEvent::NewMessage(payload) = &event {
            if payload.suggest_zh.is_some() {
                match serde_json::to_string(&event) {
                    Ok(agent_json) => self.broker.publish_agents(cid, agent_json),
                    Err(e) => warn!(error = %e, "failed to serialize outbound event"),
                }

                let mut client_payload = payload.clone();
                client_payload.suggest_zh = None;
                match serde_json::to_string(&OutboundEvent::NewMessage(client_payload)) {
                    Ok(client_json) => self.broker.publish_clients(cid, client_json),
                    Err(e) => warn!(error = %e, "failed to serialize outbound event"),
                }
                return;
            }
        }

        match serde_json::to_string(&event) {
            Ok(json) => self.broker.publish_all(cid, json),
            Err(e) => warn!(error = %e, "failed to serialize outbound event"),
        }
    }
}
