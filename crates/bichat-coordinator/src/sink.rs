use async_trait::async_trait;
use bichat_core::ConversationId;
use bichat_protocol::OutboundEvent;

/// The coordinator never talks to a transport directly — it hands finished
/// events to whatever implements this, so the gateway's broker can be
/// swapped or mocked in tests without touching coordinator logic.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, cid: &ConversationId, event: OutboundEvent);
}

/// Test/dev sink that records every event instead of broadcasting it.
#[derive(Default)]
pub struct RecordingSink {
    pub events: tokio::sync::Mutex<Vec<OutboundEvent>>,
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn publish(&self, _cid: &ConversationId, event: OutboundEvent) {
        self.events.lock().await.push(event);
    }
}
