use std::time::Instant;

/// Mutable per-conversation state. Guarded by one mutex per entry in the
/// coordinator's conversation map — cheap, since writes are infrequent and
/// never held across an await point.
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub agent_online: bool,
    pub suppress_until: Instant,
    pub last_agent_activity: Instant,
    pub last_client_token: u64,
    pub last_client_qa: Option<PendingQa>,
}

#[derive(Debug, Clone)]
pub struct PendingQa {
    pub source_language_question: String,
    pub chinese_question: String,
    pub token: u64,
    pub asked_at: Instant,
}

impl ConversationState {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            agent_online: true,
            suppress_until: now,
            last_agent_activity: now,
            last_client_token: 0,
            last_client_qa: None,
        }
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}
