//! Wire frame shapes exchanged over the broker's WebSocket channel.
//!
//! Inbound frames are tagged by `type`; outbound events by `event`. Unlike a
//! request/response RPC frame, there is no `id`/correlation — every frame is
//! either a push from a participant or a broadcast to a room.

use bichat_core::types::{display_timestamp, ConversationId, Role};
use serde::{Deserialize, Serialize};

/// Query parameters a connection must supply on `/ws` upgrade.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectParams {
    pub cid: String,
    pub role: String,
}

/// Frame received from a connected client or agent.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    ClientMessage {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        image: Option<String>,
    },
    AgentMessage {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        image: Option<String>,
        #[serde(default)]
        target_lang: Option<String>,
    },
    AgentTyping,
    AgentSetStatus {
        online: bool,
    },
}

/// Event pushed to one or more rooms.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OutboundEvent {
    NewMessage(NewMessagePayload),
    AgentStatus { cid: String, online: bool },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewMessagePayload {
    pub cid: String,
    pub from: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_zh: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_reply: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_zh: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_fr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggest_zh: Option<String>,
    pub timestamp: String,
}

impl NewMessagePayload {
    pub fn for_role(cid: &ConversationId, role: Role) -> Self {
        Self {
            cid: cid.as_str().to_string(),
            from: match role {
                Role::Client => "client",
                Role::Agent => "agent",
                Role::Bot => "client", // bot replies ride on the client channel, flagged bot_reply
            },
            timestamp: display_timestamp(chrono::Utc::now()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_client_message_parses_tagged_json() {
        let raw = r#"{"type":"client_message","message":"Bonjour"}"#;
        let ev: InboundEvent = serde_json::from_str(raw).unwrap();
        match ev {
            InboundEvent::ClientMessage { message, image } => {
                assert_eq!(message.as_deref(), Some("Bonjour"));
                assert!(image.is_none());
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn inbound_agent_set_status_requires_online_flag() {
        let raw = r#"{"type":"agent_set_status","online":false}"#;
        let ev: InboundEvent = serde_json::from_str(raw).unwrap();
        matches!(ev, InboundEvent::AgentSetStatus { online: false });
    }

    #[test]
    fn outbound_new_message_omits_absent_fields() {
        let payload = NewMessagePayload::for_role(&ConversationId::from("c1"), Role::Client);
        let json = serde_json::to_value(&OutboundEvent::NewMessage(payload)).unwrap();
        assert!(json.get("original").is_none());
        assert_eq!(json["event"], "new_message");
    }
}
