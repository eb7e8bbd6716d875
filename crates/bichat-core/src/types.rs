use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque conversation identifier shared by the client, agent and bot sides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Who produced a given message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Agent,
    Bot,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Client => write!(f, "client"),
            Role::Agent => write!(f, "agent"),
            Role::Bot => write!(f, "bot"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "agent" => Ok(Role::Agent),
            "bot" => Ok(Role::Bot),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A single observed message, either a chat text or an opaque image payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub cid: ConversationId,
    pub role: Role,
    pub original_text: Option<String>,
    pub translated_text: Option<String>,
    pub image: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Message {
    pub fn now(cid: ConversationId, role: Role) -> Self {
        Self {
            cid,
            role,
            original_text: None,
            translated_text: None,
            image: None,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// RFC3339-free display timestamp used on outbound wire events: "YYYY-MM-DD HH:MM".
pub fn display_timestamp(ts: chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}
