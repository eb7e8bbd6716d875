use thiserror::Error;

#[derive(Debug, Error)]
pub enum BichatError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("knowledge store error: {0}")]
    Knowledge(String),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("broker protocol error: {0}")]
    Protocol(String),

    #[error("unknown conversation: {cid}")]
    UnknownConversation { cid: String },

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("request timeout after {ms}ms")]
    Timeout { ms: u64 },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BichatError {
    /// Short error code, carried for any future client-visible surfacing.
    pub fn code(&self) -> &'static str {
        match self {
            BichatError::Config(_) => "CONFIG_ERROR",
            BichatError::Knowledge(_) => "KNOWLEDGE_ERROR",
            BichatError::Translation(_) => "TRANSLATION_ERROR",
            BichatError::Protocol(_) => "PROTOCOL_ERROR",
            BichatError::UnknownConversation { .. } => "UNKNOWN_CONVERSATION",
            BichatError::MessageTooLarge { .. } => "MESSAGE_TOO_LARGE",
            BichatError::Timeout { .. } => "TIMEOUT",
            BichatError::Serialization(_) => "SERIALIZATION_ERROR",
            BichatError::Io(_) => "IO_ERROR",
            BichatError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, BichatError>;
