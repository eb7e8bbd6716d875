pub mod coordinator;
pub mod pending;
pub mod rule_responder;
pub mod sink;
pub mod state;

pub use coordinator::ConversationCoordinator;
pub use rule_responder::{KeywordRuleResponder, RuleResponder};
pub use sink::{EventSink, RecordingSink};
pub use state::{ConversationState, PendingQa};
