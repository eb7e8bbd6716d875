use std::sync::Arc;
use std::time::Duration;

use bichat_core::config::{BichatConfig, ChatConfig};
use bichat_core::types::{ConversationId, Role};
use bichat_coordinator::{ConversationCoordinator, KeywordRuleResponder, RecordingSink};
use bichat_knowledge::KnowledgeStore;
use bichat_protocol::OutboundEvent;
use bichat_translate::TranslationCascade;

fn fast_chat_config() -> ChatConfig {
    let mut cfg = BichatConfig::default().chat;
    cfg.bot_inactivity_sec = 0;
    cfg.bot_suppress_sec = 0;
    cfg
}

fn no_op_cascade() -> Arc<TranslationCascade> {
    Arc::new(TranslationCascade::new(false, vec![], vec![], None))
}

async fn build() -> (ConversationCoordinator, Arc<RecordingSink>) {
    let knowledge = Arc::new(KnowledgeStore::open_in_memory().unwrap());
    let sink = Arc::new(RecordingSink::default());
    let coordinator = ConversationCoordinator::new(
        fast_chat_config(),
        knowledge,
        no_op_cascade(),
        Arc::new(KeywordRuleResponder),
        sink.clone(),
    );
    (coordinator, sink)
}

#[tokio::test]
async fn bot_takes_over_when_agent_stays_silent() {
    let (coordinator, sink) = build().await;
    let cid = ConversationId::from("t1");
    coordinator.on_connect(&cid, Role::Client).await;
    coordinator
        .on_client_message(&cid, Some("Bonjour".to_string()), None)
        .await;

    tokio::time::sleep(Duration::from_millis(100)).await;

    let events = sink.events.lock().await;
    let bot_reply_seen = events.iter().any(|e| matches!(e, OutboundEvent::NewMessage(p) if p.bot_reply == Some(true)));
    assert!(bot_reply_seen);
}

#[tokio::test]
async fn agent_message_cancels_pending_bot_reply() {
    let (coordinator, sink) = build().await;
    let cid = ConversationId::from("t2");
    coordinator.on_connect(&cid, Role::Client).await;

    let mut slow_cfg = fast_chat_config();
    slow_cfg.bot_inactivity_sec = 2;
    let knowledge = Arc::new(KnowledgeStore::open_in_memory().unwrap());
    let coordinator = ConversationCoordinator::new(
        slow_cfg,
        knowledge,
        no_op_cascade(),
        Arc::new(KeywordRuleResponder),
        sink.clone(),
    );

    coordinator
        .on_client_message(&cid, Some("Salut".to_string()), None)
        .await;
    coordinator
        .on_agent_message(&cid, Some("你好".to_string()), None, None)
        .await;

    tokio::time::sleep(Duration::from_millis(2200)).await;

    let events = sink.events.lock().await;
    let bot_reply_seen = events.iter().any(|e| matches!(e, OutboundEvent::NewMessage(p) if p.bot_reply == Some(true)));
    assert!(!bot_reply_seen);
}
