use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use bichat_core::config::ChatConfig;
use bichat_core::types::{ConversationId, Role};
use bichat_knowledge::KnowledgeStore;
use bichat_protocol::{NewMessagePayload, OutboundEvent};
use bichat_translate::TranslationCascade;

use crate::pending::wait_for_takeover;
use crate::rule_responder::RuleResponder;
use crate::sink::EventSink;
use crate::state::{ConversationState, PendingQa};

pub struct ConversationCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    config: ChatConfig,
    states: DashMap<ConversationId, AsyncMutex<ConversationState>>,
    pending: DashMap<ConversationId, JoinHandle<()>>,
    knowledge: Arc<KnowledgeStore>,
    translate: Arc<TranslationCascade>,
    rule_responder: Arc<dyn RuleResponder>,
    sink: Arc<dyn EventSink>,
    token_seq: AtomicU64,
}

impl Clone for ConversationCoordinator {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl ConversationCoordinator {
    pub fn new(
        config: ChatConfig,
        knowledge: Arc<KnowledgeStore>,
        translate: Arc<TranslationCascade>,
        rule_responder: Arc<dyn RuleResponder>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                states: DashMap::new(),
                pending: DashMap::new(),
                knowledge,
                translate,
                rule_responder,
                sink,
                token_seq: AtomicU64::new(1),
            }),
        }
    }

    pub async fn on_connect(&self, cid: &ConversationId, role: Role) {
        self.inner
            .states
            .entry(cid.clone())
            .or_insert_with(|| AsyncMutex::new(ConversationState::new()));

        let online = {
            let entry = self.inner.states.get(cid).unwrap();
            let mut state = entry.lock().await;
            if role == Role::Agent {
                state.last_agent_activity = Instant::now();
            }
            state.agent_online
        };

        self.inner
            .sink
            .publish(
                cid,
                OutboundEvent::AgentStatus {
                    cid: cid.as_str().to_string(),
                    online,
                },
            )
            .await;
    }

    pub async fn on_agent_set_online(&self, cid: &ConversationId, online: bool) {
        self.ensure_state(cid).await;
        if let Some(entry) = self.inner.states.get(cid) {
            let mut state = entry.lock().await;
            state.agent_online = online;
        }
        self.inner
            .sink
            .publish(
                cid,
                OutboundEvent::AgentStatus {
                    cid: cid.as_str().to_string(),
                    online,
                },
            )
            .await;
    }

    pub async fn on_agent_typing(&self, cid: &ConversationId) {
        self.ensure_state(cid).await;
        if let Some(entry) = self.inner.states.get(cid) {
            let mut state = entry.lock().await;
            let now = Instant::now();
            state.suppress_until = now + Duration::from_secs(self.inner.config.bot_suppress_sec);
            state.last_agent_activity = now;
        }
    }

    pub async fn on_client_message(&self, cid: &ConversationId, text: Option<String>, image: Option<String>) {
        self.ensure_state(cid).await;

        if let Some(image) = image {
            let _ = self.inner.knowledge.log_message(cid.as_str(), "client", "auto", "[image]");
            let mut payload = NewMessagePayload::for_role(cid, Role::Client);
            payload.image = Some(image);
            self.inner.sink.publish(cid, OutboundEvent::NewMessage(payload)).await;
            return;
        }

        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            return;
        };

        let chinese = self.inner.translate.translate(&text, "zh", "auto").await;
        let token = self.inner.token_seq.fetch_add(1, Ordering::SeqCst);
        let token_issued_at = Instant::now();

        let agent_online = {
            let entry = self.inner.states.get(cid).unwrap();
            let mut state = entry.lock().await;
            state.last_client_token = token;
            state.last_client_qa = Some(PendingQa {
                source_language_question: text.clone(),
                chinese_question: chinese.clone(),
                token,
                asked_at: token_issued_at,
            });
            state.agent_online
        };

        let _ = self.inner.knowledge.log_message(cid.as_str(), "client", "auto", &text);
        let _ = self.inner.knowledge.log_message(cid.as_str(), "client", "zh", &chinese);

        let suggestion = self
            .inner
            .knowledge
            .retrieve_best(&text, &chinese)
            .unwrap_or(None);

        let mut payload = NewMessagePayload::for_role(cid, Role::Client);
        payload.original = Some(text.clone());
        payload.client_zh = Some(chinese.clone());
        if agent_online {
            payload.suggest_zh = suggestion.as_ref().map(|s| s.chinese_answer.clone());
        }
        self.inner.sink.publish(cid, OutboundEvent::NewMessage(payload)).await;

        let kb_answer = suggestion.map(|s| s.chinese_answer);
        if !agent_online {
            self.finalize_bot_reply(cid, &text, &chinese, kb_answer).await;
        } else {
            self.schedule_pending_takeover(cid.clone(), token, token_issued_at, text, chinese, kb_answer);
        }
    }

    pub async fn on_agent_message(
        &self,
        cid: &ConversationId,
        text: Option<String>,
        image: Option<String>,
        target_lang: Option<String>,
    ) {
        self.ensure_state(cid).await;
        if let Some(entry) = self.inner.states.get(cid) {
            let mut state = entry.lock().await;
            state.last_agent_activity = Instant::now();
        }

        if let Some(image) = image {
            let _ = self.inner.knowledge.log_message(cid.as_str(), "agent", "zh", "[image]");
            let mut payload = NewMessagePayload::for_role(cid, Role::Agent);
            payload.image = Some(image);
            self.inner.sink.publish(cid, OutboundEvent::NewMessage(payload)).await;
            return;
        }

        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            return;
        };

        let target = target_lang.unwrap_or_else(|| self.inner.config.default_client_lang.clone());
        let translated = self.inner.translate.translate(&text, &target, "auto").await;

        let mut payload = NewMessagePayload::for_role(cid, Role::Agent);
        payload.original = Some(text.clone());
        payload.translated = Some(translated.clone());
        self.inner.sink.publish(cid, OutboundEvent::NewMessage(payload)).await;

        let _ = self.inner.knowledge.log_message(cid.as_str(), "agent", "zh", &text);
        let _ = self.inner.knowledge.log_message(cid.as_str(), "agent", &target, &translated);

        let pairing = {
            let entry = self.inner.states.get(cid).unwrap();
            let state = entry.lock().await;
            state.last_client_qa.clone()
        };

        if let Some(qa) = pairing {
            let age = qa.asked_at.elapsed();
            if age < Duration::from_secs(self.inner.config.learning_pairing_window_sec) {
                if let Err(e) =
                    self.inner
                        .knowledge
                        .upsert_qa(&qa.source_language_question, &qa.chinese_question, &text, "agent_auto")
                {
                    warn!(error = %e, "failed to record learning pair");
                }
            }
        }
    }

    async fn ensure_state(&self, cid: &ConversationId) {
        self.inner
            .states
            .entry(cid.clone())
            .or_insert_with(|| AsyncMutex::new(ConversationState::new()));
    }

    fn schedule_pending_takeover(
        &self,
        cid: ConversationId,
        token: u64,
        token_issued_at: Instant,
        customer_original: String,
        customer_chinese: String,
        kb_answer: Option<String>,
    ) {
        if let Some((_, old)) = self.inner.pending.remove(&cid) {
            old.abort();
        }

        let coordinator = self.clone();
        let inactivity = Duration::from_secs(self.inner.config.bot_inactivity_sec);
        let cid_for_insert = cid.clone();

        let handle = tokio::spawn(async move {
            let inner = coordinator.inner.clone();
            let cid_for_snapshot = cid.clone();
            let ready = wait_for_takeover(token, token_issued_at, inactivity, move || {
                match inner.states.get(&cid_for_snapshot) {
                    Some(entry) => match entry.try_lock() {
                        Ok(state) => (state.last_client_token, state.last_agent_activity, state.suppress_until),
                        Err(_) => (token, token_issued_at, token_issued_at),
                    },
                    None => (token, token_issued_at, token_issued_at),
                }
            })
            .await;

            if ready {
                coordinator
                    .finalize_bot_reply(&cid, &customer_original, &customer_chinese, kb_answer)
                    .await;
            }
            coordinator.inner.pending.remove(&cid);
        });

        self.inner.pending.insert(cid_for_insert, handle);
    }

    async fn finalize_bot_reply(
        &self,
        cid: &ConversationId,
        customer_original: &str,
        customer_chinese: &str,
        kb_answer: Option<String>,
    ) {
        let reply_zh = self.compose_bot_reply(customer_chinese, kb_answer).await;
        let reply_target = self
            .inner
            .translate
            .translate(&reply_zh, &self.inner.config.default_client_lang, "zh")
            .await;

        let mut payload = NewMessagePayload::for_role(cid, Role::Bot);
        payload.original = Some(customer_original.to_string());
        payload.client_zh = Some(customer_chinese.to_string());
        payload.bot_reply = Some(true);
        payload.reply_zh = Some(reply_zh.clone());
        payload.reply_fr = Some(reply_target);
        self.inner.sink.publish(cid, OutboundEvent::NewMessage(payload)).await;

        let _ = self.inner.knowledge.log_message(cid.as_str(), "bot", "zh", &reply_zh);
        info!(cid = %cid, "bot takeover delivered");
    }

    /// KnowledgeStore -> RuleResponder -> echo.
    async fn compose_bot_reply(&self, customer_chinese: &str, kb_answer: Option<String>) -> String {
        if let Some(answer) = kb_answer {
            return answer;
        }
        if let Some(answer) = self.inner.rule_responder.respond(customer_chinese).await {
            return answer;
        }
        customer_chinese.to_string()
    }
}
