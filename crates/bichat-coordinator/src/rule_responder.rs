use async_trait::async_trait;

/// External collaborator: maps a Chinese question to a canned Chinese
/// answer, or nothing. The exact ruleset is out of scope; this trait is
/// the seam the coordinator calls through, with a minimal keyword-matching
/// implementation provided so the crate is runnable standalone.
#[async_trait]
pub trait RuleResponder: Send + Sync {
    async fn respond(&self, chinese_question: &str) -> Option<String>;
}

const WITHDRAWAL_KEYWORDS: &[&str] = &[
    "提现", "支付", "钱", "账户", "转账", "retrait", "retraits", "retirer", "paiement", "argent", "compte", "transfert",
];
const GREETING_KEYWORDS: &[&str] = &["你好", "bonjour"];

/// Minimal keyword-matching default, mirroring the shape of the reference
/// rule set without reproducing its exact wording.
pub struct KeywordRuleResponder;

#[async_trait]
impl RuleResponder for KeywordRuleResponder {
    async fn respond(&self, chinese_question: &str) -> Option<String> {
        let q = chinese_question.to_lowercase();
        if WITHDRAWAL_KEYWORDS.iter().any(|k| q.contains(k)) {
            return Some("由于支付渠道波动，请您耐心等待，我们会尽快处理。".to_string());
        }
        if GREETING_KEYWORDS.iter().any(|k| q.contains(k)) {
            return Some("您好，欢迎咨询，请问有什么可以帮您？".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn matches_withdrawal_keyword() {
        let responder = KeywordRuleResponder;
        let reply = responder.respond("怎么提现").await;
        assert!(reply.is_some());
    }

    #[tokio::test]
    async fn matches_greeting() {
        let responder = KeywordRuleResponder;
        let reply = responder.respond("你好").await;
        assert!(reply.is_some());
    }

    #[tokio::test]
    async fn returns_none_for_unmatched_question() {
        let responder = KeywordRuleResponder;
        let reply = responder.respond("今天天气怎么样").await;
        assert!(reply.is_none());
    }
}
