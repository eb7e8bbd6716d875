use serde::{Deserialize, Serialize};

/// A learned question/answer pair. `question_fingerprint` is the dedup key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: i64,
    pub source_language_question: String,
    pub chinese_question: String,
    pub chinese_answer: String,
    pub question_fingerprint: String,
    pub hits: i64,
    pub upvotes: i64,
    pub source: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A single logged message (client, agent, or bot), one language variant per row.
#[derive(Debug, Clone)]
pub struct LoggedMessage {
    pub cid: String,
    pub role: String,
    pub lang: String,
    pub content: String,
}

/// Best match returned by `retrieve_best`, ranked ascending (lower is better).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedAnswer {
    pub id: i64,
    pub chinese_answer: String,
    pub score: f64,
}
