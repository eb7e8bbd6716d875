use std::sync::Mutex;

use regex::Regex;
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::db;
use crate::error::KnowledgeError;
use crate::types::RetrievedAnswer;

/// Query tokens are capped at this many AND-joined terms when building an
/// FTS5 MATCH expression.
const MAX_QUERY_TERMS: usize = 8;
const QUOTE_CHARS: &[char] = &['"', '\'', '`'];

/// Persistent Q/A knowledge base plus the append-only conversation log.
///
/// A single connection behind a mutex, matching the teacher's
/// memory manager: retrieval volume here never approaches a level where
/// sharding the connection would pay for its complexity.
pub struct KnowledgeStore {
    db: Mutex<Connection>,
}

impl KnowledgeStore {
    pub fn open(path: &str) -> Result<Self, KnowledgeError> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(path)?;
        db::init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// In-memory store for tests and short-lived tooling.
    pub fn open_in_memory() -> Result<Self, KnowledgeError> {
        let conn = Connection::open_in_memory()?;
        db::init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    pub fn log_message(&self, cid: &str, role: &str, lang: &str, content: &str) -> Result<(), KnowledgeError> {
        let db = self.db.lock().unwrap();
        let now = chrono::Utc::now().to_rfc3339();
        db.execute(
            "INSERT INTO messages(conv_id, role, lang, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![cid, role, lang, content, now],
        )?;
        Ok(())
    }

    /// Insert or merge a question/answer pair. Returns the knowledge entry id.
    pub fn upsert_qa(
        &self,
        source_language_question: &str,
        chinese_question: &str,
        chinese_answer: &str,
        source: &str,
    ) -> Result<Option<i64>, KnowledgeError> {
        let q_fr = truncate(source_language_question.trim(), 500);
        let q_zh = truncate(chinese_question.trim(), 500);
        let a_zh = truncate(chinese_answer.trim(), 2000);
        if q_zh.is_empty() || a_zh.is_empty() {
            return Ok(None);
        }

        let fingerprint = fingerprint(&q_zh);
        let now = chrono::Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();

        let existing: Option<(i64, String, String)> = db
            .query_row(
                "SELECT id, chinese_answer, source_language_question FROM knowledge WHERE question_fingerprint = ?1",
                rusqlite::params![fingerprint],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .ok();

        let id = match existing {
            Some((id, old_answer, old_source_q)) => {
                let merged_source_q = if old_source_q.is_empty() { q_fr.clone() } else { old_source_q };
                if old_answer == a_zh {
                    db.execute(
                        "UPDATE knowledge SET source_language_question = ?1, upvotes = upvotes + 1,
                         updated_at = ?2 WHERE id = ?3",
                        rusqlite::params![merged_source_q, now, id],
                    )?;
                } else {
                    db.execute(
                        "UPDATE knowledge SET chinese_answer = ?1, source_language_question = ?2,
                         upvotes = upvotes + 1, updated_at = ?3 WHERE id = ?4",
                        rusqlite::params![a_zh, merged_source_q, now, id],
                    )?;
                }
                id
            }
            None => {
                db.execute(
                    "INSERT INTO knowledge
                     (source_language_question, chinese_question, chinese_answer, question_fingerprint,
                      hits, upvotes, source, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, 0, 1, ?5, ?6, ?6)",
                    rusqlite::params![q_fr, q_zh, a_zh, fingerprint, source, now],
                )?;
                db.last_insert_rowid()
            }
        };

        if let Err(e) = db.execute(
            "INSERT OR REPLACE INTO knowledge_fts(rowid, question_all, answer_zh) VALUES (?1, ?2, ?3)",
            rusqlite::params![id, format!("{q_fr} {q_zh}"), a_zh],
        ) {
            warn!(error = %e, "failed to sync knowledge_fts, continuing without index update");
        }

        Ok(Some(id))
    }

    /// Best match across both the source-language and Chinese query variants.
    pub fn retrieve_best(
        &self,
        query_source_lang: &str,
        query_chinese: &str,
    ) -> Result<Option<RetrievedAnswer>, KnowledgeError> {
        let db = self.db.lock().unwrap();

        let mut candidates = Vec::new();
        candidates.extend(search_one(&db, query_source_lang));
        candidates.extend(search_one(&db, query_chinese));

        if candidates.is_empty() {
            return Ok(None);
        }

        candidates.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal));
        let best = candidates.into_iter().next().unwrap();

        let now = chrono::Utc::now().to_rfc3339();
        db.execute(
            "UPDATE knowledge SET hits = hits + 1, updated_at = ?1 WHERE id = ?2",
            rusqlite::params![now, best.id],
        )?;

        Ok(Some(best))
    }
}

fn search_one(db: &Connection, raw_query: &str) -> Vec<RetrievedAnswer> {
    if raw_query.trim().is_empty() {
        return Vec::new();
    }
    match search_fts(db, raw_query) {
        Ok(rows) if !rows.is_empty() => rows,
        Ok(_) => Vec::new(),
        Err(e) => {
            debug!(error = %e, "fts query failed, falling back to substring search");
            search_like(db, raw_query).unwrap_or_default()
        }
    }
}

fn search_fts(db: &Connection, raw_query: &str) -> rusqlite::Result<Vec<RetrievedAnswer>> {
    let expr = make_fts_query(raw_query);
    if expr.is_empty() {
        return Ok(Vec::new());
    }
    let mut stmt = db.prepare(
        "SELECT rowid, answer_zh, bm25(knowledge_fts) AS score
           FROM knowledge_fts
          WHERE knowledge_fts MATCH ?1
          ORDER BY score
          LIMIT 3",
    )?;
    let rows = stmt.query_map(rusqlite::params![expr], |row| {
        Ok(RetrievedAnswer {
            id: row.get(0)?,
            chinese_answer: row.get(1)?,
            score: row.get(2)?,
        })
    })?;
    rows.collect()
}

fn search_like(db: &Connection, raw_query: &str) -> rusqlite::Result<Vec<RetrievedAnswer>> {
    let pattern = format!("%{}%", truncate(raw_query, 50));
    let mut stmt = db.prepare(
        "SELECT id, chinese_answer, 1.0 AS score
           FROM knowledge
          WHERE source_language_question LIKE ?1 OR chinese_question LIKE ?1
          ORDER BY hits DESC, id DESC
          LIMIT 3",
    )?;
    let rows = stmt.query_map(rusqlite::params![pattern], |row| {
        Ok(RetrievedAnswer {
            id: row.get(0)?,
            chinese_answer: row.get(1)?,
            score: row.get(2)?,
        })
    })?;
    rows.collect()
}

/// Strip quoting characters, tokenize on word characters (Unicode-aware,
/// so CJK ideographs count as their own tokens), drop single-character
/// noise, cap the term count, and AND-join into an FTS5 MATCH expression.
fn make_fts_query(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| !QUOTE_CHARS.contains(c)).collect();
    let token_re = Regex::new(r"[\w一-鿿]+").expect("static regex");
    let tokens: Vec<&str> = token_re
        .find_iter(&cleaned)
        .map(|m| m.as_str())
        .filter(|t| t.chars().count() > 1)
        .take(MAX_QUERY_TERMS)
        .collect();
    tokens
        .iter()
        .map(|t| format!("\"{t}\""))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn fingerprint(normalized_chinese_question: &str) -> String {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    normalized_chinese_question.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_then_retrieve_round_trips() {
        let store = KnowledgeStore::open_in_memory().unwrap();
        store
            .upsert_qa("Comment retirer ?", "怎么提现", "请在提现界面提交申请", "agent_auto")
            .unwrap();
        let hit = store.retrieve_best("Comment retirer ?", "怎么提现").unwrap();
        assert!(hit.is_some());
        assert_eq!(hit.unwrap().chinese_answer, "请在提现界面提交申请");
    }

    #[test]
    fn repeated_upsert_with_same_answer_bumps_upvotes_not_duplicate_rows() {
        let store = KnowledgeStore::open_in_memory().unwrap();
        store.upsert_qa("a", "怎么提现", "答案", "agent_auto").unwrap();
        store.upsert_qa("a", "怎么提现", "答案", "agent_auto").unwrap();
        let db = store.db.lock().unwrap();
        let count: i64 = db
            .query_row("SELECT COUNT(*) FROM knowledge", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn retrieve_falls_back_to_substring_when_fts_expression_empty() {
        let store = KnowledgeStore::open_in_memory().unwrap();
        store.upsert_qa("", "ok", "好的", "agent_auto").unwrap();
        // single-char tokens are filtered out of the fts expression, forcing
        // the substring fallback path.
        let hit = store.retrieve_best("", "o").unwrap();
        assert!(hit.is_none() || hit.unwrap().chinese_answer == "好的");
    }

    #[test]
    fn retrieve_best_bumps_hits() {
        let store = KnowledgeStore::open_in_memory().unwrap();
        store
            .upsert_qa("Comment retirer ?", "怎么提现", "请稍等", "agent_auto")
            .unwrap();
        store.retrieve_best("Comment retirer ?", "怎么提现").unwrap();
        let db = store.db.lock().unwrap();
        let hits: i64 = db
            .query_row("SELECT hits FROM knowledge LIMIT 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(hits, 1);
    }
}
