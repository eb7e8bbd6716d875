use rusqlite::{Connection, Result};

/// Create the message log, knowledge table and its FTS5 shadow index. Idempotent.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    create_messages_table(conn)?;
    create_knowledge_table(conn)?;
    create_fts_index(conn)?;
    Ok(())
}

fn create_messages_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS messages (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            conv_id     TEXT NOT NULL,
            role        TEXT NOT NULL,
            lang        TEXT NOT NULL,
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_messages_conv
            ON messages(conv_id, created_at);",
    )
}

fn create_knowledge_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS knowledge (
            id                      INTEGER PRIMARY KEY AUTOINCREMENT,
            source_language_question TEXT NOT NULL DEFAULT '',
            chinese_question        TEXT NOT NULL DEFAULT '',
            chinese_answer          TEXT NOT NULL DEFAULT '',
            question_fingerprint    TEXT NOT NULL UNIQUE,
            hits                    INTEGER NOT NULL DEFAULT 0,
            upvotes                 INTEGER NOT NULL DEFAULT 0,
            source                  TEXT NOT NULL DEFAULT 'agent_auto',
            created_at              TEXT NOT NULL,
            updated_at              TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_knowledge_fingerprint
            ON knowledge(question_fingerprint);",
    )
}

/// External-content FTS5 index over the knowledge table; rowids must match
/// `knowledge.id` and are synchronized manually on every write.
fn create_fts_index(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE VIRTUAL TABLE IF NOT EXISTS knowledge_fts
            USING fts5(question_all, answer_zh, content='knowledge', content_rowid='id');",
    )?;
    // First-run backfill for rows that predate the index.
    let mut stmt = conn.prepare(
        "SELECT id, source_language_question || ' ' || chinese_question, chinese_answer
         FROM knowledge",
    )?;
    let rows: Vec<(i64, String, String)> = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .filter_map(|r| r.ok())
        .collect();
    drop(stmt);
    for row in rows {
        conn.execute(
            "INSERT OR REPLACE INTO knowledge_fts(rowid, question_all, answer_zh) VALUES(?1, ?2, ?3)",
            rusqlite::params![row.0, row.1, row.2],
        )?;
    }
    Ok(())
}
