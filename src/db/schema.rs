//! SQL DDL for the metamem tables.
//!
//! Defines the `memories` table (one row per stored utterance, embedding as
//! a packed `f32` blob) and `schema_meta`. All DDL uses `IF NOT EXISTS` for
//! idempotent initialization.

use rusqlite::Connection;

/// Schema version written on first initialization.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = r#"
-- One row per remembered utterance
CREATE TABLE IF NOT EXISTS memories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL CHECK(session_id <> ''),
    role TEXT NOT NULL,
    text TEXT NOT NULL CHECK(text <> ''),
    embedding BLOB NOT NULL,
    created_at TEXT NOT NULL
);

-- Recall scans one session at a time, in insertion order for tie-breaks
CREATE INDEX IF NOT EXISTS idx_memories_session ON memories(session_id, id);

-- Schema metadata (schema_version, embedding_dim, embedding_model)
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}
