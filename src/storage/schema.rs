//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the archive database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track archive runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    journal TEXT NOT NULL,
    archived_by TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    failure TEXT
);

-- One row per archived post; posts are never merged across runs
CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    post_id TEXT NOT NULL,
    url TEXT NOT NULL,
    author TEXT NOT NULL,
    time TEXT NOT NULL,
    subject TEXT NOT NULL,
    privacy TEXT NOT NULL,
    comment_count INTEGER NOT NULL,
    archived_at TEXT NOT NULL,
    body TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_posts_run ON posts(run_id);
CREATE INDEX IF NOT EXISTS idx_posts_post_id ON posts(post_id);

-- Commenters per post, for statistics without decoding post bodies
CREATE TABLE IF NOT EXISTS commenters (
    post_row INTEGER NOT NULL REFERENCES posts(id),
    author TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_commenters_author ON commenters(author);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
