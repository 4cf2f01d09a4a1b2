//! SQLite storage implementation
//!
//! Mirrors archived posts into a SQLite database so runs can be inspected
//! and summarised without re-reading the JSON files.

use crate::journal::{JournalArchive, Post, Privacy};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{PostSink, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
    run_id: Option<i64>,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn, run_id: None })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn, run_id: None })
    }

    // ===== Run Management =====

    /// Starts a new run; subsequent posts are recorded under it
    pub fn create_run(
        &mut self,
        journal: &str,
        archived_by: &str,
        config_hash: &str,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (journal, archived_by, started_at, config_hash, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                journal,
                archived_by,
                now,
                config_hash,
                RunStatus::Running.to_db_string()
            ],
        )?;

        let run_id = self.conn.last_insert_rowid();
        self.run_id = Some(run_id);
        Ok(run_id)
    }

    pub fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, journal, archived_by, started_at, finished_at, config_hash, status, failure
                 FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    pub fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, journal, archived_by, started_at, finished_at, config_hash, status, failure
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn finish_run(&mut self, status: RunStatus, failure: Option<&str>) -> StorageResult<()> {
        let run_id = self.run_id.ok_or(StorageError::NoActiveRun)?;
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, failure = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, failure, run_id],
        )?;
        Ok(())
    }

    // ===== Statistics =====

    pub fn count_posts(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn count_comments(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(comment_count), 0) FROM posts WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn count_posts_by_privacy(&self, run_id: i64) -> StorageResult<HashMap<Privacy, u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT privacy, COUNT(*) FROM posts WHERE run_id = ?1 GROUP BY privacy",
        )?;

        let rows = stmt.query_map(params![run_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = HashMap::new();
        for row in rows {
            let (privacy, count) = row?;
            if let Some(privacy) = Privacy::from_str_opt(&privacy) {
                counts.insert(privacy, count as u64);
            }
        }
        Ok(counts)
    }

    pub fn count_distinct_commenters(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT c.author) FROM commenters c
             JOIN posts p ON p.id = c.post_row
             WHERE p.run_id = ?1 AND c.author != ''",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Reads back an archived post of a run
    pub fn load_post(&self, run_id: i64, post_id: &str) -> StorageResult<Option<Post>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM posts WHERE run_id = ?1 AND post_id = ?2",
                params![run_id, post_id],
                |row| row.get(0),
            )
            .optional()?;

        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        journal: row.get(1)?,
        archived_by: row.get(2)?,
        started_at: row.get(3)?,
        finished_at: row.get(4)?,
        config_hash: row.get(5)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(6)?).unwrap_or(RunStatus::Running),
        failure: row.get(7)?,
    })
}

impl PostSink for SqliteStorage {
    fn store_post(&mut self, post: &Post) -> StorageResult<()> {
        let run_id = self.run_id.ok_or(StorageError::NoActiveRun)?;
        let body = serde_json::to_string(post)?;
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO posts (run_id, post_id, url, author, time, subject, privacy, comment_count, archived_at, body)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                run_id,
                post.id,
                post.url,
                post.author,
                post.time,
                post.subject,
                post.privacy.as_str(),
                post.comments.len() as i64,
                now,
                body
            ],
        )?;
        let post_row = tx.last_insert_rowid();

        {
            let mut stmt =
                tx.prepare("INSERT INTO commenters (post_row, author) VALUES (?1, ?2)")?;
            for comment in &post.comments {
                stmt.execute(params![post_row, comment.author])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn store_archive(&mut self, _archive: &JournalArchive) -> StorageResult<()> {
        self.finish_run(RunStatus::Completed, None)
    }

    fn record_failure(&mut self, reason: &str) -> StorageResult<()> {
        self.finish_run(RunStatus::Failed, Some(reason))
    }
}
