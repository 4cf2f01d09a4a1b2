//! Storage module for persisting archived posts
//!
//! This module handles everything written to disk:
//! - One pretty-printed JSON file per post, plus the complete archive
//! - An optional SQLite mirror with run tracking for statistics
//!
//! Both implement `PostSink`; `ArchiveStorage` fans each post out to all
//! configured sinks.

mod json;
mod schema;
mod sqlite;
mod traits;

pub use json::{JsonDirectoryStorage, ARCHIVE_FILE_NAME};
pub use sqlite::SqliteStorage;
pub use traits::{PostSink, StorageError, StorageResult};

use crate::journal::{JournalArchive, Post};

/// Represents an archive run in the database
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub journal: String,
    pub archived_by: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub failure: Option<String>,
}

/// Status of an archive run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// All configured sinks for one run
pub struct ArchiveStorage {
    json: JsonDirectoryStorage,
    sqlite: Option<SqliteStorage>,
}

impl ArchiveStorage {
    pub fn new(json: JsonDirectoryStorage, sqlite: Option<SqliteStorage>) -> Self {
        Self { json, sqlite }
    }

    pub fn json(&self) -> &JsonDirectoryStorage {
        &self.json
    }

    pub fn sqlite(&self) -> Option<&SqliteStorage> {
        self.sqlite.as_ref()
    }
}

impl PostSink for ArchiveStorage {
    fn store_post(&mut self, post: &Post) -> StorageResult<()> {
        self.json.store_post(post)?;
        if let Some(sqlite) = self.sqlite.as_mut() {
            sqlite.store_post(post)?;
        }
        Ok(())
    }

    fn store_archive(&mut self, archive: &JournalArchive) -> StorageResult<()> {
        self.json.store_archive(archive)?;
        if let Some(sqlite) = self.sqlite.as_mut() {
            sqlite.store_archive(archive)?;
        }
        Ok(())
    }

    fn record_failure(&mut self, reason: &str) -> StorageResult<()> {
        self.json.record_failure(reason)?;
        if let Some(sqlite) = self.sqlite.as_mut() {
            sqlite.record_failure(reason)?;
        }
        Ok(())
    }
}
