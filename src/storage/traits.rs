//! Storage traits and error types
//!
//! This module defines the interface the crawl driver persists through and
//! the associated error types.

use crate::journal::{JournalArchive, Post};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("No archive run has been started")]
    NoActiveRun,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Receiver of archived posts
///
/// `store_post` is called once per post, right after the post is fully
/// assembled, so every completed post is durable even if the run later
/// fails. `store_archive` is called once at the end of a successful run.
pub trait PostSink {
    /// Persists one finished post
    fn store_post(&mut self, post: &Post) -> StorageResult<()>;

    /// Persists the complete archive
    fn store_archive(&mut self, archive: &JournalArchive) -> StorageResult<()>;

    /// Records that the run was aborted
    fn record_failure(&mut self, _reason: &str) -> StorageResult<()> {
        Ok(())
    }
}
