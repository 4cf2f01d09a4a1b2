//! Journal Archiver: a sequential archiver for hosted blogging journals
//!
//! This crate walks a journal's chronological post chain from the oldest
//! entry forward and, for every post, rebuilds the full comment thread from
//! the flat and threaded comment feeds.

pub mod config;
pub mod crawler;
pub mod journal;
pub mod output;
pub mod session;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for archiver operations
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} returned by {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Too many redirects from {url}")]
    RedirectLimit { url: String },

    #[error("Redirect loop detected at {url}")]
    RedirectLoop { url: String },

    #[error("Redirect from {url} has no usable Location header")]
    BadRedirect { url: String },

    #[error("Required field '{field}' missing on {url}")]
    MissingField { url: String, field: &'static str },

    #[error("Malformed comment feed at {url}: {source}")]
    FeedDecode {
        url: String,
        source: serde_json::Error,
    },

    #[error("Comment {comment_id} of post {post_id} has no threading entry")]
    ThreadMismatch { post_id: String, comment_id: i64 },

    #[error("Login failed for {user}: HTTP {status}")]
    Login { user: String, status: u16 },

    #[error("First post discovery failed: {0}")]
    Discovery(String),

    #[error("{stage} failed for {url}: {source}")]
    Stage {
        stage: state::CrawlStage,
        url: String,
        #[source]
        source: Box<ArchiveError>,
    },

    #[error("Crawl cancelled")]
    Cancelled,

    #[error("Cannot {action} while {state}")]
    InvalidTransition { state: String, action: &'static str },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    /// Wraps an error with the crawl stage and URL it occurred at
    pub fn at_stage(self, stage: state::CrawlStage, url: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            url: url.into(),
            source: Box::new(self),
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for archiver operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use journal::{ArchiveMeta, Comment, JournalArchive, JournalType, Post, Privacy};
pub use session::{Credentials, Session};
pub use state::{CrawlStage, CrawlState};
pub use crate::url::JournalUrls;
