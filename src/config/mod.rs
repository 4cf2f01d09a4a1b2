//! Configuration module for the journal archiver
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use journal_archiver::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("archiver.toml")).unwrap();
//! println!("Archiving journal: {}", config.journal.name);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, JournalConfig, OutputConfig, SiteConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
