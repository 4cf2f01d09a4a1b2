//! Statistics about an archive
//!
//! Statistics are computed either from an in-memory archive at the end of a
//! run or from the SQLite mirror of an earlier run.

use crate::journal::{JournalArchive, Privacy};
use crate::storage::{RunStatus, SqliteStorage, StorageError, StorageResult};
use std::collections::{HashMap, HashSet};

/// Archive statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveStatistics {
    /// Journal the archive belongs to
    pub journal: String,

    /// Identity the archive was made under
    pub archived_by: String,

    /// Run status, when loaded from the database
    pub status: Option<RunStatus>,

    /// Total number of archived posts
    pub total_posts: u64,

    /// Total number of comments across all posts
    pub total_comments: u64,

    /// Count of posts by privacy level
    pub posts_by_privacy: HashMap<Privacy, u64>,

    /// Number of distinct named commenters
    pub distinct_commenters: u64,
}

impl ArchiveStatistics {
    /// Computes statistics from a finished archive
    pub fn from_archive(archive: &JournalArchive) -> Self {
        let mut posts_by_privacy = HashMap::new();
        let mut commenters = HashSet::new();

        for post in &archive.posts {
            *posts_by_privacy.entry(post.privacy).or_insert(0) += 1;
            commenters.extend(
                post.comments
                    .iter()
                    .map(|c| c.author.as_str())
                    .filter(|author| !author.is_empty()),
            );
        }

        Self {
            journal: archive.meta.journal.clone(),
            archived_by: archive.meta.archived_by.clone(),
            status: None,
            total_posts: archive.posts.len() as u64,
            total_comments: archive.comment_count() as u64,
            posts_by_privacy,
            distinct_commenters: commenters.len() as u64,
        }
    }
}

/// Loads statistics of the most recent run from the database
pub fn load_statistics(storage: &SqliteStorage) -> StorageResult<ArchiveStatistics> {
    let run = storage.get_latest_run()?.ok_or(StorageError::NoActiveRun)?;

    Ok(ArchiveStatistics {
        total_posts: storage.count_posts(run.id)?,
        total_comments: storage.count_comments(run.id)?,
        posts_by_privacy: storage.count_posts_by_privacy(run.id)?,
        distinct_commenters: storage.count_distinct_commenters(run.id)?,
        journal: run.journal,
        archived_by: run.archived_by,
        status: Some(run.status),
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ArchiveStatistics) {
    println!("=== Archive Statistics ===\n");

    println!("Overview:");
    println!("  Journal: {}", stats.journal);
    println!("  Archived by: {}", stats.archived_by);
    if let Some(status) = stats.status {
        println!("  Run status: {}", status.to_db_string());
    }
    println!("  Posts: {}", stats.total_posts);
    println!("  Comments: {}", stats.total_comments);
    println!("  Distinct commenters: {}", stats.distinct_commenters);
    println!();

    println!("Posts by Privacy:");
    for privacy in [Privacy::Public, Privacy::FriendsOnly, Privacy::Private] {
        let count = stats.posts_by_privacy.get(&privacy).copied().unwrap_or(0);
        let percentage = if stats.total_posts > 0 {
            (count as f64 / stats.total_posts as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", privacy, count, percentage);
    }

    let average = if stats.total_posts > 0 {
        stats.total_comments as f64 / stats.total_posts as f64
    } else {
        0.0
    };
    println!();
    println!("Average comments per post: {:.1}", average);
}
