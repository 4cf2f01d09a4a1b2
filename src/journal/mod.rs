//! Archive data model
//!
//! - `Post`: one journal entry, built from a single fetched page
//! - `Comment`: one comment with its content and thread position
//! - `JournalArchive`: run metadata plus every post collected by the crawl

mod comment;
mod post;

pub use comment::{Comment, FlatComment, ThreadLinks};
pub use post::{Post, Privacy};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Whether the archived account is a personal journal or a community
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JournalType {
    Journal,
    Community,
    #[default]
    Unknown,
}

impl fmt::Display for JournalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Journal => "journal",
            Self::Community => "community",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Who archived what, and when
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveMeta {
    /// Operator identity (the logged-in user, or "anonymous")
    pub archived_by: String,

    /// UTC timestamp of the start of the run
    pub archived_on: String,

    /// Name of the archived journal
    pub journal: String,

    #[serde(rename = "type")]
    pub journal_type: JournalType,
}

/// Top-level aggregate for one archive run
///
/// Posts are appended in crawl order and never revisited. On disk the
/// archive is `{meta, journal: {profile, friends, posts}}`; the friends
/// list is always written empty.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalArchive {
    pub meta: ArchiveMeta,

    /// Free-text profile of the journal, when the profile page exposes one
    pub profile: Option<String>,

    pub posts: Vec<Post>,
}

#[derive(Serialize)]
struct ArchiveRef<'a> {
    meta: &'a ArchiveMeta,
    journal: JournalRef<'a>,
}

#[derive(Serialize)]
struct JournalRef<'a> {
    profile: &'a Option<String>,
    friends: &'a [String],
    posts: &'a [Post],
}

#[derive(Deserialize)]
struct ArchiveOwned {
    meta: ArchiveMeta,
    #[serde(default)]
    journal: JournalOwned,
}

#[derive(Deserialize, Default)]
struct JournalOwned {
    #[serde(default)]
    profile: Option<String>,
    #[serde(default)]
    posts: Vec<Post>,
}

impl Serialize for JournalArchive {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ArchiveRef {
            meta: &self.meta,
            journal: JournalRef {
                profile: &self.profile,
                friends: &[],
                posts: &self.posts,
            },
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for JournalArchive {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ArchiveOwned { meta, journal } = ArchiveOwned::deserialize(deserializer)?;
        Ok(Self {
            meta,
            profile: journal.profile,
            posts: journal.posts,
        })
    }
}

impl JournalArchive {
    /// Creates an empty archive stamped with the current time
    pub fn new(archived_by: &str, journal: &str, journal_type: JournalType) -> Self {
        Self {
            meta: ArchiveMeta {
                archived_by: archived_by.to_string(),
                archived_on: chrono::Utc::now().to_string(),
                journal: journal.to_string(),
                journal_type,
            },
            profile: None,
            posts: Vec::new(),
        }
    }

    /// Appends a fully assembled post
    pub fn push(&mut self, post: Post) {
        self.posts.push(post);
    }

    /// Total number of comments across all posts
    pub fn comment_count(&self) -> usize {
        self.posts.iter().map(|p| p.comments.len()).sum()
    }
}
