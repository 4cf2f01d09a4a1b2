//! Crawl state definitions for the post-discovery loop
//!
//! The crawl follows "next post" links one at a time. The driver only ever
//! holds one of these states; `Done` and `Failed` are terminal.

use std::fmt;

/// Stage of post processing, named in failure messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlStage {
    /// Fetching the post page
    Fetch,
    /// Extracting post fields from the page
    Extract,
    /// Paginating the flat or threaded comment feed
    CommentCollect,
    /// Joining comment content with thread structure
    Stitch,
    /// Handing the finished post to storage
    Persist,
}

impl CrawlStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Extract => "extract",
            Self::CommentCollect => "comment-collect",
            Self::Stitch => "stitch",
            Self::Persist => "persist",
        }
    }
}

impl fmt::Display for CrawlStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents where the crawl currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlState {
    /// No first post URL has been supplied yet
    AwaitingFirstPost,

    /// The given post URL is the next one to process
    FetchingPost { url: String },

    /// The last post had no "next" link
    Done,

    /// A post could not be processed; the crawl was aborted
    Failed {
        stage: CrawlStage,
        url: String,
        reason: String,
    },
}

impl CrawlState {
    /// Returns true if no further steps can be taken
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed { .. })
    }

    /// Returns true if the crawl finished by reaching the end of the chain
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// The URL about to be fetched, if any
    pub fn pending_url(&self) -> Option<&str> {
        match self {
            Self::FetchingPost { url } => Some(url),
            _ => None,
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingFirstPost => write!(f, "awaiting first post"),
            Self::FetchingPost { url } => write!(f, "fetching {}", url),
            Self::Done => write!(f, "done"),
            Self::Failed { stage, url, reason } => {
                write!(f, "failed at {} for {}: {}", stage, url, reason)
            }
        }
    }
}
