//! Seams between the crawl logic and the network
//!
//! The crawl driver and the comment collectors only talk to these traits.
//! `Session` implements both over HTTP; tests substitute in-memory fixtures.

use crate::crawler::comments::CommentPage;
use crate::url::FeedMode;
use crate::Result;
use async_trait::async_trait;

/// A fetched page together with how it was reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL the caller asked for
    pub requested_url: String,

    /// URL the body was finally served from
    pub final_url: String,

    /// Every URL that answered with a redirect, in the order they were visited
    pub history: Vec<String>,

    /// Response body
    pub body: String,
}

impl FetchedPage {
    /// A page served directly, without redirects
    pub fn direct(url: &str, body: impl Into<String>) -> Self {
        Self {
            requested_url: url.to_string(),
            final_url: url.to_string(),
            history: Vec::new(),
            body: body.into(),
        }
    }
}

/// One request against the comment feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentRequest<'a> {
    pub post_id: &'a str,
    pub mode: FeedMode,

    /// 1-based page number
    pub page: u32,

    /// Sent unchanged with every page of one post
    pub cache_buster: i64,
}

/// Source of post pages
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches a page, following redirects
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage>;
}

/// Source of comment feed pages
#[async_trait]
pub trait CommentFeed: Send + Sync {
    /// Fetches and decodes one page of the comment feed
    async fn fetch_comment_page(&self, request: CommentRequest<'_>) -> Result<CommentPage>;
}
