//! Crawl driver - the post-discovery state machine
//!
//! The driver walks the journal one post at a time:
//!
//! ```text
//! AwaitingFirstPost --start(url)--> FetchingPost(url)
//! FetchingPost(url) --step--> FetchingPost(next) | Done | Failed
//! ```
//!
//! One step fetches the page, extracts the post, collects both comment
//! feeds, stitches them and hands the finished post to storage. Any error
//! moves the driver to `Failed` and aborts the crawl. `step` never sleeps;
//! `run` adds the fixed delay between posts and checks for cancellation.

use crate::config::CrawlerConfig;
use crate::crawler::comments::{collect_comments, collect_threading, stitch};
use crate::crawler::parser::{parse_post, ParsedPost};
use crate::crawler::source::{CommentFeed, PageSource};
use crate::journal::JournalArchive;
use crate::state::{CrawlStage, CrawlState};
use crate::storage::PostSink;
use crate::url::JournalUrls;
use crate::{ArchiveError, Result};
use chrono::Utc;
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Tunables of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Pause between consecutive post fetches
    pub post_delay: Duration,

    /// Keep the raw page HTML on each post
    pub capture_source: bool,
}

impl CrawlOptions {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            post_delay: Duration::from_millis(config.post_delay),
            capture_source: config.capture_source,
        }
    }
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

/// Drives the crawl along the "next post" chain
pub struct CrawlDriver<'a, S: ?Sized, K: ?Sized> {
    source: &'a S,
    sink: &'a mut K,
    urls: JournalUrls,
    options: CrawlOptions,
    archive: JournalArchive,
    state: CrawlState,
    failure: Option<ArchiveError>,
    visited: Vec<String>,
    seen: HashSet<String>,
}

impl<'a, S, K> CrawlDriver<'a, S, K>
where
    S: PageSource + CommentFeed + ?Sized,
    K: PostSink + ?Sized,
{
    /// Creates a driver waiting for its first post
    pub fn new(
        source: &'a S,
        sink: &'a mut K,
        urls: JournalUrls,
        archive: JournalArchive,
        options: CrawlOptions,
    ) -> Self {
        Self {
            source,
            sink,
            urls,
            options,
            archive,
            state: CrawlState::AwaitingFirstPost,
            failure: None,
            visited: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    pub fn archive(&self) -> &JournalArchive {
        &self.archive
    }

    /// Post URLs processed so far, in order
    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    /// Supplies the first post and moves to `FetchingPost`
    pub fn start(&mut self, first_post: impl Into<String>) -> Result<()> {
        if self.state != CrawlState::AwaitingFirstPost {
            return Err(ArchiveError::InvalidTransition {
                state: self.state.to_string(),
                action: "start",
            });
        }

        self.state = CrawlState::FetchingPost {
            url: first_post.into(),
        };
        Ok(())
    }

    /// Processes the pending post and transitions to the next state
    ///
    /// Terminal states are left unchanged.
    pub async fn step(&mut self) -> Result<&CrawlState> {
        let url = match &self.state {
            CrawlState::FetchingPost { url } => url.clone(),
            CrawlState::AwaitingFirstPost => {
                return Err(ArchiveError::InvalidTransition {
                    state: self.state.to_string(),
                    action: "step",
                })
            }
            CrawlState::Done | CrawlState::Failed { .. } => return Ok(&self.state),
        };

        self.visited.push(url.clone());
        self.seen.insert(url.clone());

        match self.process_post(&url).await {
            Ok(parsed) => self.complete_post(&url, parsed),
            Err(error) => self.fail(error),
        }

        Ok(&self.state)
    }

    /// Steps until the chain ends, a post fails or `cancel` fires
    ///
    /// Cancellation is honoured while a post is in flight too: the partly
    /// processed post is dropped before it reaches storage.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<()> {
        if self.state.is_terminal() {
            return match self.state {
                CrawlState::Done => Ok(()),
                _ => Err(ArchiveError::InvalidTransition {
                    state: self.state.to_string(),
                    action: "run",
                }),
            };
        }

        loop {
            if cancel.is_cancelled() {
                return Err(ArchiveError::Cancelled);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ArchiveError::Cancelled),
                result = self.step() => { result?; }
            }

            if let Some(error) = self.failure.take() {
                return Err(error);
            }
            if self.state.is_done() {
                tracing::info!("All {} posts archived", self.archive.posts.len());
                return Ok(());
            }

            if !self.options.post_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(ArchiveError::Cancelled),
                    _ = tokio::time::sleep(self.options.post_delay) => {}
                }
            }
        }
    }

    /// Hands the complete archive to storage and returns it
    pub fn finish(self) -> Result<JournalArchive> {
        if !self.state.is_done() {
            return Err(ArchiveError::InvalidTransition {
                state: self.state.to_string(),
                action: "finish",
            });
        }

        self.sink.store_archive(&self.archive)?;
        Ok(self.archive)
    }

    async fn process_post(&self, url: &str) -> Result<ParsedPost> {
        let page = self
            .source
            .fetch_page(url)
            .await
            .map_err(|e| e.at_stage(CrawlStage::Fetch, url))?;

        let ParsedPost { mut post, next_url } =
            parse_post(&page, &self.urls).map_err(|e| e.at_stage(CrawlStage::Extract, url))?;

        if self.options.capture_source {
            post.html = Some(page.body);
        }

        tracing::debug!("Downloading comments for post {}", post.id);
        let cache_buster = Utc::now().timestamp_millis();

        let collected = collect_comments(self.source, &post.id, None, cache_buster)
            .await
            .map_err(|e| e.at_stage(CrawlStage::CommentCollect, url))?;

        let threads = collect_threading(
            self.source,
            &post.id,
            collected.thread_total(),
            cache_buster,
        )
        .await
        .map_err(|e| e.at_stage(CrawlStage::CommentCollect, url))?;

        post.comments = stitch(&post.id, collected.comments, &threads)
            .map_err(|e| e.at_stage(CrawlStage::Stitch, url))?;

        Ok(ParsedPost { post, next_url })
    }

    fn complete_post(&mut self, url: &str, parsed: ParsedPost) {
        let ParsedPost { post, next_url } = parsed;

        if let Err(e) = self.sink.store_post(&post) {
            self.fail(ArchiveError::from(e).at_stage(CrawlStage::Persist, url));
            return;
        }

        tracing::info!(
            "{} {} ({} comments)",
            post.time,
            post.subject,
            post.comments.len()
        );
        self.archive.push(post);

        self.state = match next_url {
            Some(next) if self.seen.contains(&next) => {
                tracing::warn!("Next link of {} points back to {}, stopping", url, next);
                CrawlState::Done
            }
            Some(next) => CrawlState::FetchingPost { url: next },
            None => CrawlState::Done,
        };
    }

    fn fail(&mut self, error: ArchiveError) {
        let pending = self.state.pending_url().unwrap_or_default().to_string();
        let (stage, url, reason) = match &error {
            ArchiveError::Stage { stage, url, source } => (*stage, url.clone(), source.to_string()),
            other => (CrawlStage::Fetch, pending, other.to_string()),
        };

        tracing::error!("{}", error);
        if let Err(e) = self.sink.record_failure(&error.to_string()) {
            tracing::warn!("Failed to record crawl failure: {}", e);
        }

        self.state = CrawlState::Failed { stage, url, reason };
        self.failure = Some(error);
    }
}
