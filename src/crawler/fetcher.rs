//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the archiver, including:
//! - Building the HTTP client with the configured user agent and timeout
//! - GET requests with manual redirect handling, so the redirect history
//!   is available to the post parser
//! - Decoding comment feed pages
//! - Error classification
//!
//! Nothing here retries: every failure is returned to the caller.

use crate::config::Config;
use crate::crawler::comments::CommentPage;
use crate::crawler::source::{CommentFeed, CommentRequest, FetchedPage, PageSource};
use crate::session::Session;
use crate::{ArchiveError, Result};
use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::{redirect::Policy, Client};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// The client keeps cookies between requests, never follows redirects on its
/// own and gives up on any request after the configured timeout.
pub fn build_http_client(config: &Config) -> std::result::Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.crawler.request_timeout);

    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::none()) // Handle redirects manually
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL under the given session
///
/// # Request Flow
///
/// 1. Send GET request with the session's cookies
/// 2. On a 3xx answer, record the URL in the history and follow `Location`
///    - more than `max-redirects` hops → `RedirectLimit`
///    - a URL seen twice → `RedirectLoop`
/// 3. Any other non-2xx status → `HttpStatus`
/// 4. Timeouts → `Timeout`, other transport failures → `Http`
pub async fn fetch_url(session: &Session, url: &str) -> Result<FetchedPage> {
    let mut current = Url::parse(url)?;
    let mut history = Vec::new();
    let mut visited = HashSet::new();
    visited.insert(current.to_string());

    loop {
        tracing::debug!("GET {}", current);
        let response = session
            .client()
            .get(current.as_str())
            .send()
            .await
            .map_err(|e| transport_error(current.as_str(), e))?;

        let status = response.status();

        if status.is_redirection() {
            if history.len() >= session.max_redirects() {
                return Err(ArchiveError::RedirectLimit {
                    url: url.to_string(),
                });
            }

            let next = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|location| current.join(location).ok())
                .ok_or_else(|| ArchiveError::BadRedirect {
                    url: current.to_string(),
                })?;

            if !visited.insert(next.to_string()) {
                return Err(ArchiveError::RedirectLoop {
                    url: next.to_string(),
                });
            }

            tracing::debug!("Redirect {} -> {}", current, next);
            history.push(current.to_string());
            current = next;
            continue;
        }

        if !status.is_success() {
            return Err(ArchiveError::HttpStatus {
                url: current.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(current.as_str(), e))?;

        return Ok(FetchedPage {
            requested_url: url.to_string(),
            final_url: current.to_string(),
            history,
            body,
        });
    }
}

/// Fetches and decodes one comment feed page
pub async fn fetch_comment_page(session: &Session, request: CommentRequest<'_>) -> Result<CommentPage> {
    let url = session.urls().comment_feed(
        request.post_id,
        request.mode,
        request.page,
        request.cache_buster,
    );

    let page = fetch_url(session, &url).await?;
    serde_json::from_str(&page.body).map_err(|source| ArchiveError::FeedDecode { url, source })
}

/// Classifies a reqwest failure
fn transport_error(url: &str, error: reqwest::Error) -> ArchiveError {
    if error.is_timeout() {
        ArchiveError::Timeout {
            url: url.to_string(),
        }
    } else {
        ArchiveError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

#[async_trait]
impl PageSource for Session {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage> {
        fetch_url(self, url).await
    }
}

#[async_trait]
impl CommentFeed for Session {
    async fn fetch_comment_page(&self, request: CommentRequest<'_>) -> Result<CommentPage> {
        fetch_comment_page(self, request).await
    }
}
