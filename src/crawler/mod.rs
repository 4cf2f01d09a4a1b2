//! Crawler module for post fetching and processing
//!
//! This module contains the core archiving logic, including:
//! - HTTP fetching with manual redirect tracking
//! - Post extraction from page markup
//! - Comment feed pagination and thread stitching
//! - First post discovery through the calendar
//! - The sequential crawl driver

mod comments;
mod coordinator;
mod discovery;
mod fetcher;
mod parser;
mod source;

pub use comments::{
    collect_comments, collect_threading, normalize_comment_time, stitch, CollectedComments,
    CommentPage, RawComment,
};
pub use coordinator::{CrawlDriver, CrawlOptions};
pub use discovery::{
    detect_journal_type, discover_first_post, extract_profile, fetch_profile, first_post_link,
    oldest_month_link, ProfileInfo,
};
pub use fetcher::{build_http_client, fetch_comment_page, fetch_url};
pub use parser::{parse_post, ParsedPost};
pub use source::{CommentFeed, CommentRequest, FetchedPage, PageSource};
