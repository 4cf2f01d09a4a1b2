//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: where the post-discovery loop currently is
//! - `CrawlStage`: which processing stage of a post failed

mod crawl_state;

pub use crawl_state::{CrawlStage, CrawlState};
