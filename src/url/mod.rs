//! URL handling module for the journal archiver
//!
//! This module knows the journal's URL layout: the base URL set for a
//! journal, how post ids map onto post URLs, and how the comment feed
//! endpoints are addressed.

mod feed;
mod journal;
mod post_id;

pub use feed::FeedMode;
pub use journal::JournalUrls;
pub use post_id::{canonical_post_url, post_id_from_url, POST_SUFFIX};

use url::Url;

/// Resolves a link href against the page it was found on
///
/// Returns None for empty hrefs, fragment-only links and anything that does
/// not resolve to an HTTP(S) URL.
pub fn resolve_link(href: &str, base_url: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let resolved = match Url::parse(base_url) {
        Ok(base) => base.join(href).ok()?,
        Err(_) => Url::parse(href).ok()?,
    };

    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}
