//! Journal discovery
//!
//! Before the crawl can start it needs the oldest post, found by walking the
//! journal calendar: the calendar page's second-to-last link points at the
//! oldest month, and that month's first post link is the first post.
//! The profile page tells whether the account is a journal or a community.

use crate::crawler::source::PageSource;
use crate::journal::JournalType;
use crate::url::{resolve_link, JournalUrls, POST_SUFFIX};
use crate::{ArchiveError, Result};
use scraper::{Html, Selector};

/// What the profile page reveals about the archived account
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileInfo {
    pub journal_type: JournalType,
    pub profile: Option<String>,
}

/// Classifies the account from the user-head icon on its profile page
pub fn detect_journal_type(html: &str) -> JournalType {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("img.i-ljuser-userhead") else {
        return JournalType::Unknown;
    };

    let src = document
        .select(&selector)
        .next()
        .and_then(|image| image.value().attr("src"))
        .unwrap_or("");

    if src.contains("userinfo") {
        JournalType::Journal
    } else if src.contains("community") {
        JournalType::Community
    } else {
        JournalType::Unknown
    }
}

/// Text of the profile block, if the page has one
pub fn extract_profile(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("div.l-profile").ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
}

/// Link to the oldest month on the calendar page
///
/// The calendar lists months newest first and ends with one navigation
/// link, so the oldest month is the second-to-last link.
pub fn oldest_month_link(html: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").ok()?;
    let links: Vec<&str> = document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .collect();

    let href = links.len().checked_sub(2).map(|i| links[i])?;
    resolve_link(href, page_url)
}

/// First post link on a month page
pub fn first_post_link(html: &str, page_url: &str, urls: &JournalUrls) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").ok()?;
    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_link(href, page_url))
        .find(|href| href.starts_with(&urls.journal) && href.ends_with(POST_SUFFIX))
}

/// Fetches the profile page and reads the account type and profile text
pub async fn fetch_profile<S>(source: &S, urls: &JournalUrls) -> Result<ProfileInfo>
where
    S: PageSource + ?Sized,
{
    tracing::info!("Acquiring profile info...");
    let page = source.fetch_page(&urls.profile).await?;

    Ok(ProfileInfo {
        journal_type: detect_journal_type(&page.body),
        profile: extract_profile(&page.body),
    })
}

/// Walks the calendar to the journal's oldest post
pub async fn discover_first_post<S>(source: &S, urls: &JournalUrls) -> Result<String>
where
    S: PageSource + ?Sized,
{
    tracing::info!("Discovering first post...");
    let calendar = source.fetch_page(&urls.calendar).await?;

    let month_url = oldest_month_link(&calendar.body, &calendar.final_url).ok_or_else(|| {
        ArchiveError::Discovery(format!("no month links on {}", urls.calendar))
    })?;
    tracing::debug!("Oldest month: {}", month_url);

    let month = source.fetch_page(&month_url).await?;
    let first_post = first_post_link(&month.body, &month.final_url, urls).ok_or_else(|| {
        ArchiveError::Discovery(format!("no post links on {}", month_url))
    })?;

    tracing::info!("Found first post: {}", first_post);
    Ok(first_post)
}
