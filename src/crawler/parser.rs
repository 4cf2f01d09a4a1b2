//! Post page parser
//!
//! This module turns one fetched post page into a `Post` and finds the URL
//! of the next post in the journal, if there is one.
//!
//! Only the author and the timestamp are required. Every other field falls
//! back to its default when the page does not carry it.

use crate::crawler::source::FetchedPage;
use crate::journal::{Post, Privacy};
use crate::url::{canonical_post_url, post_id_from_url, resolve_link, JournalUrls};
use crate::{ArchiveError, Result};
use scraper::{ElementRef, Html, Selector};

/// Marker class on the subject heading of private posts
const PRIVATE_MARKER: &str = "i-posticon-private";

/// Marker class on the subject heading of friends-only posts
const PROTECTED_MARKER: &str = "i-posticon-protected";

/// A parsed post plus where the chain continues
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPost {
    pub post: Post,

    /// URL of the following post; None at the end of the journal
    pub next_url: Option<String>,
}

/// Parses a post page
///
/// # Example
///
/// ```
/// use journal_archiver::config::SiteConfig;
/// use journal_archiver::crawler::{parse_post, FetchedPage};
/// use journal_archiver::url::JournalUrls;
///
/// let urls = JournalUrls::new(&SiteConfig::default(), "dr-dos").unwrap();
/// let html = r#"<span class="ljuser" data-ljuser="dr-dos"></span><time>2017-01-01</time>"#;
/// let page = FetchedPage::direct("http://dr-dos.livejournal.com/1.html", html);
/// let parsed = parse_post(&page, &urls).unwrap();
/// assert_eq!(parsed.post.id, "1");
/// assert_eq!(parsed.post.author, "dr-dos");
/// assert!(parsed.next_url.is_none());
/// ```
pub fn parse_post(page: &FetchedPage, urls: &JournalUrls) -> Result<ParsedPost> {
    let document = Html::parse_document(&page.body);

    let canonical = canonical_post_url(&page.requested_url, &page.history, urls);
    let mut post = Post::new(&post_id_from_url(canonical, urls), &page.requested_url);

    post.author = select_first(&document, "span.ljuser")
        .and_then(|element| element.value().attr("data-ljuser"))
        .map(str::to_string)
        .ok_or_else(|| missing(page, "author"))?;

    post.time = select_first(&document, "time")
        .map(element_text)
        .ok_or_else(|| missing(page, "time"))?;

    post.userpic = extract_userpic(&document, &urls.userpics).unwrap_or_default();

    if let Some(subject) = select_first(&document, "h1.b-singlepost-title") {
        post.privacy = extract_privacy(subject);
        post.subject = element_text(subject).trim().to_string();
    }

    post.location = meta_item_text(&document, "location");
    post.music = meta_item_text(&document, "music");

    if let Some(mood) = meta_item(&document, "mood") {
        post.mood = select_within(mood, "span").map(element_text).unwrap_or_default();
        post.mood_image = select_within(mood, "img")
            .and_then(|image| image.value().attr("src"))
            .map(str::to_string)
            .unwrap_or_default();
    }

    post.content = select_first(&document, "div.b-singlepost-bodywrapper")
        .map(|element| element.html())
        .unwrap_or_default();

    let next_url = select_first(&document, "a.b-controls-next")
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| resolve_link(href, &page.final_url));

    Ok(ParsedPost { post, next_url })
}

fn missing(page: &FetchedPage, field: &'static str) -> ArchiveError {
    ArchiveError::MissingField {
        url: page.requested_url.clone(),
        field,
    }
}

fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next()
}

fn select_within<'a>(element: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    element.select(&selector).next()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// First image served from the userpic host
fn extract_userpic(document: &Html, userpic_host: &str) -> Option<String> {
    let selector = Selector::parse("img[src]").ok()?;
    document
        .select(&selector)
        .filter_map(|image| image.value().attr("src"))
        .find(|src| src.starts_with(userpic_host))
        .map(str::to_string)
}

/// Privacy is marked by a class on the first span inside the subject heading
fn extract_privacy(subject: ElementRef<'_>) -> Privacy {
    let Some(marker) = select_within(subject, "span") else {
        return Privacy::Public;
    };

    let has_class = |name: &str| marker.value().classes().any(|class| class == name);
    if has_class(PRIVATE_MARKER) {
        Privacy::Private
    } else if has_class(PROTECTED_MARKER) {
        Privacy::FriendsOnly
    } else {
        Privacy::Public
    }
}

fn meta_item<'a>(document: &'a Html, name: &str) -> Option<ElementRef<'a>> {
    select_first(document, &format!("li.b-singlepost-meta-item-{}", name))
}

/// Text of the labeled metadata item, empty when the item is absent
fn meta_item_text(document: &Html, name: &str) -> String {
    meta_item(document, name)
        .and_then(|item| select_within(item, "span"))
        .map(element_text)
        .unwrap_or_default()
}
