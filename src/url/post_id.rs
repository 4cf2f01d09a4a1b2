use crate::url::JournalUrls;

/// Suffix carried by every post page URL
pub const POST_SUFFIX: &str = ".html";

/// Picks the canonical URL of a fetched post
///
/// The first redirect hop that lies inside the journal wins; otherwise the
/// requested URL is used as-is.
pub fn canonical_post_url<'a>(requested: &'a str, history: &'a [String], urls: &JournalUrls) -> &'a str {
    history
        .iter()
        .find(|hop| hop.starts_with(&urls.journal))
        .map(String::as_str)
        .unwrap_or(requested)
}

/// Derives a post id by stripping the journal base URL and the page suffix
///
/// ```
/// use journal_archiver::config::SiteConfig;
/// use journal_archiver::url::{post_id_from_url, JournalUrls};
///
/// let urls = JournalUrls::new(&SiteConfig::default(), "dr-dos").unwrap();
/// assert_eq!(post_id_from_url("http://dr-dos.livejournal.com/411146.html", &urls), "411146");
/// ```
pub fn post_id_from_url(url: &str, urls: &JournalUrls) -> String {
    let without_base = url.strip_prefix(&urls.journal).unwrap_or(url);
    // Query strings (e.g. ?view=comments) are not part of the id
    let without_query = without_base
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or(without_base);
    without_query
        .strip_suffix(POST_SUFFIX)
        .unwrap_or(without_query)
        .to_string()
}
