use crate::config::SiteConfig;
use crate::url::FeedMode;
use crate::ConfigError;
use url::Url;

/// The URL set of one journal
///
/// All members are plain strings so they can be prefix-matched against links
/// found in page markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalUrls {
    /// Journal name the set was built for
    pub name: String,

    /// Site root (login form lives here)
    pub root: String,

    /// Journal base URL, always ending in '/'
    pub journal: String,

    /// Profile page of the journal
    pub profile: String,

    /// Calendar page listing every month with posts
    pub calendar: String,

    /// Host that serves userpics
    pub userpics: String,
}

impl JournalUrls {
    /// Builds the URL set for `name` from the site layout
    ///
    /// # Example
    ///
    /// ```
    /// use journal_archiver::config::SiteConfig;
    /// use journal_archiver::url::JournalUrls;
    ///
    /// let urls = JournalUrls::new(&SiteConfig::default(), "dr-dos").unwrap();
    /// assert_eq!(urls.journal, "http://dr-dos.livejournal.com/");
    /// assert_eq!(urls.calendar, "http://dr-dos.livejournal.com/calendar");
    /// ```
    pub fn new(site: &SiteConfig, name: &str) -> Result<Self, ConfigError> {
        let root = with_trailing_slash(&site.root);
        let journal = with_trailing_slash(&site.journal_url.replace("{journal}", name));

        let profile = Url::parse_with_params(
            &format!("{}userinfo.bml", root),
            &[("user", name), ("comms", "access")],
        )
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid root '{}': {}", root, e)))?;

        Url::parse(&journal)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid journal URL '{}': {}", journal, e)))?;

        Ok(Self {
            name: name.to_string(),
            calendar: format!("{}calendar", journal),
            profile: profile.to_string(),
            userpics: site.userpic_host.clone(),
            root,
            journal,
        })
    }

    /// URL of the login form
    pub fn login(&self) -> String {
        format!("{}login.bml", self.root)
    }

    /// Builds one comment feed request URL
    ///
    /// `cache_buster` is sent as the `_` parameter; it is fixed for all
    /// pages of one post so the server sees a consistent listing.
    pub fn comment_feed(&self, post_id: &str, mode: FeedMode, page: u32, cache_buster: i64) -> String {
        let mut url = format!("{}{}/__rpc_get_thread", self.journal, self.name);
        url.push_str(&format!(
            "?journal={}&itemid={}&flat={}&skip=&media=&page={}&_={}",
            self.name,
            post_id,
            mode.flag(),
            page,
            cache_buster
        ));
        url
    }
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}
