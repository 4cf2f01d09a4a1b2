use serde::Deserialize;

/// Main configuration structure for the archiver
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub journal: JournalConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// The journal being archived
#[derive(Debug, Clone, Deserialize)]
pub struct JournalConfig {
    /// Journal (or community) name, e.g. "dr-dos"
    pub name: String,
}

/// Hosting site layout
///
/// Defaults to LiveJournal. `journal-url` may contain a `{journal}`
/// placeholder which is replaced by the journal name.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Site root, hosts the login form and profile pages
    #[serde(default = "default_root")]
    pub root: String,

    /// Journal base URL template
    #[serde(rename = "journal-url", default = "default_journal_url")]
    pub journal_url: String,

    /// Host that serves userpic images
    #[serde(rename = "userpic-host", default = "default_userpic_host")]
    pub userpic_host: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            journal_url: default_journal_url(),
            userpic_host: default_userpic_host(),
        }
    }
}

fn default_root() -> String {
    "http://www.livejournal.com/".to_string()
}

fn default_journal_url() -> String {
    "http://{journal}.livejournal.com/".to_string()
}

fn default_userpic_host() -> String {
    "http://l-userpic.livejournal.com".to_string()
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Delay between consecutive post fetches (milliseconds)
    #[serde(rename = "post-delay", default = "default_post_delay")]
    pub post_delay: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Maximum redirect hops followed for a single fetch
    #[serde(rename = "max-redirects", default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Keep the raw page HTML alongside each archived post
    #[serde(rename = "capture-source", default)]
    pub capture_source: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            post_delay: default_post_delay(),
            request_timeout: default_request_timeout(),
            max_redirects: default_max_redirects(),
            capture_source: false,
        }
    }
}

fn default_post_delay() -> u64 {
    3000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    10
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the user agent as `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory for per-post JSON files
    pub directory: String,

    /// Optional SQLite database mirroring the archived posts
    #[serde(rename = "database-path", default)]
    pub database_path: Option<String>,
}
