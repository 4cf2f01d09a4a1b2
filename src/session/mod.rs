//! Authenticated session handling
//!
//! A `Session` is the capability every fetch runs under: it owns the HTTP
//! client (and with it the cookie jar), the journal's URL set and the
//! operator identity. Only `login` ever writes cookies into it; afterwards
//! it is shared by reference and never mutated.

mod login;

pub use login::Credentials;

use crate::config::Config;
use crate::crawler::build_http_client;
use crate::url::JournalUrls;
use crate::Result;
use reqwest::Client;

/// Identity recorded for archives made without logging in
pub const ANONYMOUS: &str = "anonymous";

/// Authenticated (or anonymous) access to one journal
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    urls: JournalUrls,
    user: Option<String>,
    max_redirects: usize,
}

impl Session {
    /// Creates a session without logging in
    ///
    /// Only public posts are visible to such a session.
    pub fn anonymous(config: &Config) -> Result<Self> {
        let client = build_http_client(config)?;
        let urls = JournalUrls::new(&config.site, &config.journal.name)?;

        Ok(Self {
            client,
            urls,
            user: None,
            max_redirects: config.crawler.max_redirects,
        })
    }

    /// Logs in and returns a session carrying the resulting cookies
    pub async fn login(config: &Config, credentials: &Credentials) -> Result<Self> {
        let mut session = Self::anonymous(config)?;
        login::submit_login(&session.client, &session.urls, credentials).await?;
        session.user = Some(credentials.user.clone());
        tracing::info!("Logged in as {}", credentials.user);
        Ok(session)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn urls(&self) -> &JournalUrls {
        &self.urls
    }

    pub fn max_redirects(&self) -> usize {
        self.max_redirects
    }

    /// Operator identity recorded in the archive metadata
    pub fn operator(&self) -> &str {
        self.user.as_deref().unwrap_or(ANONYMOUS)
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }
}
