use crate::url::JournalUrls;
use crate::{ArchiveError, Result};
use reqwest::{Client, StatusCode};
use std::fmt;

/// Login credentials for the hosting site
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Posts the login form; the client's cookie jar keeps the session cookies
///
/// The client does not follow redirects, so a redirect after a successful
/// login counts as success alongside a plain 200.
pub(super) async fn submit_login(
    client: &Client,
    urls: &JournalUrls,
    credentials: &Credentials,
) -> Result<()> {
    let login_url = urls.login();
    tracing::info!("Logging in to {}...", login_url);

    let form = [
        ("user", credentials.user.as_str()),
        ("password", credentials.password.as_str()),
        ("action:login", ""),
    ];

    let response = client
        .post(&login_url)
        .form(&form)
        .send()
        .await
        .map_err(|source| ArchiveError::Http {
            url: login_url.clone(),
            source,
        })?;

    let status = response.status();
    if status != StatusCode::OK && !status.is_redirection() {
        return Err(ArchiveError::Login {
            user: credentials.user.clone(),
            status: status.as_u16(),
        });
    }

    Ok(())
}
