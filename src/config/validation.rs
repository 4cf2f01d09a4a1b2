use crate::config::types::{Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_journal_name(&config.journal.name)?;
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Journal names end up in hostnames and paths, so only a restricted alphabet is allowed
fn validate_journal_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "journal name cannot be empty".to_string(),
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "journal name must contain only letters, digits, '-' and '_', got '{}'",
            name
        )));
    }

    Ok(())
}

fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    parse_http_url("root", &config.root)?;
    parse_http_url(
        "journal-url",
        &config.journal_url.replace("{journal}", "journal"),
    )?;
    parse_http_url("userpic-host", &config.userpic_host)?;
    Ok(())
}

fn parse_http_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", field, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field, value
        )));
    }

    Ok(url)
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    if config.max_redirects < 1 || config.max_redirects > 20 {
        return Err(ConfigError::Validation(format!(
            "max-redirects must be between 1 and 20, got {}",
            config.max_redirects
        )));
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if matches!(config.database_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "database-path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::Validation(format!("Invalid email format: '{}'", email));

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }

    Ok(())
}
