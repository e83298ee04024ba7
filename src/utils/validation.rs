use crate::utils::error::{ProxyError, Result};
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> ProxyError {
    ProxyError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Feeds are fetched with reqwest, so only http and https URLs with a host are usable.
pub fn validate_feed_url(field_name: &str, url_str: &str) -> Result<Url> {
    let url = Url::parse(url_str)
        .map_err(|e| invalid(field_name, url_str, format!("Invalid feed URL: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            field_name,
            url_str,
            format!("Feed URL scheme must be http or https, got {}", url.scheme()),
        ));
    }
    if url.host_str().is_none() {
        return Err(invalid(field_name, url_str, "Feed URL has no host"));
    }
    Ok(url)
}

pub fn validate_timeout(field_name: &str, seconds: u64) -> Result<Duration> {
    if seconds == 0 {
        return Err(invalid(field_name, seconds, "Timeout must be at least 1 second"));
    }
    Ok(Duration::from_secs(seconds))
}

pub fn validate_label(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field_name, value, "Value cannot be empty or whitespace-only"));
    }
    Ok(())
}

pub fn validate_bind_address(field_name: &str, value: &str) -> Result<SocketAddr> {
    value
        .parse::<SocketAddr>()
        .map_err(|e| invalid(field_name, value, format!("Invalid socket address: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_feed_url() {
        assert!(validate_feed_url("searches.url", "https://example.com/rss").is_ok());
        assert!(validate_feed_url("searches.url", "http://example.com").is_ok());
        assert!(validate_feed_url("searches.url", "").is_err());
        assert!(validate_feed_url("searches.url", "invalid-url").is_err());
        assert!(validate_feed_url("searches.url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_timeout() {
        assert_eq!(
            validate_timeout("http.timeout_seconds", 15).unwrap(),
            Duration::from_secs(15)
        );
        assert!(validate_timeout("http.timeout_seconds", 0).is_err());
    }

    #[test]
    fn test_validate_label() {
        assert!(validate_label("searches.name", "eBay - YES").is_ok());
        assert!(validate_label("searches.name", "   ").is_err());
    }

    #[test]
    fn test_validate_bind_address() {
        let addr = validate_bind_address("server.bind", "127.0.0.1:3001").unwrap();
        assert_eq!(addr.port(), 3001);
        assert!(validate_bind_address("server.bind", "localhost").is_err());
    }
}
