//! Client-management API configuration.
//!
//! One base URL for the whole API. Override via environment variables or
//! explicit construction for staging/testing.

use url::Url;
use zeroize::Zeroizing;

/// Default base URL when `KYC_API_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for connecting to the client-management API.
///
/// Custom `Debug` implementation redacts the `api_token` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL; API paths are joined below it (`{base}ef/do/v1/...`).
    pub base_url: Url,
    /// Bearer token for API authentication. Zeroed on drop.
    pub api_token: Zeroizing<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `KYC_API_BASE_URL` (default: `http://localhost:8080/`)
    /// - `KYC_API_TOKEN` (required)
    /// - `KYC_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_token = std::env::var("KYC_API_TOKEN").map_err(|_| ConfigError::MissingToken)?;
        Ok(Self {
            base_url: env_url("KYC_API_BASE_URL", DEFAULT_BASE_URL)?,
            api_token: Zeroizing::new(api_token),
            timeout_secs: std::env::var("KYC_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Configuration pointing at a mock server (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `base_url` cannot be parsed.
    pub fn local_mock(base_url: &str, token: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base(base_url)
                .map_err(|e| ConfigError::InvalidUrl("base_url".to_string(), e.to_string()))?,
            api_token: Zeroizing::new(token.to_string()),
            timeout_secs: 5,
        })
    }
}

/// Parse a base URL, making sure it ends in `/` so relative joins keep
/// any path prefix.
fn parse_base(raw: &str) -> Result<Url, url::ParseError> {
    if raw.ends_with('/') {
        Url::parse(raw)
    } else {
        Url::parse(&format!("{raw}/"))
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    parse_base(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("KYC_API_TOKEN environment variable is required")]
    MissingToken,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_mock_builds_valid_config() {
        let cfg = ApiConfig::local_mock("http://127.0.0.1:9000", "test-token").unwrap();
        assert_eq!(cfg.api_token.as_str(), "test-token");
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.base_url.as_str(), "http://127.0.0.1:9000/");
    }

    #[test]
    fn base_url_keeps_path_prefix() {
        let cfg = ApiConfig::local_mock("https://api.example.com/sandbox", "t").unwrap();
        let joined = cfg.base_url.join("ef/do/v1/clients/1").unwrap();
        assert_eq!(joined.as_str(), "https://api.example.com/sandbox/ef/do/v1/clients/1");
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = ApiConfig::local_mock("http://127.0.0.1:9000", "s3cret").unwrap();
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("s3cret"));
        assert!(printed.contains("[REDACTED]"));
    }

    #[test]
    fn env_url_uses_default_when_var_absent() {
        let url = env_url("NONEXISTENT_VAR_KYC_12345", "https://example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn env_url_rejects_invalid_url() {
        std::env::set_var("TEST_BAD_URL_KYC", "not a url");
        let result = env_url("TEST_BAD_URL_KYC", "https://example.com");
        std::env::remove_var("TEST_BAD_URL_KYC");
        assert!(result.is_err());
    }
}
