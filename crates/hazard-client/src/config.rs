//! Configuration for the HTTP client.

use std::time::Duration;

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.reask.earth/v2";

/// Default token endpoint.
pub const DEFAULT_AUTH_URL: &str = "https://api.reask.earth/v1/token";

/// Longest request URL the service accepts.
pub const URL_MAX_BYTES: usize = 1 << 15;

/// Configuration for [`crate::HttpHazardClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root that endpoint paths are appended to.
    pub base_url: String,
    /// Token endpoint.
    pub auth_url: String,
    /// Timeout for a single HTTP request.
    pub request_timeout: Duration,
    /// Requests with longer URLs are rejected before sending.
    pub max_url_bytes: usize,
    /// Section of `~/.reask` holding the credentials.
    pub credentials_section: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            request_timeout: Duration::from_secs(300),
            max_url_bytes: URL_MAX_BYTES,
            credentials_section: "default".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("REASK_BASE_URL") {
            config.base_url = val.trim_end_matches('/').to_string();
        }

        if let Ok(val) = std::env::var("REASK_AUTH_URL") {
            config.auth_url = val;
        }

        if let Ok(val) = std::env::var("REASK_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.request_timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(val) = std::env::var("REASK_CONFIG_SECTION") {
            config.credentials_section = val;
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("base_url must not be empty".to_string());
        }

        if self.auth_url.is_empty() {
            return Err("auth_url must not be empty".to_string());
        }

        if self.request_timeout.is_zero() {
            return Err("request_timeout must be > 0".to_string());
        }

        Ok(())
    }

    /// Full URL of an endpoint path.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://api.reask.earth/v2");
        assert_eq!(config.max_url_bytes, 32_768);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_url() {
        let mut config = ClientConfig::default();
        assert_eq!(
            config.endpoint_url("deepcyc/tcwind/events"),
            "https://api.reask.earth/v2/deepcyc/tcwind/events"
        );

        config.base_url = "http://localhost:8080/v2/".to_string();
        assert_eq!(
            config.endpoint_url("metryc/tcwind/events"),
            "http://localhost:8080/v2/metryc/tcwind/events"
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();
        config.request_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
