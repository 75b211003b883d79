//! Connection settings for the hosted backend.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the hosted auth and data service.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedConfig {
    /// Project base URL (e.g., "https://abc.supabase.co").
    url: String,
    /// Public anonymous API key, sent as the `apikey` header.
    anon_key: String,
    /// Request timeout in seconds.
    /// Default: 30
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
    /// Key under which the browser persists the session.
    /// Default: "roofclaim.auth.session"
    #[serde(default = "default_storage_key")]
    storage_key: String,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_storage_key() -> String {
    "roofclaim.auth.session".to_string()
}

impl HostedConfig {
    /// Creates a configuration with defaults for optional fields.
    #[must_use]
    pub fn new(url: String, anon_key: String) -> Self {
        Self {
            url,
            anon_key,
            timeout_seconds: default_timeout_seconds(),
            storage_key: default_storage_key(),
        }
    }

    #[must_use]
    pub fn builder(url: String, anon_key: String) -> HostedConfigBuilder {
        HostedConfigBuilder::new(url, anon_key)
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    #[must_use]
    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Auth API endpoint for `path` (e.g., "token").
    #[must_use]
    pub fn auth_endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.url())
    }

    /// Data API endpoint for a table.
    #[must_use]
    pub fn table_endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.url())
    }

    /// Data API endpoint for a stored function.
    #[must_use]
    pub fn rpc_endpoint(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{function}", self.url())
    }
}

/// Builder for `HostedConfig`.
#[derive(Debug)]
pub struct HostedConfigBuilder {
    config: HostedConfig,
}

impl HostedConfigBuilder {
    #[must_use]
    pub fn new(url: String, anon_key: String) -> Self {
        Self {
            config: HostedConfig::new(url, anon_key),
        }
    }

    #[must_use]
    pub fn timeout_seconds(mut self, seconds: u64) -> Self {
        self.config.timeout_seconds = seconds;
        self
    }

    #[must_use]
    pub fn storage_key(mut self, key: String) -> Self {
        self.config.storage_key = key;
        self
    }

    #[must_use]
    pub fn build(self) -> HostedConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> HostedConfig {
        HostedConfig::new(
            "https://project.example.co/".to_string(),
            "anon".to_string(),
        )
    }

    #[test]
    fn new_config_has_defaults() {
        let config = config();
        assert_eq!(config.url(), "https://project.example.co");
        assert_eq!(config.anon_key(), "anon");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.storage_key(), "roofclaim.auth.session");
    }

    #[test]
    fn endpoints() {
        let config = config();
        assert_eq!(
            config.auth_endpoint("token"),
            "https://project.example.co/auth/v1/token"
        );
        assert_eq!(
            config.table_endpoint("users"),
            "https://project.example.co/rest/v1/users"
        );
        assert_eq!(
            config.rpc_endpoint("get_project_status"),
            "https://project.example.co/rest/v1/rpc/get_project_status"
        );
    }

    #[test]
    fn builder_allows_customization() {
        let config = HostedConfig::builder("https://h".to_string(), "k".to_string())
            .timeout_seconds(5)
            .storage_key("custom".to_string())
            .build();
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.storage_key(), "custom");
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let json = r#"{"url": "https://h", "anon_key": "k"}"#;
        let config: HostedConfig = serde_json::from_str(json).expect("deserialize");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.storage_key(), "roofclaim.auth.session");
    }
}
