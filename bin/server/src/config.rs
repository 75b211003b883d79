//! Centralized server configuration.
//!
//! Loaded via the `config` crate from environment variables, using `__` to
//! separate nested keys (`BACKEND__URL`, `BACKEND__ANON_KEY`, ...).
//!
//! See [`HostedConfig`] for the backend settings.

use roofclaim_hosted::HostedConfig;
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Hosted auth and data backend. Only its public part reaches the browser.
    pub backend: HostedConfig,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(
            config::Environment::default()
                .separator("__")
                .try_parsing(true),
        )
    }

    fn from_source(
        source: impl config::Source + Send + Sync + 'static,
    ) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }
}
