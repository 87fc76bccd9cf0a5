//! Configuration schema types.
//!
//! [`HermesConfig`] is the root type; use [`ConfigLoader`](crate::ConfigLoader)
//! to assemble it from defaults, files and environment variables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Complete Hermes configuration.
///
/// # Example
///
/// ```
/// use hermes_config::HermesConfig;
///
/// let config = HermesConfig::default();
/// assert!(config.client.base_url.is_none());
/// assert_eq!(config.logging.level, "info");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HermesConfig {
    /// API client configuration.
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HermesConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `client.base_url` is set but is not an `http://` or `https://` URL
    /// - a default header name is empty
    /// - `logging.level` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base_url) = &self.client.base_url {
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                return Err(ConfigError::invalid_value(
                    "client.base_url",
                    format!("expected an http:// or https:// URL, got {base_url}"),
                ));
            }
        }

        if self.client.default_headers.keys().any(String::is_empty) {
            return Err(ConfigError::invalid_value(
                "client.default_headers",
                "header names must not be empty",
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "logging.level",
                "must not be empty",
            ));
        }

        Ok(())
    }

    /// Create a configuration preset for local test runs.
    ///
    /// Enables request dumps, debug level and pretty log output.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::{HermesConfig, LogFormat};
    ///
    /// let config = HermesConfig::development();
    /// assert!(config.client.dump_requests);
    /// assert_eq!(config.logging.format, LogFormat::Pretty);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.client.dump_requests = true;
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config
    }
}

/// API client configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL prepended to every request endpoint.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Headers sent with every request.
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,

    /// Record the rendered wire form of every request.
    #[serde(default)]
    pub dump_requests: bool,

    /// Value of the `User-Agent` header.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` from the environment.
    #[serde(default)]
    pub use_env_proxy: bool,
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (CI).
    #[default]
    Json,
    /// Human-readable pretty format (local runs).
    Pretty,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log filter directive (e.g. `info` or `hermes=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
