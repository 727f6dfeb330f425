//! Configuration management for keymon

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub backend: BackendSettings,

    /// Dashboard panel settings
    #[serde(default)]
    pub panel: PanelConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings for the backend that serves `/keys/active`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL every backend path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key sent as `X-API-Key`, if the backend requires one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

/// Dashboard panel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Delay between the end of one refresh and the start of the next (milliseconds)
    #[serde(default = "default_refresh_delay")]
    pub refresh_delay_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_refresh_delay() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            refresh_delay_ms: default_refresh_delay(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl BackendSettings {
    /// Get request timeout as Duration
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Join a backend path onto the base URL
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl PanelConfig {
    /// Get refresh delay as Duration
    #[must_use]
    pub const fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }
}

impl Config {
    /// Load configuration from an optional `keymon` file and `KEYMON_*` environment variables
    ///
    /// Nested keys use a double underscore, e.g. `KEYMON_BACKEND__BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded, parsed or validated.
    pub fn load() -> crate::Result<Self> {
        let config: Self = config::Config::builder()
            .add_source(config::File::with_name("keymon").required(false))
            .add_source(
                config::Environment::with_prefix("KEYMON")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::configuration(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            crate::Error::configuration(format!("Failed to parse config file: {e}"))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can drive a panel
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] naming the first offending field.
    pub fn validate(&self) -> crate::Result<()> {
        let base_url = self.backend.base_url.trim();
        let rest = base_url
            .strip_prefix("http://")
            .or_else(|| base_url.strip_prefix("https://"))
            .ok_or_else(|| {
                crate::Error::validation("backend.base_url", "must start with http:// or https://")
            })?;
        if rest.trim_matches('/').is_empty() {
            return Err(crate::Error::validation("backend.base_url", "host is missing"));
        }

        if self.backend.request_timeout_seconds == 0 {
            return Err(crate::Error::validation(
                "backend.request_timeout_seconds",
                "must be greater than zero",
            ));
        }

        if self.panel.refresh_delay_ms == 0 {
            return Err(crate::Error::validation(
                "panel.refresh_delay_ms",
                "must be greater than zero",
            ));
        }

        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            return Err(crate::Error::validation(
                "logging.format",
                "must be either json or pretty",
            ));
        }

        Ok(())
    }

    /// Render the configuration as TOML
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized.
    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| {
            crate::Error::configuration(format!("Failed to serialize configuration: {e}"))
        })
    }
}
