//! Engine settings
//!
//! Loaded from TOML. Every field has a default, so an empty file is valid.
//!
//! ```toml
//! parallelism = 4
//! log_filter = "invoke_kernel=debug"
//! log_format = "json"
//!
//! [client_capabilities]
//! write_only_attributes_allowed = true
//! ```

use crate::error::SettingsError;
use crate::providers::ClientCapabilities;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Invoke engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvokeConfig {
    /// Maximum instances planned at once
    pub parallelism: usize,
    /// Capabilities declared to providers
    pub client_capabilities: ClientCapabilities,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for InvokeConfig {
    fn default() -> Self {
        Self {
            parallelism: 10,
            client_capabilities: ClientCapabilities::default(),
            log_filter: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl InvokeConfig {
    /// Parse and validate settings
    ///
    /// # Errors
    /// Fails on malformed TOML or out-of-range values.
    pub fn from_toml_str(s: &str) -> Result<Self, SettingsError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings from a file
    ///
    /// # Errors
    /// Fails when the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "loaded settings file");
        Self::from_toml_str(&raw)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Fails when `parallelism` is zero or `log_filter` is empty.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.parallelism == 0 {
            return Err(SettingsError::Invalid {
                field: "parallelism",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.log_filter.trim().is_empty() {
            return Err(SettingsError::Invalid {
                field: "log_filter",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Set parallelism
    #[inline]
    #[must_use]
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Set client capabilities
    #[inline]
    #[must_use]
    pub fn with_client_capabilities(mut self, capabilities: ClientCapabilities) -> Self {
        self.client_capabilities = capabilities;
        self
    }

    /// Set the log filter
    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Set the log format
    #[inline]
    #[must_use]
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_is_defaults() {
        assert_eq!(InvokeConfig::from_toml_str("").unwrap(), InvokeConfig::default());
    }

    #[test]
    fn parses_every_field() {
        let config = InvokeConfig::from_toml_str(
            r#"
            parallelism = 4
            log_filter = "invoke_kernel=debug"
            log_format = "json"

            [client_capabilities]
            write_only_attributes_allowed = true
            "#,
        )
        .unwrap();
        assert_eq!(
            config,
            InvokeConfig::default()
                .with_parallelism(4)
                .with_log_filter("invoke_kernel=debug")
                .with_log_format(LogFormat::Json)
                .with_client_capabilities(ClientCapabilities {
                    deferral_allowed: false,
                    write_only_attributes_allowed: true,
                })
        );
    }

    #[test]
    fn zero_parallelism_is_rejected() {
        let err = InvokeConfig::from_toml_str("parallelism = 0").unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "parallelism", .. }));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = InvokeConfig::from_toml_str("parallelism = [").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = InvokeConfig::load("/nonexistent/invoke.toml").unwrap_err();
        assert!(matches!(err, SettingsError::Read(_)));
    }
}
