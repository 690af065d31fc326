//! Server settings.
//!
//! Values come from an optional TOML file; the binary layers environment
//! variables and command line flags on top.

use serde::{Deserialize, Serialize};
use std::{net::IpAddr, path::Path, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Top-level server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON-RPC endpoint url
    pub rpc_url: String,

    /// Interface to listen on
    pub host: IpAddr,

    /// HTTP port
    pub port: u16,

    /// Upper bound for a single query, in seconds
    pub request_timeout_secs: u64,

    /// Allow cross-origin requests
    pub cors: bool,

    /// Prometheus exporter port, disabled when unset
    pub metrics_port: Option<u16>,

    /// Log output format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8080,
            request_timeout_secs: 30,
            cors: true,
            metrics_port: None,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;

        Ok(config)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc_url.trim().is_empty() {
            return Err(ConfigError::Invalid("rpc_url is empty".to_string()));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive".to_string(),
            ));
        }

        if self.metrics_port.is_some_and(|port| port == self.port) {
            return Err(ConfigError::Invalid(format!(
                "metrics_port {} collides with port",
                self.port
            )));
        }

        Ok(())
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.cors);
        assert_eq!(config.metrics_port, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            rpc_url = "https://sepolia.example.org"
            port = 3000
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.rpc_url, "https://sepolia.example.org");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.host, IpAddr::from([0, 0, 0, 0]));
    }

    #[test]
    fn test_unknown_log_format() {
        let result: Result<Config, _> = toml::from_str(r#"log_format = "xml""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            rpc_url: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config {
            metrics_port: Some(8080),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
