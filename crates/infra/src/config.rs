//! Connector configuration.
//!
//! Read either from a JSON file or from the environment.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MAGESYNC_URL` - Base URL of the Magento instance
//! - `MAGESYNC_API_USER` - Web services API user
//! - `MAGESYNC_API_KEY` - Web services API key
//!
//! ## Optional
//! - `MAGESYNC_TIMEOUT_SECS` - HTTP timeout per call (default: 30)
//! - `MAGESYNC_BATCH_SIZE` - Products per inventory call (default: 50)
//! - `MAGESYNC_LOG` - Log filter used when `RUST_LOG` is unset (default: info)
//! - `MAGESYNC_LOG_FORMAT` - `json` or `pretty` (default: json)

use std::path::Path;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use magesync_catalog::INVENTORY_BATCH_SIZE;
use magesync_magento::Credentials;
use magesync_observability::{LogFormat, LogSettings};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("cannot read {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("invalid config file {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Everything the `magesync` binary needs to talk to one instance.
#[derive(Clone)]
pub struct ConnectorConfig {
    pub url: String,
    pub api_user: String,
    pub api_key: SecretString,
    pub timeout: Duration,
    pub batch_size: usize,
    pub log: LogSettings,
}

impl std::fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("url", &self.url)
            .field("api_user", &self.api_user)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("batch_size", &self.batch_size)
            .field("log", &self.log)
            .finish()
    }
}

#[derive(Deserialize)]
struct FileConfig {
    url: String,
    api_user: String,
    api_key: String,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default = "default_batch_size")]
    batch_size: usize,
    #[serde(default)]
    log: LogSettings,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_batch_size() -> usize {
    INVENTORY_BATCH_SIZE
}

impl ConnectorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let timeout_secs = match lookup("MAGESYNC_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("MAGESYNC_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let batch_size = match lookup("MAGESYNC_BATCH_SIZE") {
            Some(raw) => raw.parse::<usize>().map_err(|e| {
                ConfigError::InvalidEnvVar("MAGESYNC_BATCH_SIZE".to_string(), e.to_string())
            })?,
            None => INVENTORY_BATCH_SIZE,
        };

        let mut log = LogSettings::default();
        if let Some(filter) = lookup("MAGESYNC_LOG") {
            log.filter = filter;
        }
        if let Some(format) = lookup("MAGESYNC_LOG_FORMAT") {
            log.format = match format.as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                other => {
                    return Err(ConfigError::InvalidEnvVar(
                        "MAGESYNC_LOG_FORMAT".to_string(),
                        format!("expected json or pretty, got {other:?}"),
                    ));
                }
            };
        }

        Self {
            url: required("MAGESYNC_URL")?,
            api_user: required("MAGESYNC_API_USER")?,
            api_key: SecretString::from(required("MAGESYNC_API_KEY")?),
            timeout: Duration::from_secs(timeout_secs),
            batch_size,
            log,
        }
        .validated()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&text).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = serde_json::from_str(text).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })?;
        Self {
            url: file.url,
            api_user: file.api_user,
            api_key: SecretString::from(file.api_key),
            timeout: Duration::from_secs(file.timeout_secs),
            batch_size: file.batch_size,
            log: file.log,
        }
        .validated()
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.url.clone(),
            self.api_user.clone(),
            self.api_key.expose_secret(),
        )
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "url must start with http:// or https://, got {:?}",
                self.url
            )));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch size must be positive".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid("timeout must be positive".to_string()));
        }
        Ok(self)
    }
}
