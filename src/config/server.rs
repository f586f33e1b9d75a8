//! Configuration file types
//!
//! Defines the structure of the steward configuration file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::checks::CheckOptions;
use crate::client::IcingaClient;
use crate::maintenance::{DEFAULT_AUTHOR, DEFAULT_COMMENT, DowntimeSpec};

/// Errors that can occur during configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to create client: {0}")]
    Client(#[from] crate::client::IcingaError),
}

/// Connection settings for the Icinga API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// API URL (e.g., "https://icinga.example.com:5665")
    pub url: String,
    /// API user
    pub username: String,
    /// API password; usually supplied through the environment instead
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    /// Verify the server certificate
    #[serde(default = "default_verify_certs")]
    pub verify_certs: bool,
}

fn default_verify_certs() -> bool {
    true
}

impl ServerConfig {
    /// Check the settings without connecting
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.url)
            .map_err(|e| ConfigError::Invalid(format!("server.url '{}': {e}", self.url)))?;
        if url.scheme() != "https" {
            return Err(ConfigError::Invalid(format!(
                "server.url '{}' must use https",
                self.url
            )));
        }
        if self.username.is_empty() {
            return Err(ConfigError::Invalid("server.username is empty".to_string()));
        }
        Ok(())
    }

    /// Create a client for this server
    pub fn to_client(&self) -> Result<IcingaClient, ConfigError> {
        self.validate()?;
        Ok(IcingaClient::new(
            &self.url,
            &self.username,
            &self.password,
            self.verify_certs,
        )?)
    }
}

/// Defaults recorded on new downtimes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceDefaults {
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default = "default_comment")]
    pub comment: String,
}

fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

fn default_comment() -> String {
    DEFAULT_COMMENT.to_string()
}

impl Default for MaintenanceDefaults {
    fn default() -> Self {
        Self {
            author: default_author(),
            comment: default_comment(),
        }
    }
}

impl MaintenanceDefaults {
    /// Downtime of the given length carrying these defaults
    pub fn to_downtime_spec(&self, duration: Duration) -> DowntimeSpec {
        DowntimeSpec::new(duration)
            .with_author(&self.author)
            .with_comment(&self.comment)
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Icinga server
    pub server: ServerConfig,

    /// Default budget for forced checks
    #[serde(default)]
    pub check: CheckOptions,

    /// Default downtime metadata
    #[serde(default)]
    pub maintenance: MaintenanceDefaults,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Generate a default configuration
    pub fn default_config() -> Self {
        Config {
            server: ServerConfig {
                url: "https://icinga.example.com:5665".to_string(),
                username: "steward".to_string(),
                password: String::new(),
                verify_certs: true,
            },
            check: CheckOptions::new(Duration::from_secs(30), 0),
            maintenance: MaintenanceDefaults::default(),
        }
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
