use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::cycle::CycleConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cycle: CycleConfig,
    /// Record source (required to start imports)
    #[serde(default)]
    pub source: Option<SourceConfig>,
    /// Record sink (required to start imports)
    #[serde(default)]
    pub sink: Option<SinkConfig>,
    #[serde(default)]
    pub notifier: NotifierConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("fetchcycle.db")
}

/// HTTP record source configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Endpoint returning the records as JSON (e.g., "http://gateway/api/v1/records")
    pub url: String,
    /// Bearer token sent with the request
    #[serde(default)]
    pub token: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// HTTP record sink configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SinkConfig {
    /// Endpoint each record is PUT to
    pub url: String,
    /// Bearer token sent with each request
    #[serde(default)]
    pub token: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Response statuses counted as a stored record.
    /// 400 is included by default: bad data must not halt the import.
    #[serde(default = "default_accept_statuses")]
    pub accept_statuses: Vec<u16>,
}

fn default_accept_statuses() -> Vec<u16> {
    vec![200, 400]
}

/// Completion notifier configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NotifierConfig {
    /// Webhook receiving the final status document. No webhook means no-op.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl NotifierConfig {
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or_else(default_timeout)
    }
}

fn default_timeout() -> u64 {
    30
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cycle: CycleConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SanitizedEndpointConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sink: Option<SanitizedEndpointConfig>,
    pub notifier: NotifierConfig,
}

/// Sanitized endpoint config (token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedEndpointConfig {
    pub url: String,
    pub token_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            cycle: config.cycle.clone(),
            source: config.source.as_ref().map(|s| SanitizedEndpointConfig {
                url: s.url.clone(),
                token_configured: s.token.is_some(),
                timeout_secs: s.timeout_secs,
            }),
            sink: config.sink.as_ref().map(|s| SanitizedEndpointConfig {
                url: s.url.clone(),
                token_configured: s.token.is_some(),
                timeout_secs: s.timeout_secs,
            }),
            notifier: config.notifier.clone(),
        }
    }
}
