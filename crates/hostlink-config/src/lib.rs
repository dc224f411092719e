#![deny(unsafe_code)]

//! Configuration loading and validation for hostlink.
//!
//! Loads TOML configuration files and validates them against expected schemas.
//! Provides the [`AppConfig`] type as the central configuration structure,
//! and the [`catalogue`] module for the declarative tool catalogue document.

/// Declarative tool catalogue document (name, description, enabled flag).
pub mod catalogue;

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use catalogue::{CatalogueDocument, CatalogueError, ToolDescriptor};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Framing scheme names accepted in `host.framing`.
pub const FRAMING_MODES: [&str; 3] = ["nul", "text", "half-close"];

/// Reassembly strategy names accepted in `host.reassembly`.
pub const REASSEMBLY_MODES: [&str; 2] = ["delimiter", "speculative"];

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Connection to the host application.
    #[serde(default)]
    pub host: HostConfig,

    /// Tool catalogue document location.
    #[serde(default)]
    pub catalogue: CatalogueConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings for the host application's command socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Address the host listens on.
    #[serde(default = "default_host_addr")]
    pub addr: String,

    /// Port the host listens on.
    #[serde(default = "default_host_port")]
    pub port: u16,

    /// Maximum time to establish a connection, in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Maximum time to wait for a complete response, in milliseconds.
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,

    /// Maximum idle gap between chunks once a response has started, in milliseconds.
    #[serde(default = "default_chunk_timeout_ms")]
    pub chunk_timeout_ms: u64,

    /// Message boundary scheme: "nul", "text", or "half-close".
    #[serde(default = "default_framing")]
    pub framing: String,

    /// How to detect a complete response: "delimiter" or "speculative".
    #[serde(default = "default_reassembly")]
    pub reassembly: String,

    /// Upper bound on simultaneously open sessions.
    #[serde(default = "default_max_concurrent_sessions")]
    pub max_concurrent_sessions: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            addr: default_host_addr(),
            port: default_host_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
            response_timeout_ms: default_response_timeout_ms(),
            chunk_timeout_ms: default_chunk_timeout_ms(),
            framing: default_framing(),
            reassembly: default_reassembly(),
            max_concurrent_sessions: default_max_concurrent_sessions(),
        }
    }
}

impl HostConfig {
    /// `addr:port` for socket connection.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn chunk_timeout(&self) -> Duration {
        Duration::from_millis(self.chunk_timeout_ms)
    }
}

fn default_host_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_host_port() -> u16 {
    55557
}

fn default_connect_timeout_ms() -> u64 {
    3_000
}

fn default_response_timeout_ms() -> u64 {
    30_000
}

fn default_chunk_timeout_ms() -> u64 {
    300
}

fn default_framing() -> String {
    "nul".to_string()
}

fn default_reassembly() -> String {
    "delimiter".to_string()
}

fn default_max_concurrent_sessions() -> usize {
    4
}

/// Where the tool catalogue document lives.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CatalogueConfig {
    /// Path to the JSON catalogue document. When unset every registered
    /// operation is advertised with its built-in description.
    #[serde(default)]
    pub path: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let host = &self.host;
        if host.port == 0 {
            return Err(ConfigError::Validation(
                "host.port must be non-zero".to_string(),
            ));
        }
        if host.addr.is_empty() {
            return Err(ConfigError::Validation(
                "host.addr must not be empty".to_string(),
            ));
        }
        if !FRAMING_MODES.contains(&host.framing.as_str()) {
            return Err(ConfigError::Validation(format!(
                "host.framing must be one of {:?}, got {:?}",
                FRAMING_MODES, host.framing
            )));
        }
        if !REASSEMBLY_MODES.contains(&host.reassembly.as_str()) {
            return Err(ConfigError::Validation(format!(
                "host.reassembly must be one of {:?}, got {:?}",
                REASSEMBLY_MODES, host.reassembly
            )));
        }
        if host.connect_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "host.connect_timeout_ms must be non-zero".to_string(),
            ));
        }
        if host.response_timeout_ms == 0 || host.chunk_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "host.response_timeout_ms and host.chunk_timeout_ms must be non-zero"
                    .to_string(),
            ));
        }
        if host.chunk_timeout_ms > host.response_timeout_ms {
            return Err(ConfigError::Validation(format!(
                "host.chunk_timeout_ms ({}) must not exceed host.response_timeout_ms ({})",
                host.chunk_timeout_ms, host.response_timeout_ms
            )));
        }
        if host.max_concurrent_sessions == 0 {
            return Err(ConfigError::Validation(
                "host.max_concurrent_sessions must be at least 1".to_string(),
            ));
        }

        if let Some(path) = &self.catalogue.path {
            if path.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "catalogue.path must not be empty when set".to_string(),
                ));
            }
        }

        Ok(())
    }
}
