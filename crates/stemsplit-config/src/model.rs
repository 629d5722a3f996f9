//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers; parsing lives in `validate.rs` and lookup in `loader.rs`.
//! - Values are validated once at startup and then treated as immutable.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Fully resolved service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Directory holding one subdirectory per separation run.
    pub workspace_root: PathBuf,
    /// IP address the HTTP listener binds to.
    pub bind_addr: IpAddr,
    /// Port the HTTP listener binds to.
    pub http_port: u16,
    /// Maximum accepted request body size for uploads, in bytes.
    pub max_upload_bytes: usize,
    /// External separator invocation settings.
    pub separator: SeparatorSettings,
    /// Logging preferences.
    pub logging: LoggingSettings,
}

impl ServerConfig {
    /// Socket address composed from the bind address and port.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.http_port)
    }
}

/// Settings for the external source-separation program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeparatorSettings {
    /// Executable name or path.
    pub program: String,
    /// Model descriptor handed to the program (for example `spleeter:2stems`).
    pub model: String,
}

/// Logging preferences resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive used when `RUST_LOG` is absent.
    pub level: String,
    /// Explicit output format; `None` lets the build profile decide.
    pub format: Option<LogFormatPreference>,
}

/// Output format requested for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatPreference {
    /// Structured JSON lines.
    Json,
    /// Human-readable output.
    Pretty,
}

impl FromStr for LogFormatPreference {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            _ => Err(ConfigError::invalid(
                "STEMSPLIT_LOG_FORMAT",
                "unknown_format",
                value,
            )),
        }
    }
}
