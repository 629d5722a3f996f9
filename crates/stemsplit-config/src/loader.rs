//! Environment lookup that assembles a [`ServerConfig`].
//!
//! # Design
//! - Lookups go through an injected closure so tests never mutate process env.
//! - Absent variables fall back to `defaults.rs`; present-but-invalid values fail fast.

use std::net::IpAddr;
use std::path::PathBuf;

use tracing::debug;

use crate::defaults::{
    DEFAULT_BIND_ADDR, DEFAULT_HTTP_PORT, DEFAULT_LOG_LEVEL, DEFAULT_MAX_UPLOAD_BYTES,
    DEFAULT_SEPARATOR_MODEL, DEFAULT_SEPARATOR_PROGRAM, DEFAULT_WORKSPACE_ROOT,
};
use crate::error::ConfigResult;
use crate::model::{LogFormatPreference, LoggingSettings, SeparatorSettings, ServerConfig};
use crate::validate::{
    parse_bind_addr, parse_byte_limit, parse_directory, parse_non_empty, parse_port,
};

const ENV_WORKSPACE_ROOT: &str = "STEMSPLIT_WORKSPACE_ROOT";
const ENV_BIND_ADDR: &str = "STEMSPLIT_BIND_ADDR";
const ENV_HTTP_PORT: &str = "STEMSPLIT_HTTP_PORT";
const ENV_MAX_UPLOAD_BYTES: &str = "STEMSPLIT_MAX_UPLOAD_BYTES";
const ENV_SEPARATOR_PROGRAM: &str = "STEMSPLIT_SEPARATOR_PROGRAM";
const ENV_SEPARATOR_MODEL: &str = "STEMSPLIT_SEPARATOR_MODEL";
const ENV_LOG_LEVEL: &str = "STEMSPLIT_LOG_LEVEL";
const ENV_LOG_FORMAT: &str = "STEMSPLIT_LOG_FORMAT";

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::InvalidField`] when a variable is present but
    /// cannot be parsed.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::InvalidField`] when a variable is present but
    /// cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let workspace_root = match lookup(ENV_WORKSPACE_ROOT) {
            Some(value) => parse_directory(ENV_WORKSPACE_ROOT, &value)?,
            None => PathBuf::from(DEFAULT_WORKSPACE_ROOT),
        };
        let bind_addr = match lookup(ENV_BIND_ADDR) {
            Some(value) => parse_bind_addr(ENV_BIND_ADDR, &value)?,
            None => parse_bind_addr(ENV_BIND_ADDR, DEFAULT_BIND_ADDR)?,
        };
        let http_port = match lookup(ENV_HTTP_PORT) {
            Some(value) => parse_port(ENV_HTTP_PORT, &value)?,
            None => DEFAULT_HTTP_PORT,
        };
        let max_upload_bytes = match lookup(ENV_MAX_UPLOAD_BYTES) {
            Some(value) => parse_byte_limit(ENV_MAX_UPLOAD_BYTES, &value)?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };
        let program = match lookup(ENV_SEPARATOR_PROGRAM) {
            Some(value) => parse_non_empty(ENV_SEPARATOR_PROGRAM, &value)?,
            None => DEFAULT_SEPARATOR_PROGRAM.to_string(),
        };
        let model = match lookup(ENV_SEPARATOR_MODEL) {
            Some(value) => parse_non_empty(ENV_SEPARATOR_MODEL, &value)?,
            None => DEFAULT_SEPARATOR_MODEL.to_string(),
        };
        let level = match lookup(ENV_LOG_LEVEL) {
            Some(value) => parse_non_empty(ENV_LOG_LEVEL, &value)?,
            None => DEFAULT_LOG_LEVEL.to_string(),
        };
        let format = lookup(ENV_LOG_FORMAT)
            .map(|value| value.parse::<LogFormatPreference>())
            .transpose()?;

        let config = Self {
            workspace_root,
            bind_addr,
            http_port,
            max_upload_bytes,
            separator: SeparatorSettings { program, model },
            logging: LoggingSettings { level, format },
        };
        debug!(
            workspace_root = %config.workspace_root.display(),
            addr = %config.socket_addr(),
            "resolved server configuration"
        );
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from(DEFAULT_WORKSPACE_ROOT),
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            http_port: DEFAULT_HTTP_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            separator: SeparatorSettings {
                program: DEFAULT_SEPARATOR_PROGRAM.to_string(),
                model: DEFAULT_SEPARATOR_MODEL.to_string(),
            },
            logging: LoggingSettings {
                level: DEFAULT_LOG_LEVEL.to_string(),
                format: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |name| values.get(name).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() -> ConfigResult<()> {
        let config = ServerConfig::from_lookup(lookup_from(&[]))?;
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.workspace_root, PathBuf::from("/tmp/spleeter_runs"));
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8000");
        assert_eq!(config.separator.model, "spleeter:2stems");
        assert!(config.logging.format.is_none());
        Ok(())
    }

    #[test]
    fn overrides_are_applied() -> ConfigResult<()> {
        let config = ServerConfig::from_lookup(lookup_from(&[
            (ENV_WORKSPACE_ROOT, "/var/lib/stemsplit"),
            (ENV_BIND_ADDR, "127.0.0.1"),
            (ENV_HTTP_PORT, "9090"),
            (ENV_MAX_UPLOAD_BYTES, "4096"),
            (ENV_SEPARATOR_PROGRAM, "/opt/bin/spleeter"),
            (ENV_SEPARATOR_MODEL, "spleeter:4stems"),
            (ENV_LOG_LEVEL, "debug"),
            (ENV_LOG_FORMAT, "json"),
        ]))?;
        assert_eq!(config.workspace_root, PathBuf::from("/var/lib/stemsplit"));
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9090");
        assert_eq!(config.max_upload_bytes, 4096);
        assert_eq!(config.separator.program, "/opt/bin/spleeter");
        assert_eq!(config.separator.model, "spleeter:4stems");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, Some(LogFormatPreference::Json));
        Ok(())
    }

    #[test]
    fn invalid_values_report_the_offending_variable() {
        let err = ServerConfig::from_lookup(lookup_from(&[(ENV_HTTP_PORT, "0")])).err();
        assert_eq!(
            err,
            Some(ConfigError::InvalidField {
                field: ENV_HTTP_PORT,
                reason: "zero",
                value: Some("0".to_string()),
            })
        );

        let err = ServerConfig::from_lookup(lookup_from(&[(ENV_LOG_FORMAT, "yaml")])).err();
        assert_eq!(err.map(|err| err.field()), Some(ENV_LOG_FORMAT));

        let err = ServerConfig::from_lookup(lookup_from(&[(ENV_WORKSPACE_ROOT, " ")])).err();
        assert_eq!(err.map(|err| err.reason()), Some("empty"));
    }
}
