//! Parsing helpers for raw environment values.

use std::net::IpAddr;
use std::path::PathBuf;

use crate::error::{ConfigError, ConfigResult};

pub(crate) fn parse_port(field: &'static str, value: &str) -> ConfigResult<u16> {
    let port = value
        .trim()
        .parse::<u16>()
        .map_err(|_| ConfigError::invalid(field, "not_a_port", value))?;
    if port == 0 {
        return Err(ConfigError::invalid(field, "zero", value));
    }
    Ok(port)
}

pub(crate) fn parse_bind_addr(field: &'static str, value: &str) -> ConfigResult<IpAddr> {
    value
        .trim()
        .parse::<IpAddr>()
        .map_err(|_| ConfigError::invalid(field, "not_an_ip_address", value))
}

pub(crate) fn parse_byte_limit(field: &'static str, value: &str) -> ConfigResult<usize> {
    let limit = value
        .trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::invalid(field, "not_a_number", value))?;
    if limit == 0 {
        return Err(ConfigError::invalid(field, "zero", value));
    }
    Ok(limit)
}

pub(crate) fn parse_directory(field: &'static str, value: &str) -> ConfigResult<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::invalid(field, "empty", value));
    }
    Ok(PathBuf::from(trimmed))
}

pub(crate) fn parse_non_empty(field: &'static str, value: &str) -> ConfigResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::invalid(field, "empty", value));
    }
    Ok(trimmed.to_string())
}
