//! HTTP surface modules (router, handlers, middleware).

/// Shared constants and header names for HTTP surfaces.
pub(crate) mod constants;
/// Artifact download handler.
pub(crate) mod download;
/// Problem response helpers and error mapping.
pub(crate) mod errors;
/// Health and metrics endpoints.
pub(crate) mod health;
/// Router construction and server host.
pub(crate) mod router;
/// Upload and separation handler.
pub(crate) mod separate;
/// Metrics middleware for HTTP requests.
pub(crate) mod telemetry;
