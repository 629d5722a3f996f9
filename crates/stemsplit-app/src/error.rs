//! # Design
//!
//! - Centralize application-level errors for bootstrap and serving.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: stemsplit_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: stemsplit_telemetry::TelemetryError,
    },
    /// Run workspace operations failed.
    #[error("run workspace operation failed")]
    Runs {
        /// Operation identifier.
        operation: &'static str,
        /// Source run error.
        source: stemsplit_runs::RunError,
    },
    /// API server operations failed.
    #[error("api server operation failed")]
    ApiServer {
        /// Operation identifier.
        operation: &'static str,
        /// Source API server error.
        source: stemsplit_api::ApiServerError,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: stemsplit_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: stemsplit_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn runs(operation: &'static str, source: stemsplit_runs::RunError) -> Self {
        Self::Runs { operation, source }
    }

    pub(crate) const fn api_server(
        operation: &'static str,
        source: stemsplit_api::ApiServerError,
    ) -> Self {
        Self::ApiServer { operation, source }
    }
}
