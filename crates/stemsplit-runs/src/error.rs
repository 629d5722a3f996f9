//! # Design
//!
//! - Provide structured, constant-message errors for the run lifecycle.
//! - Capture operation context (paths, fields, inputs) to make failures reproducible in tests.
//! - Keep separator failures opaque: callers only see their rendered cause.

use std::io;
use std::path::PathBuf;

use stemsplit_telemetry::RunOutcome;
use thiserror::Error;

/// Result type for run lifecycle operations.
pub type RunResult<T> = Result<T, RunError>;

/// Errors produced while creating, driving, or resolving a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The upload's extension is not on the audio allow-list.
    #[error("unsupported audio format")]
    UnsupportedFormat {
        /// Filename supplied by the client.
        filename: String,
    },
    /// A client-supplied path component was rejected.
    #[error("invalid path")]
    InvalidPath {
        /// Input that was rejected.
        field: &'static str,
        /// Static reason for the rejection.
        reason: &'static str,
        /// Offending value.
        value: String,
    },
    /// Workspace or upload I/O failed.
    #[error("run storage failure")]
    Storage {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The separator capability failed for any reason.
    #[error("separation failed")]
    SeparationFailed {
        /// Opaque separator failure.
        source: SeparatorError,
    },
    /// The separator completed but did not leave the expected stems behind.
    #[error("output files missing")]
    OutputsMissing {
        /// Expected stem paths that do not exist.
        missing: Vec<PathBuf>,
    },
    /// No artifact matched the requested run and filename.
    #[error("artifact not found")]
    NotFound {
        /// Run identifier supplied by the client.
        run_id: String,
        /// Filename supplied by the client.
        filename: String,
    },
}

impl RunError {
    pub(crate) fn storage(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_path(field: &'static str, reason: &'static str, value: &str) -> Self {
        Self::InvalidPath {
            field,
            reason,
            value: value.to_string(),
        }
    }

    /// Metrics label describing how a run ended because of this error.
    ///
    /// `None` for [`RunError::NotFound`], which only download lookups produce.
    #[must_use]
    pub const fn outcome(&self) -> Option<RunOutcome> {
        match self {
            Self::UnsupportedFormat { .. } => Some(RunOutcome::UnsupportedFormat),
            Self::InvalidPath { .. } => Some(RunOutcome::InvalidUpload),
            Self::Storage { .. } => Some(RunOutcome::StorageError),
            Self::SeparationFailed { .. } => Some(RunOutcome::SeparationFailed),
            Self::OutputsMissing { .. } => Some(RunOutcome::OutputsMissing),
            Self::NotFound { .. } => None,
        }
    }
}

/// Failure reported by a [`crate::Separator`] implementation.
///
/// The rendered message is the client-visible cause of a failed run.
#[derive(Debug, Error)]
pub enum SeparatorError {
    /// The separator program could not be started.
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        /// Program that failed to start.
        program: String,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The separator program exited unsuccessfully.
    #[error("`{program}` {status}: {stderr}")]
    ExitStatus {
        /// Program that exited.
        program: String,
        /// Rendered exit status.
        status: String,
        /// Trailing stderr output.
        stderr: String,
    },
    /// The separator panicked while running.
    #[error("separator panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },
    /// The separator task was cancelled before completion.
    #[error("separator task was cancelled")]
    Cancelled,
    /// Any other failure reported by a separator implementation.
    #[error("{message}")]
    Other {
        /// Failure description.
        message: String,
    },
}

impl SeparatorError {
    /// Build an opaque failure from a message.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}
