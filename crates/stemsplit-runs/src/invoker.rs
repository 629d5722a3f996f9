//! Runs the injected separator on its own task.
//!
//! # Design
//! - Every failure mode (returned error, panic, task cancellation) collapses into `SeparationFailed`.
//! - The separator task is detached from the request: dropping the caller does not stop it.

use std::any::Any;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinError;

use crate::error::{RunError, RunResult, SeparatorError};
use crate::separator::Separator;

/// Invokes a [`Separator`] and normalises its failures.
#[derive(Clone)]
pub struct SeparationInvoker {
    separator: Arc<dyn Separator>,
}

impl fmt::Debug for SeparationInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeparationInvoker").finish_non_exhaustive()
    }
}

impl SeparationInvoker {
    /// Wrap the separator capability.
    #[must_use]
    pub fn new(separator: Arc<dyn Separator>) -> Self {
        Self { separator }
    }

    /// Separate `input` into `output_dir`, returning how long the call took.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::SeparationFailed`] if the separator errors, panics,
    /// or its task is cancelled.
    pub async fn invoke(&self, input: &Path, output_dir: &Path) -> RunResult<Duration> {
        let separator = Arc::clone(&self.separator);
        let input = input.to_path_buf();
        let output_dir = output_dir.to_path_buf();
        let started = Instant::now();

        let task = tokio::spawn(async move {
            separator.separate_to_file(&input, &output_dir).await
        });
        let outcome = match task.await {
            Ok(result) => result,
            Err(err) => Err(join_failure(err)),
        };

        outcome
            .map(|()| started.elapsed())
            .map_err(|source| RunError::SeparationFailed { source })
    }
}

fn join_failure(err: JoinError) -> SeparatorError {
    if err.is_panic() {
        SeparatorError::Panicked {
            message: panic_message(err.into_panic().as_ref()),
        }
    } else {
        SeparatorError::Cancelled
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
