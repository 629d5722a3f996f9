//! Stub separator implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use stemsplit_runs::{Separator, SeparatorError};

use crate::fixtures::write_stems;

/// What a [`StubSeparator`] does when invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubBehaviour {
    /// Write both stems under `<output_dir>/<input stem>/`.
    WriteNested,
    /// Write both stems directly into `<output_dir>`.
    WriteFlat,
    /// Write nothing and report success.
    WriteNothing,
    /// Report a failure with the given message.
    Fail(String),
    /// Panic with the given message.
    Panic(String),
}

/// Separator double that follows a fixed [`StubBehaviour`].
#[derive(Debug, Clone)]
pub struct StubSeparator {
    behaviour: StubBehaviour,
    calls: Arc<AtomicUsize>,
}

impl StubSeparator {
    /// Stub that follows `behaviour` on every call.
    #[must_use]
    pub fn new(behaviour: StubBehaviour) -> Self {
        Self {
            behaviour,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Stub that mimics the two-stem model's nested output layout.
    #[must_use]
    pub fn nested() -> Self {
        Self::new(StubBehaviour::WriteNested)
    }

    /// Stub that fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(StubBehaviour::Fail(message.into()))
    }

    /// Number of times the stub has been invoked.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Share the stub as a separator trait object, keeping this handle for assertions.
    #[must_use]
    pub fn shared(&self) -> Arc<dyn Separator> {
        Arc::new(self.clone())
    }
}

fn nested_dir(input: &Path, output_dir: &Path) -> Result<PathBuf, SeparatorError> {
    input
        .file_stem()
        .map(|stem| output_dir.join(stem))
        .ok_or_else(|| SeparatorError::other("input path has no file stem"))
}

#[async_trait]
impl Separator for StubSeparator {
    async fn separate_to_file(
        &self,
        input: &Path,
        output_dir: &Path,
    ) -> Result<(), SeparatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            StubBehaviour::WriteNested => write_stems(&nested_dir(input, output_dir)?)
                .await
                .map_err(|err| SeparatorError::other(err.to_string())),
            StubBehaviour::WriteFlat => write_stems(output_dir)
                .await
                .map_err(|err| SeparatorError::other(err.to_string())),
            StubBehaviour::WriteNothing => Ok(()),
            StubBehaviour::Fail(message) => Err(SeparatorError::other(message.clone())),
            StubBehaviour::Panic(message) => panic!("{message}"),
        }
    }
}
