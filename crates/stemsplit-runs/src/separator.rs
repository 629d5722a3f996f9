//! Source-separation capability.
//!
//! # Design
//! - The model is a black box behind the [`Separator`] trait; callers inject an `Arc<dyn Separator>`.
//! - [`CommandSeparator`] drives an external program as a child process so no runtime worker blocks.
//! - Failure causes stay opaque strings; only the rendered message reaches clients.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use stemsplit_config::SeparatorSettings;
use tokio::process::Command;
use tracing::debug;

use crate::error::SeparatorError;

/// Bytes of trailing stderr kept when the separator program fails.
const STDERR_TAIL_BYTES: usize = 512;

/// Capability that splits an audio file into named stems.
#[async_trait]
pub trait Separator: Send + Sync {
    /// Separate `input` and write the stems below `output_dir`.
    ///
    /// Implementations write `output_dir/<input stem>/{vocals,accompaniment}.wav`
    /// on success.
    async fn separate_to_file(&self, input: &Path, output_dir: &Path)
    -> Result<(), SeparatorError>;
}

/// Separator backed by an external command line program.
///
/// Invoked as `<program> separate -p <model> -o <output_dir> <input>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSeparator {
    program: String,
    model: String,
}

impl CommandSeparator {
    /// Build a separator for the given program and model descriptor.
    #[must_use]
    pub fn new(program: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            model: model.into(),
        }
    }

    /// Build a separator from configured settings.
    #[must_use]
    pub fn from_settings(settings: &SeparatorSettings) -> Self {
        Self::new(settings.program.clone(), settings.model.clone())
    }

    /// Program that is launched.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Model descriptor passed with `-p`.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Separator for CommandSeparator {
    async fn separate_to_file(
        &self,
        input: &Path,
        output_dir: &Path,
    ) -> Result<(), SeparatorError> {
        debug!(
            program = %self.program,
            model = %self.model,
            input = %input.display(),
            output_dir = %output_dir.display(),
            "launching separator"
        );
        let output = Command::new(&self.program)
            .arg("separate")
            .arg("-p")
            .arg(&self.model)
            .arg("-o")
            .arg(output_dir)
            .arg(input)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| SeparatorError::Launch {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(SeparatorError::ExitStatus {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: stderr_tail(&output.stderr),
            })
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.len() <= STDERR_TAIL_BYTES {
        return trimmed.to_string();
    }
    let mut start = trimmed.len() - STDERR_TAIL_BYTES;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &trimmed[start..])
}
