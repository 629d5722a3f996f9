//! Maps a `(run id, filename)` download request onto a file inside the run directory.
//!
//! # Design
//! - Both inputs are validated lexically before any path is joined or the filesystem touched.
//! - The run root is searched first, then each immediate subdirectory in enumeration order.
//! - Resolution is read-only.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::{RunError, RunResult};
use crate::model::final_segment;
use crate::workspace::{is_absent, is_regular_file};

/// Resolves download requests against the workspace root.
#[derive(Debug, Clone)]
pub struct ArtifactResolver {
    root: PathBuf,
}

impl ArtifactResolver {
    /// Resolver rooted at the workspace root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Locate `filename` for the given run.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::InvalidPath`] for traversal attempts or malformed
    /// segments, [`RunError::NotFound`] when nothing matches, and
    /// [`RunError::Storage`] if the run directory cannot be listed.
    pub async fn resolve(&self, run_id: &str, filename: &str) -> RunResult<PathBuf> {
        let name = validate_request(run_id, filename)?;
        let run_dir = self.root.join(run_id);
        let not_found = || RunError::NotFound {
            run_id: run_id.to_string(),
            filename: filename.to_string(),
        };

        let candidate = run_dir.join(name);
        if is_regular_file(&candidate).await? {
            debug!(run_id, path = %candidate.display(), "artifact resolved at run root");
            return Ok(candidate);
        }

        let mut entries = match fs::read_dir(&run_dir).await {
            Ok(entries) => entries,
            Err(err) if is_absent(&err) => return Err(not_found()),
            Err(source) => return Err(RunError::storage("read_run_dir", &run_dir, source)),
        };
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| RunError::storage("read_run_dir", &run_dir, source))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|source| RunError::storage("stat", entry.path(), source))?;
            if !file_type.is_dir() {
                continue;
            }
            let nested = entry.path().join(name);
            if is_regular_file(&nested).await? {
                debug!(run_id, path = %nested.display(), "artifact resolved in subdirectory");
                return Ok(nested);
            }
        }

        Err(not_found())
    }
}

/// Lexical checks on a download request; returns the filename segment to look up.
pub(crate) fn validate_request<'a>(run_id: &str, filename: &'a str) -> RunResult<&'a str> {
    if run_id.contains("..") {
        return Err(RunError::invalid_path("run_id", "parent_segment", run_id));
    }
    if filename.contains("..") {
        return Err(RunError::invalid_path("filename", "parent_segment", filename));
    }
    if run_id.contains('\0') || filename.contains('\0') {
        let (field, value) = if run_id.contains('\0') {
            ("run_id", run_id)
        } else {
            ("filename", filename)
        };
        return Err(RunError::invalid_path(field, "nul_byte", value));
    }
    if !is_single_segment(run_id) {
        return Err(RunError::invalid_path("run_id", "not_a_segment", run_id));
    }

    let name = final_segment(filename);
    if name.is_empty() || name == "." {
        return Err(RunError::invalid_path(
            "filename",
            "no_final_segment",
            filename,
        ));
    }
    Ok(name)
}

fn is_single_segment(value: &str) -> bool {
    if value.contains('\\') {
        return false;
    }
    let mut components = Path::new(value).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(segment)), None) if segment == OsStr::new(value)
    )
}
