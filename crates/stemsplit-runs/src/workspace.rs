//! Per-run directory management.
//!
//! # Design
//! - One directory per run, named after the run id, directly under the workspace root.
//! - Run directories are created exclusively: an existing directory is a storage failure.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::error::{RunError, RunResult};
use crate::model::{RunHandle, RunId};

/// Owner of the workspace root and the run directories beneath it.
#[derive(Debug, Clone)]
pub struct RunWorkspace {
    root: PathBuf,
}

impl RunWorkspace {
    /// Open the workspace, creating the root directory if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Storage`] if the root cannot be created.
    pub async fn open(root: impl Into<PathBuf>) -> RunResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|source| RunError::storage("create_workspace_root", &root, source))?;
        info!(workspace_root = %root.display(), "run workspace ready");
        Ok(Self { root })
    }

    /// Root directory holding all runs.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory owned by the run with the given id.
    #[must_use]
    pub fn run_dir(&self, id: &RunId) -> PathBuf {
        self.root.join(id.to_string())
    }

    /// Allocate a fresh run id and create its directory.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Storage`] if the root or run directory cannot be
    /// created, including when the run directory already exists.
    pub async fn create_run(&self) -> RunResult<RunHandle> {
        let id = RunId::generate();
        let directory = self.run_dir(&id);

        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| RunError::storage("create_workspace_root", &self.root, source))?;
        fs::create_dir(&directory)
            .await
            .map_err(|source| RunError::storage("create_run_dir", &directory, source))?;

        debug!(run_id = %id, directory = %directory.display(), "run directory created");
        Ok(RunHandle::new(id, directory))
    }
}

/// Whether `path` exists and is a regular file (symlinks followed).
pub(crate) async fn is_regular_file(path: &Path) -> RunResult<bool> {
    match fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.is_file()),
        Err(err) if is_absent(&err) => Ok(false),
        Err(source) => Err(RunError::storage("stat", path, source)),
    }
}

pub(crate) fn is_absent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}
