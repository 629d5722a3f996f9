//! Scratch workspace fixtures.

use std::path::{Path, PathBuf};

use anyhow::Result;
use stemsplit_runs::Stem;
use tempfile::TempDir;

/// Placeholder bytes written for every generated stem.
pub const STEM_BYTES: &[u8] = b"RIFF\0\0\0\0WAVEfmt ";

/// Create an empty temporary directory to use as a workspace root.
///
/// # Errors
///
/// Returns an error if the temporary directory cannot be created.
pub fn temp_workspace() -> Result<TempDir> {
    Ok(tempfile::Builder::new().prefix("stemsplit-").tempdir()?)
}

/// List the run directories currently present under `root`, sorted by name.
///
/// # Errors
///
/// Returns an error if `root` cannot be listed.
pub fn run_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Write both stems into `dir`, creating it if necessary.
///
/// # Errors
///
/// Returns an error if the directory or files cannot be written.
pub async fn write_stems(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    for stem in Stem::ALL {
        tokio::fs::write(dir.join(stem.file_name()), STEM_BYTES).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn written_stems_are_listed_as_files() -> Result<()> {
        let temp = temp_workspace()?;
        let run = temp.path().join("run-1");
        write_stems(&run.join("song")).await?;

        assert_eq!(run_dirs(temp.path())?, vec![run.clone()]);
        assert!(run.join("song/vocals.wav").is_file());
        assert!(run.join("song/accompaniment.wav").is_file());
        Ok(())
    }

    #[test]
    fn temp_workspace_uses_prefix() -> Result<()> {
        let temp = temp_workspace()?;
        let name = temp
            .path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        assert!(name.starts_with("stemsplit-"));
        Ok(())
    }
}
