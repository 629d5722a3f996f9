//! Upload persistence.
//!
//! # Design
//! - The upload is streamed chunk by chunk; it is never buffered whole in memory.
//! - The input file is created exclusively, so an upload is written at most once per run.
//! - A failure mid-stream leaves the truncated file in place and surfaces as a storage error.

use std::io;
use std::path::PathBuf;
use std::pin::pin;

use futures_util::{Stream, StreamExt};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{RunError, RunResult};
use crate::model::{RunHandle, RunState, UploadName};

/// Result of persisting an upload into a run directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedInput {
    /// Absolute path of the persisted upload.
    pub path: PathBuf,
    /// Number of bytes written.
    pub bytes_written: u64,
}

/// Stream `body` into the run directory under the upload's file name.
///
/// # Errors
///
/// Returns [`RunError::Storage`] if the file cannot be created or written, or
/// if the body stream yields an error.
pub async fn ingest<S, B>(
    run: &mut RunHandle,
    upload: &UploadName,
    body: S,
) -> RunResult<IngestedInput>
where
    S: Stream<Item = io::Result<B>>,
    B: AsRef<[u8]>,
{
    let path = run.input_path(upload);
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
        .map_err(|source| RunError::storage("create_input", &path, source))?;

    let mut body = pin!(body);
    let mut bytes_written: u64 = 0;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|source| RunError::storage("read_upload", &path, source))?;
        let bytes = chunk.as_ref();
        file.write_all(bytes)
            .await
            .map_err(|source| RunError::storage("write_input", &path, source))?;
        bytes_written += bytes.len() as u64;
    }
    file.flush()
        .await
        .map_err(|source| RunError::storage("flush_input", &path, source))?;

    run.advance(RunState::InputReceived);
    debug!(run_id = %run.id(), bytes_written, input = %path.display(), "upload persisted");
    Ok(IngestedInput {
        path,
        bytes_written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::RunWorkspace;
    use anyhow::Result;
    use futures_util::stream;
    use tempfile::TempDir;

    #[tokio::test]
    async fn ingest_streams_all_chunks() -> Result<()> {
        let temp = TempDir::new()?;
        let workspace = RunWorkspace::open(temp.path()).await?;
        let mut run = workspace.create_run().await?;
        let upload = UploadName::parse("song.mp3")?;
        let chunks: Vec<io::Result<Vec<u8>>> = vec![Ok(b"ID3".to_vec()), Ok(vec![0_u8; 1024])];

        let ingested = ingest(&mut run, &upload, stream::iter(chunks)).await?;

        assert_eq!(ingested.path, run.directory().join("song.mp3"));
        assert_eq!(ingested.bytes_written, 1027);
        assert_eq!(std::fs::read(&ingested.path)?.len(), 1027);
        assert_eq!(run.state(), RunState::InputReceived);
        Ok(())
    }

    #[tokio::test]
    async fn ingest_accepts_empty_body() -> Result<()> {
        let temp = TempDir::new()?;
        let workspace = RunWorkspace::open(temp.path()).await?;
        let mut run = workspace.create_run().await?;
        let upload = UploadName::parse("silence.wav")?;

        let ingested = ingest(&mut run, &upload, stream::empty::<io::Result<&[u8]>>()).await?;

        assert_eq!(ingested.bytes_written, 0);
        assert!(ingested.path.is_file());
        Ok(())
    }

    #[tokio::test]
    async fn stream_error_leaves_truncated_file() -> Result<()> {
        let temp = TempDir::new()?;
        let workspace = RunWorkspace::open(temp.path()).await?;
        let mut run = workspace.create_run().await?;
        let upload = UploadName::parse("song.mp3")?;
        let chunks: Vec<io::Result<&[u8]>> =
            vec![Ok(&b"partial"[..]), Err(io::Error::other("client went away"))];

        let err = ingest(&mut run, &upload, stream::iter(chunks)).await.err();

        assert!(matches!(
            err,
            Some(RunError::Storage {
                operation: "read_upload",
                ..
            })
        ));
        assert_eq!(std::fs::read(run.input_path(&upload))?, b"partial");
        assert_eq!(run.state(), RunState::Created);
        Ok(())
    }

    #[tokio::test]
    async fn input_is_written_exactly_once() -> Result<()> {
        let temp = TempDir::new()?;
        let workspace = RunWorkspace::open(temp.path()).await?;
        let mut run = workspace.create_run().await?;
        let upload = UploadName::parse("song.mp3")?;
        ingest(&mut run, &upload, stream::iter(vec![Ok::<_, io::Error>(b"one")])).await?;

        let err = ingest(&mut run, &upload, stream::iter(vec![Ok::<_, io::Error>(b"two")]))
            .await
            .err();

        assert!(matches!(
            err,
            Some(RunError::Storage {
                operation: "create_input",
                ..
            })
        ));
        assert_eq!(std::fs::read(run.input_path(&upload))?, b"one");
        Ok(())
    }
}
