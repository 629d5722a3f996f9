//! Orchestrates a separation run from upload to verified stems.
//!
//! # Design
//! - Upload names are validated before a run directory exists, so rejected uploads leave no trace.
//! - Each lifecycle step advances the run state; any error marks the run failed.
//! - Outcomes are mirrored into metrics and logged with the run id.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::Stream;
use stemsplit_telemetry::{Metrics, RunOutcome, current_request_id};
use tracing::{debug, info, warn};

use crate::error::RunResult;
use crate::ingest::ingest;
use crate::invoker::SeparationInvoker;
use crate::locator::locate_outputs;
use crate::model::{CompletedRun, RunHandle, RunId, RunState, UploadName};
use crate::resolver::ArtifactResolver;
use crate::separator::Separator;
use crate::workspace::RunWorkspace;

/// Entry point for separation requests and artifact lookups.
#[derive(Debug, Clone)]
pub struct RunService {
    workspace: RunWorkspace,
    invoker: SeparationInvoker,
    resolver: ArtifactResolver,
    metrics: Metrics,
}

impl RunService {
    /// Assemble the service from an opened workspace and a separator.
    #[must_use]
    pub fn new(workspace: RunWorkspace, separator: Arc<dyn Separator>, metrics: Metrics) -> Self {
        let resolver = ArtifactResolver::new(workspace.root());
        Self {
            workspace,
            invoker: SeparationInvoker::new(separator),
            resolver,
            metrics,
        }
    }

    /// Root directory holding the runs.
    #[must_use]
    pub fn workspace_root(&self) -> &Path {
        self.workspace.root()
    }

    /// Run a full separation for one upload.
    ///
    /// Dropping the returned future mid-run records the run as abandoned.
    ///
    /// # Errors
    ///
    /// Returns an `UnsupportedFormat` or `InvalidPath` [`RunError`](crate::RunError)
    /// for rejected upload names (no run directory is created), and `Storage`,
    /// `SeparationFailed`, or `OutputsMissing` when the run fails after it was
    /// created.
    pub async fn separate_upload<S, B>(&self, raw_filename: &str, body: S) -> RunResult<CompletedRun>
    where
        S: Stream<Item = io::Result<B>>,
        B: AsRef<[u8]>,
    {
        let request_id = current_request_id().unwrap_or_default();
        let upload = UploadName::parse(raw_filename).inspect_err(|err| {
            if let Some(outcome) = err.outcome() {
                self.metrics.inc_run_outcome(outcome);
            }
            warn!(request_id = %request_id, filename = raw_filename, error = %err, "upload rejected");
        })?;
        let mut run = self.workspace.create_run().await.inspect_err(|err| {
            if let Some(outcome) = err.outcome() {
                self.metrics.inc_run_outcome(outcome);
            }
            warn!(request_id = %request_id, error = %err, "run directory could not be created");
        })?;

        let in_flight = InFlightRun::start(&self.metrics, run.id(), request_id.clone());
        info!(
            request_id = %request_id,
            run_id = %run.id(),
            filename = upload.file_name(),
            "run started"
        );

        match self.drive(&mut run, &upload, body).await {
            Ok(completed) => {
                in_flight.finish(RunOutcome::Ready);
                info!(request_id = %request_id, run_id = %run.id(), state = %run.state(), "run ready");
                Ok(completed)
            }
            Err(err) => {
                let reached = run.state();
                run.advance(RunState::Failed);
                if let Some(outcome) = err.outcome() {
                    in_flight.finish(outcome);
                }
                warn!(
                    request_id = %request_id,
                    run_id = %run.id(),
                    reached = %reached,
                    error = %err,
                    cause = ?std::error::Error::source(&err).map(|source| source.to_string()),
                    "run failed"
                );
                Err(err)
            }
        }
    }

    async fn drive<S, B>(
        &self,
        run: &mut RunHandle,
        upload: &UploadName,
        body: S,
    ) -> RunResult<CompletedRun>
    where
        S: Stream<Item = io::Result<B>>,
        B: AsRef<[u8]>,
    {
        let input = ingest(run, upload, body).await?;

        let elapsed = self.invoker.invoke(&input.path, run.directory()).await?;
        self.metrics.observe_separation(elapsed);
        run.advance(RunState::Separated);
        debug!(
            run_id = %run.id(),
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "separator finished"
        );

        let outputs = locate_outputs(run, upload.base_name()).await?;
        run.advance(RunState::Ready);

        Ok(CompletedRun {
            id: run.id(),
            directory: run.directory().to_path_buf(),
            input: input.path,
            outputs,
        })
    }

    /// Resolve a download request to a file path.
    ///
    /// # Errors
    ///
    /// See [`ArtifactResolver::resolve`].
    pub async fn resolve_artifact(&self, run_id: &str, filename: &str) -> RunResult<PathBuf> {
        self.resolver.resolve(run_id, filename).await
    }
}

/// Holds a slot in `runs_in_flight` until the run reports an outcome.
///
/// A guard dropped without [`InFlightRun::finish`] counts the run as abandoned.
struct InFlightRun {
    metrics: Metrics,
    run_id: RunId,
    request_id: String,
    settled: bool,
}

impl InFlightRun {
    fn start(metrics: &Metrics, run_id: RunId, request_id: String) -> Self {
        metrics.run_started();
        Self {
            metrics: metrics.clone(),
            run_id,
            request_id,
            settled: false,
        }
    }

    fn finish(mut self, outcome: RunOutcome) {
        self.settled = true;
        self.metrics.run_finished(outcome);
    }
}

impl Drop for InFlightRun {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        self.metrics.run_finished(RunOutcome::Abandoned);
        warn!(
            request_id = %self.request_id,
            run_id = %self.run_id,
            "run abandoned before reaching an outcome"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RunError, SeparatorError};
    use crate::model::Stem;
    use anyhow::Result;
    use async_trait::async_trait;
    use futures_util::stream;
    use tempfile::TempDir;

    /// Writes stems the way the two-stem model does: `<out>/<input stem>/<stem>.wav`.
    struct NestedWriter;

    #[async_trait]
    impl Separator for NestedWriter {
        async fn separate_to_file(
            &self,
            input: &Path,
            output_dir: &Path,
        ) -> Result<(), SeparatorError> {
            let stem_dir = input
                .file_stem()
                .map(|stem| output_dir.join(stem))
                .ok_or_else(|| SeparatorError::other("input has no stem"))?;
            tokio::fs::create_dir_all(&stem_dir)
                .await
                .map_err(|err| SeparatorError::other(err.to_string()))?;
            for stem in Stem::ALL {
                tokio::fs::write(stem_dir.join(stem.file_name()), b"RIFF")
                    .await
                    .map_err(|err| SeparatorError::other(err.to_string()))?;
            }
            Ok(())
        }
    }

    struct Refusing;

    #[async_trait]
    impl Separator for Refusing {
        async fn separate_to_file(&self, _: &Path, _: &Path) -> Result<(), SeparatorError> {
            Err(SeparatorError::other("out of memory"))
        }
    }

    struct Stalling;

    #[async_trait]
    impl Separator for Stalling {
        async fn separate_to_file(&self, _: &Path, _: &Path) -> Result<(), SeparatorError> {
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
            Ok(())
        }
    }

    async fn service(temp: &TempDir, separator: Arc<dyn Separator>) -> Result<RunService> {
        let workspace = RunWorkspace::open(temp.path()).await?;
        Ok(RunService::new(workspace, separator, Metrics::new()?))
    }

    fn body(bytes: &'static [u8]) -> impl Stream<Item = io::Result<&'static [u8]>> {
        stream::iter(vec![Ok::<_, io::Error>(bytes)])
    }

    #[tokio::test]
    async fn successful_run_produces_download_paths() -> Result<()> {
        let temp = TempDir::new()?;
        let runs = service(&temp, Arc::new(NestedWriter)).await?;

        let completed = runs.separate_upload("song.mp3", body(b"ID3")).await?;

        assert_eq!(completed.directory, temp.path().join(completed.id.to_string()));
        assert_eq!(completed.input, completed.directory.join("song.mp3"));
        assert_eq!(
            completed.download_path(Stem::Vocals),
            format!("{}/vocals.wav", completed.id)
        );
        let resolved = runs
            .resolve_artifact(&completed.id.to_string(), "accompaniment.wav")
            .await?;
        assert_eq!(resolved, completed.outputs.accompaniment);

        let snapshot = runs.metrics.snapshot();
        assert_eq!(snapshot.runs_ready_total, 1);
        assert_eq!(snapshot.runs_in_flight, 0);
        Ok(())
    }

    #[tokio::test]
    async fn unsupported_upload_creates_no_run() -> Result<()> {
        let temp = TempDir::new()?;
        let runs = service(&temp, Arc::new(NestedWriter)).await?;

        let err = runs.separate_upload("notes.txt", body(b"hello")).await.err();

        assert!(matches!(err, Some(RunError::UnsupportedFormat { .. })));
        assert_eq!(std::fs::read_dir(temp.path())?.count(), 0);
        assert_eq!(runs.metrics.snapshot().runs_failed_total, 1);
        Ok(())
    }

    #[tokio::test]
    async fn separator_failure_keeps_partial_run() -> Result<()> {
        let temp = TempDir::new()?;
        let runs = service(&temp, Arc::new(Refusing)).await?;

        let err = runs.separate_upload("song.wav", body(b"RIFF")).await.err();

        match err {
            Some(RunError::SeparationFailed { source }) => {
                assert_eq!(source.to_string(), "out of memory");
            }
            other => panic!("expected separation failure, got {other:?}"),
        }
        let runs_on_disk: Vec<_> = std::fs::read_dir(temp.path())?.collect::<io::Result<_>>()?;
        assert_eq!(runs_on_disk.len(), 1);
        assert!(runs_on_disk[0].path().join("song.wav").is_file());
        let snapshot = runs.metrics.snapshot();
        assert_eq!(snapshot.runs_failed_total, 1);
        assert_eq!(snapshot.runs_in_flight, 0);
        Ok(())
    }

    #[tokio::test]
    async fn dropped_request_releases_in_flight_slot() -> Result<()> {
        let temp = TempDir::new()?;
        let runs = service(&temp, Arc::new(Stalling)).await?;

        let task = {
            let runs = runs.clone();
            tokio::spawn(async move { runs.separate_upload("song.wav", body(b"RIFF")).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(runs.metrics.snapshot().runs_in_flight, 1);

        task.abort();
        let joined = task.await;
        assert!(joined.is_err_and(|err| err.is_cancelled()));

        let snapshot = runs.metrics.snapshot();
        assert_eq!(snapshot.runs_in_flight, 0);
        assert_eq!(snapshot.runs_failed_total, 1);
        assert!(runs.metrics.render()?.contains("runs_total{outcome=\"abandoned\"} 1"));
        Ok(())
    }
}
