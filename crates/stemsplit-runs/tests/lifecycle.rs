use std::io;

use anyhow::Result;
use futures_util::stream;
use stemsplit_runs::{RunError, RunService, RunWorkspace, SeparatorError, Stem};
use stemsplit_telemetry::Metrics;
use stemsplit_test_support::fixtures::{run_dirs, temp_workspace};
use stemsplit_test_support::mocks::{StubBehaviour, StubSeparator};

fn body(bytes: &'static [u8]) -> stream::Iter<std::vec::IntoIter<io::Result<&'static [u8]>>> {
    stream::iter(vec![Ok(bytes)])
}

async fn service(root: &std::path::Path, stub: &StubSeparator) -> Result<RunService> {
    let workspace = RunWorkspace::open(root).await?;
    Ok(RunService::new(workspace, stub.shared(), Metrics::new()?))
}

#[tokio::test]
async fn nested_outputs_resolve_for_download() -> Result<()> {
    let temp = temp_workspace()?;
    let stub = StubSeparator::nested();
    let runs = service(temp.path(), &stub).await?;

    let completed = runs.separate_upload("My Track.FLAC", body(b"fLaC")).await?;
    let run_id = completed.id.to_string();

    for stem in Stem::ALL {
        let resolved = runs.resolve_artifact(&run_id, stem.file_name()).await?;
        assert_eq!(resolved, completed.outputs.path(stem));
        assert!(resolved.starts_with(temp.path().join(&run_id).join("My Track")));
    }
    assert_eq!(stub.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn flat_only_outputs_fail_verification_but_still_resolve() -> Result<()> {
    let temp = temp_workspace()?;
    let stub = StubSeparator::new(StubBehaviour::WriteFlat);
    let runs = service(temp.path(), &stub).await?;

    let err = runs.separate_upload("song.mp3", body(b"ID3")).await.err();
    assert!(matches!(err, Some(RunError::OutputsMissing { ref missing }) if missing.len() == 2));

    let dirs = run_dirs(temp.path())?;
    assert_eq!(dirs.len(), 1);
    let run_id = dirs[0]
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let resolved = runs.resolve_artifact(&run_id, "vocals.wav").await?;
    assert_eq!(resolved, dirs[0].join("vocals.wav"));
    Ok(())
}

#[tokio::test]
async fn concurrent_runs_get_distinct_directories() -> Result<()> {
    let temp = temp_workspace()?;
    let stub = StubSeparator::nested();
    let runs = service(temp.path(), &stub).await?;

    let mut handles = Vec::new();
    for index in 0..8 {
        let runs = runs.clone();
        handles.push(tokio::spawn(async move {
            let name = format!("take-{index}.wav");
            runs.separate_upload(&name, body(b"RIFF")).await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        let completed = handle.await??;
        let entries: Vec<_> = std::fs::read_dir(&completed.directory)?
            .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().into_owned()))
            .collect::<io::Result<_>>()?;
        assert_eq!(entries.len(), 2, "unexpected entries {entries:?}");
        ids.push(completed.id);
    }
    ids.sort_by_key(|id| *id.as_uuid());
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert_eq!(run_dirs(temp.path())?.len(), 8);
    assert_eq!(stub.calls(), 8);
    Ok(())
}

#[tokio::test]
async fn unsupported_upload_never_reaches_separator() -> Result<()> {
    let temp = temp_workspace()?;
    let stub = StubSeparator::nested();
    let runs = service(temp.path(), &stub).await?;

    let err = runs.separate_upload("clip.mp4", body(b"....")).await.err();

    assert!(matches!(err, Some(RunError::UnsupportedFormat { .. })));
    assert!(run_dirs(temp.path())?.is_empty());
    assert_eq!(stub.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn separator_panic_is_a_separation_failure() -> Result<()> {
    let temp = temp_workspace()?;
    let stub = StubSeparator::new(StubBehaviour::Panic("model crashed".to_string()));
    let runs = service(temp.path(), &stub).await?;

    let err = runs.separate_upload("song.ogg", body(b"OggS")).await.err();

    match err {
        Some(RunError::SeparationFailed {
            source: SeparatorError::Panicked { message },
        }) => assert_eq!(message, "model crashed"),
        other => panic!("expected panic to surface as separation failure, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn silent_separator_reports_missing_outputs() -> Result<()> {
    let temp = temp_workspace()?;
    let stub = StubSeparator::new(StubBehaviour::WriteNothing);
    let runs = service(temp.path(), &stub).await?;

    let err = runs.separate_upload("song.m4a", body(b"ftyp")).await.err();

    assert!(matches!(err, Some(RunError::OutputsMissing { .. })));
    let dirs = run_dirs(temp.path())?;
    assert_eq!(dirs.len(), 1);
    assert!(dirs[0].join("song.m4a").is_file());
    Ok(())
}

#[tokio::test]
async fn traversal_requests_are_rejected() -> Result<()> {
    let temp = temp_workspace()?;
    let stub = StubSeparator::nested();
    let runs = service(temp.path(), &stub).await?;
    let completed = runs.separate_upload("song.mp3", body(b"ID3")).await?;

    let run_err = runs.resolve_artifact("..", "vocals.wav").await.err();
    let file_err = runs
        .resolve_artifact(&completed.id.to_string(), "../song.mp3")
        .await
        .err();

    assert!(matches!(run_err, Some(RunError::InvalidPath { .. })));
    assert!(matches!(file_err, Some(RunError::InvalidPath { .. })));
    Ok(())
}
