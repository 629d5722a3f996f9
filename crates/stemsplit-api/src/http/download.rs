//! `GET /download/{run_id}/{filename}`: stream a stem back to the client.

use std::io;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{
        HeaderValue, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::Response,
};
use stemsplit_runs::RunError;
use stemsplit_telemetry::DownloadOutcome;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::http::constants::{DETAIL_FILE_NOT_FOUND, DETAIL_STORAGE_FAILURE, MEDIA_TYPE_WAV};
use crate::http::errors::ApiError;
use crate::state::ApiState;

pub(crate) async fn download(
    State(state): State<Arc<ApiState>>,
    Path((run_id, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let path = match state.runs.resolve_artifact(&run_id, &filename).await {
        Ok(path) => path,
        Err(err) => {
            let outcome = match err {
                RunError::InvalidPath { .. } => DownloadOutcome::Rejected,
                _ => DownloadOutcome::NotFound,
            };
            state.telemetry.inc_download(outcome);
            warn!(run_id = %run_id, filename = %filename, error = %err, "download not served");
            return Err(ApiError::from_download(&err));
        }
    };

    let file = File::open(&path).await.map_err(|err| open_failure(&err))?;
    let length = file
        .metadata()
        .await
        .map_err(|err| open_failure(&err))?
        .len();
    let served_name = path
        .file_name()
        .map_or_else(|| filename.clone(), |name| name.to_string_lossy().into_owned());

    state.telemetry.inc_download(DownloadOutcome::Served);
    debug!(run_id = %run_id, path = %path.display(), bytes = length, "serving artifact");

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, MEDIA_TYPE_WAV)
        .header(CONTENT_LENGTH, length)
        .header(CONTENT_DISPOSITION, content_disposition(&served_name))
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|err| ApiError::internal(err.to_string()))
}

fn open_failure(err: &io::Error) -> ApiError {
    if err.kind() == io::ErrorKind::NotFound {
        ApiError::not_found(DETAIL_FILE_NOT_FOUND)
    } else {
        ApiError::internal(DETAIL_STORAGE_FAILURE)
    }
}

/// `attachment` disposition; non-ASCII names also get an RFC 5987 `filename*`.
pub(crate) fn content_disposition(name: &str) -> HeaderValue {
    let ascii_safe = name
        .chars()
        .all(|ch| ch.is_ascii() && !ch.is_ascii_control() && ch != '"' && ch != '\\');
    let value = if ascii_safe {
        format!("attachment; filename=\"{name}\"")
    } else {
        let fallback: String = name
            .chars()
            .map(|ch| {
                if ch.is_ascii() && !ch.is_ascii_control() && ch != '"' && ch != '\\' {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            encode_rfc5987(name)
        )
    };
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn encode_rfc5987(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}
