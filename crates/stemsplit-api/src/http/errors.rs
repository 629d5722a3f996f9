//! RFC9457-style API error wrapper and run error mapping.

use std::io;

use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use stemsplit_runs::RunError;
use stemsplit_telemetry::{current_request_id, current_route};
use tracing::error;

use crate::http::constants::{
    DETAIL_FILE_NOT_FOUND, DETAIL_INVALID_FILENAME, DETAIL_MALFORMED_MULTIPART,
    DETAIL_OUTPUTS_MISSING, DETAIL_STORAGE_FAILURE, DETAIL_UNSUPPORTED_FORMAT,
    DETAIL_UPLOAD_TOO_LARGE, PROBLEM_BAD_REQUEST, PROBLEM_INTERNAL, PROBLEM_NOT_FOUND,
    PROBLEM_PAYLOAD_TOO_LARGE, PROBLEM_SEPARATION_FAILED, PROBLEM_SERVICE_UNAVAILABLE,
    PROBLEM_UNPROCESSABLE, PROBLEM_UNSUPPORTED_FORMAT,
};
use crate::models::ProblemDetails;

/// Structured API error rendered as a problem document.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) kind: &'static str,
    title: &'static str,
    detail: Option<String>,
}

impl ApiError {
    const fn new(status: StatusCode, kind: &'static str, title: &'static str) -> Self {
        Self {
            status,
            kind,
            title,
            detail: None,
        }
    }

    pub(crate) fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub(crate) fn internal(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            PROBLEM_INTERNAL,
            "internal server error",
        )
        .with_detail(detail)
    }

    pub(crate) const fn bad_request() -> Self {
        Self::new(StatusCode::BAD_REQUEST, PROBLEM_BAD_REQUEST, "bad request")
    }

    pub(crate) fn unsupported_format() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            PROBLEM_UNSUPPORTED_FORMAT,
            "unsupported audio format",
        )
        .with_detail(DETAIL_UNSUPPORTED_FORMAT)
    }

    pub(crate) fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            PROBLEM_UNPROCESSABLE,
            "unprocessable request",
        )
        .with_detail(detail)
    }

    pub(crate) fn payload_too_large() -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            PROBLEM_PAYLOAD_TOO_LARGE,
            "payload too large",
        )
        .with_detail(DETAIL_UPLOAD_TOO_LARGE)
    }

    pub(crate) fn not_found(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            PROBLEM_NOT_FOUND,
            "resource not found",
        )
        .with_detail(detail)
    }

    pub(crate) fn separation_failed(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            PROBLEM_SEPARATION_FAILED,
            "separation failed",
        )
        .with_detail(detail)
    }

    pub(crate) fn service_unavailable(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            PROBLEM_SERVICE_UNAVAILABLE,
            "service unavailable",
        )
        .with_detail(detail)
    }

    /// Map a multipart parsing failure, honouring the body limit status.
    pub(crate) fn from_multipart(err: &MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::payload_too_large()
        } else {
            Self::bad_request().with_detail(DETAIL_MALFORMED_MULTIPART)
        }
    }

    /// Map a failure of `POST /separate`.
    pub(crate) fn from_upload(err: &RunError) -> Self {
        match err {
            RunError::UnsupportedFormat { .. } => Self::unsupported_format(),
            RunError::InvalidPath { .. } => Self::bad_request().with_detail(DETAIL_INVALID_FILENAME),
            RunError::Storage { source, .. } => multipart_cause(source).map_or_else(
                || Self::internal(DETAIL_STORAGE_FAILURE),
                Self::from_multipart,
            ),
            RunError::SeparationFailed { source } => {
                Self::separation_failed(format!("Separation failed: {source}"))
            }
            RunError::OutputsMissing { .. } => Self::internal(DETAIL_OUTPUTS_MISSING),
            RunError::NotFound { .. } => Self::not_found(DETAIL_FILE_NOT_FOUND),
        }
    }

    /// Map a failure of `GET /download/{run_id}/{filename}`.
    pub(crate) fn from_download(err: &RunError) -> Self {
        match err {
            RunError::InvalidPath { .. } => Self::bad_request(),
            RunError::NotFound { .. } => Self::not_found(DETAIL_FILE_NOT_FOUND),
            _ => Self::internal(DETAIL_STORAGE_FAILURE),
        }
    }
}

/// Multipart error carried inside an upload stream failure, if any.
fn multipart_cause(source: &io::Error) -> Option<&MultipartError> {
    source
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<MultipartError>())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(
                request_id = %current_request_id().unwrap_or_default(),
                route = %current_route().unwrap_or_default(),
                status = self.status.as_u16(),
                detail = self.detail.as_deref().unwrap_or(self.title),
                "request failed"
            );
        }
        let body = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stemsplit_runs::SeparatorError;

    #[test]
    fn upload_errors_map_to_client_contract() {
        let unsupported = ApiError::from_upload(&RunError::UnsupportedFormat {
            filename: "a.txt".to_string(),
        });
        assert_eq!(unsupported.status, StatusCode::BAD_REQUEST);
        assert_eq!(unsupported.detail.as_deref(), Some("Unsupported audio format"));

        let failed = ApiError::from_upload(&RunError::SeparationFailed {
            source: SeparatorError::other("boom"),
        });
        assert_eq!(failed.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(failed.kind, PROBLEM_SEPARATION_FAILED);
        assert_eq!(failed.detail.as_deref(), Some("Separation failed: boom"));

        let missing = ApiError::from_upload(&RunError::OutputsMissing { missing: Vec::new() });
        assert_eq!(missing.detail.as_deref(), Some("Output files missing"));
    }

    #[test]
    fn plain_storage_errors_are_internal() {
        let err = RunError::Storage {
            operation: "write_input",
            path: "/tmp/x".into(),
            source: io::Error::other("disk full"),
        };
        let mapped = ApiError::from_upload(&err);
        assert_eq!(mapped.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(mapped.detail.as_deref(), Some("Run storage failure"));
    }

    #[test]
    fn download_errors_distinguish_traversal_and_absence() {
        let traversal = ApiError::from_download(&RunError::InvalidPath {
            field: "run_id",
            reason: "parent_segment",
            value: "..".to_string(),
        });
        assert_eq!(traversal.status, StatusCode::BAD_REQUEST);
        assert!(traversal.detail.is_none());

        let missing = ApiError::from_download(&RunError::NotFound {
            run_id: "abc".to_string(),
            filename: "vocals.wav".to_string(),
        });
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.detail.as_deref(), Some("File not found"));
    }

    #[tokio::test]
    async fn server_errors_render_inside_request_context() -> anyhow::Result<()> {
        let response = stemsplit_telemetry::with_request_context("req-7", "/separate", async {
            ApiError::from_upload(&RunError::OutputsMissing {
                missing: vec!["/runs/x/song/vocals.wav".into()],
            })
            .into_response()
        })
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let problem: ProblemDetails = serde_json::from_slice(&body)?;
        assert_eq!(problem.detail.as_deref(), Some("Output files missing"));
        Ok(())
    }
}
