//! `POST /separate`: accept an upload and run it through the separator.

use std::io;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use futures_util::TryStreamExt;
use tracing::{debug, info};

use crate::http::constants::{DETAIL_MALFORMED_MULTIPART, DETAIL_MISSING_FIELD, UPLOAD_FIELD};
use crate::http::errors::ApiError;
use crate::models::SeparateResponse;
use crate::state::ApiState;

/// Streams the `file` field into a new run; other form fields are skipped.
pub(crate) async fn separate(
    State(state): State<Arc<ApiState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SeparateResponse>, ApiError> {
    let mut multipart =
        multipart.map_err(|_| ApiError::bad_request().with_detail(DETAIL_MALFORMED_MULTIPART))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::from_multipart(&err))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = ?field.name(), "skipping form field");
            continue;
        }
        let filename = field
            .file_name()
            .map(ToOwned::to_owned)
            .ok_or_else(|| ApiError::unprocessable(DETAIL_MISSING_FIELD))?;

        let body = field.map_err(io::Error::other);
        let completed = state
            .runs
            .separate_upload(&filename, body)
            .await
            .map_err(|err| ApiError::from_upload(&err))?;

        info!(run_id = %completed.id, "separation completed");
        return Ok(Json(SeparateResponse::from_completed(&completed)));
    }

    Err(ApiError::unprocessable(DETAIL_MISSING_FIELD))
}
