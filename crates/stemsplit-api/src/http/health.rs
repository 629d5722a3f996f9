//! Health and diagnostics endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use stemsplit_telemetry::build_sha;
use tracing::{error, warn};

use crate::http::constants::{DETAIL_WORKSPACE_UNAVAILABLE, MEDIA_TYPE_METRICS};
use crate::http::errors::ApiError;
use crate::models::HealthResponse;
use crate::state::ApiState;

pub(crate) async fn health(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    let root = state.runs.workspace_root();
    match tokio::fs::metadata(root).await {
        Ok(metadata) if metadata.is_dir() => Ok(Json(HealthResponse {
            status: "ok".to_string(),
            build: build_sha().to_string(),
            workspace_root: root.display().to_string(),
        })),
        Ok(_) => {
            warn!(workspace_root = %root.display(), "workspace root is not a directory");
            Err(ApiError::service_unavailable(DETAIL_WORKSPACE_UNAVAILABLE))
        }
        Err(err) => {
            warn!(workspace_root = %root.display(), error = %err, "workspace root is unavailable");
            Err(ApiError::service_unavailable(DETAIL_WORKSPACE_UNAVAILABLE))
        }
    }
}

pub(crate) async fn metrics(State(state): State<Arc<ApiState>>) -> Result<Response, ApiError> {
    let body = state.telemetry.render().map_err(|err| {
        error!(error = %err, "failed to render metrics");
        ApiError::internal("failed to render metrics")
    })?;
    Ok((StatusCode::OK, [(CONTENT_TYPE, MEDIA_TYPE_METRICS)], body).into_response())
}
