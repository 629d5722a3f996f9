//! Wire payloads returned by the HTTP API.

use serde::{Deserialize, Serialize};
use stemsplit_runs::{CompletedRun, Stem};

/// RFC9457 problem document returned for every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    /// URI reference identifying the problem type.
    pub kind: String,
    /// Short, human-readable summary of the issue.
    pub title: String,
    /// HTTP status code associated with the error.
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Client-facing explanation of this occurrence.
    pub detail: Option<String>,
}

/// Successful separation response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeparateResponse {
    /// Download URL of the vocals stem.
    pub vocals_url: String,
    /// Download URL of the accompaniment stem.
    pub music_url: String,
    /// Run identifier.
    pub id: String,
}

impl SeparateResponse {
    /// Build the response for a completed run.
    #[must_use]
    pub fn from_completed(run: &CompletedRun) -> Self {
        Self {
            vocals_url: format!("/download/{}", run.download_path(Stem::Vocals)),
            music_url: format!("/download/{}", run.download_path(Stem::Accompaniment)),
            id: run.id.to_string(),
        }
    }
}

/// Liveness payload served at `/health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// `ok` when the workspace root is usable.
    pub status: String,
    /// Build identifier.
    pub build: String,
    /// Workspace root the service writes runs into.
    pub workspace_root: String,
}
