//! Shared HTTP constants (headers, problem URIs, client-facing details).

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";
pub(crate) const MEDIA_TYPE_WAV: &str = "audio/wav";
pub(crate) const MEDIA_TYPE_METRICS: &str = "text/plain; version=0.0.4";
pub(crate) const UPLOAD_FIELD: &str = "file";

pub(crate) const PROBLEM_INTERNAL: &str = "https://stemsplit.dev/problems/internal";
pub(crate) const PROBLEM_BAD_REQUEST: &str = "https://stemsplit.dev/problems/bad-request";
pub(crate) const PROBLEM_UNSUPPORTED_FORMAT: &str =
    "https://stemsplit.dev/problems/unsupported-format";
pub(crate) const PROBLEM_UNPROCESSABLE: &str = "https://stemsplit.dev/problems/unprocessable";
pub(crate) const PROBLEM_PAYLOAD_TOO_LARGE: &str =
    "https://stemsplit.dev/problems/payload-too-large";
pub(crate) const PROBLEM_NOT_FOUND: &str = "https://stemsplit.dev/problems/not-found";
pub(crate) const PROBLEM_SEPARATION_FAILED: &str =
    "https://stemsplit.dev/problems/separation-failed";
pub(crate) const PROBLEM_SERVICE_UNAVAILABLE: &str =
    "https://stemsplit.dev/problems/service-unavailable";

pub(crate) const DETAIL_UNSUPPORTED_FORMAT: &str = "Unsupported audio format";
pub(crate) const DETAIL_INVALID_FILENAME: &str = "Invalid upload filename";
pub(crate) const DETAIL_MISSING_FIELD: &str = "Missing upload field 'file'";
pub(crate) const DETAIL_MALFORMED_MULTIPART: &str = "Malformed multipart body";
pub(crate) const DETAIL_UPLOAD_TOO_LARGE: &str = "Upload exceeds the configured size limit";
pub(crate) const DETAIL_OUTPUTS_MISSING: &str = "Output files missing";
pub(crate) const DETAIL_STORAGE_FAILURE: &str = "Run storage failure";
pub(crate) const DETAIL_FILE_NOT_FOUND: &str = "File not found";
pub(crate) const DETAIL_WORKSPACE_UNAVAILABLE: &str = "Workspace root is unavailable";
