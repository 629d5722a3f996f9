//! Default values applied when an environment variable is absent.
//!
//! # Design
//! - Centralize fallbacks so the loader and documentation stay consistent.
//! - Defaults target a local development host.

/// Directory that holds one subdirectory per separation run.
pub const DEFAULT_WORKSPACE_ROOT: &str = "/tmp/spleeter_runs";
/// Interface the HTTP listener binds to.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
/// Port the HTTP listener binds to.
pub const DEFAULT_HTTP_PORT: u16 = 8000;
/// Largest accepted request body for uploads (256 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;
/// Executable invoked to separate an upload into stems.
pub const DEFAULT_SEPARATOR_PROGRAM: &str = "spleeter";
/// Model descriptor passed to the separator program.
pub const DEFAULT_SEPARATOR_MODEL: &str = "spleeter:2stems";
/// Log level used when neither `RUST_LOG` nor the service variable is set.
pub const DEFAULT_LOG_LEVEL: &str = "info";
