#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Environment-backed configuration for the Stemsplit service.
//!
//! Layout: `model.rs` (typed settings), `validate.rs` (value parsing),
//! `loader.rs` (environment lookup), `defaults.rs` (fallback values).

mod defaults;
pub mod error;
mod loader;
pub mod model;
mod validate;

pub use defaults::{
    DEFAULT_BIND_ADDR, DEFAULT_HTTP_PORT, DEFAULT_LOG_LEVEL, DEFAULT_MAX_UPLOAD_BYTES,
    DEFAULT_SEPARATOR_MODEL, DEFAULT_SEPARATOR_PROGRAM, DEFAULT_WORKSPACE_ROOT,
};
pub use error::{ConfigError, ConfigResult};
pub use model::{LogFormatPreference, LoggingSettings, SeparatorSettings, ServerConfig};
