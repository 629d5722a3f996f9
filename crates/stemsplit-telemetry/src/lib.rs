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

//! Telemetry primitives shared across the Stemsplit workspace.
//!
//! This crate centralises logging, metrics, and request-context helpers so the
//! service binary and the HTTP surface adopt a consistent observability story.
//!
//! Layout: `init.rs` (subscriber setup), `context.rs` (span/task-local context),
//! `layers.rs` (request id middleware), `metrics.rs` (Prometheus registry).

mod context;
pub mod error;
mod init;
mod layers;
mod metrics;

pub use context::{GlobalContextGuard, current_request_id, current_route, with_request_context};
pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
pub use layers::{propagate_request_id_layer, set_request_id_layer};
pub use metrics::{DownloadOutcome, Metrics, MetricsSnapshot, RunOutcome};
