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
#![allow(clippy::module_name_repetitions)]

//! Run-scoped job lifecycle and artifact resolution.
//!
//! A run is one upload: it gets a fresh UUID, an exclusive directory under the
//! workspace root, the persisted upload, and (after the separator succeeds)
//! two verified stems. Download requests are resolved back into that directory
//! without ever escaping it.
//!
//! Layout: `model.rs` (ids, states, names), `workspace.rs` (directories),
//! `ingest.rs` (upload streaming), `separator.rs` (capability trait and command
//! backend), `invoker.rs` (task isolation), `locator.rs` (output checks),
//! `resolver.rs` (downloads), `service.rs` (orchestration).

pub mod error;
mod ingest;
mod invoker;
mod locator;
pub mod model;
mod resolver;
mod separator;
mod service;
mod workspace;

pub use error::{RunError, RunResult, SeparatorError};
pub use ingest::{IngestedInput, ingest};
pub use invoker::SeparationInvoker;
pub use locator::locate_outputs;
pub use model::{
    ALLOWED_EXTENSIONS, CompletedRun, RunHandle, RunId, RunState, SeparatedOutputs, Stem,
    UploadName,
};
pub use resolver::ArtifactResolver;
pub use separator::{CommandSeparator, Separator};
pub use service::RunService;
pub use workspace::RunWorkspace;
