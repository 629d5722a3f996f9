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

//! HTTP API for the Stemsplit service.
//!
//! Layout: `http/` (router, handlers, middleware, problem responses),
//! `models.rs` (wire payloads), `state.rs` (shared handler state),
//! `error.rs` (server bootstrap errors).

pub mod error;
mod http;
pub mod models;
mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::router::ApiServer;
