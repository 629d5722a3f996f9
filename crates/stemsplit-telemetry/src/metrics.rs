//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Outcome labels are closed enums so label cardinality stays bounded.

use std::convert::TryFrom;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use prometheus::core::Collector;
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Terminal outcome of a separation run, used as the `outcome` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Both stems were produced and verified.
    Ready,
    /// The upload was rejected before any work began.
    UnsupportedFormat,
    /// The upload name could not be used as a path segment.
    InvalidUpload,
    /// Workspace or upload I/O failed.
    StorageError,
    /// The separator capability reported a failure.
    SeparationFailed,
    /// The separator finished but expected stems were absent.
    OutputsMissing,
    /// The request driving the run went away before it reached an outcome.
    Abandoned,
}

impl RunOutcome {
    /// Label value recorded for this outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::UnsupportedFormat => "unsupported_format",
            Self::InvalidUpload => "invalid_upload",
            Self::StorageError => "storage_error",
            Self::SeparationFailed => "separation_failed",
            Self::OutputsMissing => "outputs_missing",
            Self::Abandoned => "abandoned",
        }
    }
}

/// Outcome of an artifact download, used as the `outcome` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The artifact was resolved and streamed.
    Served,
    /// No artifact matched the request.
    NotFound,
    /// The request was rejected as a path traversal attempt.
    Rejected,
}

impl DownloadOutcome {
    /// Label value recorded for this outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Served => "served",
            Self::NotFound => "not_found",
            Self::Rejected => "rejected",
        }
    }
}

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    runs_total: IntCounterVec,
    downloads_total: IntCounterVec,
    runs_in_flight: IntGauge,
    separation_last_duration_ms: IntGauge,
}

/// Snapshot of selected gauges and counters for health reporting.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Runs currently between workspace creation and a terminal outcome.
    pub runs_in_flight: i64,
    /// Wall-clock duration of the most recent separator invocation (ms).
    pub separation_last_duration_ms: i64,
    /// Total runs that reached the ready state.
    pub runs_ready_total: u64,
    /// Total runs that ended in any failure outcome.
    pub runs_failed_total: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = build(
            "http_requests_total",
            IntCounterVec::new(
                Opts::new("http_requests_total", "Total HTTP requests received"),
                &["route", "code"],
            ),
        )?;
        let runs_total = build(
            "runs_total",
            IntCounterVec::new(
                Opts::new("runs_total", "Separation runs by terminal outcome"),
                &["outcome"],
            ),
        )?;
        let downloads_total = build(
            "downloads_total",
            IntCounterVec::new(
                Opts::new("downloads_total", "Artifact download requests by outcome"),
                &["outcome"],
            ),
        )?;
        let runs_in_flight = build(
            "runs_in_flight",
            IntGauge::with_opts(Opts::new(
                "runs_in_flight",
                "Separation runs currently in progress",
            )),
        )?;
        let separation_last_duration_ms = build(
            "separation_last_duration_ms",
            IntGauge::with_opts(Opts::new(
                "separation_last_duration_ms",
                "Duration of the most recent separator invocation (ms)",
            )),
        )?;

        register(&registry, "http_requests_total", &http_requests_total)?;
        register(&registry, "runs_total", &runs_total)?;
        register(&registry, "downloads_total", &downloads_total)?;
        register(&registry, "runs_in_flight", &runs_in_flight)?;
        register(
            &registry,
            "separation_last_duration_ms",
            &separation_last_duration_ms,
        )?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                runs_total,
                downloads_total,
                runs_in_flight,
                separation_last_duration_ms,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Mark a run as started.
    pub fn run_started(&self) {
        self.inner.runs_in_flight.inc();
    }

    /// Mark a previously started run as finished with the given outcome.
    pub fn run_finished(&self, outcome: RunOutcome) {
        self.inner.runs_in_flight.dec();
        self.inc_run_outcome(outcome);
    }

    /// Count a run outcome without touching the in-flight gauge (used for
    /// uploads rejected before a run was started).
    pub fn inc_run_outcome(&self, outcome: RunOutcome) {
        self.inner
            .runs_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    /// Count a download request outcome.
    pub fn inc_download(&self, outcome: DownloadOutcome) {
        self.inner
            .downloads_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    /// Record how long the most recent separator invocation took.
    pub fn observe_separation(&self, duration: Duration) {
        self.inner
            .separation_last_duration_ms
            .set(Self::duration_to_ms(duration));
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the most relevant gauges and counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let ready = self
            .inner
            .runs_total
            .with_label_values(&[RunOutcome::Ready.as_str()])
            .get();
        let failed: u64 = [
            RunOutcome::UnsupportedFormat,
            RunOutcome::InvalidUpload,
            RunOutcome::StorageError,
            RunOutcome::SeparationFailed,
            RunOutcome::OutputsMissing,
            RunOutcome::Abandoned,
        ]
        .iter()
        .map(|outcome| {
            self.inner
                .runs_total
                .with_label_values(&[outcome.as_str()])
                .get()
        })
        .sum();
        MetricsSnapshot {
            runs_in_flight: self.inner.runs_in_flight.get(),
            separation_last_duration_ms: self.inner.separation_last_duration_ms.get(),
            runs_ready_total: ready,
            runs_failed_total: failed,
        }
    }

    /// Convert a duration to milliseconds saturating at `i64::MAX`.
    pub(crate) fn duration_to_ms(duration: Duration) -> i64 {
        i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
    }
}

fn build<C>(name: &'static str, collector: prometheus::Result<C>) -> Result<C> {
    collector.map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}
