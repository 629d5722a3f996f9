//! Shared state handed to every handler.

use stemsplit_runs::RunService;
use stemsplit_telemetry::Metrics;

pub(crate) struct ApiState {
    pub(crate) runs: RunService,
    pub(crate) telemetry: Metrics,
}

impl ApiState {
    pub(crate) const fn new(runs: RunService, telemetry: Metrics) -> Self {
        Self { runs, telemetry }
    }
}
