//! Verifies the stems a finished separation left behind.

use crate::error::{RunError, RunResult};
use crate::model::{RunHandle, SeparatedOutputs, Stem};
use crate::workspace::is_regular_file;

/// Confirm both stems exist at `run/<base_name>/<stem>.wav`.
///
/// Only the nested layout is checked here; download resolution tolerates
/// other layouts separately.
///
/// # Errors
///
/// Returns [`RunError::OutputsMissing`] listing every absent stem, or
/// [`RunError::Storage`] if a stem location cannot be inspected.
pub async fn locate_outputs(run: &RunHandle, base_name: &str) -> RunResult<SeparatedOutputs> {
    let vocals = run.expected_output(base_name, Stem::Vocals);
    let accompaniment = run.expected_output(base_name, Stem::Accompaniment);

    let mut missing = Vec::new();
    for path in [&vocals, &accompaniment] {
        if !is_regular_file(path).await? {
            missing.push(path.clone());
        }
    }

    if missing.is_empty() {
        Ok(SeparatedOutputs {
            vocals,
            accompaniment,
        })
    } else {
        Err(RunError::OutputsMissing { missing })
    }
}
