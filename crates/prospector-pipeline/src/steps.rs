use std::future::Future;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::error::{PipelineError, Step};

/// Wall-clock time spent in one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTiming {
    pub step: Step,
    pub duration: Duration,
}

impl StepTiming {
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Run one step, record its timing and emit the step lifecycle events.
///
/// A failing step is wrapped in [`PipelineError::StepFailure`].
pub(crate) async fn timed_step<T, F>(
    run_id: Uuid,
    step: Step,
    timings: &mut Vec<StepTiming>,
    work: F,
) -> Result<T, PipelineError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    tracing::info!(run_id = %run_id, step = %step, "step_started");
    let started = Instant::now();
    let result = work.await;
    let timing = StepTiming {
        step,
        duration: started.elapsed(),
    };
    timings.push(timing);
    let duration_ms = timing.duration_ms();

    match result {
        Ok(value) => {
            tracing::info!(run_id = %run_id, step = %step, duration_ms, "step_completed");
            Ok(value)
        }
        Err(source) => {
            tracing::error!(
                run_id = %run_id,
                step = %step,
                duration_ms,
                error = %format!("{source:#}"),
                "step_failed"
            );
            Err(PipelineError::StepFailure { step, source })
        }
    }
}
