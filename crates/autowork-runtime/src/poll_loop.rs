use std::time::Duration;

use autowork_classifier::ClassificationOracle;
use tokio::time::MissedTickBehavior;

use crate::pipeline::{CycleError, PipelineState, PollCycleReport, WorkPipeline};

#[derive(Debug)]
pub enum PollEvent<'a> {
    CycleStarted {
        cycle: usize,
    },
    CycleFinished {
        cycle: usize,
        outcome: &'a Result<PollCycleReport, CycleError>,
    },
}

/// Runs poll cycles on a fixed interval, the first one immediately.
///
/// Cycles never overlap: a slow cycle delays the next tick instead of queueing
/// extra ones. Cycle errors are handed to `on_event` and the loop keeps going.
/// With `max_cycles` unset the loop only ends when the process is terminated.
pub async fn run_poll_loop<O, F>(
    pipeline: &WorkPipeline<O>,
    state: &mut PipelineState,
    interval: Duration,
    max_cycles: Option<usize>,
    mut on_event: F,
) -> usize
where
    O: ClassificationOracle,
    F: FnMut(PollEvent<'_>),
{
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut completed = 0_usize;
    loop {
        if max_cycles.is_some_and(|limit| completed >= limit) {
            return completed;
        }
        ticker.tick().await;
        let cycle = completed + 1;
        on_event(PollEvent::CycleStarted { cycle });
        let outcome = pipeline.run_cycle(state).await;
        if let Err(error) = &outcome {
            tracing::warn!(cycle, error = %error, "poll cycle failed");
        }
        on_event(PollEvent::CycleFinished {
            cycle,
            outcome: &outcome,
        });
        completed = cycle;
    }
}
