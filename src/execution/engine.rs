//! Main execution engine - runs a composed pipeline from start to finish

use crate::core::{
    CancellationFlag, EventBus, ExecutionEvent, PipelineContext, PipelineError, RunControl,
    RunReport, RunState, Unit,
};
use tracing::{error, info, warn};

/// Top-level invocation of a pipeline.
///
/// The engine owns the event handlers and the cancellation flag; each call
/// to [`execute`](Self::execute) gets fresh counters.
#[derive(Debug, Clone, Default)]
pub struct ExecutionEngine {
    events: EventBus,
    cancellation: CancellationFlag,
}

impl ExecutionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(&ExecutionEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(handler);
    }

    /// Flag that stops the run before the next unit starts once raised
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancellation.clone()
    }

    /// Validate and run `pipeline` against `ctx`.
    ///
    /// Outputs produced before a failure stay in `ctx`.
    pub async fn execute(&self, pipeline: &dyn Unit, ctx: &mut PipelineContext) -> RunReport {
        let control = RunControl::new(self.events.clone(), self.cancellation.clone());
        ctx.attach(control.clone());

        let mut state = RunState::new(ctx.run_id(), pipeline.name());
        state.start();

        info!(
            "Starting pipeline execution: {} ({})",
            pipeline.name(),
            ctx.run_id()
        );
        control.emit(ExecutionEvent::PipelineStarted {
            run_id: ctx.run_id(),
            pipeline_name: pipeline.name().to_string(),
        });

        let result = match pipeline.validate() {
            Ok(()) => pipeline.run(ctx).await,
            Err(e) => Err(e),
        };

        state.units_completed = control.units_completed();
        state.units_failed = control.units_failed();
        state.tolerated_failures = control.tolerated_failures();

        let failure = match result {
            Ok(()) => {
                state.complete();
                None
            }
            Err(e @ PipelineError::Cancelled { .. }) => {
                warn!("Pipeline {} cancelled: {}", pipeline.name(), e);
                state.cancel();
                Some(e.to_failure())
            }
            Err(e) => {
                error!("Pipeline {} failed: {}", pipeline.name(), e);
                state.fail();
                Some(e.to_failure())
            }
        };

        info!(
            "Pipeline execution finished: {} - {:?}",
            pipeline.name(),
            state.status
        );
        control.emit(ExecutionEvent::PipelineCompleted {
            run_id: ctx.run_id(),
            status: state.status,
        });

        RunReport { state, failure }
    }
}

/// Validate and run `pipeline`, handing back the final context.
///
/// The plain functional entry point: no event handlers, no cancellation.
pub async fn run(pipeline: &dyn Unit, mut ctx: PipelineContext) -> Result<PipelineContext, PipelineError> {
    ctx.attach(RunControl::default());
    pipeline.validate()?;
    pipeline.run(&mut ctx).await?;
    Ok(ctx)
}
