//! Bounded loop composition

use crate::core::{
    ExecutionEvent, LoopOutcome, LoopReport, PipelineContext, PipelineError,
    TerminationCondition, Unit, UnitRef,
};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Re-runs its body until the termination condition holds or the bound is hit.
///
/// The body always runs at least once. Reaching `max_iterations` is a normal
/// exit; the [`LoopReport`] written to `state[name]` tells the two apart.
/// Body failures propagate immediately and are never retried.
pub struct LoopUnit {
    name: String,
    body: UnitRef,
    condition: TerminationCondition,
    max_iterations: usize,
}

impl LoopUnit {
    pub fn new(
        name: impl Into<String>,
        body: UnitRef,
        condition: TerminationCondition,
        max_iterations: usize,
    ) -> Self {
        Self {
            name: name.into(),
            body,
            condition,
            max_iterations,
        }
    }

    pub fn body(&self) -> &UnitRef {
        &self.body
    }

    pub fn condition(&self) -> &TerminationCondition {
        &self.condition
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    fn iteration_key(&self) -> String {
        format!("{}.iteration", self.name)
    }

    fn finish(&self, ctx: &mut PipelineContext, iterations: usize, outcome: LoopOutcome) {
        let report = LoopReport {
            iterations,
            outcome,
        };
        ctx.record_output(
            &self.name,
            serde_json::to_value(&report).unwrap_or_default(),
        );
        ctx.control().emit(ExecutionEvent::LoopFinished {
            loop_name: self.name.clone(),
            iterations,
            outcome,
        });
    }
}

#[async_trait]
impl Unit for LoopUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn descendant_names(&self) -> Vec<String> {
        crate::core::unit::collect_names([&self.body])
    }

    fn validate(&self) -> Result<(), PipelineError> {
        crate::core::unit::validate_name(&self.name)?;
        if self.max_iterations == 0 {
            return Err(PipelineError::composition(
                &self.name,
                "max_iterations must be at least 1",
            ));
        }
        crate::core::unit::ensure_slot_unshadowed(&self.name, &self.descendant_names())?;
        self.body.validate()
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let mut iteration = 0;

        loop {
            if ctx.is_cancelled() {
                return Err(PipelineError::Cancelled {
                    unit: self.name.clone(),
                });
            }

            let pass = iteration + 1;
            debug!("Loop {} pass {}/{}", self.name, pass, self.max_iterations);
            ctx.annotate(self.iteration_key(), Value::from(pass));
            ctx.control().emit(ExecutionEvent::LoopIteration {
                loop_name: self.name.clone(),
                iteration: pass,
                max_iterations: self.max_iterations,
            });

            self.body.run(ctx).await?;

            if self.condition.is_met(ctx) {
                info!(
                    "Loop {} converged on {} after {} pass(es)",
                    self.name,
                    self.condition.description(),
                    pass
                );
                self.finish(ctx, pass, LoopOutcome::Converged);
                return Ok(());
            }

            iteration += 1;
            if iteration >= self.max_iterations {
                warn!(
                    "Loop {} exhausted {} pass(es) without {}",
                    self.name,
                    self.max_iterations,
                    self.condition.description()
                );
                self.finish(ctx, iteration, LoopOutcome::Exhausted);
                return Ok(());
            }
        }
    }
}
