//! Leaf unit - runs one agent and stores its output in the agent's own slot

use crate::agent::AgentError;
use crate::core::{Agent, ExecutionEvent, PipelineContext, PipelineError, Unit};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info};

/// Wraps an [`Agent`] as a [`Unit`].
///
/// The agent gets a read-only context; only this wrapper writes, and only to
/// `state[agent.name()]`.
pub struct AgentUnit {
    agent: Arc<dyn Agent>,
    timeout: Option<Duration>,
}

impl AgentUnit {
    pub fn new<A: Agent + 'static>(agent: A) -> Self {
        Self::from_arc(Arc::new(agent))
    }

    pub fn from_arc(agent: Arc<dyn Agent>) -> Self {
        Self {
            agent,
            timeout: None,
        }
    }

    /// Fail the unit if the agent takes longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl Unit for AgentUnit {
    fn name(&self) -> &str {
        self.agent.name()
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let name = self.agent.name();

        if ctx.is_cancelled() {
            return Err(PipelineError::Cancelled {
                unit: name.to_string(),
            });
        }

        info!("Running unit: {}", name);
        ctx.control().emit(ExecutionEvent::UnitStarted {
            unit: name.to_string(),
        });

        let result = match self.timeout {
            Some(limit) => match timeout(limit, self.agent.execute(ctx)).await {
                Ok(result) => result,
                Err(_) => Err(AgentError::Timeout(limit.as_secs())),
            },
            None => self.agent.execute(ctx).await,
        };

        match result {
            Ok(output) => {
                debug!("Unit {} produced: {}", name, output);
                ctx.record_output(name, output);
                ctx.control().unit_completed();
                ctx.control().emit(ExecutionEvent::UnitCompleted {
                    unit: name.to_string(),
                });
                Ok(())
            }
            Err(e) => {
                error!("Unit {} failed: {}", name, e);
                ctx.control().unit_failed();
                ctx.control().emit(ExecutionEvent::UnitFailed {
                    unit: name.to_string(),
                    error: e.to_string(),
                });
                Err(PipelineError::Collaborator {
                    unit: name.to_string(),
                    source: e,
                })
            }
        }
    }
}

/// Wrap an agent as a shared unit
pub fn unit<A: Agent + 'static>(agent: A) -> Arc<dyn Unit> {
    Arc::new(AgentUnit::new(agent))
}
