//! Execution state models

use crate::core::error::{PipelineFailure, UnitFailure};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall pipeline execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Pipeline has not started
    Pending,
    /// Pipeline is currently running
    Running,
    /// Pipeline completed successfully
    Completed,
    /// Pipeline failed
    Failed,
    /// Pipeline was cancelled
    Cancelled,
}

/// How a loop finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopOutcome {
    /// The termination predicate held after a pass
    Converged,
    /// `max_iterations` passes ran without convergence
    Exhausted,
}

/// Written by a loop into its own state slot once it stops
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopReport {
    pub iterations: usize,
    pub outcome: LoopOutcome,
}

impl LoopReport {
    pub fn converged(&self) -> bool {
        self.outcome == LoopOutcome::Converged
    }
}

/// Written by a parallel group into its own state slot once every sibling settles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<UnitFailure>,
}

/// State of a single pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Unique run ID
    pub run_id: Uuid,

    /// Name of the top-level unit
    pub pipeline_name: String,

    /// Current execution status
    pub status: ExecutionStatus,

    /// When the run started
    pub started_at: Option<DateTime<Utc>>,

    /// When the run finished
    pub completed_at: Option<DateTime<Utc>>,

    /// Leaf units that completed (a unit run twice counts twice)
    pub units_completed: usize,

    /// Leaf units that failed
    pub units_failed: usize,

    /// Failures swallowed by `ContinueOnFailure` groups
    #[serde(default)]
    pub tolerated_failures: Vec<UnitFailure>,
}

impl RunState {
    pub fn new(run_id: Uuid, pipeline_name: impl Into<String>) -> Self {
        Self {
            run_id,
            pipeline_name: pipeline_name.into(),
            status: ExecutionStatus::Pending,
            started_at: None,
            completed_at: None,
            units_completed: 0,
            units_failed: 0,
            tolerated_failures: Vec::new(),
        }
    }

    /// Mark run as started
    pub fn start(&mut self) {
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Mark run as completed
    pub fn complete(&mut self) {
        self.status = ExecutionStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark run as failed
    pub fn fail(&mut self) {
        self.status = ExecutionStatus::Failed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark run as cancelled
    pub fn cancel(&mut self) {
        self.status = ExecutionStatus::Cancelled;
        self.completed_at = Some(Utc::now());
    }

    /// Wall-clock duration, once the run has finished
    pub fn duration(&self) -> Option<std::time::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => end.signed_duration_since(start).to_std().ok(),
            _ => None,
        }
    }
}

/// Result of a top-level run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub state: RunState,
    pub failure: Option<PipelineFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none() && self.state.status == ExecutionStatus::Completed
    }

    pub fn into_result(self) -> Result<RunState, PipelineFailure> {
        match self.failure {
            Some(failure) => Err(failure),
            None => Ok(self.state),
        }
    }
}
