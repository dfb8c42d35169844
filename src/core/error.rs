//! Pipeline error taxonomy

use crate::agent::AgentError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad category of a pipeline failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A unit's external collaborator failed (model provider, subprocess, timeout)
    CollaboratorFailure,
    /// The pipeline was assembled incorrectly
    CompositionError,
    /// The run was cancelled before a unit could start
    Cancelled,
}

/// Errors raised while running a composed pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unit '{unit}' failed: {source}")]
    Collaborator {
        unit: String,
        #[source]
        source: AgentError,
    },

    #[error("invalid composition '{composition}': {reason}")]
    Composition { composition: String, reason: String },

    #[error("{} unit(s) failed in '{group}': {}", .failures.len(), unit_names(.failures))]
    Aggregate {
        group: String,
        failures: Vec<UnitFailure>,
    },

    #[error("run cancelled before '{unit}' started")]
    Cancelled { unit: String },
}

impl PipelineError {
    pub fn composition(composition: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::Composition {
            composition: composition.into(),
            reason: reason.into(),
        }
    }

    /// Error category
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Collaborator { .. } | PipelineError::Aggregate { .. } => {
                ErrorKind::CollaboratorFailure
            }
            PipelineError::Composition { .. } => ErrorKind::CompositionError,
            PipelineError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Name of the unit (or composition) the error originated from
    pub fn unit(&self) -> &str {
        match self {
            PipelineError::Collaborator { unit, .. } | PipelineError::Cancelled { unit } => unit,
            PipelineError::Composition { composition, .. } => composition,
            PipelineError::Aggregate { group, .. } => group,
        }
    }

    /// Flatten into per-unit failure records.
    ///
    /// Aggregate errors expand to their members; everything else is one record.
    pub fn unit_failures(&self) -> Vec<UnitFailure> {
        match self {
            PipelineError::Aggregate { failures, .. } => failures.clone(),
            other => vec![UnitFailure {
                unit: other.unit().to_string(),
                kind: other.kind(),
                message: other.to_string(),
            }],
        }
    }

    /// Structured, user-facing form of this error
    pub fn to_failure(&self) -> PipelineFailure {
        PipelineFailure {
            kind: self.kind(),
            unit: self.unit().to_string(),
            message: self.to_string(),
            failures: match self {
                PipelineError::Aggregate { failures, .. } => failures.clone(),
                _ => Vec::new(),
            },
        }
    }
}

/// A single unit's failure, as recorded in group reports and aggregate errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFailure {
    pub unit: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// The single structured failure surfaced by a top-level run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineFailure {
    pub kind: ErrorKind,

    /// Originating unit, composition or parallel group
    pub unit: String,

    pub message: String,

    /// Member failures when the failure came from a parallel group
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<UnitFailure>,
}

fn unit_names(failures: &[UnitFailure]) -> String {
    failures
        .iter()
        .map(|f| f.unit.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
