//! Units - the composable building blocks of a pipeline

use crate::agent::AgentError;
use crate::core::{context::PipelineContext, error::PipelineError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// A named step that reads and extends the shared context.
///
/// Leaf agents, sequences, parallel groups and loops are all units, so any
/// composition can be nested inside another.
#[async_trait]
pub trait Unit: Send + Sync {
    /// Name of the unit; also the state slot it writes
    fn name(&self) -> &str;

    /// Check the structure of this unit (and its children) before running
    fn validate(&self) -> Result<(), PipelineError> {
        validate_name(self.name())
    }

    /// Names of every unit nested below this one, at any depth
    fn descendant_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Run the unit against the context
    async fn run(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError>;
}

/// Shared handle to a unit
pub type UnitRef = Arc<dyn Unit>;

/// An opaque external collaborator (LLM role, helper, heuristic).
///
/// Agents only get read access to the context; whatever they return is
/// stored under their own name by the surrounding unit.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    async fn execute(&self, ctx: &PipelineContext) -> Result<Value, AgentError>;
}

/// Names of `children` and of everything nested inside them
pub(crate) fn collect_names<'a>(children: impl IntoIterator<Item = &'a UnitRef>) -> Vec<String> {
    let mut names = Vec::new();
    for child in children {
        names.push(child.name().to_string());
        names.extend(child.descendant_names());
    }
    names
}

/// A composer that writes a report into its own slot must not contain a unit
/// with the same name.
pub(crate) fn ensure_slot_unshadowed(
    owner: &str,
    descendants: &[String],
) -> Result<(), PipelineError> {
    if descendants.iter().any(|name| name == owner) {
        return Err(PipelineError::composition(
            owner,
            format!("nested unit '{}' would share the composer's state slot", owner),
        ));
    }
    Ok(())
}

pub(crate) fn validate_name(name: &str) -> Result<(), PipelineError> {
    if name.trim().is_empty() {
        return Err(PipelineError::composition(
            "<unnamed>",
            "unit names must not be empty",
        ));
    }
    Ok(())
}
