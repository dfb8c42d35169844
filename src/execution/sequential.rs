//! Sequential composition - runs units one after another on the same context

use crate::core::{PipelineContext, PipelineError, Unit, UnitRef};
use async_trait::async_trait;
use tracing::debug;

/// Runs its units in list order, feeding the same context forward.
///
/// The first failure stops the sequence. A unit may appear more than once;
/// each run overwrites its previous slot.
pub struct Sequential {
    name: String,
    description: Option<String>,
    units: Vec<UnitRef>,
}

impl Sequential {
    pub fn new(name: impl Into<String>, units: Vec<UnitRef>) -> Self {
        Self {
            name: name.into(),
            description: None,
            units,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn units(&self) -> &[UnitRef] {
        &self.units
    }
}

#[async_trait]
impl Unit for Sequential {
    fn name(&self) -> &str {
        &self.name
    }

    fn descendant_names(&self) -> Vec<String> {
        crate::core::unit::collect_names(&self.units)
    }

    fn validate(&self) -> Result<(), PipelineError> {
        crate::core::unit::validate_name(&self.name)?;
        if self.units.is_empty() {
            return Err(PipelineError::composition(
                &self.name,
                "a sequence needs at least one unit",
            ));
        }
        self.units.iter().try_for_each(|unit| unit.validate())
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        for (index, unit) in self.units.iter().enumerate() {
            if ctx.is_cancelled() {
                return Err(PipelineError::Cancelled {
                    unit: unit.name().to_string(),
                });
            }
            debug!(
                "Sequence {} step {}/{}: {}",
                self.name,
                index + 1,
                self.units.len(),
                unit.name()
            );
            unit.run(ctx).await?;
        }
        Ok(())
    }
}
