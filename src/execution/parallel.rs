//! Parallel composition - fan-out over a shared snapshot, fan-in by unit name

use crate::core::{
    ErrorKind, ExecutionEvent, GroupReport, PipelineContext, PipelineError, Unit, UnitFailure, UnitRef,
};
use async_trait::async_trait;
use futures::future::{join_all, try_join_all};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

type Settled<'a> = (&'a str, PipelineContext, Result<(), PipelineError>);

/// How a parallel group handles failed siblings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Abort the group on the first failure; nothing is merged
    FailFast,
    /// Run every sibling, merge what succeeded, then fail with an aggregate error
    #[default]
    BestEffort,
    /// Run every sibling, merge what succeeded, record failures and carry on
    ContinueOnFailure,
}

/// Runs its units concurrently against copies of the same context snapshot.
///
/// Siblings cannot see each other's output. Once all have settled, each
/// sibling's writes are merged back; the group then writes a [`GroupReport`]
/// into its own slot.
pub struct Parallel {
    name: String,
    description: Option<String>,
    units: Vec<UnitRef>,
    mode: FailureMode,
}

impl Parallel {
    pub fn new(name: impl Into<String>, units: Vec<UnitRef>) -> Self {
        Self {
            name: name.into(),
            description: None,
            units,
            mode: FailureMode::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn failure_mode(&self) -> FailureMode {
        self.mode
    }

    pub fn units(&self) -> &[UnitRef] {
        &self.units
    }

    /// Fail if two settled siblings wrote the same state slot
    fn check_disjoint(&self, settled: &[Settled<'_>]) -> Result<(), PipelineError> {
        let mut claimed: HashMap<&str, &str> = HashMap::new();
        for (writer, child, result) in settled {
            if result.is_err() {
                continue;
            }
            for key in child.state_writes() {
                if let Some(previous) = claimed.insert(key.as_str(), *writer) {
                    return Err(PipelineError::composition(
                        &self.name,
                        format!(
                            "units '{}' and '{}' both wrote state slot '{}'",
                            previous, writer, key
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Copy a settled sibling's writes into the parent context
    fn merge(ctx: &mut PipelineContext, child: &PipelineContext) {
        for key in child.state_writes() {
            if let Some(output) = child.get_output(key) {
                ctx.record_output(key, serde_json::Value::Object(output.clone()));
            }
        }
        for key in child.meta_writes() {
            if let Some(value) = child.get_meta(key) {
                ctx.annotate(key.clone(), value.clone());
            }
        }
    }
}

#[async_trait]
impl Unit for Parallel {
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
                "a parallel group needs at least one unit",
            ));
        }

        crate::core::unit::ensure_slot_unshadowed(&self.name, &self.descendant_names())?;

        let mut seen = HashSet::new();
        for unit in &self.units {
            if !seen.insert(unit.name()) {
                return Err(PipelineError::composition(
                    &self.name,
                    format!("duplicate unit name '{}'", unit.name()),
                ));
            }
            unit.validate()?;
        }
        Ok(())
    }

    async fn run(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        if ctx.is_cancelled() {
            return Err(PipelineError::Cancelled {
                unit: self.name.clone(),
            });
        }

        info!(
            "Dispatching {} units in parallel group {}",
            self.units.len(),
            self.name
        );

        let snapshot: &PipelineContext = ctx;
        let settled: Vec<Settled<'_>> = if self.mode == FailureMode::FailFast {
            let runs = self.units.iter().map(|unit| {
                let mut child = snapshot.fork();
                async move {
                    unit.run(&mut child).await?;
                    Ok::<_, PipelineError>((unit.name(), child, Ok(())))
                }
            });
            try_join_all(runs).await?
        } else {
            let runs = self.units.iter().map(|unit| {
                let mut child = snapshot.fork();
                async move {
                    let result = unit.run(&mut child).await;
                    (unit.name(), child, result)
                }
            });
            join_all(runs).await
        };

        self.check_disjoint(&settled)?;

        let mut report = GroupReport::default();
        let mut failures: Vec<UnitFailure> = Vec::new();

        for (name, child, result) in &settled {
            match result {
                Ok(()) => {
                    Self::merge(ctx, child);
                    report.succeeded.push(name.to_string());
                }
                Err(e) => failures.extend(e.unit_failures()),
            }
        }
        report.failed = failures.clone();

        let report_value = serde_json::to_value(&report).unwrap_or_default();
        ctx.record_output(&self.name, report_value);
        ctx.control().emit(ExecutionEvent::GroupFinished {
            group: self.name.clone(),
            succeeded: report.succeeded.len(),
            failed: failures.len(),
        });

        if failures.is_empty() {
            info!("Parallel group {} completed", self.name);
            return Ok(());
        }

        if let Some(cancelled) = failures.iter().find(|f| f.kind == ErrorKind::Cancelled) {
            return Err(PipelineError::Cancelled {
                unit: cancelled.unit.clone(),
            });
        }

        match self.mode {
            FailureMode::ContinueOnFailure => {
                warn!(
                    "Parallel group {} continuing past {} failed unit(s)",
                    self.name,
                    failures.len()
                );
                ctx.control().tolerate(&failures);
                Ok(())
            }
            _ => Err(PipelineError::Aggregate {
                group: self.name.clone(),
                failures,
            }),
        }
    }
}
