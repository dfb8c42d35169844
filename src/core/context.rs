//! Pipeline context - the shared state threaded through every unit

use crate::core::error::UnitFailure;
use crate::core::event::{EventBus, ExecutionEvent};
use crate::core::state::{GroupReport, LoopReport};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// String-keyed map of arbitrary values
pub type ValueMap = serde_json::Map<String, Value>;

/// Execution context for a pipeline run
///
/// `inputs` and `defaults` are fixed at construction. Units only ever add to
/// `state` (one slot per unit name, last write wins) and `meta`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineContext {
    run_id: Uuid,

    /// Campaign inputs (e.g. the brief)
    inputs: ValueMap,

    /// Read-only configuration (brand, region, objective)
    defaults: ValueMap,

    /// Last output of each unit, keyed by unit name
    state: BTreeMap<String, ValueMap>,

    /// Cross-cutting annotations
    meta: ValueMap,

    /// Slots written since this context was forked
    #[serde(skip)]
    journal: Journal,

    #[serde(skip)]
    control: RunControl,
}

#[derive(Debug, Clone, Default)]
struct Journal {
    state: BTreeSet<String>,
    meta: BTreeSet<String>,
}

impl PipelineContext {
    /// Create a context from inputs and defaults
    pub fn new(inputs: ValueMap, defaults: ValueMap) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            inputs,
            defaults,
            state: BTreeMap::new(),
            meta: ValueMap::new(),
            journal: Journal::default(),
            control: RunControl::default(),
        }
    }

    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn inputs(&self) -> &ValueMap {
        &self.inputs
    }

    pub fn get_input(&self, key: &str) -> Option<&Value> {
        self.inputs.get(key)
    }

    /// Get an input as a string slice, if it is a string
    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.inputs.get(key).and_then(Value::as_str)
    }

    pub fn defaults(&self) -> &ValueMap {
        &self.defaults
    }

    pub fn get_default(&self, key: &str) -> Option<&Value> {
        self.defaults.get(key)
    }

    pub fn state(&self) -> &BTreeMap<String, ValueMap> {
        &self.state
    }

    /// Get the last output of a unit
    pub fn get_output(&self, unit: &str) -> Option<&ValueMap> {
        self.state.get(unit)
    }

    pub fn meta(&self) -> &ValueMap {
        &self.meta
    }

    pub fn get_meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    /// Store a unit's output in its own slot.
    ///
    /// Objects are stored as-is; any other value is wrapped as `{"output": value}`.
    pub fn record_output(&mut self, unit: &str, output: Value) {
        let output = match output {
            Value::Object(map) => map,
            other => {
                let mut map = ValueMap::new();
                map.insert("output".to_string(), other);
                map
            }
        };
        self.state.insert(unit.to_string(), output);
        self.journal.state.insert(unit.to_string());
    }

    /// Set a meta annotation
    pub fn annotate(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        self.meta.insert(key.clone(), value);
        self.journal.meta.insert(key);
    }

    /// Read-only view of `state` limited to the given unit names
    pub fn view<'a>(&'a self, scope: &'a [String]) -> StateView<'a> {
        StateView { ctx: self, scope }
    }

    /// Report written by the loop with this name, if it has finished at least once
    pub fn loop_report(&self, name: &str) -> Option<LoopReport> {
        self.state
            .get(name)
            .and_then(|slot| serde_json::from_value(Value::Object(slot.clone())).ok())
    }

    /// Report written by the parallel group with this name
    pub fn group_report(&self, name: &str) -> Option<GroupReport> {
        self.state
            .get(name)
            .and_then(|slot| serde_json::from_value(Value::Object(slot.clone())).ok())
    }

    /// Get all variables available for prompt rendering
    ///
    /// Inputs and defaults appear both bare and prefixed (`inputs.brief`,
    /// `defaults.brand`); inputs win over defaults for bare keys. Unit outputs
    /// are rendered as compact JSON under `state.<unit>`.
    pub fn get_rendering_variables(&self) -> HashMap<String, String> {
        let mut vars = HashMap::new();

        for (key, value) in &self.defaults {
            vars.insert(key.clone(), render_value(value));
            vars.insert(format!("defaults.{}", key), render_value(value));
        }

        for (key, value) in &self.inputs {
            vars.insert(key.clone(), render_value(value));
            vars.insert(format!("inputs.{}", key), render_value(value));
        }

        for (unit, output) in &self.state {
            vars.insert(
                format!("state.{}", unit),
                Value::Object(output.clone()).to_string(),
            );
        }

        for (key, value) in &self.meta {
            vars.insert(format!("meta.{}", key), render_value(value));
        }

        vars
    }

    pub fn control(&self) -> &RunControl {
        &self.control
    }

    pub fn is_cancelled(&self) -> bool {
        self.control.is_cancelled()
    }

    pub(crate) fn attach(&mut self, control: RunControl) {
        self.control = control;
    }

    /// Copy of this context with an empty write journal, for one parallel sibling
    pub(crate) fn fork(&self) -> Self {
        let mut child = self.clone();
        child.journal = Journal::default();
        child
    }

    pub(crate) fn state_writes(&self) -> impl Iterator<Item = &String> {
        self.journal.state.iter()
    }

    pub(crate) fn meta_writes(&self) -> impl Iterator<Item = &String> {
        self.journal.meta.iter()
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Builder for [`PipelineContext`]
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    inputs: ValueMap,
    defaults: ValueMap,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(key.into(), value.into());
        self
    }

    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    pub fn with_defaults<I, K>(mut self, defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (key, value) in defaults {
            self.defaults.insert(key.into(), value);
        }
        self
    }

    pub fn build(self) -> PipelineContext {
        PipelineContext::new(self.inputs, self.defaults)
    }
}

/// Narrow read-only view over `state`, scoped to a fixed set of unit names.
///
/// Lookups outside the scope behave as if the unit never ran.
#[derive(Debug, Clone, Copy)]
pub struct StateView<'a> {
    ctx: &'a PipelineContext,
    scope: &'a [String],
}

impl<'a> StateView<'a> {
    /// Last output of a unit in scope
    pub fn output(&self, unit: &str) -> Option<&'a ValueMap> {
        if !self.scope.iter().any(|s| s == unit) {
            debug!("State view denied access to out-of-scope unit '{}'", unit);
            return None;
        }
        self.ctx.state.get(unit)
    }

    /// Look up `key` in a unit's output, falling back to a nested `output` object
    pub fn value(&self, unit: &str, key: &str) -> Option<&'a Value> {
        let output = self.output(unit)?;
        output
            .get(key)
            .or_else(|| output.get("output").and_then(|nested| nested.get(key)))
    }

    /// Truthiness of a flag in a unit's output. Missing flags are false.
    pub fn flag(&self, unit: &str, key: &str) -> bool {
        self.value(unit, key).is_some_and(is_truthy)
    }

    /// Text of a unit's output: its `text` or `output` string, else the JSON form
    pub fn text(&self, unit: &str) -> Option<String> {
        let output = self.output(unit)?;
        let text = ["text", "output"]
            .iter()
            .find_map(|key| output.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| Value::Object(output.clone()).to_string());
        Some(text)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes"),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

/// Cooperative cancellation signal shared by every unit in a run
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct RunCounters {
    completed: AtomicUsize,
    failed: AtomicUsize,
    tolerated: Mutex<Vec<UnitFailure>>,
}

/// Per-run handles shared by a context and all of its forks
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    events: EventBus,
    cancellation: CancellationFlag,
    counters: Arc<RunCounters>,
}

impl RunControl {
    pub fn new(events: EventBus, cancellation: CancellationFlag) -> Self {
        Self {
            events,
            cancellation,
            counters: Arc::new(RunCounters::default()),
        }
    }

    pub fn emit(&self, event: ExecutionEvent) {
        self.events.emit(event);
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub(crate) fn unit_completed(&self) {
        self.counters.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn unit_failed(&self) {
        self.counters.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn tolerate(&self, failures: &[UnitFailure]) {
        let mut tolerated = self
            .counters
            .tolerated
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        tolerated.extend_from_slice(failures);
    }

    pub fn units_completed(&self) -> usize {
        self.counters.completed.load(Ordering::SeqCst)
    }

    pub fn units_failed(&self) -> usize {
        self.counters.failed.load(Ordering::SeqCst)
    }

    pub fn tolerated_failures(&self) -> Vec<UnitFailure> {
        self.counters
            .tolerated
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
