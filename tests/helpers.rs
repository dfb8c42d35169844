//! Scripted agents and run helpers shared by the scenario tests
#![allow(dead_code)]

use async_trait::async_trait;
use campaign_pipeline::{
    Agent, AgentError, ExecutionEngine, ExecutionEvent, PipelineContext, RunReport, Unit,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Agent that returns scripted outputs in order, repeating the last one
pub struct ScriptedAgent {
    name: String,
    outputs: Vec<Value>,
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
    fail: bool,
}

impl ScriptedAgent {
    pub fn new(name: &str, output: Value) -> Self {
        Self::sequence(name, vec![output])
    }

    pub fn sequence(name: &str, outputs: Vec<Value>) -> Self {
        Self {
            name: name.to_string(),
            outputs,
            calls: Arc::new(AtomicUsize::new(0)),
            delay: None,
            fail: false,
        }
    }

    /// Always fails with a collaborator error
    pub fn failing(name: &str) -> Self {
        let mut agent = Self::new(name, Value::Null);
        agent.fail = true;
        agent
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Handle to the call counter
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &PipelineContext) -> Result<Value, AgentError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(AgentError::Api(format!("{} is unavailable", self.name)));
        }
        let index = n.min(self.outputs.len().saturating_sub(1));
        Ok(self.outputs.get(index).cloned().unwrap_or(Value::Null))
    }
}

/// Appends its name to the `trail` of the unit it follows
pub struct TrailAgent {
    name: String,
    after: Option<String>,
}

impl TrailAgent {
    pub fn first(name: &str) -> Self {
        Self {
            name: name.to_string(),
            after: None,
        }
    }

    pub fn after(name: &str, previous: &str) -> Self {
        Self {
            name: name.to_string(),
            after: Some(previous.to_string()),
        }
    }
}

#[async_trait]
impl Agent for TrailAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &PipelineContext) -> Result<Value, AgentError> {
        let mut trail: Vec<Value> = self
            .after
            .as_deref()
            .and_then(|previous| ctx.get_output(previous))
            .and_then(|output| output.get("trail"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        trail.push(Value::from(self.name.clone()));
        Ok(json!({ "trail": trail }))
    }
}

/// Reports which state slots it could see, after an optional delay
pub struct SnapshotAgent {
    name: String,
    delay: Duration,
}

impl SnapshotAgent {
    pub fn new(name: &str, delay_ms: u64) -> Self {
        Self {
            name: name.to_string(),
            delay: Duration::from_millis(delay_ms),
        }
    }
}

#[async_trait]
impl Agent for SnapshotAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &PipelineContext) -> Result<Value, AgentError> {
        tokio::time::sleep(self.delay).await;
        let visible: Vec<String> = ctx.state().keys().cloned().collect();
        Ok(json!({ "visible": visible, "score": 7 }))
    }
}

/// Engine whose events are recorded in order
pub fn recording_engine() -> (ExecutionEngine, Arc<Mutex<Vec<ExecutionEvent>>>) {
    let engine = ExecutionEngine::new();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    engine.add_event_handler(move |event| sink.lock().unwrap().push(event.clone()));
    (engine, events)
}

/// Run `pipeline` on a fresh engine
pub async fn execute(pipeline: &dyn Unit, ctx: &mut PipelineContext) -> RunReport {
    ExecutionEngine::new().execute(pipeline, ctx).await
}

pub fn brief_context(brief: &str) -> PipelineContext {
    PipelineContext::builder()
        .with_input("brief", brief)
        .with_default("brand", "Acme Bio")
        .build()
}

pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}
