//! Agents backed by a prompt template and an [`AgentExecutor`]

use crate::agent::{AgentError, AgentExecutor};
use crate::core::{Agent, PipelineContext};
use async_trait::async_trait;
use regex::{Captures, Regex};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

const RESPONSE_FORMAT: &str =
    "\n\n--- IMPORTANT: Respond with a single JSON object and nothing else.\n";

/// An LLM role: renders its instruction against the context, sends it to the
/// executor and returns the JSON object found in the reply.
pub struct PromptAgent {
    name: String,
    description: String,
    instruction: String,
    executor: Arc<dyn AgentExecutor>,
}

impl PromptAgent {
    pub fn new(
        name: impl Into<String>,
        instruction: impl Into<String>,
        executor: Arc<dyn AgentExecutor>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instruction: instruction.into(),
            executor,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// The full prompt this agent would send for `ctx`.
    ///
    /// Besides the context's rendering variables, `{{ unit }}` is this agent's
    /// name and `{{ state }}` is every unit output as one JSON object.
    pub fn build_prompt(&self, ctx: &PipelineContext) -> String {
        let mut variables = ctx.get_rendering_variables();
        variables.insert("unit".to_string(), self.name.clone());
        variables.insert(
            "state".to_string(),
            serde_json::to_string(ctx.state()).unwrap_or_default(),
        );
        format!(
            "{}{}",
            render_template(&self.instruction, &variables),
            RESPONSE_FORMAT
        )
    }
}

#[async_trait]
impl Agent for PromptAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn execute(&self, ctx: &PipelineContext) -> Result<Value, AgentError> {
        let prompt = self.build_prompt(ctx);
        debug!("{} prompt: {} bytes", self.name, prompt.len());

        let response = self.executor.execute(&prompt).await?;
        if let Some(ms) = response.elapsed_ms {
            debug!("{} replied in {}ms", self.name, ms);
        }
        let content = response.content.trim();
        if content.is_empty() {
            return Err(AgentError::InvalidOutput(format!(
                "{} returned an empty response",
                self.name
            )));
        }

        Ok(match extract_json(content) {
            Some(object) => Value::Object(object),
            None => json!({ "text": content }),
        })
    }
}

fn placeholder_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").ok())
        .as_ref()
}

fn fence_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?s)```json\s*(.*?)```").ok())
        .as_ref()
}

/// Replace `{{ key }}` placeholders; unknown keys are left as written
pub fn render_template(template: &str, variables: &HashMap<String, String>) -> String {
    match placeholder_pattern() {
        Some(pattern) => pattern
            .replace_all(template, |caps: &Captures| {
                variables
                    .get(&caps[1])
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned(),
        None => template.to_string(),
    }
}

/// First JSON object in a model reply.
///
/// A fenced ```json block wins; otherwise each `{...}` span is tried in order
/// and the first that parses as an object is returned.
pub fn extract_json(text: &str) -> Option<Map<String, Value>> {
    if let Some(pattern) = fence_pattern() {
        for caps in pattern.captures_iter(text) {
            if let Ok(Value::Object(map)) = serde_json::from_str(caps[1].trim()) {
                return Some(map);
            }
        }
    }

    let mut offset = 0;
    while let Some((start, end)) = next_object_span(&text[offset..]) {
        let start = offset + start;
        if let Some(end) = end {
            if let Ok(Value::Object(map)) = serde_json::from_str(&text[start..=offset + end]) {
                return Some(map);
            }
        }
        // resume just past this opening brace
        offset = start + 1;
    }
    None
}

/// Byte offsets of the first `{` in `text` and of its matching `}`, if any
fn next_object_span(text: &str) -> Option<(usize, Option<usize>)> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some((start, Some(start + i)));
                }
            }
            _ => {}
        }
    }
    Some((start, None))
}
