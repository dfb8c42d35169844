//! Model reply and collaborator error types

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Ways a model collaborator can fail
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Invalid output: {0}")]
    InvalidOutput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Raw text returned by a model, with how long it took to produce
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentResponse {
    pub content: String,

    /// Wall-clock time of the call, when the executor measured it
    #[serde(default)]
    pub elapsed_ms: Option<u64>,
}

impl AgentResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            elapsed_ms: None,
        }
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = Some(elapsed.as_millis().min(u64::MAX as u128) as u64);
        self
    }
}
