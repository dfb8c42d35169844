//! Model collaborators: the command client and prompt-backed agents

pub mod client;
pub mod prompt_agent;
pub mod response;
pub mod subprocess_client;

use async_trait::async_trait;
use std::time::Instant;
pub use client::AgentClientConfig;
pub use prompt_agent::{extract_json, render_template, PromptAgent};
pub use response::{AgentError, AgentResponse};
pub use subprocess_client::SubprocessClient;

/// Trait for prompt execution - allows for different implementations
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    /// Send a prompt and wait for the full response
    async fn execute(&self, prompt: &str) -> Result<AgentResponse, AgentError>;
}

/// Executor that shells out to a model CLI for every prompt
#[derive(Debug, Clone)]
pub struct CommandAgentClient {
    subprocess_client: SubprocessClient,
}

impl CommandAgentClient {
    pub fn new(config: AgentClientConfig) -> Self {
        let subprocess_client =
            SubprocessClient::new(config.program, config.args, config.timeout_secs);
        Self { subprocess_client }
    }

    pub fn program(&self) -> &str {
        self.subprocess_client.program()
    }
}

#[async_trait]
impl AgentExecutor for CommandAgentClient {
    async fn execute(&self, prompt: &str) -> Result<AgentResponse, AgentError> {
        let started = Instant::now();
        let content = self.subprocess_client.execute(prompt).await?;
        Ok(AgentResponse::new(content).with_elapsed(started.elapsed()))
    }
}
