//! Subprocess client - runs a model command-line program per prompt

use crate::agent::AgentError;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Client for executing a model CLI as a subprocess
#[derive(Debug, Clone)]
pub struct SubprocessClient {
    program: String,
    args: Vec<String>,
    timeout_secs: u64,
}

impl SubprocessClient {
    /// Create a new subprocess client
    ///
    /// # Arguments
    /// * `program` - Executable to run (e.g., "pi", "/usr/local/bin/llm")
    /// * `args` - Fixed arguments placed before the prompt
    /// * `timeout_secs` - Timeout for command execution in seconds
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            program: program.into(),
            args,
            timeout_secs,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run `<program> <args...> <prompt>` and capture stdout
    ///
    /// # Errors
    /// Returns `AgentError` if:
    /// - The executable cannot be spawned
    /// - It exits with a non-zero status
    /// - The output is not valid UTF-8
    /// - The command times out
    pub async fn execute(&self, prompt: &str) -> Result<String, AgentError> {
        debug!(
            "Spawning {} subprocess with prompt length: {}",
            self.program,
            prompt.len()
        );

        let result = timeout(
            Duration::from_secs(self.timeout_secs),
            Command::new(&self.program)
                .args(&self.args)
                .arg(prompt)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| AgentError::Timeout(self.timeout_secs))?;

        let output = result.map_err(|e| {
            AgentError::Internal(format!("Failed to execute {}: {}", self.program, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            warn!("{} exited with code {}: {}", self.program, exit_code, stderr.trim());
            return Err(AgentError::Api(format!(
                "{} exited with code {}: {}",
                self.program,
                exit_code,
                stderr.trim()
            )));
        }

        let content = String::from_utf8(output.stdout).map_err(|e| {
            AgentError::Internal(format!("Failed to decode {} output: {}", self.program, e))
        })?;

        debug!("{} returned {} bytes of output", self.program, content.len());

        Ok(content)
    }
}
