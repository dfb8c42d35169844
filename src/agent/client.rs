//! Agent client configuration

use crate::core::config::AgentCommandConfig;

/// Configuration for the model command client
#[derive(Debug, Clone)]
pub struct AgentClientConfig {
    /// Program to run; defaults to `pi` on PATH
    pub program: String,

    /// Arguments placed before the prompt
    pub args: Vec<String>,

    /// Timeout for requests in seconds
    pub timeout_secs: u64,
}

impl Default for AgentClientConfig {
    fn default() -> Self {
        AgentCommandConfig::default().into()
    }
}

impl From<AgentCommandConfig> for AgentClientConfig {
    fn from(config: AgentCommandConfig) -> Self {
        Self {
            program: config.command,
            args: config.args,
            timeout_secs: config.timeout_secs,
        }
    }
}

impl AgentClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
