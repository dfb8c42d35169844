//! Campaign configuration from YAML

use crate::execution::FailureMode;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level campaign configuration loaded from YAML.
///
/// Every field is optional in the file; missing fields take the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    /// Name of the top-level pipeline unit
    pub name: String,

    /// Read-only defaults handed to every unit (brand, region, objective)
    pub defaults: BTreeMap<String, Value>,

    /// Bound on copywriter/legal revision passes
    pub max_iterations: usize,

    /// Number of key-opinion-leader reviewers in the fan-out
    pub reviewers: usize,

    /// Failure policy for the reviewer fan-out
    pub reviewer_failure_mode: FailureMode,

    /// Per-unit timeout for agent calls (in seconds)
    pub unit_timeout_secs: u64,

    /// Seed for the A/B assignment (random when unset)
    pub ab_seed: Option<u64>,

    /// Command used to reach the language model
    pub agent: AgentCommandConfig,

    /// Where the markdown deployment report is written
    pub output: String,

    /// Instruction overrides keyed by role name
    pub instructions: BTreeMap<String, String>,
}

/// The LLM command-line program invoked for every prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentCommandConfig {
    /// Program to execute
    pub command: String,

    /// Arguments placed before the prompt
    pub args: Vec<String>,

    /// Timeout for a single invocation (in seconds)
    pub timeout_secs: u64,
}

impl Default for AgentCommandConfig {
    fn default() -> Self {
        Self {
            command: "pi".to_string(),
            args: vec![
                "--mode".to_string(),
                "text".to_string(),
                "--print".to_string(),
                "--no-session".to_string(),
            ],
            timeout_secs: 600,
        }
    }
}

impl Default for CampaignConfig {
    fn default() -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert("brand".to_string(), Value::from("Acme Bio"));
        defaults.insert("region".to_string(), Value::from("US"));
        defaults.insert(
            "objective".to_string(),
            Value::from("Generate HCP awareness"),
        );

        Self {
            name: "marketing_agency_pipeline".to_string(),
            defaults,
            max_iterations: 6,
            reviewers: 10,
            reviewer_failure_mode: FailureMode::ContinueOnFailure,
            unit_timeout_secs: 300,
            ab_seed: None,
            agent: AgentCommandConfig::default(),
            output: "deploy_output.md".to_string(),
            instructions: BTreeMap::new(),
        }
    }
}

impl CampaignConfig {
    /// Load campaign configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse campaign configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: CampaignConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the campaign configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Pipeline name must not be empty");
        }
        if self.max_iterations == 0 {
            anyhow::bail!("max_iterations must be at least 1");
        }
        if self.reviewers == 0 {
            anyhow::bail!("reviewers must be at least 1");
        }
        if self.unit_timeout_secs == 0 {
            anyhow::bail!("unit_timeout_secs must be greater than 0");
        }
        if self.agent.timeout_secs == 0 {
            anyhow::bail!("agent.timeout_secs must be greater than 0");
        }
        if self.agent.command.trim().is_empty() {
            anyhow::bail!("agent.command must not be empty");
        }

        let known = crate::campaign::roles::known_role_names();
        for role in self.instructions.keys() {
            if !known.iter().any(|k| k == role) {
                anyhow::bail!(
                    "Instruction override for unknown role '{}' (known roles: {})",
                    role,
                    known.join(", ")
                );
            }
        }

        Ok(())
    }

    /// Override a default value
    pub fn set_default(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.defaults.insert(key.into(), value.into());
    }

    /// Instruction for a role, honouring overrides
    pub fn instruction_for<'a>(&'a self, role: &str, fallback: &'a str) -> &'a str {
        self.instructions
            .get(role)
            .map(String::as_str)
            .unwrap_or(fallback)
    }
}
