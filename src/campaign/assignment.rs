//! A/B variant assignment for the reviewer fan-out

use crate::agent::AgentError;
use crate::campaign::roles::AB_ASSIGNMENT;
use crate::core::{Agent, PipelineContext};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};
use tracing::info;

/// Assigns every reviewer variant `"A"` or `"B"` with equal probability.
///
/// Output: `{ "<reviewer>": "A" | "B", ... }` under `state.ab_assignment`.
/// With a seed the assignment is the same on every run.
#[derive(Debug, Clone)]
pub struct AbAssignment {
    reviewers: Vec<String>,
    seed: Option<u64>,
}

impl AbAssignment {
    pub fn new(reviewers: Vec<String>) -> Self {
        Self {
            reviewers,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn reviewers(&self) -> &[String] {
        &self.reviewers
    }

    fn assign(&self) -> Map<String, Value> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.reviewers
            .iter()
            .map(|name| {
                let variant = if rng.gen_bool(0.5) { "A" } else { "B" };
                (name.clone(), Value::from(variant))
            })
            .collect()
    }
}

#[async_trait]
impl Agent for AbAssignment {
    fn name(&self) -> &str {
        AB_ASSIGNMENT
    }

    fn description(&self) -> &str {
        "Randomly assigns each reviewer variant A or B"
    }

    async fn execute(&self, _ctx: &PipelineContext) -> Result<Value, AgentError> {
        let assignment = self.assign();
        for (reviewer, variant) in &assignment {
            info!("A/B assignment: {} -> {}", reviewer, variant);
        }
        Ok(Value::Object(assignment))
    }
}
