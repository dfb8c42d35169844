//! Assembly of the marketing and outreach workflows

use crate::agent::{AgentExecutor, PromptAgent};
use crate::campaign::assignment::AbAssignment;
use crate::campaign::roles::{self, Role};
use crate::core::config::CampaignConfig;
use crate::core::{Agent, PipelineError, TerminationCondition, UnitRef};
use crate::execution::{AgentUnit, FailureMode, LoopUnit, Parallel, Sequential};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const COPYWRITER_LEGAL_SEQUENCE: &str = "copywriter_legal_sequence";
pub const COPYWRITER_LEGAL_LOOP: &str = "copywriter_legal_loop";
pub const REVIEWER_GROUP: &str = "kol_parallel";
pub const OUTREACH_PIPELINE: &str = "chief_marketing_agent";

/// Resolves the agent for each role: an explicit override, else a prompt
/// agent over the shared executor.
#[derive(Default, Clone)]
struct AgentSource {
    executor: Option<Arc<dyn AgentExecutor>>,
    /// Instruction overrides are read through [`CampaignConfig::instruction_for`]
    config: CampaignConfig,
    overrides: HashMap<String, Arc<dyn Agent>>,
    timeout: Option<Duration>,
}

impl AgentSource {
    /// `unit_name` differs from `role.name` only for reviewers
    fn unit_for(&self, role: &Role, unit_name: &str) -> Result<UnitRef, PipelineError> {
        let agent: Arc<dyn Agent> = match self.overrides.get(unit_name) {
            Some(agent) => agent.clone(),
            None => {
                let executor = self.executor.clone().ok_or_else(|| {
                    PipelineError::composition(
                        unit_name,
                        "no agent registered and no executor to build one",
                    )
                })?;
                let instruction = self.config.instruction_for(role.name, role.instruction);
                Arc::new(
                    PromptAgent::new(unit_name, instruction, executor)
                        .with_description(role.description),
                )
            }
        };
        Ok(self.wrap(agent))
    }

    fn wrap(&self, agent: Arc<dyn Agent>) -> UnitRef {
        let unit = AgentUnit::from_arc(agent);
        Arc::new(match self.timeout {
            Some(limit) => unit.with_timeout(limit),
            None => unit,
        })
    }
}

/// The end-to-end marketing agency workflow:
///
/// ```text
/// ceo -> loop(copywriter -> legal) -> market research -> A/B assignment
///     -> parallel(kol_1..kol_n) -> aggregator -> loop(copywriter -> legal) -> ceo
/// ```
///
/// The same loop runs twice; the CEO runs first for strategy and last for
/// sign-off.
pub struct MarketingPipeline;

impl MarketingPipeline {
    pub fn builder() -> MarketingPipelineBuilder {
        MarketingPipelineBuilder::default()
    }

    /// Builder pre-filled from configuration, with prompt agents over `executor`
    pub fn from_config(
        config: &CampaignConfig,
        executor: Arc<dyn AgentExecutor>,
    ) -> MarketingPipelineBuilder {
        let mut builder = Self::builder()
            .name(config.name.clone())
            .max_iterations(config.max_iterations)
            .reviewers(config.reviewers)
            .reviewer_failure_mode(config.reviewer_failure_mode)
            .unit_timeout(Duration::from_secs(config.unit_timeout_secs))
            .executor(executor);
        if let Some(seed) = config.ab_seed {
            builder = builder.ab_seed(seed);
        }
        builder.source.config = config.clone();
        builder
    }
}

/// Builder for [`MarketingPipeline`]
pub struct MarketingPipelineBuilder {
    name: String,
    max_iterations: usize,
    reviewers: usize,
    failure_mode: FailureMode,
    ab_seed: Option<u64>,
    source: AgentSource,
}

impl Default for MarketingPipelineBuilder {
    fn default() -> Self {
        Self {
            name: "marketing_agency_pipeline".to_string(),
            max_iterations: 6,
            reviewers: 10,
            failure_mode: FailureMode::ContinueOnFailure,
            ab_seed: None,
            source: AgentSource::default(),
        }
    }
}

impl MarketingPipelineBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Bound on copywriter/legal passes per loop run
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn reviewers(mut self, count: usize) -> Self {
        self.reviewers = count;
        self
    }

    pub fn reviewer_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    pub fn ab_seed(mut self, seed: u64) -> Self {
        self.ab_seed = Some(seed);
        self
    }

    pub fn unit_timeout(mut self, timeout: Duration) -> Self {
        self.source.timeout = Some(timeout);
        self
    }

    /// Executor used for every role without an explicit agent
    pub fn executor(mut self, executor: Arc<dyn AgentExecutor>) -> Self {
        self.source.executor = Some(executor);
        self
    }

    /// Replace the default instruction of a role
    pub fn instruction(mut self, role: impl Into<String>, instruction: impl Into<String>) -> Self {
        self.source
            .config
            .instructions
            .insert(role.into(), instruction.into());
        self
    }

    /// Use `agent` for the unit of the same name (e.g. `legal_agent`, `kol_4`)
    pub fn agent<A: Agent + 'static>(self, agent: A) -> Self {
        self.agent_arc(Arc::new(agent))
    }

    pub fn agent_arc(mut self, agent: Arc<dyn Agent>) -> Self {
        self.source
            .overrides
            .insert(agent.name().to_string(), agent);
        self
    }

    /// Assemble and validate the pipeline
    pub fn build(self) -> Result<Sequential, PipelineError> {
        let source = &self.source;

        let ceo = source.unit_for(&roles::CEO, roles::CEO.name)?;
        let revision_loop = copywriter_legal_loop(source, self.max_iterations)?;
        let research = source.unit_for(&roles::MARKET_RESEARCH, roles::MARKET_RESEARCH.name)?;

        let reviewer_names = roles::reviewers(self.reviewers);
        let assignment = match source.overrides.get(roles::AB_ASSIGNMENT) {
            Some(agent) => source.wrap(agent.clone()),
            None => {
                let mut ab = AbAssignment::new(reviewer_names.clone());
                if let Some(seed) = self.ab_seed {
                    ab = ab.with_seed(seed);
                }
                source.wrap(Arc::new(ab))
            }
        };

        let reviewers = reviewer_names
            .iter()
            .map(|name| source.unit_for(&roles::REVIEWER, name))
            .collect::<Result<Vec<_>, _>>()?;
        let reviewer_group: UnitRef = Arc::new(
            Parallel::new(REVIEWER_GROUP, reviewers)
                .with_description("Key opinion leaders review their assigned variant")
                .with_failure_mode(self.failure_mode),
        );

        let aggregator = source.unit_for(&roles::AGGREGATOR, roles::AGGREGATOR.name)?;

        let pipeline = Sequential::new(
            self.name,
            vec![
                ceo.clone(),
                revision_loop.clone(),
                research,
                assignment,
                reviewer_group,
                aggregator,
                revision_loop,
                ceo,
            ],
        )
        .with_description("End-to-end marketing agency pipeline");

        crate::core::Unit::validate(&pipeline)?;
        Ok(pipeline)
    }
}

/// Copywriter then legal, repeated until legal sets `all_clear`
fn copywriter_legal_loop(
    source: &AgentSource,
    max_iterations: usize,
) -> Result<UnitRef, PipelineError> {
    let body: UnitRef = Arc::new(
        Sequential::new(
            COPYWRITER_LEGAL_SEQUENCE,
            vec![
                source.unit_for(&roles::COPYWRITER, roles::COPYWRITER.name)?,
                source.unit_for(&roles::LEGAL, roles::LEGAL.name)?,
            ],
        )
        .with_description("Copywriter then legal"),
    );
    Ok(Arc::new(LoopUnit::new(
        COPYWRITER_LEGAL_LOOP,
        body,
        TerminationCondition::flag(roles::LEGAL.name, "all_clear"),
        max_iterations,
    )))
}

/// Lead finding followed by email drafting for one company
pub struct OutreachPipeline;

impl OutreachPipeline {
    pub fn builder() -> OutreachPipelineBuilder {
        OutreachPipelineBuilder::default()
    }

    pub fn from_config(
        config: &CampaignConfig,
        executor: Arc<dyn AgentExecutor>,
    ) -> OutreachPipelineBuilder {
        let mut builder = Self::builder()
            .unit_timeout(Duration::from_secs(config.unit_timeout_secs))
            .executor(executor);
        builder.source.config = config.clone();
        builder
    }
}

/// Builder for [`OutreachPipeline`]
#[derive(Default)]
pub struct OutreachPipelineBuilder {
    source: AgentSource,
}

impl OutreachPipelineBuilder {
    pub fn executor(mut self, executor: Arc<dyn AgentExecutor>) -> Self {
        self.source.executor = Some(executor);
        self
    }

    pub fn unit_timeout(mut self, timeout: Duration) -> Self {
        self.source.timeout = Some(timeout);
        self
    }

    pub fn agent<A: Agent + 'static>(mut self, agent: A) -> Self {
        self.source
            .overrides
            .insert(agent.name().to_string(), Arc::new(agent));
        self
    }

    pub fn build(self) -> Result<Sequential, PipelineError> {
        let pipeline = Sequential::new(
            OUTREACH_PIPELINE,
            vec![
                self.source
                    .unit_for(&roles::LEAD_FINDER, roles::LEAD_FINDER.name)?,
                self.source
                    .unit_for(&roles::EMAIL_DRAFTER, roles::EMAIL_DRAFTER.name)?,
            ],
        )
        .with_description("Chief marketing agent: lead finding then email drafting");
        crate::core::Unit::validate(&pipeline)?;
        Ok(pipeline)
    }
}
