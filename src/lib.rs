//! campaign-pipeline - agent pipelines for pharmaceutical marketing campaigns
//!
//! Units (leaf agents, sequences, parallel groups, bounded loops) compose
//! recursively and share one [`PipelineContext`] per run.

pub mod agent;
pub mod campaign;
pub mod cli;
pub mod core;
pub mod execution;
pub mod sink;

// Re-export commonly used types
pub use agent::{AgentClientConfig, AgentError, AgentExecutor, AgentResponse, CommandAgentClient, PromptAgent};
pub use campaign::{AbAssignment, MarketingPipeline, OutreachPipeline};
pub use core::config::CampaignConfig;
pub use core::{
    Agent, CancellationFlag, ErrorKind, ExecutionEvent, ExecutionStatus, LoopOutcome,
    LoopReport, PipelineContext, PipelineError, PipelineFailure, RunReport, RunState,
    TerminationCondition, Unit, UnitRef,
};
pub use execution::{run, unit, AgentUnit, ExecutionEngine, FailureMode, LoopUnit, Parallel, Sequential};
pub use sink::{DeploymentSink, InMemorySink, JsonFileSink, MarkdownFileSink};
