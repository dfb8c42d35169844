//! Pipeline composition and execution engine

pub mod agent_unit;
pub mod engine;
pub mod loop_unit;
pub mod parallel;
pub mod sequential;

pub use agent_unit::{unit, AgentUnit};
pub use engine::{run, ExecutionEngine};
pub use loop_unit::LoopUnit;
pub use parallel::{FailureMode, Parallel};
pub use sequential::Sequential;
