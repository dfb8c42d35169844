//! Core domain models for campaign pipelines
//!
//! This module defines the shared context, the unit abstraction, termination
//! conditions, run state and the error taxonomy.

pub mod condition;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod state;
pub mod unit;

pub use condition::*;
pub use context::*;
pub use error::*;
pub use event::*;
pub use state::*;
pub use unit::*;
