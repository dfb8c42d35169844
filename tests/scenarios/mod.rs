//! Scenario-based tests for the composition engine

mod cancellation;
mod loop_bounds;
mod parallel_fan_out;
mod sequential_order;
