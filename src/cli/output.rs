//! CLI output formatting

use crate::core::{ExecutionEvent, ExecutionStatus, LoopOutcome, PipelineFailure, RunState};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static LOOP: Emoji<'_, '_> = Emoji("🔁 ", "@ ");

/// Spinner shown while units run
pub fn create_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}") {
        spinner.set_style(spinner_style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
        ExecutionStatus::Cancelled => style("CANCELLED").yellow().to_string(),
    }
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::PipelineStarted {
            run_id,
            pipeline_name,
        } => format!(
            "{} Starting pipeline {} ({})",
            ROCKET,
            style(pipeline_name).bold(),
            style(&run_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::UnitStarted { unit } => format!("{} {}", SPINNER, style(unit).cyan()),
        ExecutionEvent::UnitCompleted { unit } => format!("{} {}", CHECK, style(unit).green()),
        ExecutionEvent::UnitFailed { unit, error } => {
            format!("{} {}: {}", CROSS, style(unit).red(), style(error).dim())
        }
        ExecutionEvent::LoopIteration {
            loop_name,
            iteration,
            max_iterations,
        } => format!(
            "{} {} pass {}/{}",
            LOOP,
            style(loop_name).yellow(),
            iteration,
            max_iterations
        ),
        ExecutionEvent::LoopFinished {
            loop_name,
            iterations,
            outcome,
        } => match outcome {
            LoopOutcome::Converged => format!(
                "{} {} converged after {} pass(es)",
                CHECK,
                style(loop_name).green(),
                iterations
            ),
            LoopOutcome::Exhausted => format!(
                "{} {} stopped at its bound of {} pass(es)",
                WARN,
                style(loop_name).yellow(),
                iterations
            ),
        },
        ExecutionEvent::GroupFinished {
            group,
            succeeded,
            failed,
        } => {
            let icon = if *failed == 0 { CHECK } else { WARN };
            format!(
                "{} {}: {} succeeded, {} failed",
                icon,
                style(group).bold(),
                style(succeeded).green(),
                style(failed).red()
            )
        }
        ExecutionEvent::PipelineCompleted { run_id, status } => {
            let status_str = match status {
                ExecutionStatus::Completed => {
                    format!("{} completed", style("successfully").green())
                }
                ExecutionStatus::Failed => style("failed").red().to_string(),
                other => format_status(*other),
            };
            format!(
                "{} Pipeline ({}) {}",
                INFO,
                style(&run_id.to_string()[..8]).dim(),
                status_str
            )
        }
    }
}

/// Format the structured failure of a run
pub fn format_failure(failure: &PipelineFailure) -> String {
    let mut out = format!(
        "{} {} in {}: {}",
        CROSS,
        style(format!("{:?}", failure.kind)).red(),
        style(&failure.unit).bold(),
        failure.message
    );
    for member in &failure.failures {
        out.push_str(&format!(
            "\n    - {}: {}",
            style(&member.unit).red(),
            style(&member.message).dim()
        ));
    }
    out
}

/// Format a finished run's summary line plus any tolerated failures
pub fn format_run_state(state: &RunState) -> String {
    let mut out = format!(
        "{} - {} ({} units completed, {} failed",
        style(&state.pipeline_name).bold(),
        format_status(state.status),
        style(state.units_completed).green(),
        style(state.units_failed).red()
    );
    if let Some(duration) = state.duration() {
        out.push_str(&format!(", {}", format_duration(duration)));
    }
    out.push(')');

    for failure in &state.tolerated_failures {
        out.push_str(&format!(
            "\n  {} tolerated failure in {}: {}",
            WARN,
            style(&failure.unit).yellow(),
            style(&failure.message).dim()
        ));
    }
    out
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
