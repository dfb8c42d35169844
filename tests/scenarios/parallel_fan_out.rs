//! Parallel composition: isolated siblings, merge by name, failure policies

use crate::helpers::*;
use campaign_pipeline::{
    unit, ErrorKind, ExecutionEvent, ExecutionStatus, FailureMode, Parallel, UnitRef,
};
use pretty_assertions::assert_eq;
use serde_json::json;

/// Ten reviewers with the given per-reviewer delays; reviewer #4 fails
fn reviewers(delays_ms: [u64; 10]) -> Vec<UnitRef> {
    delays_ms
        .iter()
        .enumerate()
        .map(|(i, delay)| {
            let name = format!("kol_{}", i + 1);
            if i + 1 == 4 {
                unit(ScriptedAgent::failing(&name).with_delay(std::time::Duration::from_millis(*delay)))
            } else {
                unit(SnapshotAgent::new(&name, *delay))
            }
        })
        .collect()
}

#[tokio::test]
async fn test_best_effort_keeps_nine_outputs_and_names_the_failure() {
    let group = Parallel::new("kol_parallel", reviewers([5, 30, 10, 1, 25, 0, 15, 20, 35, 2]));
    let mut ctx = brief_context("Launch X");

    let report = execute(&group, &mut ctx).await;

    assert_eq!(report.state.status, ExecutionStatus::Failed);
    let failure = report.failure.unwrap();
    assert_eq!(failure.kind, ErrorKind::CollaboratorFailure);
    assert_eq!(failure.unit, "kol_parallel");
    assert_eq!(failure.failures.len(), 1);
    assert_eq!(failure.failures[0].unit, "kol_4");
    assert!(failure.message.contains("kol_4"));

    for i in (1..=10).filter(|i| *i != 4) {
        assert!(ctx.get_output(&format!("kol_{}", i)).is_some(), "kol_{} missing", i);
    }
    assert!(ctx.get_output("kol_4").is_none());
    assert_eq!(report.state.units_completed, 9);
    assert_eq!(report.state.units_failed, 1);
}

#[tokio::test]
async fn test_final_state_is_independent_of_completion_order() {
    let fast_first = Parallel::new("kol_parallel", reviewers([0, 5, 10, 15, 20, 25, 30, 35, 40, 45]))
        .with_failure_mode(FailureMode::ContinueOnFailure);
    let slow_first = Parallel::new("kol_parallel", reviewers([45, 40, 35, 30, 25, 20, 15, 10, 5, 0]))
        .with_failure_mode(FailureMode::ContinueOnFailure);

    let mut first = brief_context("Launch X");
    let mut second = brief_context("Launch X");
    execute(&fast_first, &mut first).await;
    execute(&slow_first, &mut second).await;

    assert_eq!(first.state(), second.state());
    // nine reviewers plus the group report
    assert_eq!(first.state().len(), 10);
}

#[tokio::test]
async fn test_siblings_only_see_the_shared_snapshot() {
    let group = Parallel::new(
        "kol_parallel",
        vec![
            unit(SnapshotAgent::new("kol_1", 0)),
            unit(SnapshotAgent::new("kol_2", 20)),
        ],
    );
    let mut ctx = brief_context("Launch X");
    ctx.record_output("market_research_agent", json!({"survey": {}}));

    execute(&group, &mut ctx).await;

    for name in ["kol_1", "kol_2"] {
        assert_eq!(
            ctx.get_output(name).unwrap()["visible"],
            json!(["market_research_agent"])
        );
    }
}

#[tokio::test]
async fn test_continue_on_failure_surfaces_tolerated_failures() {
    let group = Parallel::new("kol_parallel", reviewers([0; 10]))
        .with_failure_mode(FailureMode::ContinueOnFailure);
    let (engine, events) = recording_engine();
    let mut ctx = brief_context("Launch X");

    let report = engine.execute(&group, &mut ctx).await;

    assert!(report.is_success());
    assert_eq!(report.state.tolerated_failures.len(), 1);
    assert_eq!(report.state.tolerated_failures[0].unit, "kol_4");

    let group_report = ctx.group_report("kol_parallel").unwrap();
    assert_eq!(group_report.succeeded.len(), 9);
    assert_eq!(group_report.failed[0].unit, "kol_4");

    let events = events.lock().unwrap();
    assert!(events.contains(&ExecutionEvent::GroupFinished {
        group: "kol_parallel".to_string(),
        succeeded: 9,
        failed: 1,
    }));
}

#[tokio::test]
async fn test_fail_fast_aborts_without_merging() {
    let group = Parallel::new(
        "kol_parallel",
        vec![
            unit(ScriptedAgent::new("kol_1", json!({"score": 9})).with_delay(std::time::Duration::from_millis(200))),
            unit(ScriptedAgent::failing("kol_2")),
        ],
    )
    .with_failure_mode(FailureMode::FailFast);
    let mut ctx = brief_context("Launch X");

    let report = execute(&group, &mut ctx).await;

    assert_eq!(report.failure.unwrap().unit, "kol_2");
    assert!(ctx.state().is_empty());
}

#[tokio::test]
async fn test_duplicate_names_rejected_before_running() {
    let first = ScriptedAgent::new("kol_1", json!({}));
    let first_calls = first.calls();
    let group = Parallel::new(
        "kol_parallel",
        vec![unit(first), unit(ScriptedAgent::new("kol_1", json!({})))],
    );
    let mut ctx = brief_context("Launch X");

    let report = execute(&group, &mut ctx).await;

    assert_eq!(report.failure.unwrap().kind, ErrorKind::CompositionError);
    assert_eq!(calls(&first_calls), 0);
}

#[tokio::test]
async fn test_grandchild_named_like_group_is_rejected() {
    let nested = ScriptedAgent::new("panel", json!({"score": 9}));
    let nested_calls = nested.calls();
    let inner: UnitRef = std::sync::Arc::new(campaign_pipeline::Sequential::new(
        "kol_sequence",
        vec![unit(nested)],
    ));
    let group = Parallel::new("panel", vec![inner]);
    let mut ctx = brief_context("Launch X");

    let report = execute(&group, &mut ctx).await;

    assert_eq!(report.failure.unwrap().kind, ErrorKind::CompositionError);
    assert_eq!(calls(&nested_calls), 0);
    assert!(ctx.get_output("panel").is_none());
}
