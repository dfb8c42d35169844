//! Bounded loops: convergence, exhaustion and the at-least-once rule

use crate::helpers::*;
use campaign_pipeline::{
    unit, ExecutionEvent, LoopOutcome, LoopUnit, Sequential, TerminationCondition, UnitRef,
};
use serde_json::json;
use std::sync::Arc;

fn legal_loop(outputs: Vec<serde_json::Value>, max: usize) -> (LoopUnit, Arc<std::sync::atomic::AtomicUsize>) {
    let legal = ScriptedAgent::sequence("legal_agent", outputs);
    let legal_calls = legal.calls();
    let body = Arc::new(Sequential::new(
        "copywriter_legal_sequence",
        vec![
            unit(ScriptedAgent::new("copywriter_agent", json!({"campaign_brief": {}}))),
            unit(legal),
        ],
    ));
    let looped = LoopUnit::new(
        "copywriter_legal_loop",
        body,
        TerminationCondition::flag("legal_agent", "all_clear"),
        max,
    );
    (looped, legal_calls)
}

#[tokio::test]
async fn test_never_converging_runs_exactly_the_bound() {
    let (looped, legal_calls) = legal_loop(vec![json!({"all_clear": false})], 4);
    let mut ctx = brief_context("Launch X");

    let report = execute(&looped, &mut ctx).await;

    assert!(report.is_success());
    assert_eq!(calls(&legal_calls), 4);
    let loop_report = ctx.loop_report("copywriter_legal_loop").unwrap();
    assert_eq!(loop_report.outcome, LoopOutcome::Exhausted);
    assert!(!loop_report.converged());
    assert_eq!(loop_report.iterations, 4);
}

#[tokio::test]
async fn test_converging_on_first_pass_runs_once() {
    let (looped, legal_calls) = legal_loop(vec![json!({"all_clear": true})], 5);
    let mut ctx = brief_context("Launch X");

    execute(&looped, &mut ctx).await;

    assert_eq!(calls(&legal_calls), 1);
    let loop_report = ctx.loop_report("copywriter_legal_loop").unwrap();
    assert_eq!(loop_report.outcome, LoopOutcome::Converged);
    assert_eq!(loop_report.iterations, 1);
}

#[tokio::test]
async fn test_bound_of_one_still_runs_the_body() {
    let (looped, legal_calls) = legal_loop(vec![json!({"all_clear": false})], 1);
    let mut ctx = brief_context("Launch X");

    execute(&looped, &mut ctx).await;

    assert_eq!(calls(&legal_calls), 1);
    assert_eq!(
        ctx.loop_report("copywriter_legal_loop").unwrap().outcome,
        LoopOutcome::Exhausted
    );
}

#[tokio::test]
async fn test_missing_flag_means_not_converged() {
    let (looped, legal_calls) = legal_loop(vec![json!({"edits": ["add fair balance"]})], 3);
    let mut ctx = brief_context("Launch X");

    let report = execute(&looped, &mut ctx).await;

    assert!(report.is_success());
    assert_eq!(calls(&legal_calls), 3);
}

#[tokio::test]
async fn test_flag_nested_under_output_is_honoured() {
    let (looped, legal_calls) = legal_loop(vec![json!({"output": {"all_clear": true}})], 3);
    let mut ctx = brief_context("Launch X");

    execute(&looped, &mut ctx).await;

    assert_eq!(calls(&legal_calls), 1);
}

#[tokio::test]
async fn test_converges_on_third_pass_then_continues() {
    let b = ScriptedAgent::new("b", json!({"draft": true}));
    let b_calls = b.calls();
    let c = ScriptedAgent::sequence(
        "c",
        vec![
            json!({"all_clear": false}),
            json!({"all_clear": false}),
            json!({"all_clear": true}),
        ],
    );
    let c_calls = c.calls();

    let review_loop: UnitRef = Arc::new(LoopUnit::new(
        "review_loop",
        Arc::new(Sequential::new("b_then_c", vec![unit(b), unit(c)])),
        TerminationCondition::flag("c", "all_clear"),
        6,
    ));
    let pipeline = Sequential::new(
        "scenario",
        vec![
            unit(ScriptedAgent::new("a", json!({"goals": []}))),
            review_loop,
            unit(ScriptedAgent::new("d", json!({"done": true}))),
        ],
    );
    let (engine, events) = recording_engine();
    let mut ctx = brief_context("Launch X");

    let report = engine.execute(&pipeline, &mut ctx).await;

    assert!(report.is_success());
    assert_eq!(calls(&b_calls), 3);
    assert_eq!(calls(&c_calls), 3);
    assert_eq!(ctx.loop_report("review_loop").unwrap().iterations, 3);
    assert!(ctx.get_output("d").is_some());
    assert_eq!(ctx.get_meta("review_loop.iteration"), Some(&json!(3)));

    let passes = events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, ExecutionEvent::LoopIteration { .. }))
        .count();
    assert_eq!(passes, 3);
}

#[tokio::test]
async fn test_body_failure_is_not_retried() {
    let failing = ScriptedAgent::failing("legal_agent");
    let legal_calls = failing.calls();
    let looped = LoopUnit::new(
        "copywriter_legal_loop",
        unit(failing),
        TerminationCondition::flag("legal_agent", "all_clear"),
        6,
    );
    let mut ctx = brief_context("Launch X");

    let report = execute(&looped, &mut ctx).await;

    assert_eq!(report.failure.unwrap().unit, "legal_agent");
    assert_eq!(calls(&legal_calls), 1);
    assert!(ctx.loop_report("copywriter_legal_loop").is_none());
}

#[tokio::test]
async fn test_zero_bound_is_a_composition_error() {
    let (looped, legal_calls) = legal_loop(vec![json!({"all_clear": true})], 0);
    let mut ctx = brief_context("Launch X");

    let report = execute(&looped, &mut ctx).await;

    assert_eq!(
        report.failure.unwrap().kind,
        campaign_pipeline::ErrorKind::CompositionError
    );
    assert_eq!(calls(&legal_calls), 0);
}

#[tokio::test]
async fn test_loop_named_like_its_body_is_rejected_before_running() {
    let legal = ScriptedAgent::new("legal_agent", json!({"all_clear": true}));
    let legal_calls = legal.calls();
    let looped = LoopUnit::new(
        "legal_agent",
        unit(legal),
        TerminationCondition::flag("legal_agent", "all_clear"),
        3,
    );
    let mut ctx = brief_context("Launch X");

    let report = execute(&looped, &mut ctx).await;

    let failure = report.failure.unwrap();
    assert_eq!(failure.kind, campaign_pipeline::ErrorKind::CompositionError);
    assert_eq!(failure.unit, "legal_agent");
    assert_eq!(calls(&legal_calls), 0);
    assert!(ctx.get_output("legal_agent").is_none());
}
