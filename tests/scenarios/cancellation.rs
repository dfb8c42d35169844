//! Cooperative cancellation stops new units from starting

use crate::helpers::*;
use campaign_pipeline::{
    unit, ExecutionEngine, ExecutionStatus, LoopUnit, Sequential, TerminationCondition,
};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_cancel_mid_sequence() {
    let slow = ScriptedAgent::new("ceo_agent", json!({"goals": []})).with_delay(Duration::from_millis(100));
    let next = ScriptedAgent::new("copywriter_agent", json!({}));
    let next_calls = next.calls();
    let pipeline = Sequential::new("campaign", vec![unit(slow), unit(next)]);

    let engine = ExecutionEngine::new();
    let cancellation = engine.cancellation();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancellation.cancel();
    });

    let mut ctx = brief_context("Launch X");
    let report = engine.execute(&pipeline, &mut ctx).await;

    assert_eq!(report.state.status, ExecutionStatus::Cancelled);
    assert_eq!(report.failure.unwrap().unit, "copywriter_agent");
    // the in-flight unit finishes
    assert!(ctx.get_output("ceo_agent").is_some());
    assert_eq!(calls(&next_calls), 0);
}

#[tokio::test]
async fn test_cancel_stops_further_loop_passes() {
    let legal = ScriptedAgent::new("legal_agent", json!({"all_clear": false}))
        .with_delay(Duration::from_millis(50));
    let legal_calls = legal.calls();
    let looped = LoopUnit::new(
        "copywriter_legal_loop",
        unit(legal),
        TerminationCondition::flag("legal_agent", "all_clear"),
        100,
    );

    let engine = ExecutionEngine::new();
    let cancellation = engine.cancellation();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(75)).await;
        cancellation.cancel();
    });

    let mut ctx = brief_context("Launch X");
    let report = engine.execute(&looped, &mut ctx).await;

    assert_eq!(report.state.status, ExecutionStatus::Cancelled);
    assert!(calls(&legal_calls) < 100);
    assert!(ctx.loop_report("copywriter_legal_loop").is_none());
}
