//! Sequential composition threads one context through its units in order

use crate::helpers::*;
use campaign_pipeline::{unit, ErrorKind, ExecutionStatus, Sequential};
use serde_json::json;

#[tokio::test]
async fn test_each_unit_sees_all_previous_writes() {
    let pipeline = Sequential::new(
        "chain",
        vec![
            unit(TrailAgent::first("a")),
            unit(TrailAgent::after("b", "a")),
            unit(TrailAgent::after("c", "b")),
        ],
    );
    let mut ctx = brief_context("Launch X");

    let report = execute(&pipeline, &mut ctx).await;

    assert!(report.is_success());
    assert_eq!(ctx.get_output("c").unwrap()["trail"], json!(["a", "b", "c"]));
    assert_eq!(report.state.units_completed, 3);
}

#[tokio::test]
async fn test_reordering_dependent_units_changes_the_result() {
    let in_order = Sequential::new(
        "chain",
        vec![
            unit(TrailAgent::first("a")),
            unit(TrailAgent::after("b", "a")),
            unit(TrailAgent::after("c", "b")),
        ],
    );
    let swapped = Sequential::new(
        "chain",
        vec![
            unit(TrailAgent::first("a")),
            unit(TrailAgent::after("c", "b")),
            unit(TrailAgent::after("b", "a")),
        ],
    );

    let mut first = brief_context("Launch X");
    let mut second = brief_context("Launch X");
    execute(&in_order, &mut first).await;
    execute(&swapped, &mut second).await;

    assert_ne!(first.get_output("c"), second.get_output("c"));
    assert_eq!(second.get_output("c").unwrap()["trail"], json!(["c"]));
}

#[tokio::test]
async fn test_failure_stops_the_sequence() {
    let after = ScriptedAgent::new("after", json!({"ran": true}));
    let after_calls = after.calls();
    let pipeline = Sequential::new(
        "chain",
        vec![
            unit(ScriptedAgent::new("before", json!({"ran": true}))),
            unit(ScriptedAgent::failing("scraper")),
            unit(after),
        ],
    );
    let mut ctx = brief_context("Launch X");

    let report = execute(&pipeline, &mut ctx).await;

    assert_eq!(report.state.status, ExecutionStatus::Failed);
    let failure = report.failure.unwrap();
    assert_eq!(failure.kind, ErrorKind::CollaboratorFailure);
    assert_eq!(failure.unit, "scraper");
    assert!(ctx.get_output("before").is_some());
    assert_eq!(calls(&after_calls), 0);
}

#[tokio::test]
async fn test_repeated_unit_overwrites_its_slot() {
    let agent = std::sync::Arc::new(ScriptedAgent::sequence(
        "ceo_agent",
        vec![json!({"phase": "strategy"}), json!({"phase": "sign_off"})],
    ));
    let ceo: campaign_pipeline::UnitRef =
        std::sync::Arc::new(campaign_pipeline::AgentUnit::from_arc(agent));
    let pipeline = Sequential::new(
        "bookends",
        vec![
            ceo.clone(),
            unit(ScriptedAgent::new("copywriter_agent", json!({"copy": "v1"}))),
            ceo,
        ],
    );
    let mut ctx = brief_context("Launch X");

    let report = execute(&pipeline, &mut ctx).await;

    assert!(report.is_success());
    assert_eq!(ctx.get_output("ceo_agent").unwrap()["phase"], json!("sign_off"));
    assert_eq!(report.state.units_completed, 3);
}

#[tokio::test]
async fn test_inputs_and_defaults_survive_the_run() {
    let pipeline = Sequential::new("chain", vec![unit(TrailAgent::first("a"))]);
    let mut ctx = brief_context("Launch X");

    execute(&pipeline, &mut ctx).await;

    assert_eq!(ctx.input_str("brief"), Some("Launch X"));
    assert_eq!(ctx.get_default("brand"), Some(&json!("Acme Bio")));
}
