//! Test: Local Gate - the pre-push prefix, run without a matrix

use crate::helpers::*;
use qgate::core::{config::PipelineConfig, JobState, LOCAL_ENVIRONMENT};
use qgate::execution::{EventBus, LocalGate};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[test]
fn test_gate_is_format_lint_doc() {
    let gate = LocalGate::from_pipeline(&scenario_pipeline()).unwrap();
    assert_eq!(gate.step_names(), vec!["format", "lint", "doc"]);
}

#[test]
fn test_builtin_gate_matches_scenario() {
    let pipeline = PipelineConfig::builtin().unwrap().to_pipeline().unwrap();
    let gate = LocalGate::from_pipeline(&pipeline).unwrap();
    assert_eq!(gate.step_names(), vec!["format", "lint", "doc"]);
}

#[tokio::test]
async fn test_gate_runs_only_local_steps() {
    let invoker = Arc::new(MockInvoker::new());
    let gate = LocalGate::from_pipeline(&scenario_pipeline()).unwrap();
    let report = gate
        .run(invoker.clone(), EventBus::new(), &CancellationToken::new())
        .await;

    assert!(report.passed());
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.environment, LOCAL_ENVIRONMENT);

    let calls = invoker.calls();
    let steps: Vec<_> = calls.iter().map(|c| c.step.as_str()).collect();
    assert_eq!(steps, vec!["format", "lint", "doc"]);
    assert!(calls.iter().all(|c| c.environment == LOCAL_ENVIRONMENT));
}

#[tokio::test]
async fn test_lint_failure_rejects_push() {
    let invoker = Arc::new(MockInvoker::new().failing("lint", 1));
    let gate = LocalGate::from_pipeline(&scenario_pipeline()).unwrap();
    let report = gate
        .run(invoker.clone(), EventBus::new(), &CancellationToken::new())
        .await;

    assert_eq!(
        report.state,
        JobState::Failed {
            step: "lint".to_string()
        }
    );
    assert_eq!(invoker.count("doc"), 0);
    assert_ne!(report.exit_code(), 0);
    assert_eq!(
        report.failing_step().map(|r| r.stderr.as_str()),
        Some("lint failed on local")
    );
}

#[tokio::test]
async fn test_gate_keeps_strict_mode() {
    let invoker = Arc::new(MockInvoker::new());
    let gate = LocalGate::from_pipeline(&scenario_pipeline()).unwrap();
    gate.run(invoker.clone(), EventBus::new(), &CancellationToken::new())
        .await;

    let calls = invoker.calls();
    assert!(calls.iter().find(|c| c.step == "lint").unwrap().env.is_strict());
}
