//! Test: Cancellation - interrupted jobs are aborted, not failed

use crate::helpers::*;
use qgate::core::{JobState, PipelineError, StepOutcome, EXIT_ABORTED};
use qgate::execution::{EventBus, ExecutionEngine, LocalGate, SchedulingStrategy};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_in_flight_step_is_aborted() {
    let cancel = CancellationToken::new();
    let invoker = Arc::new(MockInvoker::new().cancelling_on("build", cancel.clone()));
    let engine = ExecutionEngine::with_invoker(invoker.clone(), SchedulingStrategy::Sequential);

    let verdict = engine.execute(&scenario_pipeline(), &cancel).await.unwrap();

    let linux = verdict.job("linux").unwrap();
    assert_eq!(
        linux.state,
        JobState::Aborted {
            step: Some("build".to_string())
        }
    );
    assert_eq!(linux.steps.last().map(|r| r.outcome), Some(StepOutcome::Aborted));
    assert_eq!(invoker.count("test"), 0);

    // Later jobs see the cancelled token and never invoke anything
    for environment in ["macos", "windows"] {
        assert_eq!(
            verdict.job(environment).unwrap().state,
            JobState::Aborted { step: None }
        );
        assert!(invoker.invoked_in(environment).is_empty());
    }

    assert!(!verdict.passed());
    assert!(verdict.aborted());
    assert_eq!(verdict.exit_code(), EXIT_ABORTED);
    assert!(verdict
        .failures()
        .iter()
        .all(|e| matches!(e, PipelineError::JobAborted { .. })));
}

#[tokio::test]
async fn test_parallel_jobs_are_all_aborted() {
    let cancel = CancellationToken::new();
    let invoker = Arc::new(MockInvoker::new().hanging_on("test"));
    let engine = ExecutionEngine::with_invoker(invoker, SchedulingStrategy::Parallel);

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let verdict = engine.execute(&scenario_pipeline(), &cancel).await.unwrap();
    for job in &verdict.jobs {
        assert_eq!(
            job.state,
            JobState::Aborted {
                step: Some("test".to_string())
            }
        );
    }
}

#[tokio::test]
async fn test_cancelled_local_gate_is_not_a_failure() {
    let cancel = CancellationToken::new();
    let invoker = Arc::new(MockInvoker::new().cancelling_on("lint", cancel.clone()));
    let gate = LocalGate::from_pipeline(&scenario_pipeline()).unwrap();

    let report = gate.run(invoker.clone(), EventBus::new(), &cancel).await;

    assert!(report.aborted());
    assert_eq!(report.exit_code(), EXIT_ABORTED);
    assert_eq!(invoker.count("doc"), 0);
}
