//! Test: Run Verdict - pass iff every job passed

use crate::helpers::*;
use qgate::core::{Verdict, EXIT_FAILURE};
use qgate::execution::SchedulingStrategy;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_all_jobs_pass() {
    for strategy in strategies() {
        let invoker = Arc::new(MockInvoker::new());
        let verdict = run_with_mock(&scenario_pipeline(), invoker.clone(), strategy).await;

        assert_eq!(verdict.verdict, Verdict::Pass);
        assert_eq!(verdict.exit_code(), 0);
        assert_eq!(verdict.jobs.len(), 3);
        assert_eq!(invoker.calls().len(), 16);
    }
}

#[tokio::test]
async fn test_single_failed_job_flips_verdict() {
    for environment in ["linux", "macos", "windows"] {
        let invoker = Arc::new(MockInvoker::new().failing_in(environment, "test", 1));
        let verdict = run_with_mock(&scenario_pipeline(), invoker, SchedulingStrategy::Parallel).await;

        assert_eq!(verdict.verdict, Verdict::Fail, "failure in {}", environment);
        assert_eq!(verdict.exit_code(), EXIT_FAILURE);
        assert_eq!(verdict.jobs.iter().filter(|j| j.passed()).count(), 2);
    }
}

#[tokio::test]
async fn test_strategy_does_not_change_verdict() {
    let mut verdicts = Vec::new();
    for strategy in strategies() {
        let invoker = Arc::new(
            MockInvoker::new()
                .failing_in("windows", "doc", 1)
                .with_delay(Duration::from_millis(2)),
        );
        let verdict = run_with_mock(&scenario_pipeline(), invoker, strategy).await;
        let states: Vec<_> = verdict.jobs.iter().map(|j| j.state.clone()).collect();
        verdicts.push((verdict.verdict, states));
    }

    assert!(verdicts.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn test_reports_follow_declaration_order() {
    let invoker = Arc::new(MockInvoker::new().with_delay(Duration::from_millis(1)));
    let verdict = run_with_mock(&scenario_pipeline(), invoker, SchedulingStrategy::Parallel).await;

    let environments: Vec<_> = verdict.jobs.iter().map(|j| j.environment.as_str()).collect();
    assert_eq!(environments, vec!["linux", "macos", "windows"]);
}
