//! Test: Matrix Expansion - one job per environment, predicates filter steps

use crate::helpers::*;
use qgate::core::{EnvScope, Environment, Pipeline, Predicate, Step};
use qgate::execution::{MatrixExpander, SchedulingStrategy};
use std::sync::Arc;

#[test]
fn test_one_job_per_environment_in_declaration_order() {
    let jobs = MatrixExpander::expand(&scenario_pipeline()).unwrap();

    let environments: Vec<_> = jobs.iter().map(|j| j.environment.name.as_str()).collect();
    assert_eq!(environments, vec!["linux", "macos", "windows"]);

    for job in &jobs {
        let names = job.step_names();
        assert_eq!(&names[..5], &["format", "lint", "doc", "build", "test"]);
    }
}

#[test]
fn test_linux_only_step_counts() {
    let jobs = MatrixExpander::expand(&scenario_pipeline()).unwrap();
    let counts: Vec<_> = jobs.iter().map(|j| j.steps.len()).collect();
    assert_eq!(counts, vec![6, 5, 5]);
    assert_eq!(jobs[0].step_names().last(), Some(&"leak-sanitizer"));
}

#[tokio::test]
async fn test_excluded_step_is_never_invoked() {
    let invoker = Arc::new(MockInvoker::new());
    let verdict = run_with_mock(&scenario_pipeline(), invoker.clone(), SchedulingStrategy::Parallel).await;

    assert!(verdict.passed());
    assert_eq!(invoker.count("leak-sanitizer"), 1);
    assert!(!invoker.invoked_in("macos").contains(&"leak-sanitizer".to_string()));
    assert!(!invoker.invoked_in("windows").contains(&"leak-sanitizer".to_string()));
}

#[tokio::test]
async fn test_excluded_failing_step_does_not_affect_job() {
    // The sanitizer would fail everywhere, but it only applies to linux
    let invoker = Arc::new(MockInvoker::new().failing("leak-sanitizer", 1));
    let verdict = run_with_mock(&scenario_pipeline(), invoker, SchedulingStrategy::Sequential).await;

    assert!(!verdict.job("linux").unwrap().passed());
    assert!(verdict.job("macos").unwrap().passed());
    assert!(verdict.job("windows").unwrap().passed());
}

#[tokio::test]
async fn test_step_for_undeclared_platform_is_dead_configuration() {
    let pipeline = Pipeline::new("dead")
        .with_environment(Environment::os("linux"))
        .with_step(Step::new("build", "cargo"))
        .with_step(Step::new("freebsd", "cargo").when(Predicate::equals("os", "freebsd")));

    let invoker = Arc::new(MockInvoker::new());
    let verdict = run_with_mock(&pipeline, invoker.clone(), SchedulingStrategy::Sequential).await;

    assert!(verdict.passed());
    assert_eq!(invoker.count("freebsd"), 0);
}

#[tokio::test]
async fn test_predicates_over_extra_attributes() {
    let pipeline = Pipeline::new("arch")
        .with_job_env(
            Environment::os("linux").with_attribute("arch", "x86_64"),
            EnvScope::new(),
        )
        .with_job_env(
            Environment::os("linux-arm").with_attribute("arch", "aarch64"),
            EnvScope::new(),
        )
        .with_step(Step::new("build", "cargo"))
        .with_step(
            Step::new("sanitizer", "cargo").when(Predicate::All(vec![
                Predicate::one_of("os", ["linux", "linux-arm"]),
                Predicate::equals("arch", "x86_64"),
            ])),
        );

    let jobs = MatrixExpander::expand(&pipeline).unwrap();
    assert_eq!(jobs[0].step_names(), vec!["build", "sanitizer"]);
    assert_eq!(jobs[1].step_names(), vec!["build"]);
}
