//! Test: Environment Scoping - step over job over global, strict mode

use crate::helpers::*;
use qgate::core::EnvScope;
use qgate::execution::SchedulingStrategy;
use std::sync::Arc;

const LAYERED: &str = r#"
name: layered
env:
  X: "1"
environments:
  - name: linux
    env:
      X: "2"
      Y: "3"
  - macos
steps:
  - name: build
    command: [cargo, build]
    env:
      X: "4"
  - name: test
    command: [cargo, test]
"#;

#[tokio::test]
async fn test_step_over_job_over_global() {
    let invoker = Arc::new(MockInvoker::new());
    run_with_mock(&pipeline_from_yaml(LAYERED), invoker.clone(), SchedulingStrategy::Sequential).await;

    let calls = invoker.calls();
    let scope = |environment: &str, step: &str| -> EnvScope {
        calls
            .iter()
            .find(|c| c.environment == environment && c.step == step)
            .map(|c| c.env.clone())
            .unwrap()
    };

    assert_eq!(scope("linux", "build"), EnvScope::new().with("X", "4").with("Y", "3"));
    assert_eq!(scope("linux", "test"), EnvScope::new().with("X", "2").with("Y", "3"));
    assert_eq!(scope("macos", "build"), EnvScope::new().with("X", "4"));
    assert_eq!(scope("macos", "test"), EnvScope::new().with("X", "1"));
}

#[tokio::test]
async fn test_strict_steps_escalate_warnings() {
    let invoker = Arc::new(MockInvoker::new());
    run_with_mock(&scenario_pipeline(), invoker.clone(), SchedulingStrategy::Sequential).await;

    let linux: Vec<_> = invoker
        .calls()
        .into_iter()
        .filter(|c| c.environment == "linux")
        .collect();

    let find = |step: &str| linux.iter().find(|c| c.step == step).unwrap();
    assert!(find("lint").env.is_strict());
    assert!(find("doc").env.is_strict());
    assert!(!find("format").env.is_strict());
    assert!(!find("build").env.is_strict());
    assert_eq!(find("leak-sanitizer").env.get("RUSTFLAGS"), Some("-Z sanitizer=leak"));
}

#[tokio::test]
async fn test_strict_environment_applies_to_every_step() {
    let yaml = r#"
name: strict-env
environments:
  - name: linux
    strict: true
  - macos
steps:
  - name: build
    command: [cargo, build]
  - name: sanitizer
    command: [cargo, test]
    env:
      RUSTFLAGS: "-Z sanitizer=leak"
"#;
    let invoker = Arc::new(MockInvoker::new());
    run_with_mock(&pipeline_from_yaml(yaml), invoker.clone(), SchedulingStrategy::Sequential).await;

    let calls = invoker.calls();
    let linux_build = calls
        .iter()
        .find(|c| c.environment == "linux" && c.step == "build")
        .unwrap();
    assert!(linux_build.env.is_strict());

    let linux_sanitizer = calls
        .iter()
        .find(|c| c.environment == "linux" && c.step == "sanitizer")
        .unwrap();
    assert_eq!(linux_sanitizer.env.get("RUSTFLAGS"), Some("-Z sanitizer=leak"));
    assert_eq!(linux_sanitizer.env.get("RUSTDOCFLAGS"), Some("-D warnings"));

    let macos_build = calls
        .iter()
        .find(|c| c.environment == "macos" && c.step == "build")
        .unwrap();
    assert!(!macos_build.env.is_strict());
}
