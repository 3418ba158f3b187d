//! Scenario-based tests for qgate, driven by a scripted invoker

mod helpers;

mod cancellation;
mod env_scoping;
mod local_gate;
mod matrix_expansion;
mod verdict;
