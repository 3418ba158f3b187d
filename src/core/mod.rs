//! Core domain models for Pipeline
//!
//! This module defines the fundamental data structures that represent
//! pipelines, steps, environments, and their configuration.

pub mod config;
pub mod environment;
pub mod error;
pub mod job;
pub mod pipeline;
pub mod predicate;
pub mod state;
pub mod step;

pub use environment::*;
pub use error::*;
pub use job::*;
pub use pipeline::*;
pub use predicate::*;
pub use state::*;
pub use step::*;
