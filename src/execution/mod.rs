//! Pipeline execution engine

pub mod engine;
pub mod events;
pub mod executor;
pub mod local_gate;
pub mod matrix;
pub mod scheduler;

pub use engine::ExecutionEngine;
pub use events::{EventBus, EventHandler, ExecutionEvent};
pub use executor::JobExecutor;
pub use local_gate::LocalGate;
pub use matrix::MatrixExpander;
pub use scheduler::{JobScheduler, SchedulingStrategy};
