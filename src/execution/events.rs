//! Execution events and the handlers that observe them

use crate::core::{JobState, StepRecord, Verdict};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Events that can occur during a pipeline run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        run_id: Uuid,
        pipeline: String,
        /// Environment names, one job each
        jobs: Vec<String>,
    },
    JobStarted {
        environment: String,
        steps: Vec<String>,
    },
    StepStarted {
        environment: String,
        step: String,
        command: String,
    },
    StepFinished {
        environment: String,
        record: StepRecord,
    },
    JobFinished {
        environment: String,
        state: JobState,
    },
    RunFinished {
        run_id: Uuid,
        verdict: Verdict,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Fan-out of events to every subscribed handler
///
/// Cloning shares the handler list, so jobs running on separate tasks report
/// to the same subscribers.
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Arc<RwLock<Vec<EventHandler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.handlers.write().await.push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    pub async fn emit(&self, event: ExecutionEvent) {
        let handlers = self.handlers.read().await;
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}
