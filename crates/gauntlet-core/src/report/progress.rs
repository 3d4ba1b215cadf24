use std::sync::Arc;
use std::time::Duration;

/// Emitted once per case as it completes. `done` counts completed cases,
/// in completion order, not input order.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub done: usize,
    pub total: usize,
    pub case_name: String,
    pub elapsed: Duration,
    pub error: Option<String>,
}

/// Callback invoked after each case completes.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;
