//! Progress reporting for a run. The runner emits done/total after each case; the console
//! layer consumes via a sink.

use std::sync::Arc;

/// One progress update: how many cases are done out of the total.
#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent {
    pub done: usize,
    pub total: usize,
}

/// Sink for progress events. Runner calls this each time a case completes.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;
