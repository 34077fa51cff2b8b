use std::sync::Arc;
use std::time::Duration;

use admitdoc_pipeline::RenderPipeline;
use admitdoc_records::RecordStore;

/// Shared application state passed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub records: Arc<dyn RecordStore>,
    pub pipeline: Arc<RenderPipeline>,
    /// Ceiling on one document-retrieval wait.
    pub wait_timeout: Duration,
}

impl AppState {
    /// Build a fully initialised state container from its constituent parts.
    pub fn new(
        records: Arc<dyn RecordStore>,
        pipeline: Arc<RenderPipeline>,
        wait_timeout: Duration,
    ) -> Self {
        Self {
            records,
            pipeline,
            wait_timeout,
        }
    }
}
