//! Error types for the render pipeline.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the pipeline to producers and waiters.
///
/// Only `EnqueueFailed` and `RenderFailed` ever reach the status store;
/// `Timeout` is scoped to the one wait that gave up, the underlying job
/// keeps running.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to enqueue render job: {0}")]
    EnqueueFailed(String),

    #[error("rendering failed: {0}")]
    RenderFailed(String),

    #[error("timed out after {0:?} waiting for render to complete")]
    Timeout(Duration),
}

impl PipelineError {
    /// Returns true for the waiter-scoped timeout outcome.
    #[inline]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
