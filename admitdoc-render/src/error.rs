//! Error types reported by renderers.

use thiserror::Error;
use uuid::Uuid;

/// Errors that may occur while rendering a record to a document.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("record not found: {0}")]
    RecordNotFound(Uuid),

    #[error("record store error: {0}")]
    Store(String),

    #[error("render timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("renderer produced no output")]
    EmptyOutput,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
