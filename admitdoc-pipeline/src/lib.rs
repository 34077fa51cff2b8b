//! Asynchronous render-job pipeline for the admitdoc backend.
//!
//! Record mutations are cheap; rendering a record to PDF is not. This crate
//! defers the expensive part to background workers while letting a
//! synchronous retrieval path wait for the outcome with a bounded timeout.
//!
//! # Architecture
//!
//! - [`RenderPipeline`] - constructible handle owning the queue, the status
//!   store, the completion channel and the workers
//! - [`StatusStore`] - shared per-record lifecycle state, the single source
//!   of truth for job outcomes
//! - [`RenderStatus`] / [`RenderState`] - one entry per record id
//! - [`PipelineError`] - enqueue/render/timeout failure taxonomy
//!
//! # Protocol
//!
//! `submit(id)` unconditionally overwrites the record's status with
//! `Generating` (a changed record makes the old document stale) and enqueues
//! a job. Workers render, write `Done` or `Failed`, and broadcast the id.
//! `wait_for_completion(id, timeout)` races that broadcast against a polling
//! fallback and a deadline; timing out abandons only the wait, never the
//! render. Two jobs for one id may race; the status store reflects whichever
//! worker finished last.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use admitdoc_pipeline::{PipelineConfig, RenderPipeline};
//! use admitdoc_render::{Renderer, RenderError};
//! use bytes::Bytes;
//! use uuid::Uuid;
//!
//! struct NullRenderer;
//!
//! #[admitdoc_render::async_trait]
//! impl Renderer for NullRenderer {
//!     async fn render(&self, _id: Uuid) -> Result<Bytes, RenderError> {
//!         Ok(Bytes::from_static(b"%PDF-1.7 empty"))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let pipeline = RenderPipeline::start(Arc::new(NullRenderer), PipelineConfig::default());
//!     let id = Uuid::new_v4();
//!     pipeline.submit(id).await.unwrap();
//!     let bytes = pipeline
//!         .wait_for_completion(id, Duration::from_secs(5))
//!         .await
//!         .unwrap();
//!     println!("rendered {} bytes", bytes.len());
//! }
//! ```

mod error;
mod pipeline;
mod store;
mod types;

pub use error::PipelineError;
pub use pipeline::{PipelineConfig, RenderPipeline};
pub use store::StatusStore;
pub use types::{RenderJob, RenderState, RenderStatus};
