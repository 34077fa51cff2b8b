//! Renderer contract for the admitdoc pipeline.
//!
//! The pipeline treats rendering as an opaque capability: given a record id,
//! produce document bytes or fail. This crate provides:
//!
//! - [`Renderer`] - the trait the pipeline workers call
//! - [`RenderError`] - the failure taxonomy renderers report
//! - [`BrowserRenderer`] - a concrete renderer that prints a trivial HTML
//!   rendition of the record to PDF through a headless browser
//! - [`artifact`] - the boundary sanity check for produced bytes
//!
//! Renderers re-read the record at render time, never from a snapshot taken
//! at enqueue time, so two queued jobs for the same id both render whatever
//! the record says when the worker gets to them.

mod browser;
mod error;

pub mod artifact;

pub use browser::{BrowserRenderer, BrowserRendererConfig};
pub use error::RenderError;

use bytes::Bytes;
use uuid::Uuid;

// Re-export async_trait for convenience when implementing Renderer
pub use async_trait::async_trait;

/// Trait for document renderers.
///
/// Implementations must be safe to call concurrently; the pipeline may run
/// several workers against one renderer instance.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render the document for `id`, returning the artifact bytes.
    async fn render(&self, id: Uuid) -> Result<Bytes, RenderError>;
}
