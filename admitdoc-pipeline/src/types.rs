//! Core types for the render pipeline.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A request to (re)render the document for one record.
///
/// Deliberately carries no payload beyond the id: the renderer re-reads the
/// record at render time, so a queued job always renders the latest data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderJob {
    pub id: Uuid,
    pub enqueued_at: DateTime<Utc>,
}

impl RenderJob {
    #[inline]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            enqueued_at: Utc::now(),
        }
    }
}

/// Lifecycle state of a record's render job.
///
/// A record with no status entry at all is `Pending` (never generated).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RenderState {
    Pending,
    Generating,
    Done,
    Failed,
}

impl RenderState {
    /// Returns true if this state represents a terminal outcome.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for RenderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Generating => "generating",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

/// Per-record render status. One entry per record id, replaced wholesale on
/// every transition so observers never see a half-written value.
///
/// Invariants, enforced by the constructors: `artifact` is present iff the
/// state is `Done`, `error` is present iff the state is `Failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderStatus {
    pub id: Uuid,
    pub state: RenderState,
    #[serde(skip)]
    pub artifact: Option<Bytes>,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl RenderStatus {
    /// Status written by the producer when a job is submitted.
    #[inline]
    pub fn generating(id: Uuid) -> Self {
        Self {
            id,
            state: RenderState::Generating,
            artifact: None,
            error: None,
            updated_at: Utc::now(),
        }
    }

    /// Status written by a worker on success.
    #[inline]
    pub fn done(id: Uuid, artifact: Bytes) -> Self {
        Self {
            id,
            state: RenderState::Done,
            artifact: Some(artifact),
            error: None,
            updated_at: Utc::now(),
        }
    }

    /// Status written on failure, by a worker or by the producer when the
    /// enqueue itself failed.
    #[inline]
    pub fn failed(id: Uuid, message: impl Into<String>) -> Self {
        Self {
            id,
            state: RenderState::Failed,
            artifact: None,
            error: Some(message.into()),
            updated_at: Utc::now(),
        }
    }

    /// Returns true once the job has reached `Done` or `Failed`.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
