use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tracing::warn;
use uuid::Uuid;

use admitdoc_pipeline::RenderState;
use admitdoc_render::artifact;

use crate::{error::ApiError, state::AppState};

/// GET /records/{id}/document
/// Return the rendered PDF for a record, waiting for an in-flight render
/// when necessary.
///
/// Policy for records whose document was never generated (or whose job got
/// lost): absence of a status entry means nothing is in flight, so this
/// handler submits a fresh render before waiting. A `Generating` entry means
/// a job is already running somewhere; then waiting alone is enough and no
/// duplicate job is enqueued.
pub async fn download(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    if state.records.get(id).await?.is_none() {
        return Err(ApiError::not_found(format!("record {id} does not exist")));
    }

    if state.pipeline.state_of(id).await == RenderState::Pending {
        state.pipeline.submit(id).await?;
    }

    // Fast path and wait are the same call: an already-terminal status
    // resolves immediately, otherwise this blocks up to the configured
    // ceiling. Timing out leaves the render running; a retry of this
    // request may then find it done.
    let bytes = state
        .pipeline
        .wait_for_completion(id, state.wait_timeout)
        .await?;

    if !artifact::looks_like_pdf(&bytes) {
        warn!(record_id = %id, len = bytes.len(), "stored artifact failed the PDF sanity check");
        return Err(ApiError::InvalidArtifact);
    }

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"admission-{id}.pdf\""),
        ),
    ];
    Ok((headers, bytes).into_response())
}
