use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use admitdoc_pipeline::RenderState;

use crate::{error::ApiError, state::AppState};

/// GET /records/{id}/document/status
/// Report the render lifecycle state for a record without touching the
/// artifact bytes. A record that was never submitted reads as `pending`.
pub async fn status(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if state.records.get(id).await?.is_none() {
        return Err(ApiError::not_found(format!("record {id} does not exist")));
    }

    let payload = match state.pipeline.status(id).await {
        Some(status) => json!({
            "recordId": id,
            "state": status.state,
            "error": status.error,
            "updatedAt": status.updated_at.to_rfc3339(),
        }),
        None => json!({
            "recordId": id,
            "state": RenderState::Pending,
            "error": Value::Null,
            "updatedAt": Value::Null,
        }),
    };

    Ok(Json(payload))
}
