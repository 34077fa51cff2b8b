use std::sync::Arc;

use axum::extract::{Extension, Json, Path};
use serde_json::Value;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

use super::dto::RecordPayload;

/// PUT /records/{id}
/// Replace a record's payload and re-render its document.
///
/// The previous artifact becomes stale the moment the record changes, so
/// submission happens on every update, not only when a document was asked
/// for before.
pub async fn update(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Option<Json<RecordPayload>>,
) -> Result<Json<Value>, ApiError> {
    let payload = body
        .ok_or_else(|| ApiError::bad_request("missing request body"))?
        .0;

    let mut record = state
        .records
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("record {id} does not exist")))?;

    record.applicant_name = payload.applicant_name;
    record.program = payload.program;
    record.fields = payload.fields;

    let record = state.records.upsert(record).await?;
    state.pipeline.submit(record.id).await?;

    Ok(Json(serde_json::to_value(&record)?))
}
