use std::sync::Arc;

use axum::extract::{Extension, Json};
use axum::http::StatusCode;
use serde_json::Value;

use admitdoc_records::AdmissionRecord;

use crate::{error::ApiError, state::AppState};

use super::dto::RecordPayload;

/// POST /records
/// Store a new admission record and kick off document generation.
///
/// The render runs in the background; this handler never waits for it.
pub async fn create(
    Extension(state): Extension<Arc<AppState>>,
    body: Option<Json<RecordPayload>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let payload = body
        .ok_or_else(|| ApiError::bad_request("missing request body"))?
        .0;
    if payload.applicant_name.trim().is_empty() {
        return Err(ApiError::bad_request("applicant_name must not be empty"));
    }

    let record = state
        .records
        .upsert(AdmissionRecord::new(
            payload.applicant_name,
            payload.program,
            payload.fields,
        ))
        .await?;

    // A failed enqueue already left a Failed status behind; surface it to
    // the caller as well so it can retry the mutation.
    state.pipeline.submit(record.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::to_value(&record)?),
    ))
}
