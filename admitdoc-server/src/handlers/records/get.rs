use std::sync::Arc;

use axum::extract::{Extension, Json, Path};
use serde_json::Value;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// GET /records/{id}
pub async fn get_record(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let record = state
        .records
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("record {id} does not exist")))?;

    Ok(Json(serde_json::to_value(&record)?))
}
