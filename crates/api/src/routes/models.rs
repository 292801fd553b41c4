//! Model Statistics Routes

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{ApiError, ApiResponse, AppState, ModelStats};

/// Get the evaluation report of the last run
pub async fn get_model_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ModelStats>>, ApiError> {
    let path = state.store.evaluation_path();
    if !path.exists() {
        return Err(ApiError::NotFound("Models not evaluated yet".to_string()));
    }

    let stats: ModelStats = state.store.read_json(&path)?;
    Ok(ApiResponse::ok(stats))
}
