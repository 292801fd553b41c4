//! City Routes

use axum::{extract::State, Json};
use flood_data::{DataSources, LocationRow};
use std::sync::Arc;

use crate::{ApiError, ApiResponse, AppState};

/// Get the monitored city locations
pub async fn get_cities(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<LocationRow>>>, ApiError> {
    if !state.store.has_datasets() {
        return Ok(ApiResponse::ok(Vec::new()));
    }

    let locations = DataSources::in_dir(state.store.data_dir()).load_locations()?;
    Ok(ApiResponse::ok(locations))
}
