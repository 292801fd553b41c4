//! Alert Routes

use alerting::{AlertRecord, RiskLevel};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{ApiError, ApiResponse, AppState};

/// Query parameters for alerts endpoint
#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    /// Filter by city
    pub city: Option<String>,
    /// Filter by risk level (`HIGH`, `SEVERE`, ...)
    pub risk_level: Option<RiskLevel>,
    /// Maximum number of records
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    2000
}

/// Get the alert feed written by the last run
pub async fn get_alerts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AlertQuery>,
) -> Result<Json<ApiResponse<Vec<AlertRecord>>>, ApiError> {
    let data: Vec<AlertRecord> = state
        .store
        .read_alerts()?
        .into_iter()
        .filter(|a| params.city.as_deref().map_or(true, |city| a.city == city))
        .filter(|a| params.risk_level.map_or(true, |level| a.risk_level == level))
        .take(params.limit)
        .collect();

    Ok(ApiResponse::ok(data))
}
