//! Simulation Routes

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::simulation::SimulationFrame;
use crate::{ApiError, ApiResponse, AppState, MessageResponse, Pipeline};
use tracing::info;

/// Query parameters for simulation endpoint
#[derive(Debug, Deserialize)]
pub struct SimulationQuery {
    /// Only frames at this timestep
    pub timestep: Option<u32>,
}

/// Get simulation frames written by the last run
pub async fn get_simulation(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SimulationQuery>,
) -> Result<Json<ApiResponse<Vec<SimulationFrame>>>, ApiError> {
    let path = state.store.simulation_path();
    if !path.exists() {
        return Err(ApiError::NotFound("Simulation not generated yet".to_string()));
    }

    let mut frames: Vec<SimulationFrame> = state.store.read_json(&path)?;
    if let Some(timestep) = params.timestep {
        frames.retain(|f| f.timestep == timestep);
    }
    Ok(ApiResponse::ok(frames))
}

/// Run the simulation with the loaded models and rewrite its artifacts
pub async fn generate_simulation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let config = state.config.clone();
    let (frames, alerts) = tokio::task::spawn_blocking(move || -> anyhow::Result<(usize, usize)> {
        let pipeline = Pipeline::new(config);
        pipeline.store().setup_directories()?;
        let engine = pipeline.load_engine()?;
        let output = pipeline.simulate(&engine)?;
        Ok((output.frames.len(), output.feed.len()))
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Failed to generate simulation: {e}")))?
    .map_err(|e| ApiError::Internal(format!("Failed to generate simulation: {e:#}")))?;

    info!("Simulation regenerated over HTTP: {} frames, {} alerts", frames, alerts);
    Ok(Json(MessageResponse {
        success: true,
        message: format!("Simulation generated successfully: {frames} frames, {alerts} alerts"),
    }))
}

#[cfg(test)]
mod tests {
    use crate::simulation::{run_simulation, SimulationConfig};
    use crate::tests::get_json;
    use crate::{create_router, AppConfig, AppState};
    use alerting::AlertFeedConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use inference_engine::RiskEngine;
    use std::sync::Arc;
    use storage::ArtifactStore;
    use tower::ServiceExt;

    async fn post_json(state: Arc<AppState>, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = create_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_generate_writes_frames_and_alerts() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.paths.root = dir.path().to_path_buf();
        config.simulation.cities = 2;
        config.simulation.timesteps = 30;
        let state = Arc::new(AppState::from_config(config));

        let (status, body) = post_json(state.clone(), "/api/generate-simulation").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["message"].as_str().unwrap().contains("60 frames"));
        assert!(state.store.alerts_path().exists());

        let (status, body) = get_json(create_router(state), "/api/simulation").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 60);
    }

    #[tokio::test]
    async fn test_generate_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("not-a-dir");
        std::fs::write(&blocked, "").unwrap();
        let state = Arc::new(AppState::new(ArtifactStore::new(&blocked)));

        let (status, body) = post_json(state, "/api/generate-simulation").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().starts_with("Failed to generate simulation"));
    }

    #[tokio::test]
    async fn test_not_generated() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(Arc::new(AppState::new(ArtifactStore::new(dir.path()))));

        let (status, body) = get_json(app, "/api/simulation").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Simulation not generated yet");
    }

    #[tokio::test]
    async fn test_frames_by_timestep() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let config = SimulationConfig {
            cities: 3,
            timesteps: 5,
            ..Default::default()
        };
        let output = run_simulation(&config, &RiskEngine::default(), AlertFeedConfig::default());
        store.write_json(&store.simulation_path(), &output.frames).unwrap();
        let state = Arc::new(AppState::new(store));

        let (status, body) = get_json(create_router(state.clone()), "/api/simulation").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 15);

        let (_, body) = get_json(create_router(state), "/api/simulation?timestep=4").await;
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data[0]["city"], "Mumbai");
        assert_eq!(data[0]["source"], "simulated");
    }
}
