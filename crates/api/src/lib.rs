//! Suraksha Flood Risk API
//!
//! Pipeline orchestration, the city simulation and the dashboard API server.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::sync::Arc;
use storage::{ArtifactStore, StorageError};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod pipeline;
mod routes;
pub mod simulation;

pub use config::AppConfig;
pub use pipeline::{ModelStats, Pipeline, RunSummary};

/// Application state shared across handlers
pub struct AppState {
    /// Artifact store the handlers read from
    pub store: ArtifactStore,
    /// Settings for runs triggered over HTTP
    pub config: AppConfig,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Prometheus render handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state with default settings rooted at the store
    pub fn new(store: ArtifactStore) -> Self {
        let mut config = AppConfig::default();
        config.paths.root = store.root().to_path_buf();
        Self::from_config(config)
    }

    pub fn from_config(config: AppConfig) -> Self {
        Self {
            store: ArtifactStore::new(&config.paths.root),
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Success envelope used by every `/api` route
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self { success: true, data })
    }
}

/// Envelope for routes that only report an outcome
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Failure envelope
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

/// Handler errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Data(#[from] flood_data::DataError),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) | ApiError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            success: false,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
}

/// Which artifacts are present on disk
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub datasets: bool,
    pub models: bool,
    pub simulation: bool,
    pub alerts: bool,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/alerts", get(routes::alerts::get_alerts))
        .route("/api/cities", get(routes::cities::get_cities))
        .route("/api/model-stats", get(routes::models::get_model_stats))
        .route("/api/simulation", get(routes::simulation::get_simulation))
        .route("/api/generate-simulation", post(routes::simulation::generate_simulation))
        .route("/metrics", get(metrics_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentStatus {
            datasets: state.store.has_datasets(),
            models: state.store.has_models(),
            simulation: state.store.simulation_path().exists(),
            alerts: state.store.alerts_path().exists(),
        },
    })
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

/// Parse a configured log level (`trace`, `debug`, `info`, `warn`, `error`)
pub fn parse_log_level(level: &str) -> anyhow::Result<Level> {
    level
        .trim()
        .parse::<Level>()
        .map_err(|_| anyhow::anyhow!("invalid log level '{level}' (expected trace, debug, info, warn or error)"))
}

/// Initialize logging at the given level
pub fn init_logging(level: &str) -> anyhow::Result<()> {
    let level = parse_log_level(level)?;
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Install the Prometheus recorder for the process
pub fn install_metrics() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

/// Run the server
pub async fn run_server(config: &AppConfig, metrics: PrometheusHandle) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_config(config.clone()).with_metrics(metrics));
    let app = create_router(state);

    info!("Starting API server on {}", config.server.addr);

    let listener = tokio::net::TcpListener::bind(&config.server.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    pub(crate) async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_reports_components() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.setup_directories().unwrap();
        let app = create_router(Arc::new(AppState::new(store)));

        let (status, body) = get_json(app, "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["components"]["datasets"], false);
        assert_eq!(body["components"]["models"], false);
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level(" WARN ").unwrap(), Level::WARN);

        let err = parse_log_level("verbose").unwrap_err();
        assert!(err.to_string().contains("'verbose'"));
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(Arc::new(AppState::new(ArtifactStore::new(dir.path()))));

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
