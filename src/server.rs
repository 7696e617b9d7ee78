//! HTTP serving
//!
//! A thin axum transport over the synchronous prediction library. The
//! predictor is loaded once at startup and shared read-only across
//! requests. If the artifacts cannot be loaded the service still starts
//! and answers every request from the heuristic.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::PipelineError;
use crate::predict::{
    artifact_paths_from_env, heuristic_prediction, MoodPredictor, Prediction, PredictionRequest,
};

pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Server settings; every variable has a default
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
    pub addr: SocketAddr,
}

impl ServerConfig {
    /// Reads `MOODCAST_MODEL_PATH`, `MOODCAST_SCALER_PATH` and
    /// `MOODCAST_ADDR` from the environment
    pub fn from_env() -> Result<Self, PipelineError> {
        let (model_path, scaler_path) = artifact_paths_from_env();
        let addr = std::env::var("MOODCAST_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
        let addr: SocketAddr = addr.parse().map_err(|_| {
            PipelineError::Config(format!("MOODCAST_ADDR is not a socket address: {addr}"))
        })?;
        Ok(Self {
            model_path,
            scaler_path,
            addr,
        })
    }
}

/// Shared state; `None` means heuristic-only serving
#[derive(Clone)]
pub struct AppState {
    predictor: Arc<Option<MoodPredictor>>,
}

impl AppState {
    pub fn new(predictor: Option<MoodPredictor>) -> Self {
        Self {
            predictor: Arc::new(predictor),
        }
    }

    /// Loads the artifacts named by the config. A load failure is logged
    /// and downgrades the service to heuristic-only answers.
    pub fn from_config(config: &ServerConfig) -> Self {
        match MoodPredictor::load(&config.model_path, &config.scaler_path) {
            Ok(predictor) => {
                info!(
                    model = %config.model_path.display(),
                    scaler = %config.scaler_path.display(),
                    "prediction artifacts loaded"
                );
                Self::new(Some(predictor))
            }
            Err(e) => {
                warn!("artifacts unavailable, serving heuristic only: {e}");
                Self::new(None)
            }
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Installs the fmt subscriber honoring `RUST_LOG`, defaulting to `info`
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Binds and serves until the process is stopped
pub async fn serve(config: ServerConfig) -> Result<(), PipelineError> {
    let state = AppState::from_config(&config);
    let app = build_router(state);

    info!("listening on {}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Endpoint failures; the body keeps the flat `{"error": ...}` wire shape
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => {
                tracing::error!("prediction failed: {message}");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": crate::PRODUCER_NAME,
        "version": crate::MOODCAST_VERSION,
    }))
}

async fn predict_handler(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<Prediction>, ApiError> {
    let Json(request) = payload?;

    let prediction = match &*state.predictor {
        Some(predictor) => predictor.predict(&request),
        None => heuristic_prediction(&request),
    };

    // A corrupt artifact can push NaN through the linear algebra without
    // raising; refuse to serve a non-numeric score.
    if !prediction.prediction.is_finite() {
        return Err(ApiError::Internal(
            "model produced a non-finite score".to_string(),
        ));
    }
    Ok(Json(prediction))
}
