use crate::config::Config;
use crate::errors::AppError;
use crate::models::*;
use crate::scoring::ChurnScorer;
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Scorer bound to the artifact loaded at startup. Read-only.
    pub scorer: ChurnScorer,
}

impl AppState {
    pub fn new(config: Config, scorer: ChurnScorer) -> Self {
        Self { config, scorer }
    }
}

/// Health check endpoint.
///
/// Returns the service status, version, and the version of the loaded artifact.
#[utoipa::path(
    get,
    path = "/health",
    tag = "service",
    responses((status = 200, description = "Service is up and the artifact is loaded"))
)]
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    let metadata = state.scorer.artifact().metadata();
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "churn-scoring-api",
            "version": env!("CARGO_PKG_VERSION"),
            "environment": state.config.environment,
            "model_version": metadata.version,
        })),
    )
}

/// POST /predict
///
/// Scores one customer and returns the churn probability, the thresholded
/// decision and the model's feature importance.
///
/// # Returns
///
/// * `Result<Json<PredictionResult>, Response>` - The prediction, or the rendered
///   `AppError`: a 400 naming the invalid field or an opaque 500.
#[utoipa::path(
    post,
    path = "/predict",
    tag = "scoring",
    request_body = CustomerRecord,
    responses(
        (status = 200, description = "Churn prediction", body = PredictionResult),
        (status = 400, description = "A field is out of range or has no encoding", body = ErrorResponse),
        (status = 500, description = "Scoring failed", body = ErrorResponse)
    )
)]
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(record): Json<CustomerRecord>,
) -> Result<Json<PredictionResult>, Response> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("predict", %request_id);

    // Errors are rendered inside the span so their logs carry request_id.
    span.in_scope(|| {
        tracing::info!("POST /predict");
        match state.scorer.score(&record) {
            Ok(result) => {
                tracing::info!(
                    "Prediction complete. Probability: {}, Decision: {}",
                    result.churn_probability,
                    result.label()
                );
                Ok(Json(result))
            }
            Err(err) => Err(AppError::from(err).into_response()),
        }
    })
}

/// GET /model
///
/// Describes the loaded artifact: version, feature contract and digest.
#[utoipa::path(
    get,
    path = "/model",
    tag = "scoring",
    responses((status = 200, description = "Loaded artifact contract", body = ModelInfo))
)]
pub async fn model_info(State(state): State<Arc<AppState>>) -> Json<ModelInfo> {
    let artifact = state.scorer.artifact();
    let metadata = artifact.metadata();

    Json(ModelInfo {
        version: metadata.version.clone(),
        trained_at: metadata.trained_at,
        currency: metadata.currency.to_string(),
        feature_columns: artifact
            .feature_columns()
            .iter()
            .map(|column| column.name().to_string())
            .collect(),
        feature_importance: artifact.feature_importance().map(<[_]>::to_vec),
        sha256: metadata.sha256.clone(),
        loaded_at: metadata.loaded_at,
    })
}

/// Fallback for unmatched routes, so every error body is JSON.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}
