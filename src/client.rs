use crate::errors::AppError;
use crate::models::{CustomerRecord, ErrorResponse, ModelInfo, PredictionResult};
use std::time::Duration;

/// Client for a running churn scoring API.
///
/// This is the request side of the dashboard: it posts a record to
/// `/predict` and decodes the result.
#[derive(Clone)]
pub struct ChurnApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ChurnApiClient {
    /// Creates a new `ChurnApiClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the API, e.g. `http://localhost:8000`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create scoring client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Scores a customer.
    ///
    /// # Returns
    ///
    /// * `Result<PredictionResult, AppError>` - The prediction. A 400 from the API
    ///   is returned as `AppError::BadRequest` carrying the API's message.
    pub async fn predict(&self, record: &CustomerRecord) -> Result<PredictionResult, AppError> {
        let url = format!("{}/predict", self.base_url);
        tracing::debug!("Posting customer record to {}", url);

        let response = self
            .client
            .post(&url)
            .json(record)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Scoring request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| "Invalid customer record".to_string());
            return Err(AppError::BadRequest(message));
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Scoring API returned {}: {}",
                status, error_text
            )));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse prediction: {}", e))
        })
    }

    /// Fetches the contract of the artifact the API is serving.
    pub async fn model_info(&self) -> Result<ModelInfo, AppError> {
        let url = format!("{}/model", self.base_url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::ExternalApiError(format!(
                "Scoring API returned {} for /model",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    /// Checks that the API is up.
    pub async fn health(&self) -> Result<serde_json::Value, AppError> {
        let url = format!("{}/health", self.base_url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::ExternalApiError(format!(
                "Health check returned {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}
