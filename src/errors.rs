use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use std::path::PathBuf;

/// Application-specific error types surfaced at the HTTP boundary.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Resource not found error.
    NotFound(String),
    /// Bad request error (invalid input).
    BadRequest(String),
    /// Error interacting with a remote scoring API.
    ExternalApiError(String),
    /// Internal server error.
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::ExternalApiError(msg) => write!(f, "External API error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Maps each error variant to an appropriate HTTP status code and JSON body.
    /// Client faults are logged at info level; only internal faults reach `error!`.
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => {
                tracing::info!("Rejected request: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::ExternalApiError(msg) => {
                tracing::error!("External API error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "External service error".to_string(),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalApiError(err.to_string())
    }
}

impl From<ScoringError> for AppError {
    /// Validation failures become 400s naming the field; everything else is opaque.
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::InvalidInput { .. } => AppError::BadRequest(err.to_string()),
            ScoringError::Internal(msg) => AppError::InternalError(msg),
        }
    }
}

/// Per-request scoring failures.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoringError {
    /// A field is out of range or a categorical value has no encoding.
    /// Attributable to the caller; never retried.
    InvalidInput {
        /// Wire name of the offending field (e.g. `Age`).
        field: &'static str,
        /// Human-readable description of what was wrong.
        reason: String,
    },
    /// Scaling or prediction failed after validation passed.
    Internal(String),
}

impl ScoringError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ScoringError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// The offending field for validation failures.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ScoringError::InvalidInput { field, .. } => Some(field),
            ScoringError::Internal(_) => None,
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, ScoringError::InvalidInput { .. })
    }
}

impl fmt::Display for ScoringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringError::InvalidInput { field, reason } => {
                write!(f, "Invalid value for {}: {}", field, reason)
            }
            ScoringError::Internal(msg) => write!(f, "Internal scoring error: {}", msg),
        }
    }
}

impl std::error::Error for ScoringError {}

/// Startup failures while loading the scoring artifact. Always fatal.
#[derive(Debug)]
pub enum ArtifactLoadError {
    /// No file at the configured path.
    Missing(PathBuf),
    /// The file exists but could not be read.
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The file is not a valid artifact document.
    Malformed(serde_json::Error),
    /// A required capability (model, scaler, feature_columns) is absent.
    MissingComponent(&'static str),
    /// The artifact names a feature column the encoder does not know.
    UnknownFeature(String),
    /// The same feature column appears twice.
    DuplicateFeature(String),
    /// A parameter vector does not match the number of feature columns.
    ShapeMismatch {
        component: &'static str,
        expected: usize,
        actual: usize,
    },
    /// The artifact declares a currency with no conversion rate.
    UnsupportedCurrency(String),
    /// The file digest does not match the pinned SHA-256.
    ChecksumMismatch { expected: String, actual: String },
}

impl fmt::Display for ArtifactLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactLoadError::Missing(path) => {
                write!(f, "Artifact not found at {}", path.display())
            }
            ArtifactLoadError::Unreadable { path, source } => {
                write!(f, "Failed to read artifact {}: {}", path.display(), source)
            }
            ArtifactLoadError::Malformed(e) => write!(f, "Malformed artifact: {}", e),
            ArtifactLoadError::MissingComponent(name) => {
                write!(f, "Artifact is missing required component '{}'", name)
            }
            ArtifactLoadError::UnknownFeature(name) => {
                write!(f, "Artifact declares unknown feature column '{}'", name)
            }
            ArtifactLoadError::DuplicateFeature(name) => {
                write!(f, "Artifact declares feature column '{}' more than once", name)
            }
            ArtifactLoadError::ShapeMismatch {
                component,
                expected,
                actual,
            } => write!(
                f,
                "Artifact {} has {} values, expected {} (one per feature column)",
                component, actual, expected
            ),
            ArtifactLoadError::UnsupportedCurrency(code) => {
                write!(f, "Artifact currency '{}' has no conversion rate", code)
            }
            ArtifactLoadError::ChecksumMismatch { expected, actual } => write!(
                f,
                "Artifact checksum mismatch: expected {}, got {}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for ArtifactLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArtifactLoadError::Unreadable { source, .. } => Some(source),
            ArtifactLoadError::Malformed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ArtifactLoadError {
    fn from(err: serde_json::Error) -> Self {
        ArtifactLoadError::Malformed(err)
    }
}
