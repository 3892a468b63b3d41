//! The scoring artifact: a fitted scaler, a fitted classifier and the feature
//! contract they were trained against.
//!
//! Artifacts are produced offline by the training job, loaded once at startup
//! and shared read-only behind an `Arc` for the life of the process.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::encoding::{Currency, FeatureColumn};
use crate::errors::{ArtifactLoadError, ScoringError};
use crate::integrity;
use crate::models::FeatureImportance;

/// Produces the positive-class (churn) probability for a scaled feature vector.
pub trait ChurnClassifier: Send + Sync {
    fn predict_probability(&self, features: &[f64]) -> Result<f64, ScoringError>;
}

/// Maps raw feature values onto the distribution the classifier was trained on.
pub trait FeatureScaler: Send + Sync {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ScoringError>;
}

/// Standardization with per-column mean and scale: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Zero scales (constant training columns) are replaced by 1.0, so those
    /// columns are only centered.
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        let scale = scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();
        Self { mean, scale }
    }
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ScoringError> {
        if features.len() != self.mean.len() || features.len() != self.scale.len() {
            return Err(ScoringError::Internal(format!(
                "scaler expects {} features, got {}",
                self.mean.len(),
                features.len()
            )));
        }

        Ok(features
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }
}

/// Binary logistic regression: `sigmoid(intercept + coefficients · x)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl ChurnClassifier for LogisticRegression {
    fn predict_probability(&self, features: &[f64]) -> Result<f64, ScoringError> {
        if features.len() != self.coefficients.len() {
            return Err(ScoringError::Internal(format!(
                "model expects {} features, got {}",
                self.coefficients.len(),
                features.len()
            )));
        }

        let logit = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>();

        Ok(sigmoid(logit))
    }
}

/// Numerically stable logistic function.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ModelDocument {
    LogisticRegression(LogisticRegression),
}

/// On-disk layout. Every component is optional here so that absence can be
/// reported as a missing capability rather than a generic parse error.
#[derive(Debug, Deserialize)]
struct ArtifactDocument {
    version: Option<String>,
    trained_at: Option<DateTime<Utc>>,
    currency: Option<String>,
    feature_columns: Option<Vec<String>>,
    scaler: Option<StandardScaler>,
    model: Option<ModelDocument>,
    feature_importance: Option<Vec<FeatureImportance>>,
}

/// Descriptive information about a loaded artifact.
#[derive(Debug, Clone)]
pub struct ArtifactMetadata {
    pub version: Option<String>,
    pub trained_at: Option<DateTime<Utc>>,
    /// Unit the monetary features were trained in.
    pub currency: Currency,
    /// Hex SHA-256 of the file the artifact was read from.
    pub sha256: Option<String>,
    pub source: Option<PathBuf>,
    pub loaded_at: DateTime<Utc>,
}

impl Default for ArtifactMetadata {
    fn default() -> Self {
        Self {
            version: None,
            trained_at: None,
            currency: Currency::default(),
            sha256: None,
            source: None,
            loaded_at: Utc::now(),
        }
    }
}

/// Immutable model bundle consumed by the inference core.
pub struct ScoringArtifact {
    model: Arc<dyn ChurnClassifier>,
    scaler: Arc<dyn FeatureScaler>,
    feature_columns: Vec<FeatureColumn>,
    feature_importance: Option<Vec<FeatureImportance>>,
    metadata: ArtifactMetadata,
}

impl fmt::Debug for ScoringArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoringArtifact")
            .field("feature_columns", &self.feature_columns)
            .field("feature_importance", &self.feature_importance)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl ScoringArtifact {
    /// Builds an artifact from already-fitted capabilities.
    ///
    /// # Arguments
    ///
    /// * `model` - Classifier returning the churn probability.
    /// * `scaler` - Transform applied to the raw feature vector.
    /// * `feature_columns` - Column order the model and scaler were fitted with.
    /// * `feature_importance` - Optional ranked importance table.
    pub fn new(
        model: Arc<dyn ChurnClassifier>,
        scaler: Arc<dyn FeatureScaler>,
        feature_columns: Vec<FeatureColumn>,
        feature_importance: Option<Vec<FeatureImportance>>,
    ) -> Result<Self, ArtifactLoadError> {
        if feature_columns.is_empty() {
            return Err(ArtifactLoadError::MissingComponent("feature_columns"));
        }

        let mut seen = HashSet::new();
        for column in &feature_columns {
            if !seen.insert(*column) {
                return Err(ArtifactLoadError::DuplicateFeature(column.name().to_string()));
            }
        }

        Ok(Self {
            model,
            scaler,
            feature_columns,
            feature_importance,
            metadata: ArtifactMetadata::default(),
        })
    }

    /// Sets the currency the monetary features were trained in.
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.metadata.currency = currency;
        self
    }

    /// Loads an artifact from disk.
    ///
    /// When `pinned_checksum` is given, or a `<path>.sha256` sidecar exists,
    /// the file bytes must match that digest.
    ///
    /// # Errors
    ///
    /// Any [`ArtifactLoadError`]; all of them are fatal at startup.
    pub fn load(
        path: impl AsRef<Path>,
        pinned_checksum: Option<&str>,
    ) -> Result<Self, ArtifactLoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ArtifactLoadError::Missing(path.to_path_buf()));
        }

        let bytes = std::fs::read(path).map_err(|source| ArtifactLoadError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let expected = pinned_checksum
            .map(str::to_string)
            .or_else(|| integrity::read_sidecar(path));
        let sha256 = match expected {
            Some(expected) => integrity::verify(&bytes, &expected)?,
            None => {
                tracing::debug!("No checksum pinned for {}; skipping verification", path.display());
                integrity::compute_checksum(&bytes)
            }
        };

        let mut artifact = Self::from_slice(&bytes)?;
        artifact.metadata.sha256 = Some(sha256);
        artifact.metadata.source = Some(path.to_path_buf());

        tracing::info!(
            "Loaded scoring artifact {} (version: {}, {} features)",
            path.display(),
            artifact.metadata.version.as_deref().unwrap_or("unversioned"),
            artifact.feature_columns.len()
        );

        Ok(artifact)
    }

    /// Parses and validates an artifact document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ArtifactLoadError> {
        let document: ArtifactDocument = serde_json::from_slice(bytes)?;

        let column_names = document
            .feature_columns
            .ok_or(ArtifactLoadError::MissingComponent("feature_columns"))?;
        let scaler = document
            .scaler
            .ok_or(ArtifactLoadError::MissingComponent("scaler"))?;
        let ModelDocument::LogisticRegression(model) = document
            .model
            .ok_or(ArtifactLoadError::MissingComponent("model"))?;

        let feature_columns = column_names
            .iter()
            .map(|name| {
                FeatureColumn::from_name(name)
                    .ok_or_else(|| ArtifactLoadError::UnknownFeature(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let expected = feature_columns.len();
        check_shape("scaler.mean", expected, scaler.mean.len())?;
        check_shape("scaler.scale", expected, scaler.scale.len())?;
        check_shape("model.coefficients", expected, model.coefficients.len())?;

        let currency = match document.currency {
            Some(code) => {
                Currency::parse(&code).ok_or(ArtifactLoadError::UnsupportedCurrency(code))?
            }
            None => Currency::default(),
        };

        let scaler = StandardScaler::new(scaler.mean, scaler.scale);
        let mut artifact = Self::new(
            Arc::new(model),
            Arc::new(scaler),
            feature_columns,
            document.feature_importance,
        )?
        .with_currency(currency);
        artifact.metadata.version = document.version;
        artifact.metadata.trained_at = document.trained_at;

        Ok(artifact)
    }

    pub fn predict_probability(&self, features: &[f64]) -> Result<f64, ScoringError> {
        self.model.predict_probability(features)
    }

    pub fn transform_features(&self, features: &[f64]) -> Result<Vec<f64>, ScoringError> {
        self.scaler.transform(features)
    }

    /// Column order every feature vector must follow.
    pub fn feature_columns(&self) -> &[FeatureColumn] {
        &self.feature_columns
    }

    pub fn feature_importance(&self) -> Option<&[FeatureImportance]> {
        self.feature_importance.as_deref()
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }
}

fn check_shape(
    component: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), ArtifactLoadError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ArtifactLoadError::ShapeMismatch {
            component,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_feature_document() -> serde_json::Value {
        json!({
            "version": "test-1",
            "currency": "EUR",
            "feature_columns": ["Age", "Balance"],
            "scaler": { "mean": [40.0, 1000.0], "scale": [10.0, 0.0] },
            "model": { "type": "logistic_regression", "coefficients": [1.0, 0.5], "intercept": 0.0 },
            "feature_importance": [
                { "feature": "Age", "importance": 1.0 },
                { "feature": "Balance", "importance": 0.5 }
            ]
        })
    }

    #[test]
    fn test_sigmoid_is_stable() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(-800.0).is_finite());
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_standard_scaler_transform() {
        let scaler = StandardScaler::new(vec![10.0, 5.0], vec![2.0, 0.0]);
        let scaled = scaler.transform(&[14.0, 7.0]).unwrap();
        assert_eq!(scaled, vec![2.0, 2.0]);
        assert!(scaler.transform(&[1.0]).is_err());
    }

    #[test]
    fn test_logistic_regression_probability() {
        let model = LogisticRegression {
            coefficients: vec![1.0, -1.0],
            intercept: 0.0,
        };
        assert_eq!(model.predict_probability(&[2.0, 2.0]).unwrap(), 0.5);
        assert!(model.predict_probability(&[3.0, 0.0]).unwrap() > 0.9);
        assert!(matches!(
            model.predict_probability(&[1.0]),
            Err(ScoringError::Internal(_))
        ));
    }

    #[test]
    fn test_from_slice_builds_artifact() {
        let bytes = serde_json::to_vec(&two_feature_document()).unwrap();
        let artifact = ScoringArtifact::from_slice(&bytes).unwrap();

        assert_eq!(
            artifact.feature_columns(),
            &[FeatureColumn::Age, FeatureColumn::Balance]
        );
        assert_eq!(artifact.metadata().version.as_deref(), Some("test-1"));
        assert_eq!(artifact.feature_importance().map(<[_]>::len), Some(2));

        // Zero scale only centers the column.
        let scaled = artifact.transform_features(&[50.0, 1500.0]).unwrap();
        assert_eq!(scaled, vec![1.0, 500.0]);
    }

    #[test]
    fn test_missing_components_are_reported() {
        for component in ["feature_columns", "scaler", "model"] {
            let mut doc = two_feature_document();
            doc.as_object_mut().unwrap().remove(component);
            let bytes = serde_json::to_vec(&doc).unwrap();

            match ScoringArtifact::from_slice(&bytes) {
                Err(ArtifactLoadError::MissingComponent(name)) => assert_eq!(name, component),
                other => panic!("expected missing {}, got {:?}", component, other),
            }
        }
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut doc = two_feature_document();
        doc["model"]["coefficients"] = json!([1.0]);
        let bytes = serde_json::to_vec(&doc).unwrap();

        assert!(matches!(
            ScoringArtifact::from_slice(&bytes),
            Err(ArtifactLoadError::ShapeMismatch {
                component: "model.coefficients",
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_unknown_and_duplicate_columns_rejected() {
        let mut doc = two_feature_document();
        doc["feature_columns"] = json!(["Age", "Income"]);
        let bytes = serde_json::to_vec(&doc).unwrap();
        assert!(matches!(
            ScoringArtifact::from_slice(&bytes),
            Err(ArtifactLoadError::UnknownFeature(ref name)) if name == "Income"
        ));

        let mut doc = two_feature_document();
        doc["feature_columns"] = json!(["Age", "Age"]);
        let bytes = serde_json::to_vec(&doc).unwrap();
        assert!(matches!(
            ScoringArtifact::from_slice(&bytes),
            Err(ArtifactLoadError::DuplicateFeature(_))
        ));
    }

    #[test]
    fn test_unknown_model_type_is_malformed() {
        let mut doc = two_feature_document();
        doc["model"]["type"] = json!("random_forest");
        let bytes = serde_json::to_vec(&doc).unwrap();
        assert!(matches!(
            ScoringArtifact::from_slice(&bytes),
            Err(ArtifactLoadError::Malformed(_))
        ));
    }

    #[test]
    fn test_unsupported_currency_rejected() {
        let mut doc = two_feature_document();
        doc["currency"] = json!("JPY");
        let bytes = serde_json::to_vec(&doc).unwrap();
        assert!(matches!(
            ScoringArtifact::from_slice(&bytes),
            Err(ArtifactLoadError::UnsupportedCurrency(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let result = ScoringArtifact::load(dir.path().join("absent.json"), None);
        assert!(matches!(result, Err(ArtifactLoadError::Missing(_))));
    }

    #[test]
    fn test_load_verifies_sidecar_checksum() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("model.json");
        let bytes = serde_json::to_vec(&two_feature_document()).unwrap();
        std::fs::write(&path, &bytes).unwrap();

        std::fs::write(integrity::sidecar_path(&path), integrity::compute_checksum(&bytes)).unwrap();
        let artifact = ScoringArtifact::load(&path, None).unwrap();
        assert_eq!(
            artifact.metadata().sha256.as_deref(),
            Some(integrity::compute_checksum(&bytes).as_str())
        );

        std::fs::write(integrity::sidecar_path(&path), "deadbeef").unwrap();
        assert!(matches!(
            ScoringArtifact::load(&path, None),
            Err(ArtifactLoadError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_pinned_checksum_takes_precedence_over_sidecar() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("model.json");
        let bytes = serde_json::to_vec(&two_feature_document()).unwrap();
        let digest = integrity::compute_checksum(&bytes);
        std::fs::write(&path, &bytes).unwrap();

        // Valid sidecar, wrong pin
        std::fs::write(integrity::sidecar_path(&path), &digest).unwrap();
        assert!(matches!(
            ScoringArtifact::load(&path, Some("0".repeat(64).as_str())),
            Err(ArtifactLoadError::ChecksumMismatch { .. })
        ));

        // Bad sidecar, correct pin
        std::fs::write(integrity::sidecar_path(&path), "deadbeef").unwrap();
        let artifact = ScoringArtifact::load(&path, Some(digest.as_str())).unwrap();
        assert_eq!(artifact.metadata().sha256.as_deref(), Some(digest.as_str()));
    }

    #[test]
    fn test_non_finite_parameters_are_malformed() {
        let text = two_feature_document().to_string();
        assert!(text.contains("\"intercept\":0.0"));

        for literal in ["1e400", "NaN", "Infinity", "-Infinity"] {
            let patched = text.replace("\"intercept\":0.0", &format!("\"intercept\":{}", literal));
            assert!(
                matches!(
                    ScoringArtifact::from_slice(patched.as_bytes()),
                    Err(ArtifactLoadError::Malformed(_))
                ),
                "{} accepted",
                literal
            );
        }
    }
}
