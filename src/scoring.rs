//! Inference core: turns one customer record into a churn prediction.
//!
//! The pipeline is validate → encode → assemble → scale → predict → decide →
//! shape. Validation always completes before the artifact is touched, so a
//! rejected record never reaches the scaler or the model.

use std::sync::Arc;

use crate::artifact::ScoringArtifact;
use crate::encoding::{display_label, Currency, FeatureColumn, Gender, Geography};
use crate::errors::ScoringError;
use crate::models::{CustomerRecord, FeatureImportance, PredictionResult};

/// Probabilities at or above this value are classified as churn.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Raw model input, ordered exactly as the artifact's feature columns.
pub type FeatureVector = Vec<f64>;

/// A record whose fields have all passed their range and enum checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord {
    pub credit_score: u16,
    pub geography: Geography,
    pub gender: Gender,
    pub age: u8,
    pub tenure: u8,
    pub balance: f64,
    pub num_of_products: u8,
    pub has_credit_card: bool,
    pub is_active_member: bool,
    pub estimated_salary: f64,
    /// Currency the monetary fields were supplied in.
    pub currency: Currency,
}

impl ValidatedRecord {
    /// Value of one column before scaling. Monetary columns are still in the
    /// record's own currency here.
    fn raw_value(&self, column: FeatureColumn) -> f64 {
        match column {
            FeatureColumn::CreditScore => f64::from(self.credit_score),
            FeatureColumn::Geography => f64::from(self.geography.code()),
            FeatureColumn::Gender => f64::from(self.gender.code()),
            FeatureColumn::Age => f64::from(self.age),
            FeatureColumn::Tenure => f64::from(self.tenure),
            FeatureColumn::Balance => self.balance,
            FeatureColumn::NumOfProducts => f64::from(self.num_of_products),
            FeatureColumn::HasCrCard => f64::from(u8::from(self.has_credit_card)),
            FeatureColumn::IsActiveMember => f64::from(u8::from(self.is_active_member)),
            FeatureColumn::EstimatedSalary => self.estimated_salary,
        }
    }
}

/// Validates every field of `record`.
///
/// Fields are checked in training-column order and the first failure is
/// returned. `default_currency` applies when the record does not name one.
pub fn validate(
    record: &CustomerRecord,
    default_currency: Currency,
) -> Result<ValidatedRecord, ScoringError> {
    let credit_score = check_range("CreditScore", record.credit_score, 300, 900)?;

    let geography = Geography::parse(&record.geography).ok_or_else(|| {
        ScoringError::invalid(
            "Geography",
            format!(
                "unknown value '{}' (expected France, Germany or Spain)",
                record.geography
            ),
        )
    })?;

    let gender = Gender::parse(&record.gender).ok_or_else(|| {
        ScoringError::invalid(
            "Gender",
            format!("unknown value '{}' (expected Female or Male)", record.gender),
        )
    })?;

    let age = check_range("Age", record.age, 18, 100)?;
    let tenure = check_range("Tenure", record.tenure, 0, 10)?;
    let balance = check_amount("Balance", record.balance)?;
    let num_of_products = check_range("NumOfProducts", record.num_of_products, 1, 4)?;
    let has_credit_card = check_range("HasCrCard", record.has_credit_card, 0, 1)? == 1;
    let is_active_member = check_range("IsActiveMember", record.is_active_member, 0, 1)? == 1;
    let estimated_salary = check_amount("EstimatedSalary", record.estimated_salary)?;

    let currency = match record.currency.as_deref() {
        Some(code) => Currency::parse(code).ok_or_else(|| {
            ScoringError::invalid(
                "Currency",
                format!("unsupported currency '{}' (expected EUR, USD, GBP or INR)", code),
            )
        })?,
        None => default_currency,
    };

    // A finite amount can still overflow once converted.
    for (field, amount) in [("Balance", balance), ("EstimatedSalary", estimated_salary)] {
        if !currency.convert(amount, default_currency).is_finite() {
            return Err(ScoringError::invalid(
                field,
                format!(
                    "amount out of range after conversion from {} to {}",
                    currency, default_currency
                ),
            ));
        }
    }

    Ok(ValidatedRecord {
        credit_score: credit_score as u16,
        geography,
        gender,
        age: age as u8,
        tenure: tenure as u8,
        balance,
        num_of_products: num_of_products as u8,
        has_credit_card,
        is_active_member,
        estimated_salary,
        currency,
    })
}

fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<i64, ScoringError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ScoringError::invalid(
            field,
            format!("must be between {} and {}, got {}", min, max, value),
        ))
    }
}

fn check_amount(field: &'static str, value: f64) -> Result<f64, ScoringError> {
    if !value.is_finite() {
        return Err(ScoringError::invalid(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(ScoringError::invalid(
            field,
            format!("must not be negative, got {}", value),
        ));
    }
    Ok(value)
}

/// Rounds half away from zero to 3 decimal places (0.8235001 → 0.824,
/// 0.8234999 → 0.823).
pub fn round_probability(probability: f64) -> f64 {
    (probability * 1000.0).round() / 1000.0
}

/// Scores customer records against one loaded artifact.
///
/// Holds no mutable state; a single instance is shared by every request.
#[derive(Debug, Clone)]
pub struct ChurnScorer {
    artifact: Arc<ScoringArtifact>,
    relabel_importance: bool,
}

impl ChurnScorer {
    pub fn new(artifact: Arc<ScoringArtifact>) -> Self {
        Self {
            artifact,
            relabel_importance: false,
        }
    }

    /// Replace feature names in the importance list with display labels.
    pub fn with_relabeled_importance(mut self, relabel: bool) -> Self {
        self.relabel_importance = relabel;
        self
    }

    pub fn artifact(&self) -> &ScoringArtifact {
        &self.artifact
    }

    pub fn validate(&self, record: &CustomerRecord) -> Result<ValidatedRecord, ScoringError> {
        validate(record, self.artifact.metadata().currency)
    }

    /// Builds the raw feature vector in the artifact's column order,
    /// converting monetary fields into the artifact's currency.
    pub fn assemble_features(&self, record: &ValidatedRecord) -> FeatureVector {
        let target = self.artifact.metadata().currency;

        self.artifact
            .feature_columns()
            .iter()
            .map(|&column| {
                let value = record.raw_value(column);
                if column.is_monetary() {
                    record.currency.convert(value, target)
                } else {
                    value
                }
            })
            .collect()
    }

    /// Scores one record.
    ///
    /// # Errors
    ///
    /// * [`ScoringError::InvalidInput`] when a field fails validation; the
    ///   artifact is not invoked.
    /// * [`ScoringError::Internal`] for any failure in scaling or prediction.
    pub fn score(&self, record: &CustomerRecord) -> Result<PredictionResult, ScoringError> {
        let validated = self.validate(record)?;
        let features = self.assemble_features(&validated);

        let scaled = self
            .artifact
            .transform_features(&features)
            .map_err(into_internal)?;
        if scaled.len() != features.len() || scaled.iter().any(|v| !v.is_finite()) {
            return Err(ScoringError::Internal(
                "scaler produced an invalid feature vector".to_string(),
            ));
        }

        let probability = self
            .artifact
            .predict_probability(&scaled)
            .map_err(into_internal)?;
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(ScoringError::Internal(format!(
                "model returned probability outside [0, 1]: {}",
                probability
            )));
        }

        // Decide on the reported value so the response is self-consistent.
        let churn_probability = round_probability(probability);
        let prediction = churn_probability >= DECISION_THRESHOLD;

        tracing::debug!(
            "Scored customer: probability={:.6} reported={} prediction={}",
            probability,
            churn_probability,
            prediction
        );

        Ok(PredictionResult {
            churn_probability,
            prediction,
            feature_importance: self.feature_importance(),
        })
    }

    fn feature_importance(&self) -> Option<Vec<FeatureImportance>> {
        self.artifact.feature_importance().map(|entries| {
            entries
                .iter()
                .map(|entry| FeatureImportance {
                    feature: if self.relabel_importance {
                        display_label(&entry.feature)
                    } else {
                        entry.feature.clone()
                    },
                    importance: entry.importance,
                })
                .collect()
        })
    }
}

/// Any failure past validation is the service's fault, not the caller's.
fn into_internal(err: ScoringError) -> ScoringError {
    match err {
        ScoringError::Internal(_) => err,
        other => ScoringError::Internal(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{LogisticRegression, StandardScaler};

    fn record() -> CustomerRecord {
        CustomerRecord {
            credit_score: 650,
            geography: "France".to_string(),
            gender: "Male".to_string(),
            age: 35,
            tenure: 5,
            balance: 50000.0,
            num_of_products: 1,
            has_credit_card: 1,
            is_active_member: 1,
            estimated_salary: 50000.0,
            currency: None,
        }
    }

    fn identity_scorer(columns: Vec<FeatureColumn>) -> ChurnScorer {
        let n = columns.len();
        let artifact = ScoringArtifact::new(
            Arc::new(LogisticRegression {
                coefficients: vec![0.0; n],
                intercept: 0.0,
            }),
            Arc::new(StandardScaler::new(vec![0.0; n], vec![1.0; n])),
            columns,
            None,
        )
        .unwrap();
        ChurnScorer::new(Arc::new(artifact))
    }

    #[test]
    fn test_validate_accepts_boundaries() {
        let mut r = record();
        r.credit_score = 300;
        r.age = 100;
        r.tenure = 0;
        r.num_of_products = 4;
        r.balance = 0.0;
        assert!(validate(&r, Currency::Eur).is_ok());
    }

    #[test]
    fn test_validate_names_offending_field() {
        let cases: Vec<(&str, Box<dyn Fn(&mut CustomerRecord)>)> = vec![
            ("CreditScore", Box::new(|r: &mut CustomerRecord| r.credit_score = 299)),
            ("Geography", Box::new(|r: &mut CustomerRecord| r.geography = "Atlantis".to_string())),
            ("Gender", Box::new(|r: &mut CustomerRecord| r.gender = "X".to_string())),
            ("Age", Box::new(|r: &mut CustomerRecord| r.age = 17)),
            ("Age", Box::new(|r: &mut CustomerRecord| r.age = 101)),
            ("Tenure", Box::new(|r: &mut CustomerRecord| r.tenure = 11)),
            ("Balance", Box::new(|r: &mut CustomerRecord| r.balance = -0.01)),
            ("NumOfProducts", Box::new(|r: &mut CustomerRecord| r.num_of_products = 0)),
            ("HasCrCard", Box::new(|r: &mut CustomerRecord| r.has_credit_card = 2)),
            ("IsActiveMember", Box::new(|r: &mut CustomerRecord| r.is_active_member = -1)),
            ("EstimatedSalary", Box::new(|r: &mut CustomerRecord| r.estimated_salary = f64::NAN)),
            ("Currency", Box::new(|r: &mut CustomerRecord| r.currency = Some("JPY".to_string()))),
        ];

        for (field, mutate) in cases {
            let mut r = record();
            mutate(&mut r);
            let err = validate(&r, Currency::Eur).unwrap_err();
            assert_eq!(err.field(), Some(field), "unexpected error {}", err);
        }
    }

    #[test]
    fn test_localized_aliases_encode_like_canonical_names() {
        let mut r = record();
        r.geography = "Deutschland".to_string();
        r.gender = "femenino".to_string();
        let validated = validate(&r, Currency::Eur).unwrap();
        assert_eq!(validated.geography, Geography::Germany);
        assert_eq!(validated.gender, Gender::Female);
    }

    #[test]
    fn test_assemble_follows_artifact_order() {
        let scorer = identity_scorer(vec![
            FeatureColumn::Age,
            FeatureColumn::Geography,
            FeatureColumn::EstimatedSalary,
            FeatureColumn::HasCrCard,
        ]);
        let mut r = record();
        r.geography = "Spain".to_string();
        let validated = scorer.validate(&r).unwrap();

        assert_eq!(
            scorer.assemble_features(&validated),
            vec![35.0, 2.0, 50000.0, 1.0]
        );
    }

    #[test]
    fn test_monetary_fields_converted_to_artifact_currency() {
        let scorer = identity_scorer(vec![FeatureColumn::Balance, FeatureColumn::Age]);
        let mut r = record();
        r.currency = Some("USD".to_string());
        let validated = scorer.validate(&r).unwrap();
        let features = scorer.assemble_features(&validated);

        assert!((features[0] - 46000.0).abs() < 1e-6);
        assert_eq!(features[1], 35.0);
    }

    #[test]
    fn test_amount_overflowing_on_conversion_is_rejected() {
        let mut r = record();
        r.balance = 1.7e308;
        r.currency = Some("GBP".to_string());
        let err = validate(&r, Currency::Eur).unwrap_err();
        assert_eq!(err.field(), Some("Balance"));
        assert!(err.is_client_error());

        let mut r = record();
        r.estimated_salary = f64::MAX;
        r.currency = Some("GBP".to_string());
        assert_eq!(
            validate(&r, Currency::Eur).unwrap_err().field(),
            Some("EstimatedSalary")
        );

        // Same magnitude with no conversion stays valid
        let mut r = record();
        r.balance = 1.7e308;
        assert!(validate(&r, Currency::Eur).is_ok());
    }

    #[test]
    fn test_rounding_convention() {
        assert_eq!(round_probability(0.8234999), 0.823);
        assert_eq!(round_probability(0.8235001), 0.824);
        assert_eq!(round_probability(0.0), 0.0);
        assert_eq!(round_probability(1.0), 1.0);
    }

    #[test]
    fn test_zero_weights_score_exactly_half() {
        let scorer = identity_scorer(FeatureColumn::CANONICAL_ORDER.to_vec());
        let result = scorer.score(&record()).unwrap();
        assert_eq!(result.churn_probability, 0.5);
        assert!(result.prediction);
        assert_eq!(result.feature_importance, None);
    }
}
