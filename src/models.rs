use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;

// ============ API Request/Response Models ============

/// One customer to score.
///
/// Field names follow the training data columns; camelCase and snake_case
/// spellings are accepted on input. Ranges are enforced by the scorer, not by
/// deserialization, so that out-of-range values are reported by field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CustomerRecord {
    /// Credit score, 300 to 900.
    #[serde(rename = "CreditScore", alias = "creditScore", alias = "credit_score")]
    #[schema(example = 650)]
    pub credit_score: i64,
    /// Country of residence (France, Germany, Spain or a localized alias).
    #[serde(rename = "Geography", alias = "geography")]
    #[schema(example = "France")]
    pub geography: String,
    /// Female or Male (or a localized alias).
    #[serde(rename = "Gender", alias = "gender")]
    #[schema(example = "Male")]
    pub gender: String,
    /// Age in years, 18 to 100.
    #[serde(rename = "Age", alias = "age")]
    #[schema(example = 35)]
    pub age: i64,
    /// Years as a customer, 0 to 10.
    #[serde(rename = "Tenure", alias = "tenure")]
    #[schema(example = 5)]
    pub tenure: i64,
    /// Account balance in `currency`.
    #[serde(rename = "Balance", alias = "balance")]
    #[schema(example = 50000.0)]
    pub balance: f64,
    /// Number of bank products held, 1 to 4.
    #[serde(
        rename = "NumOfProducts",
        alias = "numOfProducts",
        alias = "num_of_products"
    )]
    #[schema(example = 1)]
    pub num_of_products: i64,
    /// 1 if the customer holds a credit card, else 0.
    #[serde(
        rename = "HasCrCard",
        alias = "hasCreditCard",
        alias = "has_credit_card",
        alias = "has_cr_card",
        deserialize_with = "deserialize_flag"
    )]
    #[schema(example = 1)]
    pub has_credit_card: i64,
    /// 1 if the customer is an active member, else 0.
    #[serde(
        rename = "IsActiveMember",
        alias = "isActiveMember",
        alias = "is_active_member",
        deserialize_with = "deserialize_flag"
    )]
    #[schema(example = 1)]
    pub is_active_member: i64,
    /// Estimated yearly salary in `currency`.
    #[serde(
        rename = "EstimatedSalary",
        alias = "estimatedSalary",
        alias = "estimated_salary"
    )]
    #[schema(example = 50000.0)]
    pub estimated_salary: f64,
    /// ISO code of the monetary fields; defaults to the model's currency.
    #[serde(
        rename = "Currency",
        alias = "currency",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(example = "EUR")]
    pub currency: Option<String>,
}

/// A feature and its weight in the model's importance ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Scoring outcome returned by `/predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PredictionResult {
    /// Probability of churn, rounded to 3 decimal places.
    #[schema(example = 0.058)]
    pub churn_probability: f64,
    /// 1 when `churn_probability >= 0.5`, else 0.
    #[serde(
        serialize_with = "serialize_bool_as_int",
        deserialize_with = "deserialize_bool_flag"
    )]
    #[schema(value_type = u8, example = 0)]
    pub prediction: bool,
    /// Ranked feature importance of the loaded model, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_importance: Option<Vec<FeatureImportance>>,
}

impl PredictionResult {
    /// Dashboard label for the decision.
    pub fn label(&self) -> &'static str {
        if self.prediction {
            "Churn"
        } else {
            "No Churn"
        }
    }
}

/// Contract of the loaded artifact, returned by `/model`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelInfo {
    pub version: Option<String>,
    #[schema(value_type = Option<String>)]
    pub trained_at: Option<DateTime<Utc>>,
    pub currency: String,
    pub feature_columns: Vec<String>,
    pub feature_importance: Option<Vec<FeatureImportance>>,
    pub sha256: Option<String>,
    #[schema(value_type = String)]
    pub loaded_at: DateTime<Utc>,
}

/// Error body returned by the service's own error paths (400, 404, 500).
///
/// Bodies the framework rejects before a handler runs (422) are plain text.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Int(i64),
}

/// Accepts `0`/`1` as well as JSON booleans. Other integers are passed
/// through so the scorer can reject them by field name.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match FlagRepr::deserialize(deserializer)? {
        FlagRepr::Bool(value) => i64::from(value),
        FlagRepr::Int(value) => value,
    })
}

fn deserialize_bool_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match FlagRepr::deserialize(deserializer)? {
        FlagRepr::Bool(value) => Ok(value),
        FlagRepr::Int(0) => Ok(false),
        FlagRepr::Int(1) => Ok(true),
        FlagRepr::Int(other) => Err(serde::de::Error::custom(format!(
            "expected 0 or 1, got {}",
            other
        ))),
    }
}

fn serialize_bool_as_int<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u8(u8::from(*value))
}
