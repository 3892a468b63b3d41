//! Fixed encoding tables for categorical fields, monetary units and feature columns.
//!
//! Every categorical value maps onto a closed enum whose variants carry the
//! numeric code the model was trained with. Lookups accept a small set of
//! localized aliases, matched case-insensitively after trimming.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Customer country. Codes: France=0, Germany=1, Spain=2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Geography {
    France,
    Germany,
    Spain,
}

impl Geography {
    pub fn code(self) -> u8 {
        match self {
            Geography::France => 0,
            Geography::Germany => 1,
            Geography::Spain => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Geography::France => "France",
            Geography::Germany => "Germany",
            Geography::Spain => "Spain",
        }
    }

    /// Parse a canonical name or one of its localized aliases.
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "france" | "fr" | "francia" | "frankreich" => Some(Geography::France),
            "germany" | "de" | "alemania" | "allemagne" | "deutschland" => {
                Some(Geography::Germany)
            }
            "spain" | "es" | "espana" | "españa" | "espagne" | "spanien" => Some(Geography::Spain),
            _ => None,
        }
    }
}

impl fmt::Display for Geography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer gender. Codes: Female=0, Male=1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn code(self) -> u8 {
        match self {
            Gender::Female => 0,
            Gender::Male => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "female" | "f" | "femenino" | "feminino" | "femme" | "weiblich" => Some(Gender::Female),
            "male" | "m" | "masculino" | "homme" | "männlich" | "maennlich" => Some(Gender::Male),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Currency of monetary fields.
///
/// Conversion uses a fixed table of EUR per unit; rates are never fetched at runtime.
///
/// | code | EUR per unit |
/// |------|--------------|
/// | EUR  | 1.0          |
/// | USD  | 0.92         |
/// | GBP  | 1.17         |
/// | INR  | 0.011        |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
    Inr,
}

impl Currency {
    pub fn eur_per_unit(self) -> f64 {
        match self {
            Currency::Eur => 1.0,
            Currency::Usd => 0.92,
            Currency::Gbp => 1.17,
            Currency::Inr => 0.011,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Inr => "INR",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "EUR" => Some(Currency::Eur),
            "USD" => Some(Currency::Usd),
            "GBP" => Some(Currency::Gbp),
            "INR" => Some(Currency::Inr),
            _ => None,
        }
    }

    /// Convert `amount` from `self` into `target`.
    pub fn convert(self, amount: f64, target: Currency) -> f64 {
        if self == target {
            return amount;
        }
        amount * self.eur_per_unit() / target.eur_per_unit()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column the model can be trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureColumn {
    CreditScore,
    Geography,
    Gender,
    Age,
    Tenure,
    Balance,
    NumOfProducts,
    HasCrCard,
    IsActiveMember,
    EstimatedSalary,
}

impl FeatureColumn {
    /// Training order of the reference artifact.
    pub const CANONICAL_ORDER: [FeatureColumn; 10] = [
        FeatureColumn::CreditScore,
        FeatureColumn::Geography,
        FeatureColumn::Gender,
        FeatureColumn::Age,
        FeatureColumn::Tenure,
        FeatureColumn::Balance,
        FeatureColumn::NumOfProducts,
        FeatureColumn::HasCrCard,
        FeatureColumn::IsActiveMember,
        FeatureColumn::EstimatedSalary,
    ];

    /// Column name as written in artifacts and on the wire.
    pub fn name(self) -> &'static str {
        match self {
            FeatureColumn::CreditScore => "CreditScore",
            FeatureColumn::Geography => "Geography",
            FeatureColumn::Gender => "Gender",
            FeatureColumn::Age => "Age",
            FeatureColumn::Tenure => "Tenure",
            FeatureColumn::Balance => "Balance",
            FeatureColumn::NumOfProducts => "NumOfProducts",
            FeatureColumn::HasCrCard => "HasCrCard",
            FeatureColumn::IsActiveMember => "IsActiveMember",
            FeatureColumn::EstimatedSalary => "EstimatedSalary",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            FeatureColumn::CreditScore => "Credit Score",
            FeatureColumn::Geography => "Country",
            FeatureColumn::Gender => "Gender",
            FeatureColumn::Age => "Age",
            FeatureColumn::Tenure => "Tenure (years)",
            FeatureColumn::Balance => "Account Balance",
            FeatureColumn::NumOfProducts => "Number of Products",
            FeatureColumn::HasCrCard => "Has Credit Card",
            FeatureColumn::IsActiveMember => "Active Member",
            FeatureColumn::EstimatedSalary => "Estimated Salary",
        }
    }

    /// Whether the column holds a currency amount.
    pub fn is_monetary(self) -> bool {
        matches!(self, FeatureColumn::Balance | FeatureColumn::EstimatedSalary)
    }

    /// Resolve a column name; accepts the canonical name or its snake_case form.
    pub fn from_name(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        Self::CANONICAL_ORDER.into_iter().find(|column| {
            column.name() == trimmed || to_snake_case(column.name()) == trimmed
        })
    }
}

impl fmt::Display for FeatureColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Display label for a feature name, or the name unchanged when unknown.
pub fn display_label(feature: &str) -> String {
    FeatureColumn::from_name(feature)
        .map(|column| column.display_name().to_string())
        .unwrap_or_else(|| feature.to_string())
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
