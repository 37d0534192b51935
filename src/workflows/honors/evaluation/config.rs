use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::super::domain::DomainError;

/// Switches controlling how the evaluator treats partial data and overlapping tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationOptions {
    pub missing_grades: MissingGradePolicy,
    pub tier_selection: TierSelection,
}

/// What to do with placeholder rows that carry no grade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingGradePolicy {
    /// Leave ungraded subjects out of the average and the floor checks.
    #[default]
    Exclude,
    /// Any ungraded subject makes the student ineligible for the scope.
    Disqualify,
}

/// Order in which tiers are tried; the first satisfied tier is awarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierSelection {
    /// Highest `min_gpa` first, then highest grade floor; ties keep configured order.
    #[default]
    MostStringent,
    /// Exactly the order the criteria repository returned the honor types in.
    ConfiguredOrder,
}

fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace('-', "_")
}

impl FromStr for MissingGradePolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "exclude" => Ok(Self::Exclude),
            "disqualify" => Ok(Self::Disqualify),
            _ => Err(DomainError::UnknownOption {
                option: "missing grade policy",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for TierSelection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "most_stringent" => Ok(Self::MostStringent),
            "configured_order" | "configured" => Ok(Self::ConfiguredOrder),
            _ => Err(DomainError::UnknownOption {
                option: "tier selection",
                value: s.to_string(),
            }),
        }
    }
}
