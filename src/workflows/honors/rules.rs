//! Typed form of the free-form `additional_rules` bag attached to honor criteria.
//!
//! Each recognized key maps to a variant with its own handler, so adding a rule kind means
//! adding a variant, a parse arm and a handler. Keys the engine does not know are kept as
//! [`AdditionalRule::Unrecognized`] and never fail a criterion.

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

use super::evaluation::GradeStatistics;

pub const MIN_SUBJECTS: &str = "min_subjects";
pub const NO_MISSING_GRADES: &str = "no_missing_grades";

#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalRule {
    /// At least this many graded subjects in the evaluated scope.
    MinSubjects(usize),
    /// No placeholder (ungraded) rows in the evaluated scope.
    NoMissingGrades,
    Unrecognized { key: String, value: Value },
}

/// Signature shared by every rule handler. `Err` carries the failure reason.
pub type RuleHandler = fn(&AdditionalRule, &GradeStatistics) -> Result<(), String>;

impl AdditionalRule {
    /// Builds a rule from one bag entry. Entries that switch a rule off yield `None`;
    /// recognized keys with unusable values are kept as unrecognized.
    pub fn from_entry(key: &str, value: &Value) -> Option<Self> {
        let unrecognized = || AdditionalRule::Unrecognized {
            key: key.to_string(),
            value: value.clone(),
        };

        match key {
            MIN_SUBJECTS => Some(
                value
                    .as_u64()
                    .and_then(|count| usize::try_from(count).ok())
                    .map(AdditionalRule::MinSubjects)
                    .unwrap_or_else(unrecognized),
            ),
            NO_MISSING_GRADES => match value {
                Value::Bool(true) => Some(AdditionalRule::NoMissingGrades),
                Value::Bool(false) => None,
                _ => Some(unrecognized()),
            },
            _ => Some(unrecognized()),
        }
    }

    pub fn parse_bag(bag: &Map<String, Value>) -> Vec<Self> {
        bag.iter()
            .filter_map(|(key, value)| Self::from_entry(key, value))
            .collect()
    }

    pub fn key(&self) -> &str {
        match self {
            AdditionalRule::MinSubjects(_) => MIN_SUBJECTS,
            AdditionalRule::NoMissingGrades => NO_MISSING_GRADES,
            AdditionalRule::Unrecognized { key, .. } => key,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, AdditionalRule::Unrecognized { .. })
    }

    pub fn handler(&self) -> RuleHandler {
        match self {
            AdditionalRule::MinSubjects(_) => check_min_subjects,
            AdditionalRule::NoMissingGrades => check_no_missing_grades,
            AdditionalRule::Unrecognized { .. } => ignore,
        }
    }

    pub fn check(&self, stats: &GradeStatistics) -> Result<(), String> {
        (self.handler())(self, stats)
    }

    fn to_value(&self) -> Value {
        match self {
            AdditionalRule::MinSubjects(count) => Value::from(*count),
            AdditionalRule::NoMissingGrades => Value::Bool(true),
            AdditionalRule::Unrecognized { value, .. } => value.clone(),
        }
    }
}

fn check_min_subjects(rule: &AdditionalRule, stats: &GradeStatistics) -> Result<(), String> {
    match rule {
        AdditionalRule::MinSubjects(required) if stats.subject_count < *required => Err(format!(
            "{} graded subject(s) below {MIN_SUBJECTS} {required}",
            stats.subject_count
        )),
        _ => Ok(()),
    }
}

fn check_no_missing_grades(_rule: &AdditionalRule, stats: &GradeStatistics) -> Result<(), String> {
    if stats.missing_subjects.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "missing grade for {}",
            stats.missing_subjects.join(", ")
        ))
    }
}

fn ignore(_rule: &AdditionalRule, _stats: &GradeStatistics) -> Result<(), String> {
    Ok(())
}

pub(crate) fn deserialize_bag<'de, D>(deserializer: D) -> Result<Vec<AdditionalRule>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(Value::Object(bag)) => Ok(AdditionalRule::parse_bag(&bag)),
        Some(other) => {
            warn!(value = %other, "additional_rules is not an object, ignoring it");
            Ok(Vec::new())
        }
    }
}

pub(crate) fn serialize_bag<S>(rules: &[AdditionalRule], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(rules.len()))?;
    for rule in rules {
        map.serialize_entry(rule.key(), &rule.to_value())?;
    }
    map.end()
}
