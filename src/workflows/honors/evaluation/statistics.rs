use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::super::domain::{GradeRecord, GradeScale};
use super::config::MissingGradePolicy;
use super::EvaluationError;

/// Aggregate figures the criteria matcher works from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeStatistics {
    /// Mean of subject grades. Thresholds compare against this exact value.
    pub average: f64,
    /// Worst subject grade on the scale in use, unrounded.
    pub lowest_grade: f64,
    pub lowest_subject: String,
    pub subject_count: usize,
    /// Subjects with placeholder rows, populated when the policy excludes them.
    pub missing_subjects: Vec<String>,
    pub year_of_study: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Summary {
    Graded(GradeStatistics),
    Empty,
    Incomplete { missing: Vec<String> },
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl GradeStatistics {
    /// Average as stored on a result, rounded to two decimals.
    pub fn reported_average(&self) -> f64 {
        round2(self.average)
    }
}

/// Folds grade rows into per-subject grades, then into the figures used for matching.
///
/// A subject reported in several rows (for instance once per quarter in a whole-year
/// evaluation) contributes the mean of its rows.
pub(crate) fn summarize(
    records: &[&GradeRecord],
    scale: GradeScale,
    policy: MissingGradePolicy,
) -> Result<Summary, EvaluationError> {
    if records.is_empty() {
        return Ok(Summary::Empty);
    }

    let mut subjects: BTreeMap<&str, (f64, u32)> = BTreeMap::new();
    let mut missing: BTreeSet<&str> = BTreeSet::new();
    let mut year_of_study = 0u8;

    for record in records {
        year_of_study = year_of_study.max(record.year_of_study);
        match record.grade {
            Some(grade) if scale.contains(grade) => {
                let entry = subjects.entry(record.subject.as_str()).or_insert((0.0, 0));
                entry.0 += grade;
                entry.1 += 1;
            }
            Some(grade) => {
                return Err(EvaluationError::GradeOutOfRange {
                    subject: record.subject.clone(),
                    grade,
                    scale,
                })
            }
            None => {
                missing.insert(record.subject.as_str());
            }
        }
    }

    let missing: Vec<String> = missing.into_iter().map(str::to_string).collect();
    if policy == MissingGradePolicy::Disqualify && !missing.is_empty() {
        return Ok(Summary::Incomplete { missing });
    }

    let mut lowest: Option<(&str, f64)> = None;
    let mut total = 0.0;
    for (subject, (sum, count)) in &subjects {
        let grade = sum / f64::from(*count);
        total += grade;
        lowest = match lowest {
            Some((_, current)) if scale.worst(current, grade) == current => lowest,
            _ => Some((*subject, grade)),
        };
    }

    let Some((lowest_subject, lowest_grade)) = lowest else {
        return Ok(Summary::Empty);
    };

    Ok(Summary::Graded(GradeStatistics {
        average: total / subjects.len() as f64,
        lowest_grade,
        lowest_subject: lowest_subject.to_string(),
        subject_count: subjects.len(),
        missing_subjects: missing,
        year_of_study,
    }))
}
