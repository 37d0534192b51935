use serde::{Deserialize, Serialize};

use super::super::domain::{HonorCriterion, PriorStanding};
use super::statistics::GradeStatistics;

/// Checks a criterion applies, in the order they are evaluated and reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Gpa,
    MinGrade,
    MinGradeAll,
    YearRange,
    Consistency,
    AdditionalRule,
}

impl Predicate {
    pub const fn is_grade_floor(self) -> bool {
        matches!(self, Predicate::MinGrade | Predicate::MinGradeAll)
    }
}

/// Matcher verdict for one criterion. `failed` names the first predicate that did not hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub matched: bool,
    pub failed: Option<Predicate>,
    pub reason: String,
}

impl MatchOutcome {
    fn pass(criterion: &HonorCriterion) -> Self {
        Self {
            matched: true,
            failed: None,
            reason: format!("meets {} criteria", criterion.honor_type),
        }
    }

    fn fail(predicate: Predicate, reason: String) -> Self {
        Self {
            matched: false,
            failed: Some(predicate),
            reason,
        }
    }
}

fn describe_range(min_year: Option<u8>, max_year: Option<u8>) -> String {
    match (min_year, max_year) {
        (Some(min), Some(max)) => format!("{min}-{max}"),
        (Some(min), None) => format!("{min} or above"),
        (None, Some(max)) => format!("{max} or below"),
        (None, None) => "any".to_string(),
    }
}

/// Two-decimal rendering, widened when rounding would make `value` read as `threshold`.
fn figure(value: f64, threshold: f64) -> String {
    let shown = format!("{value:.2}");
    if shown == format!("{threshold:.2}") {
        value.to_string()
    } else {
        shown
    }
}

/// Evaluates every configured threshold of `criterion` against `stats`.
pub fn match_criterion(
    criterion: &HonorCriterion,
    stats: &GradeStatistics,
    prior: PriorStanding,
) -> MatchOutcome {
    let scale = criterion.scale;

    if let Some(min_gpa) = criterion.min_gpa {
        if !scale.meets(stats.average, min_gpa) {
            return MatchOutcome::fail(
                Predicate::Gpa,
                format!(
                    "average {} does not meet min_gpa {:.2}",
                    figure(stats.average, min_gpa),
                    min_gpa
                ),
            );
        }
    }
    if let Some(max_gpa) = criterion.max_gpa {
        if scale.exceeds(stats.average, max_gpa) {
            return MatchOutcome::fail(
                Predicate::Gpa,
                format!(
                    "average {} exceeds max_gpa {:.2}",
                    figure(stats.average, max_gpa),
                    max_gpa
                ),
            );
        }
    }

    let floors = [
        (Predicate::MinGrade, "min_grade", criterion.min_grade),
        (Predicate::MinGradeAll, "min_grade_all", criterion.min_grade_all),
    ];
    for (predicate, label, floor) in floors {
        if let Some(floor) = floor {
            if !scale.meets(stats.lowest_grade, floor) {
                return MatchOutcome::fail(
                    predicate,
                    format!(
                        "lowest grade {} ({}) does not meet {} {:.2}",
                        figure(stats.lowest_grade, floor),
                        stats.lowest_subject,
                        label,
                        floor
                    ),
                );
            }
        }
    }

    let below = criterion
        .min_year
        .is_some_and(|min| stats.year_of_study < min);
    let above = criterion
        .max_year
        .is_some_and(|max| stats.year_of_study > max);
    if below || above {
        return MatchOutcome::fail(
            Predicate::YearRange,
            format!(
                "year of study {} outside range {}",
                stats.year_of_study,
                describe_range(criterion.min_year, criterion.max_year)
            ),
        );
    }

    if criterion.require_consistent_honor {
        match prior {
            PriorStanding::Qualified => {}
            PriorStanding::NotQualified => {
                return MatchOutcome::fail(
                    Predicate::Consistency,
                    "no qualifying honor in the prior period".to_string(),
                )
            }
            PriorStanding::NoRecord => {
                return MatchOutcome::fail(
                    Predicate::Consistency,
                    "no honor record for the prior period".to_string(),
                )
            }
        }
    }

    for rule in &criterion.additional_rules {
        if let Err(reason) = rule.check(stats) {
            return MatchOutcome::fail(Predicate::AdditionalRule, reason);
        }
    }

    MatchOutcome::pass(criterion)
}
