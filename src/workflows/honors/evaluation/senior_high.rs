use serde::Serialize;

use super::super::domain::{
    GradeRecord, GradingPeriod, GradingPeriodId, PriorStanding, QualificationResult, SchoolYear,
};
use super::super::snapshot::CriteriaSnapshot;
use super::{EvaluationEngine, EvaluationError, StudentGrades, Verdict, EARLIER_PERIOD};

/// Per-student eligibility across the periods of one school year. `Disqualified` is
/// terminal for the rest of the year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeState {
    Eligible,
    Disqualified { since: GradingPeriodId },
}

impl CascadeState {
    pub fn is_eligible(&self) -> bool {
        matches!(self, CascadeState::Eligible)
    }

    /// Applies the result of one period's floor check.
    pub fn observe(self, period: &GradingPeriodId, floor_violated: bool) -> Self {
        match self {
            CascadeState::Eligible if floor_violated => CascadeState::Disqualified {
                since: period.clone(),
            },
            state => state,
        }
    }
}

fn period_records<'a>(grades: &'a StudentGrades, period: &GradingPeriodId) -> Vec<&'a GradeRecord> {
    grades
        .records
        .iter()
        .filter(|record| record.grading_period.as_ref() == Some(period))
        .collect()
}

pub(super) fn walk(
    engine: &EvaluationEngine,
    snapshot: &CriteriaSnapshot,
    school_year: SchoolYear,
    grades: &StudentGrades,
    periods: &[GradingPeriod],
    upto: Option<&GradingPeriodId>,
    prior_year: PriorStanding,
) -> Result<Vec<QualificationResult>, EvaluationError> {
    let mut ordered: Vec<&GradingPeriod> = periods.iter().collect();
    ordered.sort_by_key(|period| period.sequence());

    let last = match upto {
        Some(id) => ordered
            .iter()
            .position(|period| &period.id == id)
            .ok_or_else(|| EvaluationError::UnknownPeriod(id.clone()))?,
        None if ordered.is_empty() => return Err(EvaluationError::NoGradingPeriods),
        None => ordered.len() - 1,
    };

    let scale = snapshot.scale();
    let floor = snapshot.cascade_floor();
    let mut state = CascadeState::Eligible;
    let mut prior = prior_year;
    let mut results = Vec::new();

    for period in &ordered[..=last] {
        let records = period_records(grades, &period.id);

        let verdict = if state.is_eligible() {
            let verdict = engine.judge(snapshot, &records, prior)?;
            let violated = match (verdict.lowest_grade, floor) {
                (Some(lowest), Some(floor)) => !scale.meets(lowest, floor),
                _ => false,
            };
            state = state.observe(&period.id, violated);
            verdict
        } else {
            let mut verdict = Verdict::rejected(EARLIER_PERIOD);
            verdict.average = engine.average_only(snapshot, &records)?;
            verdict
        };

        prior = if verdict.qualified {
            PriorStanding::Qualified
        } else {
            PriorStanding::NotQualified
        };

        if upto.map_or(true, |id| id == &period.id) {
            results.push(verdict.into_result(
                &grades.student,
                snapshot.level(),
                school_year,
                Some(period.id.clone()),
            ));
        }
    }

    Ok(results)
}
