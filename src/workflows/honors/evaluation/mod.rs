mod config;
mod matcher;
pub(crate) mod policy;
mod senior_high;
mod statistics;

pub use config::{EvaluationOptions, MissingGradePolicy, TierSelection};
pub use matcher::{match_criterion, MatchOutcome, Predicate};
pub use senior_high::CascadeState;
pub use statistics::GradeStatistics;

use serde::{Deserialize, Serialize};

use super::domain::{
    AcademicLevel, ApprovalStatus, GradeRecord, GradeScale, GradingPeriod, GradingPeriodId,
    HonorTypeId, PriorStanding, QualificationResult, SchoolYear, StudentId,
};
use super::snapshot::CriteriaSnapshot;
use statistics::{summarize, Summary};

pub const NO_CRITERIA: &str = "no criteria configured";
pub const NO_GRADES: &str = "no grades recorded";
pub const EARLIER_PERIOD: &str = "disqualified in earlier period";

/// Data problems that stop a single student from being evaluated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("grade {grade} for {subject} is outside the {scale:?} scale")]
    GradeOutOfRange {
        subject: String,
        grade: f64,
        scale: GradeScale,
    },
    #[error("grading period {0} is not part of the school calendar")]
    UnknownPeriod(GradingPeriodId),
    #[error("no grading periods configured")]
    NoGradingPeriods,
}

/// Every grade row fetched for one student, level and school year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentGrades {
    pub student: StudentId,
    pub records: Vec<GradeRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Verdict {
    honor_type: Option<HonorTypeId>,
    average: Option<f64>,
    lowest_grade: Option<f64>,
    qualified: bool,
    reason: Option<String>,
}

impl Verdict {
    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            honor_type: None,
            average: None,
            lowest_grade: None,
            qualified: false,
            reason: Some(reason.into()),
        }
    }

    fn into_result(
        self,
        student: &StudentId,
        level: AcademicLevel,
        school_year: SchoolYear,
        grading_period: Option<GradingPeriodId>,
    ) -> QualificationResult {
        QualificationResult {
            student: student.clone(),
            honor_type: self.honor_type,
            level,
            school_year,
            grading_period,
            average: self.average,
            qualified: self.qualified,
            reason: self.reason,
            approval: ApprovalStatus::Pending,
        }
    }
}

/// Stateless evaluator applying a criteria snapshot to a student's grades.
#[derive(Debug, Clone, Default)]
pub struct EvaluationEngine {
    options: EvaluationOptions,
}

impl EvaluationEngine {
    pub fn new(options: EvaluationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> EvaluationOptions {
        self.options
    }

    /// Evaluates one scope: the whole school year, or a single grading period when `period`
    /// is given. At most one tier is awarded.
    pub fn evaluate(
        &self,
        snapshot: &CriteriaSnapshot,
        school_year: SchoolYear,
        grades: &StudentGrades,
        period: Option<&GradingPeriodId>,
        prior: PriorStanding,
    ) -> Result<QualificationResult, EvaluationError> {
        let records: Vec<&GradeRecord> = grades
            .records
            .iter()
            .filter(|record| period.map_or(true, |id| record.grading_period.as_ref() == Some(id)))
            .collect();

        let verdict = self.judge(snapshot, &records, prior)?;
        Ok(verdict.into_result(
            &grades.student,
            snapshot.level(),
            school_year,
            period.cloned(),
        ))
    }

    /// Walks grading periods in order, carrying floor violations forward. Emits one result
    /// per period, or only the `upto` period when one is requested.
    pub fn evaluate_sequential(
        &self,
        snapshot: &CriteriaSnapshot,
        school_year: SchoolYear,
        grades: &StudentGrades,
        periods: &[GradingPeriod],
        upto: Option<&GradingPeriodId>,
        prior_year: PriorStanding,
    ) -> Result<Vec<QualificationResult>, EvaluationError> {
        senior_high::walk(
            self,
            snapshot,
            school_year,
            grades,
            periods,
            upto,
            prior_year,
        )
    }

    pub(crate) fn judge(
        &self,
        snapshot: &CriteriaSnapshot,
        records: &[&GradeRecord],
        prior: PriorStanding,
    ) -> Result<Verdict, EvaluationError> {
        if snapshot.is_empty() {
            return Ok(Verdict::rejected(NO_CRITERIA));
        }

        let stats = match summarize(records, snapshot.scale(), self.options.missing_grades)? {
            Summary::Graded(stats) => stats,
            Summary::Empty => return Ok(Verdict::rejected(NO_GRADES)),
            Summary::Incomplete { missing } => {
                return Ok(Verdict::rejected(format!(
                    "missing grade for {}",
                    missing.join(", ")
                )))
            }
        };

        let mut attempts = Vec::with_capacity(snapshot.tiers().len());
        for tier in snapshot.tiers() {
            let outcome = match_criterion(&tier.criterion, &stats, prior);
            if outcome.matched {
                return Ok(Verdict {
                    honor_type: Some(tier.honor_type.id.clone()),
                    average: Some(stats.reported_average()),
                    lowest_grade: Some(stats.lowest_grade),
                    qualified: true,
                    reason: None,
                });
            }
            attempts.push((tier, outcome));
        }

        let (honor_type, reason) = match policy::least_failing(&attempts) {
            Some((tier, outcome)) => (Some(tier.honor_type.id.clone()), outcome.reason.clone()),
            None => (None, NO_CRITERIA.to_string()),
        };

        Ok(Verdict {
            honor_type,
            average: Some(stats.reported_average()),
            lowest_grade: Some(stats.lowest_grade),
            qualified: false,
            reason: Some(reason),
        })
    }

    /// Average for a scope that is not being judged, reported for auditing only.
    pub(crate) fn average_only(
        &self,
        snapshot: &CriteriaSnapshot,
        records: &[&GradeRecord],
    ) -> Result<Option<f64>, EvaluationError> {
        match summarize(records, snapshot.scale(), self.options.missing_grades)? {
            Summary::Graded(stats) => Ok(Some(stats.reported_average())),
            Summary::Empty | Summary::Incomplete { .. } => Ok(None),
        }
    }
}
