use super::domain::{
    AcademicLevel, BatchScope, GradeRecord, GradingPeriod, GradingPeriodId, HonorCriterion,
    HonorScope, HonorType, PriorStanding, QualificationResult, SchoolYear, StudentId,
};

/// Read access to enrolment and grade data so the engine never touches persistence.
pub trait GradeSource: Send + Sync {
    fn active_students(
        &self,
        level: AcademicLevel,
        school_year: SchoolYear,
    ) -> Result<Vec<StudentId>, SourceError>;

    /// All grade rows for the student at `level` during `school_year`, across every period.
    fn grades(
        &self,
        student: &StudentId,
        level: AcademicLevel,
        school_year: SchoolYear,
    ) -> Result<Vec<GradeRecord>, SourceError>;

    fn grading_periods(
        &self,
        level: AcademicLevel,
        school_year: SchoolYear,
    ) -> Result<Vec<GradingPeriod>, SourceError>;
}

/// Administrative configuration of honor tiers and their thresholds.
pub trait CriteriaRepository: Send + Sync {
    /// Honor types for the scope, in the order administrators configured them.
    fn honor_types(&self, scope: HonorScope) -> Result<Vec<HonorType>, SourceError>;

    fn criteria(&self, level: AcademicLevel) -> Result<Vec<HonorCriterion>, SourceError>;
}

/// Persistence of qualification results.
pub trait ResultWriter: Send + Sync {
    /// Replaces every stored result covered by `scope` with `results`. Running the same
    /// scope twice must leave exactly one row per result key.
    ///
    /// Rows of students listed in `retained` are left untouched, so a student whose
    /// evaluation failed keeps the previous result. A replaced row keeps its stored
    /// `approval` when the new row has the same key and the same `qualified` verdict;
    /// otherwise approval starts over as pending.
    fn replace_scope(
        &self,
        scope: &BatchScope,
        results: &[QualificationResult],
        retained: &[StudentId],
    ) -> Result<(), SourceError>;

    /// Standing in a previous comparison scope. `period: None` looks at the whole year,
    /// counting a qualification in any of its periods.
    fn prior_standing(
        &self,
        student: &StudentId,
        school_year: SchoolYear,
        period: Option<&GradingPeriodId>,
    ) -> Result<PriorStanding, SourceError>;
}

/// Error enumeration for collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("invalid data: {0}")]
    Invalid(String),
    #[error("data store unavailable: {0}")]
    Unavailable(String),
}
