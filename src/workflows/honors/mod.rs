//! Honor qualification: criteria matching, tier selection, the senior-high cascade and the
//! batch runner that evaluates every active student of a level and school year.
//!
//! Persistence, grade storage and criteria administration stay behind the traits in
//! [`repository`]; the evaluator only sees plain values fetched up front for each student.

pub mod demo;
pub mod domain;
pub mod evaluation;
pub mod memory;
pub mod repository;
pub mod rules;
pub mod service;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use domain::{
    AcademicLevel, ApprovalStatus, BatchScope, DomainError, GradeRecord, GradeScale,
    GradingPeriod, GradingPeriodId, HonorCriterion, HonorScope, HonorType, HonorTypeId,
    PriorStanding, QualificationResult, ResultKey, SchoolYear, StudentId,
};
pub use evaluation::{
    match_criterion, CascadeState, EvaluationEngine, EvaluationError, EvaluationOptions,
    GradeStatistics, MatchOutcome, MissingGradePolicy, Predicate, StudentGrades, TierSelection,
    EARLIER_PERIOD, NO_CRITERIA, NO_GRADES,
};
pub use memory::{InMemoryCriteriaRepository, InMemoryGradeSource, InMemoryResultStore};
pub use repository::{CriteriaRepository, GradeSource, ResultWriter, SourceError};
pub use rules::{AdditionalRule, RuleHandler};
pub use service::{
    BatchError, BatchReport, BatchSummary, HonorRollService, StudentError, StudentFailure,
};
pub use snapshot::{CriteriaSnapshot, HonorTier};
