use std::sync::Arc;

use crate::workflows::honors::domain::{
    AcademicLevel, GradeRecord, GradingPeriod, GradingPeriodId, HonorCriterion, HonorScope,
    HonorType, SchoolYear, StudentId,
};
use crate::workflows::honors::evaluation::{
    EvaluationEngine, EvaluationOptions, GradeStatistics, StudentGrades, TierSelection,
};
use crate::workflows::honors::memory::{
    InMemoryCriteriaRepository, InMemoryGradeSource, InMemoryResultStore,
};
use crate::workflows::honors::repository::{
    CriteriaRepository, GradeSource, SourceError,
};
use crate::workflows::honors::service::HonorRollService;
use crate::workflows::honors::snapshot::CriteriaSnapshot;

pub(super) const WITH_HONORS: &str = "with-honors";
pub(super) const WITH_HIGH_HONORS: &str = "with-high-honors";

pub(super) fn year() -> SchoolYear {
    SchoolYear::parse("2024-2025").expect("valid school year")
}

pub(super) fn basic_honor_types() -> Vec<HonorType> {
    vec![
        HonorType::new(WITH_HONORS, "With Honors", HonorScope::Basic),
        HonorType::new(WITH_HIGH_HONORS, "With High Honors", HonorScope::Basic),
    ]
}

pub(super) fn with_honors(level: AcademicLevel) -> HonorCriterion {
    HonorCriterion::new(level, WITH_HONORS).with_min_gpa(90.0)
}

pub(super) fn with_high_honors(level: AcademicLevel) -> HonorCriterion {
    HonorCriterion::new(level, WITH_HIGH_HONORS)
        .with_min_gpa(95.0)
        .with_min_grade(90.0)
}

pub(super) fn snapshot(level: AcademicLevel, criteria: Vec<HonorCriterion>) -> CriteriaSnapshot {
    CriteriaSnapshot::from_parts(
        level,
        basic_honor_types(),
        criteria,
        TierSelection::MostStringent,
    )
}

pub(super) fn engine() -> EvaluationEngine {
    EvaluationEngine::new(EvaluationOptions::default())
}

pub(super) fn record(
    student: &str,
    subject: &str,
    level: AcademicLevel,
    period: Option<&str>,
    grade: Option<f64>,
) -> GradeRecord {
    GradeRecord {
        student: StudentId(student.to_string()),
        subject: subject.to_string(),
        level,
        school_year: year(),
        grading_period: period.map(|id| GradingPeriodId(id.to_string())),
        grade,
        year_of_study: 8,
    }
}

const SUBJECTS: [&str; 6] = ["English", "Filipino", "Math", "Science", "History", "PE"];

/// Whole-year grades, one subject per value.
pub(super) fn student_grades(student: &str, level: AcademicLevel, grades: &[f64]) -> StudentGrades {
    StudentGrades {
        student: StudentId(student.to_string()),
        records: grades
            .iter()
            .zip(SUBJECTS)
            .map(|(grade, subject)| record(student, subject, level, None, Some(*grade)))
            .collect(),
    }
}

/// Per-period senior-high grades, one subject per value.
pub(super) fn period_grades(student: &str, periods: &[(&str, &[f64])]) -> StudentGrades {
    let mut records = Vec::new();
    for (period, grades) in periods {
        for (grade, subject) in grades.iter().zip(SUBJECTS) {
            records.push(record(
                student,
                subject,
                AcademicLevel::SeniorHigh,
                Some(*period),
                Some(*grade),
            ));
        }
    }
    StudentGrades {
        student: StudentId(student.to_string()),
        records,
    }
}

/// Senior-high calendar, deliberately listed out of chronological order.
pub(super) fn shs_periods() -> Vec<GradingPeriod> {
    vec![
        GradingPeriod::new("s2-q1", 2, 1),
        GradingPeriod::new("s1-q1", 1, 1),
        GradingPeriod::new("s2-q2", 2, 2),
        GradingPeriod::new("s1-q2", 1, 2),
    ]
}

pub(super) fn period(id: &str) -> GradingPeriodId {
    GradingPeriodId(id.to_string())
}

pub(super) fn stats(average: f64, lowest_grade: f64, year_of_study: u8) -> GradeStatistics {
    GradeStatistics {
        average,
        lowest_grade,
        lowest_subject: "Math".to_string(),
        subject_count: 6,
        missing_subjects: Vec::new(),
        year_of_study,
    }
}

pub(super) struct Fixture {
    pub(super) grades: Arc<InMemoryGradeSource>,
    pub(super) criteria: Arc<InMemoryCriteriaRepository>,
    pub(super) results: Arc<InMemoryResultStore>,
}

impl Fixture {
    pub(super) fn new(criteria: Vec<HonorCriterion>) -> Self {
        let repository = InMemoryCriteriaRepository::default();
        for honor_type in basic_honor_types() {
            repository.add_honor_type(honor_type).expect("add honor type");
        }
        for criterion in criteria {
            repository.add_criterion(criterion).expect("add criterion");
        }
        let grades = InMemoryGradeSource::default();
        grades
            .set_periods(AcademicLevel::SeniorHigh, year(), shs_periods())
            .expect("set periods");

        Self {
            grades: Arc::new(grades),
            criteria: Arc::new(repository),
            results: Arc::new(InMemoryResultStore::default()),
        }
    }

    pub(super) fn enroll(&self, level: AcademicLevel, student: &str, grades: StudentGrades) {
        self.grades.enroll(level, year(), student).expect("enroll");
        self.grades.record_all(grades.records).expect("record grades");
    }

    pub(super) fn service(
        &self,
    ) -> HonorRollService<InMemoryGradeSource, InMemoryCriteriaRepository, InMemoryResultStore>
    {
        HonorRollService::new(
            self.grades.clone(),
            self.criteria.clone(),
            self.results.clone(),
            EvaluationOptions::default(),
        )
        .with_workers(2)
    }
}

/// Grade source that refuses to serve one student, for failure isolation checks.
pub(super) struct FlakyGradeSource {
    pub(super) inner: Arc<InMemoryGradeSource>,
    pub(super) broken: StudentId,
}

impl GradeSource for FlakyGradeSource {
    fn active_students(
        &self,
        level: AcademicLevel,
        school_year: SchoolYear,
    ) -> Result<Vec<StudentId>, SourceError> {
        self.inner.active_students(level, school_year)
    }

    fn grades(
        &self,
        student: &StudentId,
        level: AcademicLevel,
        school_year: SchoolYear,
    ) -> Result<Vec<GradeRecord>, SourceError> {
        if student == &self.broken {
            return Err(SourceError::Unavailable("grade shard offline".to_string()));
        }
        self.inner.grades(student, level, school_year)
    }

    fn grading_periods(
        &self,
        level: AcademicLevel,
        school_year: SchoolYear,
    ) -> Result<Vec<GradingPeriod>, SourceError> {
        self.inner.grading_periods(level, school_year)
    }
}

/// Grade source whose read for one student panics mid-evaluation.
pub(super) struct PanickingGradeSource {
    pub(super) inner: Arc<InMemoryGradeSource>,
    pub(super) broken: StudentId,
}

impl GradeSource for PanickingGradeSource {
    fn active_students(
        &self,
        level: AcademicLevel,
        school_year: SchoolYear,
    ) -> Result<Vec<StudentId>, SourceError> {
        self.inner.active_students(level, school_year)
    }

    fn grades(
        &self,
        student: &StudentId,
        level: AcademicLevel,
        school_year: SchoolYear,
    ) -> Result<Vec<GradeRecord>, SourceError> {
        if student == &self.broken {
            panic!("grade decoder crashed");
        }
        self.inner.grades(student, level, school_year)
    }

    fn grading_periods(
        &self,
        level: AcademicLevel,
        school_year: SchoolYear,
    ) -> Result<Vec<GradingPeriod>, SourceError> {
        self.inner.grading_periods(level, school_year)
    }
}

pub(super) struct UnavailableCriteria;

impl CriteriaRepository for UnavailableCriteria {
    fn honor_types(&self, _scope: HonorScope) -> Result<Vec<HonorType>, SourceError> {
        Err(SourceError::Unavailable("database offline".to_string()))
    }

    fn criteria(&self, _level: AcademicLevel) -> Result<Vec<HonorCriterion>, SourceError> {
        Err(SourceError::Unavailable("database offline".to_string()))
    }
}
