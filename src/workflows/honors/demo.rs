//! Seeded campus used by the CLI to demonstrate a full batch without a database.

use std::sync::Arc;

use super::domain::{
    AcademicLevel, ApprovalStatus, GradeRecord, GradingPeriod, GradingPeriodId, HonorCriterion,
    HonorScope, HonorType, HonorTypeId, QualificationResult, SchoolYear, StudentId,
};
use super::evaluation::EvaluationOptions;
use super::memory::{InMemoryCriteriaRepository, InMemoryGradeSource, InMemoryResultStore};
use super::repository::SourceError;
use super::rules::AdditionalRule;
use super::service::HonorRollService;

pub const WITH_HONORS: &str = "with-honors";
pub const WITH_HIGH_HONORS: &str = "with-high-honors";
pub const WITH_HIGHEST_HONORS: &str = "with-highest-honors";
pub const DEANS_LIST: &str = "deans-list";
pub const PRESIDENTS_LIST: &str = "presidents-list";

const BASIC_SUBJECTS: [&str; 5] = [
    "English",
    "Filipino",
    "Mathematics",
    "Science",
    "Araling Panlipunan",
];
const SHS_SUBJECTS: [&str; 4] = [
    "Oral Communication",
    "General Mathematics",
    "Earth Science",
    "Komunikasyon",
];
const COLLEGE_SUBJECTS: [&str; 5] = [
    "Calculus",
    "Data Structures",
    "Technical Writing",
    "Physics",
    "Ethics",
];

type WholeYear = (&'static str, u8, &'static [f64]);
type PerPeriod = (&'static str, &'static [(&'static str, &'static [f64])]);

const ELEMENTARY: &[WholeYear] = &[
    ("elem-001", 5, &[98.0, 99.0, 97.0, 98.0, 99.0]),
    ("elem-002", 5, &[93.0, 91.0, 95.0, 92.0, 90.0]),
    ("elem-003", 6, &[85.0, 88.0, 84.0, 87.0, 86.0]),
];

const JUNIOR_HIGH: &[WholeYear] = &[
    ("jhs-001", 8, &[96.0, 97.0, 95.0, 96.0, 94.0]),
    ("jhs-002", 9, &[88.0, 92.0, 95.0, 91.0, 93.0]),
    ("jhs-003", 9, &[99.0, 99.0, 89.0, 98.0, 97.0]),
    ("jhs-004", 10, &[82.0, 80.0, 85.0, 79.0, 84.0]),
];

const COLLEGE: &[WholeYear] = &[
    ("col-001", 3, &[1.0, 1.25, 1.0, 1.5, 1.25]),
    ("col-002", 2, &[1.5, 1.75, 1.5, 1.25, 2.0]),
    ("col-003", 1, &[1.0, 1.25, 1.5, 1.25, 1.0]),
    ("col-004", 4, &[2.25, 2.5, 2.0, 3.0, 2.75]),
];

const SENIOR_HIGH: &[PerPeriod] = &[
    (
        "shs-001",
        &[
            ("s1-q1", &[95.0, 96.0, 94.0, 97.0]),
            ("s1-q2", &[96.0, 95.0, 97.0, 96.0]),
            ("s2-q1", &[94.0, 95.0, 96.0, 95.0]),
            ("s2-q2", &[97.0, 96.0, 95.0, 98.0]),
        ],
    ),
    (
        "shs-002",
        &[
            ("s1-q1", &[90.0, 91.0, 92.0, 90.0]),
            ("s1-q2", &[84.0, 98.0, 97.0, 96.0]),
            ("s2-q1", &[92.0, 93.0, 94.0, 95.0]),
            ("s2-q2", &[95.0, 96.0, 97.0, 95.0]),
        ],
    ),
    (
        "shs-003",
        &[
            ("s1-q1", &[88.0, 87.0, 89.0, 86.0]),
            ("s1-q2", &[91.0, 92.0, 90.0, 93.0]),
        ],
    ),
];

fn shs_calendar() -> Vec<GradingPeriod> {
    vec![
        GradingPeriod::new("s1-q1", 1, 1),
        GradingPeriod::new("s1-q2", 1, 2),
        GradingPeriod::new("s2-q1", 2, 1),
        GradingPeriod::new("s2-q2", 2, 2),
    ]
}

fn honor_types() -> Vec<HonorType> {
    vec![
        HonorType::new(WITH_HONORS, "With Honors", HonorScope::Basic),
        HonorType::new(WITH_HIGH_HONORS, "With High Honors", HonorScope::Basic),
        HonorType::new(WITH_HIGHEST_HONORS, "With Highest Honors", HonorScope::Basic),
        HonorType::new(DEANS_LIST, "Dean's List", HonorScope::College),
        HonorType::new(PRESIDENTS_LIST, "President's List", HonorScope::College),
    ]
}

fn criteria() -> Vec<HonorCriterion> {
    let mut rows = Vec::new();
    for level in [AcademicLevel::Elementary, AcademicLevel::JuniorHigh] {
        rows.push(HonorCriterion::new(level, WITH_HONORS).with_min_gpa(90.0));
        rows.push(
            HonorCriterion::new(level, WITH_HIGH_HONORS)
                .with_min_gpa(95.0)
                .with_min_grade(90.0),
        );
        rows.push(
            HonorCriterion::new(level, WITH_HIGHEST_HONORS)
                .with_min_gpa(98.0)
                .with_min_grade(93.0),
        );
    }

    let shs = AcademicLevel::SeniorHigh;
    rows.push(
        HonorCriterion::new(shs, WITH_HONORS)
            .with_min_gpa(90.0)
            .with_min_grade_all(85.0),
    );
    rows.push(
        HonorCriterion::new(shs, WITH_HIGH_HONORS)
            .with_min_gpa(95.0)
            .with_min_grade_all(90.0),
    );

    let college = AcademicLevel::College;
    rows.push(
        HonorCriterion::new(college, DEANS_LIST)
            .with_min_gpa(1.75)
            .with_min_grade(2.5)
            .with_rule(AdditionalRule::MinSubjects(5)),
    );
    rows.push(
        HonorCriterion::new(college, PRESIDENTS_LIST)
            .with_min_gpa(1.25)
            .with_min_grade(2.0)
            .with_year_range(Some(2), None)
            .requiring_consistent_honor(),
    );
    rows
}

fn whole_year_records(
    level: AcademicLevel,
    school_year: SchoolYear,
    subjects: &[&str],
    roster: &[WholeYear],
) -> Vec<GradeRecord> {
    roster
        .iter()
        .flat_map(|(student, year_of_study, grades)| {
            grades.iter().zip(subjects).map(move |(grade, subject)| GradeRecord {
                student: StudentId(student.to_string()),
                subject: subject.to_string(),
                level,
                school_year,
                grading_period: None,
                grade: Some(*grade),
                year_of_study: *year_of_study,
            })
        })
        .collect()
}

fn senior_high_records(school_year: SchoolYear) -> Vec<GradeRecord> {
    let mut records = Vec::new();
    for (student, periods) in SENIOR_HIGH {
        for (period, grades) in periods.iter() {
            for (grade, subject) in grades.iter().zip(SHS_SUBJECTS) {
                records.push(GradeRecord {
                    student: StudentId(student.to_string()),
                    subject: subject.to_string(),
                    level: AcademicLevel::SeniorHigh,
                    school_year,
                    grading_period: Some(GradingPeriodId(period.to_string())),
                    grade: Some(*grade),
                    year_of_study: 11,
                });
            }
        }
    }
    records
}

/// In-memory collaborators populated with honor types, criteria, rosters and grades for
/// every academic level of one school year.
pub struct DemoCampus {
    pub school_year: SchoolYear,
    pub grades: Arc<InMemoryGradeSource>,
    pub criteria: Arc<InMemoryCriteriaRepository>,
    pub results: Arc<InMemoryResultStore>,
}

impl DemoCampus {
    pub fn seed(school_year: SchoolYear) -> Result<Self, SourceError> {
        let repository = InMemoryCriteriaRepository::default();
        for honor_type in honor_types() {
            repository.add_honor_type(honor_type)?;
        }
        for criterion in criteria() {
            repository.add_criterion(criterion)?;
        }

        let grades = InMemoryGradeSource::default();
        let whole_year = [
            (AcademicLevel::Elementary, &BASIC_SUBJECTS[..], ELEMENTARY),
            (AcademicLevel::JuniorHigh, &BASIC_SUBJECTS[..], JUNIOR_HIGH),
            (AcademicLevel::College, &COLLEGE_SUBJECTS[..], COLLEGE),
        ];
        for (level, subjects, roster) in whole_year {
            for (student, _, _) in roster {
                grades.enroll(level, school_year, student)?;
            }
            grades.record_all(whole_year_records(level, school_year, subjects, roster))?;
        }
        for (student, _) in SENIOR_HIGH {
            grades.enroll(AcademicLevel::SeniorHigh, school_year, student)?;
        }
        grades.record_all(senior_high_records(school_year))?;
        grades.set_periods(AcademicLevel::SeniorHigh, school_year, shs_calendar())?;

        let results = InMemoryResultStore::default();
        if let Some(previous) = school_year.previous() {
            results.insert(QualificationResult {
                student: StudentId("col-001".to_string()),
                honor_type: Some(HonorTypeId(PRESIDENTS_LIST.to_string())),
                level: AcademicLevel::College,
                school_year: previous,
                grading_period: None,
                average: Some(1.2),
                qualified: true,
                reason: None,
                approval: ApprovalStatus::Approved,
            })?;
        }

        Ok(Self {
            school_year,
            grades: Arc::new(grades),
            criteria: Arc::new(repository),
            results: Arc::new(results),
        })
    }

    pub fn service(
        &self,
        options: EvaluationOptions,
        workers: usize,
    ) -> HonorRollService<InMemoryGradeSource, InMemoryCriteriaRepository, InMemoryResultStore>
    {
        HonorRollService::new(
            self.grades.clone(),
            self.criteria.clone(),
            self.results.clone(),
            options,
        )
        .with_workers(workers)
    }
}
