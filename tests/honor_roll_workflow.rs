use std::sync::Arc;

use honor_roll::workflows::honors::{
    AcademicLevel, AdditionalRule, BatchScope, CriteriaSnapshot, EvaluationEngine,
    EvaluationOptions, GradeRecord, GradingPeriod, GradingPeriodId, HonorCriterion,
    HonorRollService, HonorScope, HonorType, HonorTypeId, InMemoryCriteriaRepository,
    InMemoryGradeSource, InMemoryResultStore, MissingGradePolicy, PriorStanding, SchoolYear,
    StudentGrades, StudentId, TierSelection, EARLIER_PERIOD,
};

fn school_year() -> SchoolYear {
    SchoolYear::parse("2025-2026").expect("valid school year")
}

fn grade(
    student: &str,
    subject: &str,
    level: AcademicLevel,
    period: Option<&str>,
    value: f64,
) -> GradeRecord {
    GradeRecord {
        student: StudentId(student.to_string()),
        subject: subject.to_string(),
        level,
        school_year: school_year(),
        grading_period: period.map(|id| GradingPeriodId(id.to_string())),
        grade: Some(value),
        year_of_study: 7,
    }
}

type Campus = (
    Arc<InMemoryGradeSource>,
    Arc<InMemoryCriteriaRepository>,
    Arc<InMemoryResultStore>,
);

fn campus(criteria: Vec<HonorCriterion>) -> Campus {
    let repository = InMemoryCriteriaRepository::default();
    repository
        .add_honor_type(HonorType::new("with-honors", "With Honors", HonorScope::Basic))
        .expect("honor type");
    repository
        .add_honor_type(HonorType::new("with-high-honors", "With High Honors", HonorScope::Basic))
        .expect("honor type");
    for criterion in criteria {
        repository.add_criterion(criterion).expect("criterion");
    }
    (
        Arc::new(InMemoryGradeSource::default()),
        Arc::new(repository),
        Arc::new(InMemoryResultStore::default()),
    )
}

#[test]
fn criteria_rows_from_json_drive_evaluation() {
    let rows = serde_json::json!([
        {
            "level": "junior_high",
            "honor_type": "with-honors",
            "scale": "percentage",
            "min_gpa": 90.0,
            "additional_rules": { "min_subjects": 3, "scholarship_quota": 10 }
        },
        {
            "level": "junior_high",
            "honor_type": "with-high-honors",
            "scale": "percentage",
            "min_gpa": 95.0,
            "min_grade": 90.0,
            "active": false
        }
    ]);
    let criteria: Vec<HonorCriterion> = serde_json::from_value(rows).expect("criteria rows");
    assert!(criteria[0]
        .additional_rules
        .iter()
        .any(|rule| matches!(rule, AdditionalRule::Unrecognized { key, .. } if key == "scholarship_quota")));

    let snapshot = CriteriaSnapshot::from_parts(
        AcademicLevel::JuniorHigh,
        vec![
            HonorType::new("with-honors", "With Honors", HonorScope::Basic),
            HonorType::new("with-high-honors", "With High Honors", HonorScope::Basic),
        ],
        criteria,
        TierSelection::MostStringent,
    );
    assert_eq!(snapshot.tiers().len(), 1);

    let grades = StudentGrades {
        student: StudentId("jhs-100".to_string()),
        records: vec![
            grade("jhs-100", "English", AcademicLevel::JuniorHigh, None, 88.0),
            grade("jhs-100", "Math", AcademicLevel::JuniorHigh, None, 92.0),
            grade("jhs-100", "Science", AcademicLevel::JuniorHigh, None, 95.0),
        ],
    };
    let result = EvaluationEngine::new(EvaluationOptions::default())
        .evaluate(&snapshot, school_year(), &grades, None, PriorStanding::NoRecord)
        .expect("evaluates");

    assert!(result.qualified);
    assert_eq!(result.average, Some(91.67));
    assert_eq!(result.honor_type, Some(HonorTypeId("with-honors".to_string())));
    assert_eq!(result.summary(), "qualified for with-honors");
}

#[tokio::test]
async fn batch_is_idempotent_and_isolates_bad_rows() {
    let level = AcademicLevel::Elementary;
    let (grades, criteria, results) = campus(vec![
        HonorCriterion::new(level, "with-honors").with_min_gpa(90.0),
        HonorCriterion::new(level, "with-high-honors")
            .with_min_gpa(95.0)
            .with_min_grade(90.0),
    ]);
    for student in ["elem-1", "elem-2", "elem-3"] {
        grades.enroll(level, school_year(), student).expect("enroll");
    }
    grades
        .record_all(vec![
            grade("elem-1", "Reading", level, None, 97.0),
            grade("elem-1", "Math", level, None, 96.0),
            grade("elem-2", "Reading", level, None, 91.0),
            grade("elem-2", "Math", level, None, 89.0),
            grade("elem-3", "Reading", level, None, 101.0),
        ])
        .expect("grades");
    let service = HonorRollService::new(
        grades,
        criteria,
        results.clone(),
        EvaluationOptions::default(),
    )
    .with_workers(3);

    let first = service
        .run(BatchScope::new(level, school_year()))
        .await
        .expect("first run");
    let second = service
        .run(BatchScope::new(level, school_year()))
        .await
        .expect("second run");

    assert_eq!(first.summary, second.summary);
    assert_eq!(first.summary.processed, 3);
    assert_eq!(first.summary.qualified, 2);
    assert_eq!(first.summary.failed, 1);
    assert_eq!(first.failures[0].student, StudentId("elem-3".to_string()));
    assert_eq!(results.len().expect("rows"), 2);
}

#[tokio::test]
async fn senior_high_cascade_through_the_service() {
    let level = AcademicLevel::SeniorHigh;
    let (grades, criteria, results) = campus(vec![HonorCriterion::new(level, "with-honors")
        .with_min_gpa(90.0)
        .with_min_grade_all(85.0)]);
    grades
        .set_periods(
            level,
            school_year(),
            vec![
                GradingPeriod::new("q1", 1, 1),
                GradingPeriod::new("q2", 1, 2),
                GradingPeriod::new("q3", 2, 1),
                GradingPeriod::new("q4", 2, 2),
            ],
        )
        .expect("calendar");
    grades.enroll(level, school_year(), "shs-100").expect("enroll");
    let marks = [
        ("q1", 90.0, 91.0),
        ("q2", 84.0, 88.0),
        ("q3", 92.0, 93.0),
        ("q4", 95.0, 96.0),
    ];
    for (period, first, second) in marks {
        grades
            .record_all(vec![
                grade("shs-100", "Statistics", level, Some(period), first),
                grade("shs-100", "Philosophy", level, Some(period), second),
            ])
            .expect("grades");
    }
    let service = HonorRollService::new(
        grades,
        criteria,
        results.clone(),
        EvaluationOptions {
            missing_grades: MissingGradePolicy::Exclude,
            tier_selection: TierSelection::MostStringent,
        },
    );

    let report = service
        .run(BatchScope::new(level, school_year()))
        .await
        .expect("batch runs");

    let verdicts: Vec<_> = report
        .results
        .iter()
        .map(|result| (result.grading_period.clone(), result.qualified, result.reason.clone()))
        .collect();
    assert_eq!(verdicts.len(), 4);
    assert!(verdicts[0].1);
    assert!(!verdicts[1].1);
    assert_eq!(verdicts[2].2.as_deref(), Some(EARLIER_PERIOD));
    assert_eq!(verdicts[3].2.as_deref(), Some(EARLIER_PERIOD));
    assert_eq!(verdicts[3].0, Some(GradingPeriodId("q4".to_string())));
    assert_eq!(results.len().expect("rows"), 4);
}
