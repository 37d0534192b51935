use super::common::*;
use crate::workflows::honors::domain::{
    AcademicLevel, GradeScale, HonorCriterion, HonorScope, HonorType, HonorTypeId,
};
use crate::workflows::honors::evaluation::TierSelection;
use crate::workflows::honors::memory::InMemoryCriteriaRepository;
use crate::workflows::honors::rules::AdditionalRule;
use crate::workflows::honors::snapshot::CriteriaSnapshot;

const LEVEL: AcademicLevel = AcademicLevel::JuniorHigh;

fn tier_ids(snapshot: &CriteriaSnapshot) -> Vec<String> {
    snapshot
        .tiers()
        .iter()
        .map(|tier| tier.honor_type.id.0.clone())
        .collect()
}

#[test]
fn orders_tiers_from_most_to_least_stringent() {
    let snapshot = snapshot(LEVEL, vec![with_honors(LEVEL), with_high_honors(LEVEL)]);

    assert_eq!(tier_ids(&snapshot), vec![WITH_HIGH_HONORS, WITH_HONORS]);
}

#[test]
fn configured_order_follows_honor_type_listing() {
    let snapshot = CriteriaSnapshot::from_parts(
        LEVEL,
        basic_honor_types(),
        vec![with_high_honors(LEVEL), with_honors(LEVEL)],
        TierSelection::ConfiguredOrder,
    );

    assert_eq!(tier_ids(&snapshot), vec![WITH_HONORS, WITH_HIGH_HONORS]);
}

#[test]
fn ignores_inactive_and_foreign_criteria() {
    let snapshot = snapshot(
        LEVEL,
        vec![
            with_honors(LEVEL).inactive(),
            with_high_honors(AcademicLevel::Elementary),
        ],
    );

    assert!(snapshot.is_empty());
}

#[test]
fn keeps_the_first_of_duplicate_active_criteria() {
    let snapshot = snapshot(
        LEVEL,
        vec![with_honors(LEVEL), with_honors(LEVEL).with_min_gpa(80.0)],
    );

    assert_eq!(snapshot.tiers().len(), 1);
    assert_eq!(snapshot.tiers()[0].criterion.min_gpa, Some(90.0));
}

#[test]
fn drops_criteria_on_the_wrong_scale_or_without_an_honor_type() {
    let mut wrong_scale = with_high_honors(LEVEL);
    wrong_scale.scale = GradeScale::CollegePoint;
    let orphan = HonorCriterion::new(LEVEL, "perfect-attendance").with_min_gpa(75.0);

    let snapshot = snapshot(LEVEL, vec![with_honors(LEVEL), wrong_scale, orphan]);

    assert_eq!(tier_ids(&snapshot), vec![WITH_HONORS]);
}

#[test]
fn college_tiers_use_college_honor_types_only() {
    let honor_types = vec![
        HonorType::new("deans-list", "Dean's List", HonorScope::College),
        HonorType::new(WITH_HONORS, "With Honors", HonorScope::Basic),
    ];
    let criteria = vec![
        HonorCriterion::new(AcademicLevel::College, "deans-list").with_min_gpa(1.75),
        HonorCriterion::new(AcademicLevel::College, WITH_HONORS).with_min_gpa(1.5),
    ];

    let snapshot = CriteriaSnapshot::from_parts(
        AcademicLevel::College,
        honor_types,
        criteria,
        TierSelection::MostStringent,
    );

    assert_eq!(snapshot.scale(), GradeScale::CollegePoint);
    assert_eq!(tier_ids(&snapshot), vec!["deans-list"]);
}

#[test]
fn college_stringency_prefers_the_lower_threshold() {
    let honor_types = vec![
        HonorType::new("deans-list", "Dean's List", HonorScope::College),
        HonorType::new("presidents-list", "President's List", HonorScope::College),
    ];
    let criteria = vec![
        HonorCriterion::new(AcademicLevel::College, "deans-list").with_min_gpa(1.75),
        HonorCriterion::new(AcademicLevel::College, "presidents-list").with_min_gpa(1.25),
    ];

    let snapshot = CriteriaSnapshot::from_parts(
        AcademicLevel::College,
        honor_types,
        criteria,
        TierSelection::MostStringent,
    );

    assert_eq!(tier_ids(&snapshot), vec!["presidents-list", "deans-list"]);
}

#[test]
fn cascade_floor_is_the_loosest_floor_when_every_tier_has_one() {
    let strict = with_high_honors(LEVEL);
    let loose = with_honors(LEVEL).with_min_grade_all(85.0);
    let snapshot = snapshot(LEVEL, vec![loose, strict]);

    assert_eq!(snapshot.cascade_floor(), Some(85.0));
}

#[test]
fn cascade_floor_is_absent_when_any_tier_lacks_one() {
    let snapshot = snapshot(LEVEL, vec![with_honors(LEVEL), with_high_honors(LEVEL)]);

    assert_eq!(snapshot.cascade_floor(), None);
}

#[test]
fn history_is_needed_only_for_consistency_tiers() {
    let plain = snapshot(LEVEL, vec![with_honors(LEVEL)]);
    let consistent = snapshot(
        LEVEL,
        vec![with_honors(LEVEL), with_high_honors(LEVEL).requiring_consistent_honor()],
    );

    assert!(!plain.requires_history());
    assert!(consistent.requires_history());
}

#[test]
fn unrecognized_rules_do_not_block_a_tier() {
    let criterion = with_honors(LEVEL).with_rule(AdditionalRule::Unrecognized {
        key: "conduct_grade".to_string(),
        value: serde_json::json!("A"),
    });

    let snapshot = snapshot(LEVEL, vec![criterion]);

    assert_eq!(tier_ids(&snapshot), vec![WITH_HONORS]);
}

#[test]
fn capture_reads_the_repository_once_per_level() {
    let repository = InMemoryCriteriaRepository::default();
    for honor_type in basic_honor_types() {
        repository.add_honor_type(honor_type).expect("honor type");
    }
    repository.add_criterion(with_honors(LEVEL)).expect("criterion");
    repository
        .add_criterion(with_honors(AcademicLevel::Elementary).with_min_gpa(88.0))
        .expect("criterion");

    let snapshot = CriteriaSnapshot::capture(&repository, LEVEL, TierSelection::MostStringent)
        .expect("capture");

    assert_eq!(snapshot.level(), LEVEL);
    assert_eq!(snapshot.tiers().len(), 1);
    assert_eq!(
        snapshot.tiers()[0].criterion.honor_type,
        HonorTypeId(WITH_HONORS.to_string())
    );
    assert_eq!(snapshot.tiers()[0].criterion.min_gpa, Some(90.0));
}
