use std::collections::BTreeSet;

use serde::Serialize;
use tracing::warn;

use super::domain::{AcademicLevel, GradeScale, HonorCriterion, HonorType, HonorTypeId};
use super::evaluation::{policy, TierSelection};
use super::repository::{CriteriaRepository, SourceError};

/// An honor type paired with the active criterion that defines it for one level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HonorTier {
    pub honor_type: HonorType,
    pub criterion: HonorCriterion,
}

/// Criteria for one academic level, frozen for the duration of a batch and ordered for
/// tier selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriteriaSnapshot {
    level: AcademicLevel,
    scale: GradeScale,
    tiers: Vec<HonorTier>,
}

impl CriteriaSnapshot {
    pub fn capture<C>(
        repository: &C,
        level: AcademicLevel,
        selection: TierSelection,
    ) -> Result<Self, SourceError>
    where
        C: CriteriaRepository + ?Sized,
    {
        let honor_types = repository.honor_types(level.scope())?;
        let criteria = repository.criteria(level)?;
        Ok(Self::from_parts(level, honor_types, criteria, selection))
    }

    /// Builds the tier list from raw repository rows. Tiers follow honor type order before
    /// the selection policy is applied.
    pub fn from_parts(
        level: AcademicLevel,
        honor_types: Vec<HonorType>,
        criteria: Vec<HonorCriterion>,
        selection: TierSelection,
    ) -> Self {
        let scale = level.default_scale();
        let mut seen: BTreeSet<HonorTypeId> = BTreeSet::new();
        let mut accepted = Vec::new();

        for criterion in criteria {
            if !criterion.active || criterion.level != level {
                continue;
            }
            if criterion.scale != scale {
                warn!(
                    %level,
                    honor_type = %criterion.honor_type,
                    "skipping criterion configured on {:?} scale, level grades on {:?}",
                    criterion.scale,
                    scale
                );
                continue;
            }
            if !seen.insert(criterion.honor_type.clone()) {
                warn!(
                    %level,
                    honor_type = %criterion.honor_type,
                    "duplicate active criterion ignored"
                );
                continue;
            }
            for rule in criterion.additional_rules.iter().filter(|rule| !rule.is_recognized()) {
                warn!(
                    %level,
                    honor_type = %criterion.honor_type,
                    rule = rule.key(),
                    "unrecognized additional rule ignored"
                );
            }
            accepted.push(criterion);
        }

        let mut tiers = Vec::new();
        for honor_type in honor_types {
            if honor_type.scope != level.scope() {
                continue;
            }
            if let Some(position) = accepted
                .iter()
                .position(|criterion| criterion.honor_type == honor_type.id)
            {
                let criterion = accepted.remove(position);
                tiers.push(HonorTier {
                    honor_type,
                    criterion,
                });
            }
        }
        for orphan in &accepted {
            warn!(
                %level,
                honor_type = %orphan.honor_type,
                "criterion references an unknown honor type"
            );
        }

        policy::order_tiers(&mut tiers, selection);

        Self { level, scale, tiers }
    }

    pub fn level(&self) -> AcademicLevel {
        self.level
    }

    pub fn scale(&self) -> GradeScale {
        self.scale
    }

    pub fn tiers(&self) -> &[HonorTier] {
        &self.tiers
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Whether any tier needs the student's standing in the previous period.
    pub fn requires_history(&self) -> bool {
        self.tiers
            .iter()
            .any(|tier| tier.criterion.require_consistent_honor)
    }

    /// The floor whose violation rules a student out of every tier: the loosest floor,
    /// provided each tier has one. `None` means no grade alone can disqualify.
    pub fn cascade_floor(&self) -> Option<f64> {
        let mut loosest: Option<f64> = None;
        for tier in &self.tiers {
            let floor = tier.criterion.grade_floor()?;
            loosest = Some(match loosest {
                Some(current) if self.scale.strictness(current) <= self.scale.strictness(floor) => {
                    current
                }
                _ => floor,
            });
        }
        loosest
    }
}
