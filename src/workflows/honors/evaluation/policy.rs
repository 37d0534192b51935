use std::cmp::Ordering;

use super::super::domain::HonorCriterion;
use super::super::snapshot::HonorTier;
use super::config::TierSelection;
use super::matcher::MatchOutcome;

/// Comparable stringency of a criterion: `min_gpa` first, grade floor second.
fn stringency(criterion: &HonorCriterion) -> (f64, f64) {
    let scale = criterion.scale;
    let gpa = criterion
        .min_gpa
        .map(|value| scale.strictness(value))
        .unwrap_or(f64::NEG_INFINITY);
    let floor = criterion
        .grade_floor()
        .map(|value| scale.strictness(value))
        .unwrap_or(f64::NEG_INFINITY);
    (gpa, floor)
}

pub(crate) fn order_tiers(tiers: &mut [HonorTier], selection: TierSelection) {
    if selection == TierSelection::ConfiguredOrder {
        return;
    }

    // Stable sort keeps configured order among equally stringent tiers.
    tiers.sort_by(|a, b| {
        let (a_gpa, a_floor) = stringency(&a.criterion);
        let (b_gpa, b_floor) = stringency(&b.criterion);
        b_gpa
            .partial_cmp(&a_gpa)
            .unwrap_or(Ordering::Equal)
            .then(b_floor.partial_cmp(&a_floor).unwrap_or(Ordering::Equal))
    });
}

/// Picks the attempt that got furthest through the predicate chain. Ties go to the later,
/// less stringent tier since that is the one closest to being awarded.
pub(crate) fn least_failing<'a>(
    attempts: &'a [(&'a HonorTier, MatchOutcome)],
) -> Option<&'a (&'a HonorTier, MatchOutcome)> {
    let mut best: Option<&(&HonorTier, MatchOutcome)> = None;
    for attempt in attempts {
        best = match best {
            Some(current) if current.1.failed > attempt.1.failed => Some(current),
            _ => Some(attempt),
        };
    }
    best
}
