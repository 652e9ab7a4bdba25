//! Multiplicative score chains with zero short-circuit.
//!
//! Every candidate scorer follows the same composition rule: start from a
//! nominal positive weight, multiply in a chain of independent modifiers,
//! then clamp to a ceiling. A zero anywhere in the chain short-circuits, so
//! expensive factors (resource queries, route estimates) behind
//! [`TaskScore::apply_with`] are never evaluated for an already-infeasible
//! candidate. Scoring is pure: nothing here mutates agent or settlement
//! state.

use crate::economy::Occupancy;

/// Default upper ceiling for a composed score.
pub const DEFAULT_SCORE_CEILING: f64 = 1000.0;

/// Per-excess-occupant bonus for group-forming activities. Balance
/// constant.
pub const GROUP_CROWDING_BONUS: f64 = 0.25;

/// A score under composition. Never negative; zero is sticky.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskScore {
    value: f64,
}

impl TaskScore {
    /// Start a chain from a nominal weight. Negative or non-finite bases
    /// collapse to zero.
    pub fn new(base: f64) -> Self {
        Self {
            value: sanitize(base),
        }
    }

    /// Multiply in one modifier. Negative or non-finite factors collapse
    /// the score to zero.
    pub fn apply(mut self, factor: f64) -> Self {
        if self.value == 0.0 {
            return self;
        }
        self.value *= sanitize(factor);
        self
    }

    /// Multiply in a modifier that is expensive to compute. The closure is
    /// only evaluated when the chain is still non-zero.
    pub fn apply_with(self, factor: impl FnOnce() -> f64) -> Self {
        if self.value == 0.0 {
            return self;
        }
        self.apply(factor())
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }

    /// Finish the chain: floor at 0, clamp to `ceiling`.
    pub fn finish(self, ceiling: f64) -> f64 {
        self.value.min(ceiling).max(0.0)
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

/// Extroversion trait (0–100) mapped to a multiplicative factor.
///
/// Piecewise linear, exactly 1.0 at the trait midpoint, halving at 0 and
/// doubling at 100. The endpoints are balance constants.
pub fn extroversion_factor(trait_0_100: f32) -> f64 {
    let t = trait_0_100.clamp(0.0, 100.0) as f64;
    if t <= 50.0 {
        0.5 + t / 100.0
    } else {
        1.0 + (t - 50.0) / 50.0
    }
}

/// Crowding modifier for a venue.
///
/// Solo work degrades with every occupant beyond capacity
/// (`1 / (1 + excess)`); group-forming activities instead gain
/// [`GROUP_CROWDING_BONUS`] per excess occupant. A venue with zero
/// capacity scores zero outright.
pub fn crowding_factor(venue: &Occupancy, group_activity: bool) -> f64 {
    if venue.capacity == 0 {
        return 0.0;
    }
    let excess = venue.excess() as f64;
    if group_activity {
        1.0 + excess * GROUP_CROWDING_BONUS
    } else {
        1.0 / (1.0 + excess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn neutral_chain_preserves_base() {
        // Nominal weight through all-neutral modifiers is undistorted.
        let score = TaskScore::new(10.0)
            .apply(1.0)
            .apply(extroversion_factor(50.0))
            .finish(DEFAULT_SCORE_CEILING);
        assert!((score - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_factor_short_circuits() {
        let evaluated = Cell::new(false);
        let score = TaskScore::new(10.0)
            .apply(0.0)
            .apply_with(|| {
                evaluated.set(true);
                5.0
            })
            .finish(DEFAULT_SCORE_CEILING);
        assert_eq!(score, 0.0);
        assert!(!evaluated.get(), "expensive factor ran on a dead chain");
    }

    #[test]
    fn negative_and_nan_collapse_to_zero() {
        assert_eq!(TaskScore::new(-5.0).value(), 0.0);
        assert_eq!(TaskScore::new(10.0).apply(-1.0).value(), 0.0);
        assert_eq!(TaskScore::new(10.0).apply(f64::NAN).value(), 0.0);
        assert_eq!(TaskScore::new(f64::INFINITY).value(), 0.0);
    }

    #[test]
    fn ceiling_clamps() {
        let score = TaskScore::new(500.0).apply(500.0).finish(DEFAULT_SCORE_CEILING);
        assert!((score - DEFAULT_SCORE_CEILING).abs() < f64::EPSILON);
    }

    #[test]
    fn extroversion_endpoints() {
        assert!((extroversion_factor(50.0) - 1.0).abs() < f64::EPSILON);
        assert!((extroversion_factor(0.0) - 0.5).abs() < f64::EPSILON);
        assert!((extroversion_factor(100.0) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn extroversion_monotone() {
        let mut prev = 0.0;
        for t in 0..=100 {
            let f = extroversion_factor(t as f32);
            assert!(f >= prev);
            prev = f;
        }
    }

    #[test]
    fn extroversion_clamps_out_of_range_input() {
        assert!((extroversion_factor(-10.0) - 0.5).abs() < f64::EPSILON);
        assert!((extroversion_factor(150.0) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn crowding_inverse_for_solo_work() {
        let free = Occupancy::new(2, 4);
        let packed = Occupancy::new(7, 4);
        assert!((crowding_factor(&free, false) - 1.0).abs() < f64::EPSILON);
        assert!((crowding_factor(&packed, false) - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn crowding_bonus_for_group_work() {
        let packed = Occupancy::new(8, 4);
        assert!((crowding_factor(&packed, true) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_capacity_venue_scores_zero() {
        let none = Occupancy::new(0, 0);
        assert_eq!(crowding_factor(&none, false), 0.0);
        assert_eq!(crowding_factor(&none, true), 0.0);
    }
}
