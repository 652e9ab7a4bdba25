//! Weighted random selection, shared by task and malfunction selection.
//!
//! Selection is two-stage: a weighted draw picks one candidate from the
//! set, then (for gated callers) an independent per-candidate gate uses
//! the chosen weight as a percentage likelihood. The two stages let the
//! aggregate scope probability and each candidate's intrinsic likelihood
//! vary independently — a scope can have many applicable failure modes
//! while each still clears its own occurrence check.

use rand::seq::SliceRandom;
use rand::Rng;

/// One candidate with its non-negative probability weight.
#[derive(Debug, Clone)]
pub struct Weighted<T> {
    pub item: T,
    pub weight: f64,
}

impl<T> Weighted<T> {
    pub fn new(item: T, weight: f64) -> Self {
        Self { item, weight }
    }
}

/// Pick one index by weight, or `None` when nothing is selectable.
///
/// Iteration order is shuffled before the walk so equal-weight ties carry
/// no positional bias. Both the shuffle and the draw come from `rng`, so
/// a fixed seed reproduces the exact selection. An empty set or an
/// all-zero total yields `None` — never a division by zero.
pub fn weighted_choice<T>(candidates: &[Weighted<T>], rng: &mut impl Rng) -> Option<usize> {
    let total: f64 = candidates.iter().map(|c| c.weight.max(0.0)).sum();
    if candidates.is_empty() || total <= 0.0 || !total.is_finite() {
        return None;
    }
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.shuffle(rng);
    let r = rng.gen_range(0.0..total);
    Some(walk(candidates, &order, r))
}

/// Two-stage selection: weighted choice, then a gate drawn against the
/// chosen candidate's own weight as a percentage. A failed gate returns
/// `None` rather than forcing a choice.
pub fn gated_choice<T>(candidates: &[Weighted<T>], rng: &mut impl Rng) -> Option<usize> {
    let idx = weighted_choice(candidates, rng)?;
    let gate = candidates[idx].weight.clamp(0.0, 100.0);
    if rng.gen_range(0.0..100.0) < gate {
        Some(idx)
    } else {
        None
    }
}

/// Walk candidates in `order`, subtracting each weight from `r` until it
/// goes negative; that candidate wins. If floating-point drift exhausts
/// the walk, the last positive-weight candidate is returned as a safety
/// fallback. Requires at least one positive weight.
pub fn walk<T>(candidates: &[Weighted<T>], order: &[usize], mut r: f64) -> usize {
    let mut last = order[0];
    for &i in order {
        let w = candidates[i].weight.max(0.0);
        if w <= 0.0 {
            continue;
        }
        last = i;
        r -= w;
        if r < 0.0 {
            return i;
        }
    }
    last
}
