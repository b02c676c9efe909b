//! Weighted random selection over typed outcomes.
//!
//! Callers build the candidate list with a pure weight function over live state
//! and hand it here for the draw, so weights can be tested without randomness.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Draws one outcome proportionally to its weight.
///
/// Non-positive and non-finite weights are never selected. Returns `None` when no
/// candidate carries positive weight.
pub fn weighted_choice<T: Copy, R: Rng>(candidates: &[(T, f64)], rng: &mut R) -> Option<T> {
    let viable: Vec<(T, f64)> = candidates
        .iter()
        .copied()
        .filter(|(_, weight)| weight.is_finite() && *weight > 0.0)
        .collect();
    if viable.is_empty() {
        return None;
    }
    let index = WeightedIndex::new(viable.iter().map(|(_, weight)| *weight)).ok()?;
    Some(viable[index.sample(rng)].0)
}
