//! Per-tick population change for a single (region, species) pair.

/// Fraction of the unfed share of a population that dies each tick.
pub const STARVATION_RATE: f64 = 0.02;
/// Baseline mortality of a carnivore population that did eat.
pub const CARNIVORE_UPKEEP: f64 = 0.005;
/// Mortality of a carnivore population that found no prey at all.
pub const CARNIVORE_STARVATION: f64 = 0.02;

/// Logistic change `r·N·(1 − N/K)`, scaled by how well the population was fed.
/// Positive below capacity, negative above it.
pub fn logistic_growth(rate: f64, count: f64, capacity: f64, fed: f64) -> f64 {
    let capacity = capacity.max(crate::world::MIN_CAPACITY);
    rate * count * (1.0 - count / capacity) * fed.clamp(0.0, 1.0)
}

pub fn starvation_loss(count: f64, fed: f64) -> f64 {
    count * (1.0 - fed.clamp(0.0, 1.0)) * STARVATION_RATE
}

/// Carnivores reproduce only from what they caught.
pub fn carnivore_growth(prey_gain: f64, count: f64, capacity: f64) -> f64 {
    if prey_gain <= 0.0 {
        return -CARNIVORE_STARVATION * count;
    }
    let capacity = capacity.max(crate::world::MIN_CAPACITY);
    prey_gain * (1.0 - count / capacity) - CARNIVORE_UPKEEP * count
}
