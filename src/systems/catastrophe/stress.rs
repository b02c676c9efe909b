use serde::Serialize;

use crate::world::{Region, MIN_CAPACITY};

/// Overgrazed ticks after which a plant stand counts towards soil degradation.
pub const SOIL_DEGRADATION_TICKS: u32 = 72;

/// Five independent 0..1 stress scores for one region. Recomputed every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StressVector {
    pub pollution: f64,
    pub deforestation: f64,
    pub overpopulation: f64,
    pub soil_degradation: f64,
    pub disease_risk: f64,
}

impl StressVector {
    pub fn peak(&self) -> f64 {
        [
            self.pollution,
            self.deforestation,
            self.overpopulation,
            self.soil_degradation,
            self.disease_risk,
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }
}

/// Zero when both inputs are zero, rising towards one as either grows.
pub fn disease_risk(pollution: f64, overpopulation: f64) -> f64 {
    1.0 - (1.0 - pollution.clamp(0.0, 1.0)) * (1.0 - overpopulation.clamp(0.0, 1.0))
}

pub fn compute_stress(region: &Region, carrying_capacity: f64) -> StressVector {
    let pollution = region.climate.pollution();
    let overpopulation =
        (region.total_population() as f64 / carrying_capacity.max(MIN_CAPACITY)).clamp(0.0, 1.0);

    let (deforestation, soil_degradation) = if region.plants.is_empty() {
        (0.0, 0.0)
    } else {
        let stands = region.plants.len() as f64;
        let missing: f64 = region
            .plants
            .iter()
            .map(|plant| 1.0 - plant.fill_fraction())
            .sum();
        let degraded = region
            .plants
            .iter()
            .filter(|plant| plant.ticks_below_threshold > SOIL_DEGRADATION_TICKS)
            .count() as f64;
        (missing / stands, degraded / stands)
    };

    StressVector {
        pollution,
        deforestation: deforestation.clamp(0.0, 1.0),
        overpopulation,
        soil_degradation,
        disease_risk: disease_risk(pollution, overpopulation),
    }
}
