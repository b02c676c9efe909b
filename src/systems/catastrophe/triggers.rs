//! Stress gates for each catastrophe kind. The per-check probabilities are gameplay-tuned
//! constants; keep them as they are.

use rand::Rng;

use crate::{
    rng::chance,
    world::{CatastropheKind, Region},
};

use super::stress::StressVector;

/// A catastrophe the trigger check wants to start.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerProposal {
    pub kind: CatastropheKind,
    pub severity: f64,
    pub cause: String,
}

struct Gate {
    kind: CatastropheKind,
    open: bool,
    severity: f64,
    rate: f64,
    cause: String,
}

fn gates(region: &Region, stress: &StressVector) -> [Gate; 7] {
    let climate = &region.climate;
    let StressVector {
        pollution,
        deforestation,
        overpopulation,
        soil_degradation,
        ..
    } = *stress;
    let crowding = (pollution + overpopulation) / 2.0;
    let dry_fire = deforestation * (1.0 - climate.humidity());
    let depletion = (soil_degradation + overpopulation) / 2.0;
    let blight = (soil_degradation + deforestation) / 2.0;
    [
        Gate {
            kind: CatastropheKind::Plague,
            open: pollution > 0.5 && overpopulation > 0.9,
            severity: crowding,
            rate: 0.002,
            cause: format!("pollution {pollution:.2} with overpopulation {overpopulation:.2}"),
        },
        Gate {
            kind: CatastropheKind::DiseaseOutbreak,
            open: pollution > 0.3 && overpopulation > 0.7,
            severity: crowding,
            rate: 0.005,
            cause: format!("pollution {pollution:.2} with overpopulation {overpopulation:.2}"),
        },
        Gate {
            kind: CatastropheKind::Flood,
            open: deforestation > 0.6 && climate.precipitation() > 30.0,
            severity: deforestation,
            rate: 0.005,
            cause: format!(
                "deforestation {deforestation:.2} under {:.1} mm rain",
                climate.precipitation()
            ),
        },
        Gate {
            kind: CatastropheKind::Landslide,
            open: deforestation > 0.5 && climate.precipitation() > 20.0 && region.elevation > 500.0,
            severity: deforestation,
            rate: 0.003,
            cause: format!(
                "bare slopes at {:.0} m, deforestation {deforestation:.2}",
                region.elevation
            ),
        },
        Gate {
            kind: CatastropheKind::ForestFire,
            open: (0.3..=0.8).contains(&deforestation) && climate.humidity() < 0.3,
            severity: dry_fire,
            rate: 0.004,
            cause: format!(
                "dry deadwood, deforestation {deforestation:.2} at humidity {:.2}",
                climate.humidity()
            ),
        },
        Gate {
            kind: CatastropheKind::Famine,
            open: soil_degradation > 0.6 && overpopulation > 0.8,
            severity: depletion,
            rate: 0.003,
            cause: format!(
                "soil degradation {soil_degradation:.2} with overpopulation {overpopulation:.2}"
            ),
        },
        Gate {
            kind: CatastropheKind::Blight,
            open: soil_degradation > 0.5 && deforestation > 0.4,
            severity: blight,
            rate: 0.002,
            cause: format!(
                "soil degradation {soil_degradation:.2} with deforestation {deforestation:.2}"
            ),
        },
    ]
}

/// Checks every gate in order and proposes at most one catastrophe.
pub fn evaluate_triggers<R: Rng>(
    region: &Region,
    stress: &StressVector,
    rng: &mut R,
) -> Option<TriggerProposal> {
    gates(region, stress)
        .into_iter()
        .filter(|gate| gate.open)
        .find(|gate| chance(rng, gate.rate * gate.severity))
        .map(|gate| TriggerProposal {
            kind: gate.kind,
            severity: gate.severity.clamp(0.0, 1.0),
            cause: gate.cause,
        })
}
