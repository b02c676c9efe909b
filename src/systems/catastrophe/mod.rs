//! Catastrophe engine: per-region stress, trigger gates and the active-catastrophe lifecycle.

mod lifecycle;
mod stress;
mod triggers;

use std::collections::BTreeMap;

use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::{RegionId, World},
};

pub use lifecycle::{evolution_pressure_for, start_catastrophe, tick_catastrophes};
pub use stress::{compute_stress, disease_risk, StressVector, SOIL_DEGRADATION_TICKS};
pub use triggers::{evaluate_triggers, TriggerProposal};

/// Keeps the most recent stress vector per region for inspection; it is never persisted.
#[derive(Debug, Default)]
pub struct CatastropheSystem {
    stress: BTreeMap<RegionId, StressVector>,
}

impl CatastropheSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stress(&self, region: RegionId) -> Option<&StressVector> {
        self.stress.get(&region)
    }
}

impl System for CatastropheSystem {
    fn name(&self) -> &str {
        "catastrophe"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        self.stress.clear();
        for id in world.region_ids() {
            let Some(region) = world.region(id) else {
                continue;
            };
            let stress = compute_stress(region, world.carrying_capacity(id));
            self.stress.insert(id, stress);
            // One catastrophe per region at a time.
            let already_struck = world
                .active_catastrophes()
                .iter()
                .any(|catastrophe| catastrophe.affected_regions.contains(&id));
            if already_struck {
                continue;
            }
            if let Some(proposal) = evaluate_triggers(region, &stress, rng) {
                start_catastrophe(world, id, proposal, rng);
            }
        }
        tick_catastrophes(world);
        Ok(())
    }
}
