//! Population and ecosystem engine: growth, predation, feeding, plants, migration and the
//! per-tick health check.

mod growth;
mod health;
mod interactions;
mod migration;
mod resources;

use anyhow::Result;
use rand::Rng;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    species::{Diet, SpeciesId, SpeciesTraits},
    world::{RegionId, World},
};

pub use growth::{carnivore_growth, logistic_growth, starvation_loss};
pub use health::{
    HealthMonitor, DECLINE_CAUSE, DEPLETION_FRACTION, EXTINCTION_CAUSE, POLLUTION_CRISIS,
};
pub use interactions::{
    apply_trampling, incidental_kill_count, predation_loss, TRAMPLE_CAUSE, TROPHIC_TRANSFER,
};
pub use migration::{migrate, Migration, MIGRATION_PRESSURE};
pub use resources::{feed, grow_plants, recolonise_plants, regenerate_resources};

/// Share of carrying capacity above which crowding starts to pollute.
pub const OVERCROWDING_THRESHOLD: f64 = 0.9;
pub const OVERCROWDING_POLLUTION: f64 = 0.001;

pub struct EcosystemSystem {
    health: HealthMonitor,
}

impl EcosystemSystem {
    pub fn new() -> Self {
        Self {
            health: HealthMonitor::new(),
        }
    }

    pub fn reset(&mut self) {
        self.health.reset();
    }
}

impl Default for EcosystemSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Feeding, predation, growth and trampling for every population in one region.
pub fn update_populations<R: Rng>(world: &mut World, id: RegionId, rng: &mut R) {
    let tick = world.tick();
    let Some(region) = world.regions.get(&id) else {
        return;
    };
    let traits: Vec<Option<SpeciesTraits>> = region
        .populations
        .iter()
        .map(|population| {
            let traits = world.species.get(&population.species).cloned();
            if traits.is_none() {
                tracing::debug!(region = %id, species = %population.species, "unknown species skipped");
            }
            traits
        })
        .collect();
    let capacities: Vec<f64> = region
        .populations
        .iter()
        .map(|population| world.species_capacity(id, &population.species))
        .collect();
    let start_counts: Vec<u64> = region
        .populations
        .iter()
        .map(|population| population.count)
        .collect();
    let counts: Vec<f64> = start_counts.iter().map(|count| *count as f64).collect();

    let index_of = |species: &SpeciesId| {
        region
            .populations
            .iter()
            .position(|population| &population.species == species)
            .filter(|index| traits[*index].is_some())
    };
    let mut losses = vec![0.0; counts.len()];
    let mut gains = vec![0.0; counts.len()];
    for relation in &world.food_web {
        let (Some(predator), Some(prey)) = (index_of(&relation.predator), index_of(&relation.prey))
        else {
            continue;
        };
        let loss = predation_loss(counts[prey] - losses[prey], counts[predator], relation.efficiency);
        losses[prey] += loss;
        gains[predator] += loss * TROPHIC_TRANSFER;
    }

    let Some(region) = world.regions.get_mut(&id) else {
        return;
    };
    for (index, species_traits) in traits.iter().enumerate() {
        let Some(species_traits) = species_traits else {
            continue;
        };
        let count = counts[index];
        let capacity = capacities[index];
        let change = match species_traits.diet {
            Diet::Carnivore => carnivore_growth(gains[index], count, capacity),
            diet => {
                let fed = feed(region, diet, count * species_traits.food_need);
                logistic_growth(species_traits.intrinsic_rate(), count, capacity, fed)
                    - starvation_loss(count, fed)
                    + gains[index] * (1.0 - count / capacity)
            }
        };
        region.populations[index].apply_delta(change - losses[index]);
    }

    let events = apply_trampling(region, &traits, &start_counts, tick, rng);
    for event in events {
        world.push_event(event);
    }
}

/// Crowded regions foul their own climate.
pub fn apply_overcrowding_pollution(world: &mut World) {
    for id in world.region_ids() {
        let capacity = world.carrying_capacity(id);
        let Some(region) = world.region_mut(id) else {
            continue;
        };
        let load = region.total_population() as f64 / capacity;
        if load > OVERCROWDING_THRESHOLD {
            region
                .climate
                .add_pollution((load - OVERCROWDING_THRESHOLD) * OVERCROWDING_POLLUTION);
        }
    }
}

impl System for EcosystemSystem {
    fn name(&self) -> &str {
        "ecosystem"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        for id in world.region_ids() {
            update_populations(world, id, rng);
        }
        for region in world.regions.values_mut() {
            regenerate_resources(region);
            grow_plants(region);
        }
        recolonise_plants(world, rng);
        migrate(world, rng);
        apply_overcrowding_pollution(world);
        for event in self.health.check(world) {
            world.push_event(event);
        }
        Ok(())
    }

    fn resume(&mut self, world: &World) {
        self.health.prime(world);
    }
}
