use std::collections::BTreeSet;

use crate::{
    events::{WorldEvent, WorldEventKind},
    world::{Population, Region, RegionId, ResourceKind, World},
};

/// Stocks under this share of their max are reported as depleted.
pub const DEPLETION_FRACTION: f64 = 0.05;
pub const POLLUTION_CRISIS: f64 = 0.7;
pub const EXTINCTION_CAUSE: &str = "local_extinction";
pub const DECLINE_CAUSE: &str = "population_decline";

/// Remembers which alarms are already raised so each fires once per episode.
#[derive(Debug, Default)]
pub struct HealthMonitor {
    depleted: BTreeSet<(RegionId, ResourceKind)>,
    polluted: BTreeSet<RegionId>,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.depleted.clear();
        self.polluted.clear();
    }

    /// Marks every alarm whose condition already holds as raised, without reporting it.
    /// A world restored from a snapshot has already announced those.
    pub fn prime(&mut self, world: &World) {
        self.reset();
        for region in world.regions() {
            for resource in &region.resources {
                if resource.fill_fraction() < DEPLETION_FRACTION {
                    self.depleted.insert((region.id, resource.kind));
                }
            }
            if region.climate.pollution() > POLLUTION_CRISIS {
                self.polluted.insert(region.id);
            }
        }
    }

    /// Removes extinct populations and raises depletion and pollution alarms.
    pub fn check(&mut self, world: &mut World) -> Vec<WorldEvent> {
        let tick = world.tick();
        let mut events = Vec::new();
        for region in world.regions.values_mut() {
            let id = region.id;
            events.extend(release_characters(region, tick));
            region.populations.retain(|population| {
                if population.count > 0 {
                    return true;
                }
                tracing::info!(region = %id, species = %population.species, "local extinction");
                events.push(WorldEvent::regional(
                    tick,
                    id,
                    WorldEventKind::LocalExtinction {
                        species: population.species.clone(),
                    },
                ));
                false
            });

            for resource in &region.resources {
                let key = (id, resource.kind);
                let fraction = resource.fill_fraction();
                if fraction >= DEPLETION_FRACTION {
                    self.depleted.remove(&key);
                    continue;
                }
                if self.depleted.insert(key) {
                    tracing::info!(region = %id, resource = ?resource.kind, fraction, "resource depleted");
                    events.push(WorldEvent::regional(
                        tick,
                        id,
                        WorldEventKind::ResourceDepletion {
                            resource: resource.kind,
                            remaining_fraction: fraction,
                        },
                    ));
                }
            }

            let pollution = region.climate.pollution();
            if pollution <= POLLUTION_CRISIS {
                self.polluted.remove(&id);
            } else if self.polluted.insert(id) {
                tracing::info!(region = %id, pollution, "pollution crisis");
                events.push(WorldEvent::regional(
                    tick,
                    id,
                    WorldEventKind::PollutionCrisis { pollution },
                ));
            }
        }
        events
    }
}

/// Characters whose population shrank below them die with it.
fn release_characters(region: &mut Region, tick: u64) -> Vec<WorldEvent> {
    let id = region.id;
    let mut events = Vec::new();
    for population in &mut region.populations {
        let cause = decline_cause(population);
        for character in population.release_surplus_characters() {
            tracing::info!(region = %id, species = %population.species, character = character.0, cause, "character lost");
            events.push(WorldEvent::regional(
                tick,
                id,
                WorldEventKind::CharacterKilled {
                    character,
                    species: population.species.clone(),
                    cause: cause.to_string(),
                },
            ));
        }
    }
    events
}

fn decline_cause(population: &Population) -> &'static str {
    if population.count == 0 {
        EXTINCTION_CAUSE
    } else {
        DECLINE_CAUSE
    }
}
