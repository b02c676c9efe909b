use std::collections::BTreeSet;

use rand::Rng;

use crate::{
    events::{WorldEvent, WorldEventKind},
    world::{
        Catastrophe, CatastropheEffect, CatastropheKind, EffectKind, Region, RegionId, World,
    },
};

use super::triggers::TriggerProposal;

struct KindProfile {
    min_ticks: u32,
    max_ticks: u32,
    pressure_factor: f64,
    effects: &'static [(EffectKind, f64)],
    spreads_to_neighbors: bool,
}

fn profile(kind: CatastropheKind) -> KindProfile {
    use EffectKind::*;
    match kind {
        CatastropheKind::DiseaseOutbreak => KindProfile {
            min_ticks: 72,
            max_ticks: 240,
            pressure_factor: 1.0,
            effects: &[(PopulationKill, 0.01)],
            spreads_to_neighbors: false,
        },
        CatastropheKind::Plague => KindProfile {
            min_ticks: 168,
            max_ticks: 720,
            pressure_factor: 1.5,
            effects: &[(PopulationKill, 0.02)],
            spreads_to_neighbors: true,
        },
        CatastropheKind::Flood => KindProfile {
            min_ticks: 24,
            max_ticks: 96,
            pressure_factor: 0.5,
            effects: &[
                (PopulationKill, 0.005),
                (PlantDestroy, 0.01),
                (ClimateDisruption, 1.0),
            ],
            spreads_to_neighbors: false,
        },
        CatastropheKind::Landslide => KindProfile {
            min_ticks: 6,
            max_ticks: 24,
            pressure_factor: 0.3,
            effects: &[(PopulationKill, 0.01), (PlantDestroy, 0.03)],
            spreads_to_neighbors: false,
        },
        CatastropheKind::ForestFire => KindProfile {
            min_ticks: 24,
            max_ticks: 120,
            pressure_factor: 0.7,
            effects: &[
                (PlantDestroy, 0.05),
                (PopulationKill, 0.005),
                (ClimateDisruption, 2.0),
            ],
            spreads_to_neighbors: false,
        },
        CatastropheKind::Famine => KindProfile {
            min_ticks: 240,
            max_ticks: 720,
            pressure_factor: 0.8,
            effects: &[(PopulationKill, 0.008)],
            spreads_to_neighbors: false,
        },
        CatastropheKind::Blight => KindProfile {
            min_ticks: 168,
            max_ticks: 480,
            pressure_factor: 0.4,
            effects: &[(PlantDestroy, 0.02)],
            spreads_to_neighbors: false,
        },
    }
}

/// Mutation-rate multiplier for a catastrophe: always above 1 for any positive severity.
pub fn evolution_pressure_for(kind: CatastropheKind, severity: f64) -> f64 {
    1.0 + severity.clamp(0.0, 1.0) * profile(kind).pressure_factor
}

/// Turns a trigger proposal into an active catastrophe and announces it.
pub fn start_catastrophe<R: Rng>(
    world: &mut World,
    origin: RegionId,
    proposal: TriggerProposal,
    rng: &mut R,
) -> u64 {
    let kind_profile = profile(proposal.kind);
    let duration = rng.gen_range(kind_profile.min_ticks..=kind_profile.max_ticks);
    let mut affected_regions: BTreeSet<RegionId> = [origin].into_iter().collect();
    if kind_profile.spreads_to_neighbors {
        affected_regions.extend(world.neighbors(origin).into_iter().filter(|neighbor| {
            world
                .region(*neighbor)
                .map_or(false, |region| region.total_population() > 0)
        }));
    }
    let severity = proposal.severity.clamp(0.0, 1.0);
    let id = world.allocate_catastrophe_id();
    let tick = world.tick();
    let catastrophe = Catastrophe {
        id,
        kind: proposal.kind,
        severity,
        origin,
        affected_regions,
        tick_started: tick,
        duration_ticks: duration,
        ticks_remaining: duration,
        cause: proposal.cause.clone(),
        effects: kind_profile
            .effects
            .iter()
            .map(|(kind, magnitude)| CatastropheEffect {
                kind: *kind,
                magnitude: *magnitude,
            })
            .collect(),
        evolution_pressure: evolution_pressure_for(proposal.kind, severity),
    };
    tracing::info!(
        id,
        region = %origin,
        kind = proposal.kind.label(),
        severity,
        duration,
        cause = %proposal.cause,
        "catastrophe started"
    );
    world.add_catastrophe(catastrophe);
    world.push_event(WorldEvent::regional(
        tick,
        origin,
        WorldEventKind::CatastropheStarted {
            catastrophe_id: id,
            catastrophe: proposal.kind,
            severity,
            cause: proposal.cause,
        },
    ));
    id
}

fn disrupt_climate(region: &mut Region, kind: CatastropheKind, strength: f64) {
    let climate = &mut region.climate;
    match kind {
        CatastropheKind::Flood => {
            climate.add_humidity(0.01 * strength);
            climate.add_precipitation(5.0 * strength);
        }
        CatastropheKind::ForestFire => {
            climate.add_temperature(strength);
            climate.add_humidity(-0.01 * strength);
            climate.add_pollution(0.005 * strength);
        }
        _ => climate.add_pollution(0.002 * strength),
    }
}

/// Applies one tick of a catastrophe to one region. Returns the characters it killed.
fn apply_effects(region: &mut Region, catastrophe: &Catastrophe, tick: u64) -> Vec<WorldEvent> {
    let mut events = Vec::new();
    for effect in &catastrophe.effects {
        let strength = effect.magnitude * catastrophe.severity;
        match effect.kind {
            EffectKind::PopulationKill => {
                for population in &mut region.populations {
                    let deaths = population.count as f64 * strength.clamp(0.0, 1.0);
                    population.apply_delta(-deaths);
                    for character in population.release_surplus_characters() {
                        events.push(WorldEvent::regional(
                            tick,
                            region.id,
                            WorldEventKind::CharacterKilled {
                                character,
                                species: population.species.clone(),
                                cause: catastrophe.kind.label().to_string(),
                            },
                        ));
                    }
                }
            }
            EffectKind::PlantDestroy => {
                for plant in region.plants.iter_mut().filter(|plant| !plant.destroyed) {
                    plant.destroy_fraction(strength);
                }
            }
            EffectKind::ClimateDisruption => disrupt_climate(region, catastrophe.kind, strength),
        }
    }
    events
}

/// Counts every active catastrophe down by one tick, applying its effects; expired ones are
/// resolved and removed. Returns the ids that resolved.
pub fn tick_catastrophes(world: &mut World) -> Vec<u64> {
    let tick = world.tick();
    let mut active = std::mem::take(&mut world.catastrophes);
    let mut resolved = Vec::new();
    for catastrophe in &mut active {
        catastrophe.ticks_remaining = catastrophe.ticks_remaining.saturating_sub(1);
        for region_id in &catastrophe.affected_regions {
            let Some(region) = world.region_mut(*region_id) else {
                tracing::debug!(region = %region_id, id = catastrophe.id, "catastrophe region missing");
                continue;
            };
            for event in apply_effects(region, catastrophe, tick) {
                world.push_event(event);
            }
        }
        if catastrophe.ticks_remaining == 0 {
            resolved.push(catastrophe.id);
            tracing::info!(
                id = catastrophe.id,
                region = %catastrophe.origin,
                kind = catastrophe.kind.label(),
                "catastrophe resolved"
            );
            world.push_event(WorldEvent::regional(
                tick,
                catastrophe.origin,
                WorldEventKind::CatastropheResolved {
                    catastrophe_id: catastrophe.id,
                    catastrophe: catastrophe.kind,
                },
            ));
        }
    }
    active.retain(|catastrophe| catastrophe.ticks_remaining > 0);
    world.catastrophes = active;
    resolved
}
