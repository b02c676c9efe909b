use std::collections::BTreeMap;

use rand::Rng;

use crate::{
    rng::chance,
    species::SpeciesId,
    world::{RegionId, World},
};

/// Share of carrying capacity above which a region starts shedding population.
pub const MIGRATION_PRESSURE: f64 = 0.7;
pub const MIGRATION_PROBABILITY: f64 = 0.1;
/// Share of the chosen population that leaves.
pub const MIGRATION_FRACTION: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct Migration {
    pub species: SpeciesId,
    pub from: RegionId,
    pub to: RegionId,
    pub count: u64,
}

/// Moves part of one species out of each crowded region into a neighbour in the species'
/// habitat layer that still has room. Region totals are read once up front and then kept
/// current as moves land, so no destination is ever pushed past its capacity.
pub fn migrate<R: Rng>(world: &mut World, rng: &mut R) -> Vec<Migration> {
    let mut totals: BTreeMap<RegionId, u64> = world
        .regions()
        .map(|region| (region.id, region.total_population()))
        .collect();
    let mut moves = Vec::new();

    for id in world.region_ids() {
        let capacity = world.carrying_capacity(id);
        let total = totals.get(&id).copied().unwrap_or_default();
        if (total as f64) <= MIGRATION_PRESSURE * capacity {
            continue;
        }
        if !chance(rng, MIGRATION_PROBABILITY) {
            continue;
        }
        let Some(region) = world.region(id) else {
            continue;
        };
        let movable: Vec<(SpeciesId, u64)> = region
            .populations
            .iter()
            .filter(|population| population.count as usize > population.characters.len())
            .map(|population| {
                (
                    population.species.clone(),
                    population.count - population.characters.len() as u64,
                )
            })
            .collect();
        if movable.is_empty() {
            continue;
        }
        let (species, free) = movable[rng.gen_range(0..movable.len())].clone();
        let Some(habitat) = world.species().get(&species).map(|traits| traits.habitat) else {
            tracing::debug!(region = %id, species = %species, "migration skipped: unknown species");
            continue;
        };
        let destinations: Vec<(RegionId, u64)> = world
            .neighbors(id)
            .into_iter()
            .filter(|neighbor| {
                world
                    .region(*neighbor)
                    .map_or(false, |region| region.layer == habitat)
            })
            .filter_map(|neighbor| {
                let room = world.carrying_capacity(neighbor)
                    - totals.get(&neighbor).copied().unwrap_or_default() as f64;
                (room >= 1.0).then(|| (neighbor, room.floor() as u64))
            })
            .collect();
        if destinations.is_empty() {
            continue;
        }
        let (to, room) = destinations[rng.gen_range(0..destinations.len())];
        let wanted = ((free as f64) * MIGRATION_FRACTION).floor() as u64;
        let count = wanted.min(room).min(free);
        if count == 0 {
            continue;
        }

        if let Some(population) = world.region_mut(id).and_then(|r| r.population_mut(&species)) {
            population.remove(count);
        }
        if let Some(destination) = world.region_mut(to) {
            destination.population_entry(&species).count += count;
        }
        if let Some(total) = totals.get_mut(&id) {
            *total -= count;
        }
        if let Some(total) = totals.get_mut(&to) {
            *total += count;
        }
        tracing::debug!(from = %id, to = %to, species = %species, count, "migration");
        moves.push(Migration {
            species,
            from: id,
            to,
            count,
        });
    }
    moves
}
