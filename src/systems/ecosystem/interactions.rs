//! Cross-species effects inside one region: predation and incidental trampling.

use rand::Rng;

use crate::{
    events::{WorldEvent, WorldEventKind},
    rng::chance,
    species::SpeciesTraits,
    world::{CharacterId, Region},
};

/// Prey killed per predator per unit of predation efficiency, per tick.
pub const PREDATION_RATE: f64 = 0.01;
/// Share of prey biomass that becomes predator births.
pub const TROPHIC_TRANSFER: f64 = 0.1;
/// Body size ratio above which the larger species tramples the smaller.
pub const TRAMPLE_SIZE_RATIO: f64 = 10.0;
pub const TRAMPLE_CAUSE: &str = "trampled";

/// Prey lost to one predator population this tick; never more prey than exist.
pub fn predation_loss(prey_count: f64, predator_count: f64, efficiency: f64) -> f64 {
    (predator_count * efficiency.clamp(0.0, 1.0) * PREDATION_RATE).min(prey_count.max(0.0))
}

/// `floor(0.001 × (ratio / 10) × large_count)`, zero unless the ratio exceeds 10.
pub fn incidental_kill_count(large_size: f64, small_size: f64, large_count: u64) -> u64 {
    if small_size <= 0.0 || large_size <= 0.0 {
        return 0;
    }
    let ratio = large_size / small_size;
    if ratio <= TRAMPLE_SIZE_RATIO {
        return 0;
    }
    (large_count as f64 * ratio / TRAMPLE_SIZE_RATIO / 1_000.0).floor() as u64
}

/// Tramples every small population sharing a habitat layer with a much larger one.
/// `traits[i]` and `start_counts[i]` belong to `region.populations[i]`; `None` entries are
/// skipped. Kills scale with the large population as it stood before this tick's growth.
pub fn apply_trampling<R: Rng>(
    region: &mut Region,
    traits: &[Option<SpeciesTraits>],
    start_counts: &[u64],
    tick: u64,
    rng: &mut R,
) -> Vec<WorldEvent> {
    let mut kills = vec![0u64; region.populations.len()];
    for (large, large_traits) in traits.iter().enumerate() {
        let Some(large_traits) = large_traits else {
            continue;
        };
        let large_count = start_counts.get(large).copied().unwrap_or(0);
        if large_count == 0 {
            continue;
        }
        for (small, small_traits) in traits.iter().enumerate() {
            let Some(small_traits) = small_traits else {
                continue;
            };
            if small == large || small_traits.habitat != large_traits.habitat {
                continue;
            }
            kills[small] += incidental_kill_count(
                large_traits.body_size,
                small_traits.body_size,
                large_count,
            );
        }
    }

    let mut events = Vec::new();
    for (index, killed) in kills.into_iter().enumerate() {
        if killed == 0 {
            continue;
        }
        let region_id = region.id;
        let population = &mut region.populations[index];
        let before = population.count;
        let removed = population.remove(killed);
        if removed == 0 {
            continue;
        }
        let odds = removed as f64 / before as f64;
        let mut trampled: Vec<CharacterId> = Vec::new();
        population.characters.retain(|character| {
            if chance(rng, odds) {
                trampled.push(*character);
                false
            } else {
                true
            }
        });
        trampled.extend(population.release_surplus_characters());
        tracing::debug!(
            region = %region_id,
            species = %population.species,
            removed,
            characters = trampled.len(),
            "incidental kills"
        );
        for character in trampled {
            events.push(WorldEvent::regional(
                tick,
                region_id,
                WorldEventKind::CharacterKilled {
                    character,
                    species: population.species.clone(),
                    cause: TRAMPLE_CAUSE.to_string(),
                },
            ));
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::{Biome, Layer};
    use crate::rng::RngManager;
    use crate::species::{Diet, SpeciesId};
    use crate::world::{Population, RegionId};

    fn traits(body_size: f64, habitat: Layer) -> SpeciesTraits {
        SpeciesTraits {
            diet: Diet::Herbivore,
            body_size,
            habitat,
            reproduction_rate: 0.01,
            maturity_days: 100.0,
            gestation_days: 30.0,
            food_need: 0.01,
        }
    }

    #[test]
    fn elephant_and_mouse() {
        assert_eq!(incidental_kill_count(90.0, 1.0, 1_000), 9);
        assert_eq!(incidental_kill_count(10.0, 1.0, 1_000), 0);
        assert_eq!(incidental_kill_count(90.0, 0.0, 1_000), 0);
    }

    #[test]
    fn predation_is_capped_by_prey() {
        assert_eq!(predation_loss(1_000.0, 100.0, 0.5), 0.5);
        assert_eq!(predation_loss(0.2, 100.0, 0.5), 0.2);
        assert_eq!(predation_loss(10.0, 0.0, 0.5), 0.0);
    }

    #[test]
    fn trampling_kills_characters_and_spares_other_layers() {
        let mut region = Region::new(RegionId(1), "Plain", Layer::Surface, Biome::Savanna);
        region.populations.push(Population::new(SpeciesId::new("mammoth"), 1_000));
        let mut mice = Population::new(SpeciesId::new("mouse"), 9);
        mice.characters = vec![CharacterId(7), CharacterId(8)];
        region.populations.push(mice);
        region.populations.push(Population::new(SpeciesId::new("mole"), 50));
        let traits = vec![
            Some(traits(90.0, Layer::Surface)),
            Some(traits(1.0, Layer::Surface)),
            Some(traits(1.0, Layer::Underground)),
        ];
        let start_counts: Vec<u64> = region.populations.iter().map(|p| p.count).collect();
        let mut manager = RngManager::new(1);
        let mut rng = manager.stream("ecosystem");
        let events = apply_trampling(&mut region, &traits, &start_counts, 3, &mut rng);
        assert_eq!(region.populations[1].count, 0);
        assert!(region.populations[1].characters.is_empty());
        assert_eq!(events.len(), 2);
        assert_eq!(region.populations[2].count, 50);
        assert_eq!(region.populations[0].count, 1_000);
        assert!(events.iter().all(|event| matches!(
            &event.kind,
            WorldEventKind::CharacterKilled { cause, .. } if cause == TRAMPLE_CAUSE
        )));
    }

    #[test]
    fn trampling_uses_the_herd_size_from_the_start_of_the_tick() {
        let mut region = Region::new(RegionId(1), "Plain", Layer::Surface, Biome::Savanna);
        region.populations.push(Population::new(SpeciesId::new("mammoth"), 1_500));
        region.populations.push(Population::new(SpeciesId::new("mouse"), 500));
        let traits = vec![Some(traits(90.0, Layer::Surface)), Some(traits(1.0, Layer::Surface))];
        let mut manager = RngManager::new(2);
        let mut rng = manager.stream("ecosystem");
        apply_trampling(&mut region, &traits, &[1_000, 500], 0, &mut rng);
        assert_eq!(region.populations[1].count, 491);
        assert_eq!(region.populations[0].count, 1_500);
    }
}
