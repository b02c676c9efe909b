//! Food stocks and plant stands: grazing, regeneration, regrowth and recolonisation.

use std::collections::BTreeMap;

use rand::Rng;

use crate::{
    rng::chance,
    species::Diet,
    world::{Region, RegionId, ResourceKind, World},
};

/// Pollution at 1.0 cuts regeneration and regrowth by this fraction.
pub const POLLUTION_REGEN_DAMPING: f64 = 0.8;
/// Plant stands under this share of max biomass count as overgrazed.
pub const OVERGRAZED_FRACTION: f64 = 0.2;
/// Stands at or above this share of max biomass can seed neighbours.
pub const SEED_STAND_FRACTION: f64 = 0.5;
/// Biomass a recolonised stand restarts at, as a share of its max.
pub const RECOLONISE_FRACTION: f64 = 0.05;

pub fn eats(diet: Diet, kind: ResourceKind) -> bool {
    match diet {
        Diet::Herbivore => matches!(kind, ResourceKind::Vegetation | ResourceKind::Plankton),
        Diet::Omnivore => kind.is_edible(),
        Diet::Detritivore => kind == ResourceKind::Fungi,
        Diet::Carnivore => false,
    }
}

/// Draws `need` food units for one population from the region's stocks, then from
/// plant biomass for grazers. Returns the fed fraction in `[0, 1]`.
pub fn feed(region: &mut Region, diet: Diet, need: f64) -> f64 {
    if need <= 0.0 {
        return 1.0;
    }
    let mut remaining = need;
    for resource in &mut region.resources {
        if remaining <= 0.0 {
            break;
        }
        if eats(diet, resource.kind) {
            remaining -= resource.consume(remaining);
        }
    }
    if diet.grazes() {
        for plant in &mut region.plants {
            if remaining <= 0.0 {
                break;
            }
            if plant.destroyed {
                continue;
            }
            let taken = remaining.min(plant.biomass);
            plant.biomass -= taken;
            remaining -= taken;
            if plant.biomass <= 0.0 {
                plant.biomass = 0.0;
                plant.destroyed = true;
            }
        }
    }
    ((need - remaining.max(0.0)) / need).clamp(0.0, 1.0)
}

pub fn pollution_damping(pollution: f64) -> f64 {
    1.0 - POLLUTION_REGEN_DAMPING * pollution.clamp(0.0, 1.0)
}

/// Restores every stock toward its max, slowed by pollution and scaled by the tide.
pub fn regenerate_resources(region: &mut Region) {
    let rate_scale = pollution_damping(region.climate.pollution()) * region.tidal_factor;
    for resource in &mut region.resources {
        let next = resource.quantity + resource.renewal_rate.max(0.0) * rate_scale;
        resource.quantity = next.clamp(0.0, resource.max_quantity.max(0.0));
    }
}

/// Logistic regrowth of surviving stands and the overgrazing counter.
pub fn grow_plants(region: &mut Region) {
    let damping = pollution_damping(region.climate.pollution());
    for plant in &mut region.plants {
        if !plant.destroyed && plant.max_biomass > 0.0 {
            let growth = plant.growth_rate
                * plant.biomass
                * (1.0 - plant.biomass / plant.max_biomass)
                * damping;
            plant.biomass = (plant.biomass + growth).clamp(0.0, plant.max_biomass);
        }
        if plant.fill_fraction() < OVERGRAZED_FRACTION {
            plant.ticks_below_threshold = plant.ticks_below_threshold.saturating_add(1);
        } else {
            plant.ticks_below_threshold = 0;
        }
    }
}

/// Destroyed stands may be reseeded from a healthy stand of the same plant next door.
/// Seed sources are read before any stand is restored. Returns how many stands came back.
pub fn recolonise_plants<R: Rng>(world: &mut World, rng: &mut R) -> usize {
    let seed_stands: BTreeMap<RegionId, Vec<(String, f64)>> = world
        .regions()
        .map(|region| {
            let stands = region
                .plants
                .iter()
                .filter(|plant| !plant.destroyed && plant.fill_fraction() >= SEED_STAND_FRACTION)
                .map(|plant| (plant.plant.clone(), plant.spread_rate))
                .collect();
            (region.id, stands)
        })
        .collect();

    let mut restored = 0;
    for id in world.region_ids() {
        let neighbors = world.neighbors(id);
        let Some(region) = world.region_mut(id) else {
            continue;
        };
        for plant in region.plants.iter_mut().filter(|plant| plant.destroyed) {
            let source = neighbors.iter().find(|neighbor| {
                seed_stands.get(*neighbor).map_or(false, |stands| {
                    stands
                        .iter()
                        .any(|(name, spread_rate)| *name == plant.plant && chance(&mut *rng, *spread_rate))
                })
            });
            if let Some(source) = source {
                plant.destroyed = false;
                plant.biomass = plant.max_biomass * RECOLONISE_FRACTION;
                restored += 1;
                tracing::debug!(region = %id, plant = %plant.plant, from = %source, "plant recolonised");
            }
        }
    }
    restored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::{Biome, Layer};
    use crate::species::SpeciesRegistry;
    use crate::time::WorldTime;
    use crate::world::{PlantPopulation, Resource};
    use crate::rng::RngManager;

    fn grass(biomass: f64) -> PlantPopulation {
        PlantPopulation {
            plant: "grass".into(),
            biomass,
            max_biomass: 100.0,
            growth_rate: 0.05,
            spread_rate: 1.0,
            destroyed: biomass <= 0.0,
            ticks_below_threshold: 0,
        }
    }

    fn meadow(id: u64) -> Region {
        Region::new(RegionId(id), "Meadow", Layer::Surface, Biome::Grassland)
    }

    #[test]
    fn grazers_fall_back_to_plants_and_stop_at_zero() {
        let mut region = meadow(1);
        region.resources.push(Resource {
            kind: ResourceKind::Vegetation,
            quantity: 3.0,
            renewal_rate: 1.0,
            max_quantity: 50.0,
        });
        region.plants.push(grass(4.0));
        let fed = feed(&mut region, Diet::Herbivore, 10.0);
        assert!((fed - 0.7).abs() < 1e-12);
        assert_eq!(region.resources[0].quantity, 0.0);
        assert!(region.plants[0].destroyed);
        assert_eq!(region.plants[0].biomass, 0.0);
    }

    #[test]
    fn carnivores_do_not_graze() {
        let mut region = meadow(1);
        region.plants.push(grass(40.0));
        assert_eq!(feed(&mut region, Diet::Carnivore, 5.0), 0.0);
        assert_eq!(region.plants[0].biomass, 40.0);
    }

    #[test]
    fn pollution_slows_regeneration() {
        let stock = Resource {
            kind: ResourceKind::Vegetation,
            quantity: 0.0,
            renewal_rate: 10.0,
            max_quantity: 100.0,
        };
        let mut clean = meadow(1);
        clean.resources.push(stock.clone());
        let mut dirty = meadow(2);
        dirty.resources.push(stock);
        dirty.climate.set_pollution(1.0);
        regenerate_resources(&mut clean);
        regenerate_resources(&mut dirty);
        assert_eq!(clean.resources[0].quantity, 10.0);
        assert!(dirty.resources[0].quantity < 2.5);
    }

    #[test]
    fn overgrazing_counter_tracks_sparse_stands() {
        let mut region = meadow(1);
        region.plants.push(grass(5.0));
        region.plants.push(grass(90.0));
        grow_plants(&mut region);
        grow_plants(&mut region);
        assert_eq!(region.plants[0].ticks_below_threshold, 2);
        assert_eq!(region.plants[1].ticks_below_threshold, 0);
    }

    #[test]
    fn healthy_neighbour_reseeds_destroyed_stand() {
        let mut world = World::new(WorldTime::default(), SpeciesRegistry::new());
        let mut bare = meadow(1);
        bare.plants.push(grass(0.0));
        let mut lush = meadow(2);
        lush.plants.push(grass(80.0));
        world.insert_region(bare);
        world.insert_region(lush);
        world.connect(RegionId(1), RegionId(2));
        let mut manager = RngManager::new(2);
        let mut rng = manager.stream("ecosystem");
        assert_eq!(recolonise_plants(&mut world, &mut rng), 1);
        let stand = &world.region(RegionId(1)).unwrap().plants[0];
        assert!(!stand.destroyed);
        assert_eq!(stand.biomass, 5.0);
    }
}
