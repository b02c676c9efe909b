#![allow(dead_code)]

use std::path::Path;

use biosphere::{
    biome::{Biome, Layer},
    engine::{standard_builder, Engine, EngineSettings, System, SystemContext},
    rng::RngManager,
    scenario::{Scenario, ScenarioLoader},
    species::{Diet, SpeciesId, SpeciesRegistry, SpeciesTraits},
    time::WorldTime,
    events::WorldEvent,
    world::{Population, Region, RegionId, Resource, ResourceKind, World},
};

pub const MEADOW: RegionId = RegionId(1);

pub fn traits(diet: Diet, body_size: f64, reproduction_rate: f64) -> SpeciesTraits {
    SpeciesTraits {
        diet,
        body_size,
        habitat: Layer::Surface,
        reproduction_rate,
        maturity_days: 60.0,
        gestation_days: 30.0,
        food_need: 0.01,
    }
}

pub fn registry(entries: &[(&str, SpeciesTraits)]) -> SpeciesRegistry {
    let mut registry = SpeciesRegistry::new();
    for (id, traits) in entries {
        registry.insert(SpeciesId::new(*id), traits.clone());
    }
    registry
}

/// A single grassland region with effectively unlimited vegetation.
pub fn meadow_world(registry: SpeciesRegistry, capacity: f64, populations: &[(&str, u64)]) -> World {
    let mut world = World::new(WorldTime::new(120, 0), registry);
    let mut region = Region::new(MEADOW, "Meadow", Layer::Surface, Biome::Grassland)
        .with_location(45.0, 0.0, 100.0);
    region.resources.push(Resource {
        kind: ResourceKind::Vegetation,
        quantity: 1.0e9,
        renewal_rate: 1.0e6,
        max_quantity: 1.0e9,
    });
    for (species, count) in populations {
        region
            .populations
            .push(Population::new(SpeciesId::new(*species), *count));
    }
    world.insert_region(region);
    world.set_carrying_capacity(MEADOW, capacity);
    world
}

pub fn count(world: &World, region: RegionId, species: &str) -> u64 {
    world
        .region(region)
        .and_then(|region| region.population(&SpeciesId::new(species)))
        .map(|population| population.count)
        .unwrap_or(0)
}

/// Runs one system for one tick the way the engine would, then advances the clock.
pub fn step_system(system: &mut dyn System, world: &mut World, rng: &mut RngManager) {
    step_system_events(system, world, rng);
}

/// `step_system`, returning the events the tick raised.
pub fn step_system_events(
    system: &mut dyn System,
    world: &mut World,
    rng: &mut RngManager,
) -> Vec<WorldEvent> {
    let time = *world.time();
    let ctx = SystemContext {
        tick: time.tick,
        time,
        scenario_name: "test",
    };
    let name = system.name().to_string();
    let mut stream = rng.stream(&name);
    system
        .run(&ctx, world, &mut stream)
        .expect("system tick succeeds");
    let events = world.drain_events();
    world.advance_time();
    events
}

pub fn load_archipelago() -> Scenario {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
        .load("scenarios/archipelago.yaml")
        .expect("fixture scenario loads")
}

pub fn standard_engine(scenario: &Scenario, snapshot_dir: &Path, interval: u64) -> Engine {
    standard_builder(EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: interval,
        snapshot_dir: snapshot_dir.to_path_buf(),
    })
    .build()
}
