mod common;

use std::collections::BTreeSet;

use biosphere::{
    biome::{Biome, Layer},
    engine::{System, SystemContext},
    events::WorldEventKind,
    rng::RngManager,
    species::{SpeciesId, SpeciesRegistry},
    systems::{
        catastrophe::{evaluate_triggers, evolution_pressure_for, StressVector},
        CatastropheSystem,
    },
    time::WorldTime,
    world::{Catastrophe, CatastropheKind, Population, Region, RegionId, World},
};

use common::{step_system, step_system_events};

fn world_of(regions: u64, population: u64, capacity: f64, pollution: f64) -> World {
    let mut world = World::new(WorldTime::new(60, 0), SpeciesRegistry::new());
    for index in 1..=regions {
        let id = RegionId(index);
        let mut region = Region::new(id, format!("Parish {index}"), Layer::Surface, Biome::Grassland)
            .with_location(10.0 * index as f64, 0.0, 120.0);
        region.climate.set_pollution(pollution);
        region
            .populations
            .push(Population::new(SpeciesId::new("hare"), population));
        world.insert_region(region);
        world.set_carrying_capacity(id, capacity);
    }
    world
}

fn started(events: &[biosphere::events::WorldEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event.kind, WorldEventKind::CatastropheStarted { .. }))
        .count()
}

#[test]
fn low_stress_never_triggers() {
    let region = Region::new(RegionId(1), "Glade", Layer::Surface, Biome::TemperateForest)
        .with_location(50.0, 0.0, 800.0);
    let stress = StressVector {
        pollution: 0.09,
        deforestation: 0.09,
        overpopulation: 0.09,
        soil_degradation: 0.09,
        disease_risk: 0.09,
    };
    let mut manager = RngManager::new(8);
    let mut rng = manager.stream("catastrophe");
    for _ in 0..1_000 {
        assert!(evaluate_triggers(&region, &stress, &mut rng).is_none());
    }
}

#[test]
fn calm_world_stays_calm() {
    let mut world = world_of(4, 50, 1_000.0, 0.05);
    let mut system = CatastropheSystem::new();
    let mut manager = RngManager::new(12);
    for _ in 0..1_000 {
        let time = *world.time();
        let ctx = SystemContext {
            tick: time.tick,
            time,
            scenario_name: "calm",
        };
        let mut rng = manager.stream("catastrophe");
        system.run(&ctx, &mut world, &mut rng).expect("tick");
        assert_eq!(started(&world.drain_events()), 0);
        world.advance_time();
    }
    assert!(world.active_catastrophes().is_empty());
    let stress = system.stress(RegionId(1)).expect("stress recorded");
    assert!(stress.peak() < 0.1);
}

#[test]
fn crowded_polluted_regions_eventually_suffer() {
    let mut world = world_of(5, 2_000, 1_000.0, 0.6);
    let mut system = CatastropheSystem::new();
    let mut manager = RngManager::new(31);
    let mut outbreak = None;
    for _ in 0..1_000 {
        let time = *world.time();
        let ctx = SystemContext {
            tick: time.tick,
            time,
            scenario_name: "crowded",
        };
        let mut rng = manager.stream("catastrophe");
        system.run(&ctx, &mut world, &mut rng).expect("tick");
        let events = world.drain_events();
        if started(&events) > 0 {
            outbreak = world.active_catastrophes().first().cloned();
            break;
        }
        world.advance_time();
    }
    let outbreak = outbreak.expect("saturated stress should trigger within 1000 ticks");
    assert!(matches!(
        outbreak.kind,
        CatastropheKind::Plague | CatastropheKind::DiseaseOutbreak
    ));
    assert!(outbreak.evolution_pressure > 1.0);
    for region in &outbreak.affected_regions {
        assert!(world.evolution_pressure(*region) > 1.0);
    }
}

#[test]
fn final_tick_resolves_once() {
    let mut world = world_of(1, 10, 1_000.0, 0.0);
    world.add_catastrophe(Catastrophe {
        id: 0,
        kind: CatastropheKind::Famine,
        severity: 0.4,
        origin: RegionId(1),
        affected_regions: BTreeSet::from([RegionId(1)]),
        tick_started: 0,
        duration_ticks: 48,
        ticks_remaining: 1,
        cause: "test".into(),
        effects: Vec::new(),
        evolution_pressure: evolution_pressure_for(CatastropheKind::Famine, 0.4),
    });
    assert!(world.evolution_pressure(RegionId(1)) > 1.0);

    let mut system = CatastropheSystem::new();
    let mut manager = RngManager::new(3);
    let mut resolved = 0;
    for _ in 0..5 {
        let time = *world.time();
        let ctx = SystemContext {
            tick: time.tick,
            time,
            scenario_name: "resolve",
        };
        let mut rng = manager.stream("catastrophe");
        system.run(&ctx, &mut world, &mut rng).expect("tick");
        resolved += world
            .drain_events()
            .iter()
            .filter(|event| matches!(event.kind, WorldEventKind::CatastropheResolved { .. }))
            .count();
        world.advance_time();
    }
    assert_eq!(resolved, 1);
    assert!(world.active_catastrophes().is_empty());
    assert_eq!(world.evolution_pressure(RegionId(1)), 1.0);
}

#[test]
fn resolution_is_reported_at_the_origin() {
    let mut world = world_of(3, 10, 1_000.0, 0.0);
    world.add_catastrophe(Catastrophe {
        id: 0,
        kind: CatastropheKind::Plague,
        severity: 0.5,
        origin: RegionId(3),
        affected_regions: BTreeSet::from([RegionId(1), RegionId(2), RegionId(3)]),
        tick_started: 0,
        duration_ticks: 200,
        ticks_remaining: 1,
        cause: "test".into(),
        effects: Vec::new(),
        evolution_pressure: evolution_pressure_for(CatastropheKind::Plague, 0.5),
    });

    let mut system = CatastropheSystem::new();
    let mut manager = RngManager::new(5);
    let resolved: Vec<_> = step_system_events(&mut system, &mut world, &mut manager)
        .into_iter()
        .filter(|event| matches!(event.kind, WorldEventKind::CatastropheResolved { .. }))
        .map(|event| event.region)
        .collect();
    assert_eq!(resolved, vec![Some(RegionId(3))]);
    assert!(world.active_catastrophes().is_empty());
}

#[test]
fn pressure_is_neutral_without_catastrophes() {
    let mut world = world_of(2, 10, 1_000.0, 0.0);
    let mut system = CatastropheSystem::new();
    let mut manager = RngManager::new(5);
    for _ in 0..10 {
        step_system(&mut system, &mut world, &mut manager);
    }
    for id in world.region_ids() {
        assert_eq!(world.evolution_pressure(id), 1.0);
    }
    for kind in [
        CatastropheKind::DiseaseOutbreak,
        CatastropheKind::Plague,
        CatastropheKind::Flood,
        CatastropheKind::Landslide,
        CatastropheKind::ForestFire,
        CatastropheKind::Famine,
        CatastropheKind::Blight,
    ] {
        assert!(evolution_pressure_for(kind, 0.5) > 1.0, "{kind:?}");
    }
}
