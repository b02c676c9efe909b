mod common;

use biosphere::{
    events::WorldEventKind,
    rng::RngManager,
    species::{Diet, SpeciesId, SpeciesRegistry},
    systems::{
        ecosystem::{incidental_kill_count, DECLINE_CAUSE, EXTINCTION_CAUSE},
        EcosystemSystem,
    },
    world::{CharacterId, FoodWebRelation, World},
};
use common::{count, meadow_world, registry, step_system, step_system_events, traits, MEADOW};

fn run(world: &mut World, ticks: usize, species: &str) -> Vec<u64> {
    let mut system = EcosystemSystem::new();
    let mut rng = RngManager::new(17);
    let mut counts = vec![count(world, MEADOW, species)];
    for _ in 0..ticks {
        step_system(&mut system, world, &mut rng);
        counts.push(count(world, MEADOW, species));
    }
    counts
}

fn hares() -> SpeciesRegistry {
    registry(&[("hare", traits(Diet::Herbivore, 5.0, 0.02))])
}

#[test]
fn growth_below_capacity_never_falls_and_levels_off() {
    let mut world = meadow_world(hares(), 1_000.0, &[("hare", 100)]);
    let counts = run(&mut world, 3_000, "hare");
    for pair in counts.windows(2) {
        assert!(pair[1] >= pair[0], "count fell from {} to {}", pair[0], pair[1]);
    }
    let last = *counts.last().unwrap();
    assert!(last <= 1_000, "overshot capacity: {last}");
    assert!(last >= 980, "did not approach capacity: {last}");
}

#[test]
fn double_capacity_shrinks_every_tick() {
    let mut world = meadow_world(hares(), 1_000.0, &[("hare", 2_000)]);
    let counts = run(&mut world, 100, "hare");
    for pair in counts.windows(2) {
        assert!(pair[1] < pair[0], "count did not drop: {} -> {}", pair[0], pair[1]);
    }
    assert!(*counts.last().unwrap() < 2_000);
}

fn predator_registry() -> SpeciesRegistry {
    registry(&[
        ("hare", traits(Diet::Herbivore, 5.0, 0.02)),
        ("lynx", traits(Diet::Carnivore, 20.0, 0.01)),
    ])
}

fn with_lynx_eating_hares(mut world: World) -> World {
    world.add_food_web_relation(FoodWebRelation {
        predator: SpeciesId::new("lynx"),
        prey: SpeciesId::new("hare"),
        efficiency: 0.5,
    });
    world
}

#[test]
fn predators_hold_prey_below_predator_free_run() {
    let mut hunted = with_lynx_eating_hares(meadow_world(
        predator_registry(),
        10_000.0,
        &[("hare", 500), ("lynx", 50)],
    ));
    let mut safe = with_lynx_eating_hares(meadow_world(
        predator_registry(),
        10_000.0,
        &[("hare", 500)],
    ));
    let hunted_counts = run(&mut hunted, 100, "hare");
    let safe_counts = run(&mut safe, 100, "hare");
    assert!(hunted_counts[100] < safe_counts[100]);
}

#[test]
fn predators_starve_without_prey() {
    let mut world = with_lynx_eating_hares(meadow_world(
        predator_registry(),
        10_000.0,
        &[("lynx", 100)],
    ));
    let counts = run(&mut world, 50, "lynx");
    for pair in counts.windows(2) {
        assert!(pair[1] <= pair[0], "predators grew: {} -> {}", pair[0], pair[1]);
    }
    assert!(counts[50] < counts[0]);
    assert!(counts[50] < 50);
}

#[test]
fn trampling_matches_formula() {
    assert_eq!(incidental_kill_count(90.0, 1.0, 1_000), 9);

    let registry = registry(&[
        ("mammoth", traits(Diet::Herbivore, 90.0, 0.0)),
        ("mouse", traits(Diet::Herbivore, 1.0, 0.0)),
    ]);
    let mut world = meadow_world(registry, 100_000.0, &[("mammoth", 1_000), ("mouse", 500)]);
    let counts = run(&mut world, 1, "mouse");
    assert_eq!(counts, vec![500, 491]);
    assert_eq!(count(&world, MEADOW, "mammoth"), 1_000);
}

#[test]
fn trampling_counts_the_herd_before_it_grows() {
    let registry = registry(&[
        ("mammoth", traits(Diet::Herbivore, 90.0, 1.0)),
        ("mouse", traits(Diet::Herbivore, 1.0, 0.0)),
    ]);
    let mut world = meadow_world(registry, 100_000.0, &[("mammoth", 1_000), ("mouse", 500)]);
    let counts = run(&mut world, 1, "mouse");
    assert!(count(&world, MEADOW, "mammoth") > 1_200, "herd should have grown this tick");
    assert_eq!(counts, vec![500, 491]);
}

#[test]
fn characters_die_with_their_population() {
    let mut world = with_lynx_eating_hares(meadow_world(
        predator_registry(),
        10_000.0,
        &[("lynx", 3)],
    ));
    let lynx = SpeciesId::new("lynx");
    world
        .region_mut(MEADOW)
        .and_then(|region| region.population_mut(&lynx))
        .expect("lynx seeded")
        .characters = vec![CharacterId(7), CharacterId(8), CharacterId(9)];

    let mut system = EcosystemSystem::new();
    let mut rng = RngManager::new(17);
    let mut deaths = Vec::new();
    for _ in 0..200 {
        for event in step_system_events(&mut system, &mut world, &mut rng) {
            if let WorldEventKind::CharacterKilled { character, cause, .. } = event.kind {
                deaths.push((character, cause));
            }
        }
        if let Some(population) = world.region(MEADOW).and_then(|r| r.population(&lynx)) {
            assert!(population.characters.len() as u64 <= population.count);
        }
    }

    assert!(world.region(MEADOW).unwrap().population(&lynx).is_none());
    assert_eq!(
        deaths,
        vec![
            (CharacterId(9), DECLINE_CAUSE.to_string()),
            (CharacterId(8), DECLINE_CAUSE.to_string()),
            (CharacterId(7), EXTINCTION_CAUSE.to_string()),
        ]
    );
}

#[test]
fn extinct_populations_are_removed() {
    let mut world = with_lynx_eating_hares(meadow_world(
        predator_registry(),
        10_000.0,
        &[("lynx", 3)],
    ));
    run(&mut world, 200, "lynx");
    let region = world.region(MEADOW).unwrap();
    assert!(region.population(&SpeciesId::new("lynx")).is_none());
}
