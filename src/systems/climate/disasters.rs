use rand::Rng;

use crate::biome::{Biome, Layer};
use crate::events::{DisasterKind, WorldEvent, WorldEventKind};
use crate::rng::chance;
use crate::weighted::weighted_choice;
use crate::world::{Region, World};

pub const BASE_DISASTER_PROBABILITY: f64 = 0.0001;
const POLLUTION_SCALING: f64 = 4.0;
const MIN_SEVERITY: f64 = 0.3;

/// Per-tick disaster probability, up to 5x base at full pollution.
pub fn disaster_probability(pollution: f64) -> f64 {
    BASE_DISASTER_PROBABILITY * (1.0 + POLLUTION_SCALING * pollution.clamp(0.0, 1.0))
}

pub fn disaster_weights(region: &Region) -> Vec<(DisasterKind, f64)> {
    let climate = &region.climate;
    let underwater = region.layer == Layer::Underwater;

    let earthquake = if region.elevation > 1_000.0 { 2.0 } else { 1.0 };
    let flood = if climate.precipitation() > 20.0 { 2.0 } else { 0.2 };
    let storm = if climate.wind_speed() > 15.0 { 2.0 } else { 0.3 };
    let wildfire = if underwater {
        0.0
    } else if climate.humidity() < 0.3 && climate.temperature() > 25.0 {
        2.0
    } else if region.biome.is_forest() {
        1.0
    } else {
        0.1
    };
    let landslide = if region.elevation > 1_500.0 && climate.precipitation() > 10.0 {
        1.5
    } else {
        0.1
    };
    let tornado = if underwater {
        0.0
    } else if matches!(region.biome, Biome::Grassland | Biome::Savanna) && climate.wind_speed() > 10.0 {
        1.0
    } else {
        0.05
    };
    let tsunami = if underwater || region.biome.is_tidal() { 0.5 } else { 0.0 };

    vec![
        (DisasterKind::Earthquake, earthquake),
        (DisasterKind::Flood, flood),
        (DisasterKind::Storm, storm),
        (DisasterKind::Wildfire, wildfire),
        (DisasterKind::Landslide, landslide),
        (DisasterKind::Tornado, tornado),
        (DisasterKind::Tsunami, tsunami),
    ]
}

/// Rolls the disaster check for every region, emitting one event per disaster.
pub fn check_disasters<R: Rng>(world: &mut World, rng: &mut R) -> usize {
    let tick = world.tick();
    let mut fired = Vec::new();
    for region in world.regions() {
        if !chance(rng, disaster_probability(region.climate.pollution())) {
            continue;
        }
        let Some(disaster) = weighted_choice(&disaster_weights(region), rng) else {
            continue;
        };
        let severity = rng.gen_range(MIN_SEVERITY..=1.0);
        tracing::info!(region = %region.id, ?disaster, severity, "natural disaster");
        fired.push(WorldEvent::regional(
            tick,
            region.id,
            WorldEventKind::NaturalDisaster { disaster, severity },
        ));
    }
    let count = fired.len();
    for event in fired {
        world.push_event(event);
    }
    count
}
