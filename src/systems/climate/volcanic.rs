use std::collections::BTreeSet;

use rand::Rng;

use crate::events::{WorldEvent, WorldEventKind};
use crate::rng::chance;
use crate::world::{RegionId, World};

const PRESSURE_BUILD_RATE: f64 = 0.002;
const ERUPTION_PRESSURE_GATE: f64 = 0.5;
const ERUPTION_PRESSURE_ONSET: f64 = 0.7;
const ERUPTION_PROBABILITY_SCALE: f64 = 0.005;
const ERUPTION_MIN_TICKS: u32 = 6;
const ERUPTION_MAX_TICKS: u32 = 24;
const ASH_SPREAD_PROBABILITY: f64 = 0.1;

const VENT_COOLING: f64 = 2.0;
const VENT_HUMIDITY: f64 = 0.02;
const ACID_RAIN: f64 = 5.0;
const POLLUTION_SPIKE: f64 = 0.15;
const ASH_COOLING: f64 = 0.5;
const ASH_POLLUTION: f64 = 0.005;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolcanicState {
    pub pressure: f64,
    pub erupting: bool,
    pub eruption_ticks_remaining: u32,
    pub ash_regions: BTreeSet<RegionId>,
}

pub fn eruption_probability(pressure: f64) -> f64 {
    if pressure <= ERUPTION_PRESSURE_GATE {
        return 0.0;
    }
    (pressure - ERUPTION_PRESSURE_ONSET).max(0.0) * ERUPTION_PROBABILITY_SCALE
}

impl VolcanicState {
    /// Advances one region's volcano by a tick, writing its effects into the world.
    pub fn step<R: Rng>(&mut self, id: RegionId, potential: f64, world: &mut World, rng: &mut R) {
        if self.erupting {
            self.erupt_tick(id, world, rng);
            return;
        }
        self.pressure = (self.pressure + rng.gen::<f64>() * PRESSURE_BUILD_RATE * potential).min(1.0);
        if chance(rng, eruption_probability(self.pressure)) {
            self.begin_eruption(id, world, rng);
        }
    }

    pub fn begin_eruption<R: Rng>(&mut self, id: RegionId, world: &mut World, rng: &mut R) {
        let duration = rng.gen_range(ERUPTION_MIN_TICKS..=ERUPTION_MAX_TICKS);
        self.erupting = true;
        self.eruption_ticks_remaining = duration;
        self.ash_regions.clear();
        if let Some(region) = world.region_mut(id) {
            region.climate.add_pollution(POLLUTION_SPIKE);
            tracing::info!(region = %id, name = %region.name, duration, "volcano erupting");
        }
        let tick = world.tick();
        world.push_event(WorldEvent::regional(
            tick,
            id,
            WorldEventKind::VolcanicEruption {
                duration_ticks: duration,
            },
        ));
    }

    fn erupt_tick<R: Rng>(&mut self, id: RegionId, world: &mut World, rng: &mut R) {
        if let Some(region) = world.region_mut(id) {
            region.climate.add_temperature(-VENT_COOLING);
            region.climate.add_humidity(VENT_HUMIDITY);
            region.climate.add_precipitation(ACID_RAIN);
        }
        for neighbor in world.neighbors(id) {
            if !self.ash_regions.contains(&neighbor) && chance(rng, ASH_SPREAD_PROBABILITY) {
                self.ash_regions.insert(neighbor);
            }
        }
        for ash in &self.ash_regions {
            if let Some(region) = world.region_mut(*ash) {
                region.climate.add_temperature(-ASH_COOLING);
                region.climate.add_pollution(ASH_POLLUTION);
            }
        }
        self.eruption_ticks_remaining = self.eruption_ticks_remaining.saturating_sub(1);
        if self.eruption_ticks_remaining == 0 {
            self.erupting = false;
            self.pressure = 0.0;
            self.ash_regions.clear();
            let tick = world.tick();
            world.push_event(WorldEvent::regional(tick, id, WorldEventKind::VolcanoQuiet));
        }
    }
}
