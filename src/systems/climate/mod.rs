//! Climate engine: per-region weather, fronts, droughts, volcanoes, tides and disasters.

mod celestial;
mod diffusion;
mod disasters;
mod drought;
mod fronts;
mod seasonal;
mod volcanic;

use std::collections::BTreeMap;

use anyhow::Result;
use rand::Rng;

use crate::{
    biome::{volcanic_potential, Layer},
    engine::{System, SystemContext},
    events::{WorldEvent, WorldEventKind},
    rng::{chance, gaussian, SystemRng},
    weighted::weighted_choice,
    world::{RegionId, World},
};

pub use celestial::{apply_eclipse, apply_tides, roll_eclipse, tidal_renewal_factor};
pub use diffusion::{diffuse_pollution, pollution_transfers, PollutionTransfer, DIFFUSION_RATE};
pub use disasters::{check_disasters, disaster_probability, disaster_weights};
pub use drought::{is_dry, severity_for, DroughtState, DroughtTransition, ONSET_TICKS};
pub use fronts::{
    aggregate_effect, front_weights, fronts_affecting, FrontEffect, FrontKind, WeatherFront,
    MAX_FRONTS_PER_REGION, MIN_INTENSITY, SPAWN_PROBABILITY,
};
pub use seasonal::{
    diurnal_term, greenhouse_warming, humidity_baseline, latitude_amplification, precipitation,
    seasonal_term, target_temperature,
};
pub use volcanic::{eruption_probability, VolcanicState};

const TEMPERATURE_NOISE_SIGMA: f64 = 0.3;
const FRONT_TEMPERATURE_NUDGE: f64 = 0.1;
const HUMIDITY_RELAXATION: f64 = 0.03;
const WIND_RELAXATION: f64 = 0.1;
const MAX_TRICKLE: f64 = 2.0;
const POLLUTION_HUMIDITY_SUPPRESSION: f64 = 0.05;
const POLLUTION_PRECIPITATION_SUPPRESSION: f64 = 0.3;
const DROUGHT_DRYING: f64 = 0.002;
const DROUGHT_HEATING: f64 = 0.05;

/// Owns every piece of climate state that lives outside the regions themselves.
/// None of it is persisted; a restored world starts with clear skies.
#[derive(Debug, Default)]
pub struct ClimateSystem {
    fronts: Vec<WeatherFront>,
    next_front_id: u64,
    droughts: BTreeMap<RegionId, DroughtState>,
    volcanoes: BTreeMap<RegionId, VolcanicState>,
}

impl ClimateSystem {
    pub fn new() -> Self {
        Self {
            next_front_id: 1,
            ..Self::default()
        }
    }

    /// Forgets all fronts, droughts and volcanic pressure, as on a world reset.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn fronts(&self) -> &[WeatherFront] {
        &self.fronts
    }

    pub fn add_front(&mut self, front: WeatherFront) {
        self.next_front_id = self.next_front_id.max(front.id + 1);
        self.fronts.push(front);
    }

    pub fn drought(&self, region: RegionId) -> Option<&DroughtState> {
        self.droughts.get(&region)
    }

    pub fn volcano(&self, region: RegionId) -> Option<&VolcanicState> {
        self.volcanoes.get(&region)
    }

    fn advance_fronts(&mut self, world: &World, rng: &mut SystemRng<'_>) {
        let adjacency = front_adjacency(world);
        for front in &mut self.fronts {
            front.decay();
        }
        self.fronts.retain(|front| !front.is_expired());
        for front in &mut self.fronts {
            front.spread(&adjacency, rng);
        }
    }

    fn spawn_fronts(&mut self, world: &mut World, rng: &mut SystemRng<'_>) {
        let tick = world.tick();
        let mut formed = Vec::new();
        for region in world.regions() {
            if region.layer == Layer::Underground {
                continue;
            }
            if fronts_affecting(&self.fronts, region.id) >= MAX_FRONTS_PER_REGION {
                continue;
            }
            if !chance(rng, SPAWN_PROBABILITY) {
                continue;
            }
            let weights = front_weights(region.climate.temperature(), region.climate.humidity());
            let Some(kind) = weighted_choice(&weights, rng) else {
                continue;
            };
            let front = WeatherFront::spawn(self.next_front_id, kind, region.id, rng);
            self.next_front_id += 1;
            tracing::info!(
                region = %region.id,
                front = kind.label(),
                intensity = front.intensity,
                ticks = front.remaining_ticks,
                "weather front formed"
            );
            formed.push(WorldEvent::regional(
                tick,
                region.id,
                WorldEventKind::WeatherFrontFormed {
                    front_id: front.id,
                    front: kind.label().to_string(),
                    intensity: front.intensity,
                },
            ));
            self.fronts.push(front);
        }
        for event in formed {
            world.push_event(event);
        }
    }

    fn update_region(
        &mut self,
        id: RegionId,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) {
        let effect = aggregate_effect(&self.fronts, id);
        let tick = world.tick();
        let Some(region) = world.region_mut(id) else {
            return;
        };
        let profile = region.biome.profile();
        let pollution = region.climate.pollution();

        let target = target_temperature(region, &ctx.time) + greenhouse_warming(pollution);
        let temperature = region.climate.temperature();
        region.climate.set_temperature(
            temperature
                + (target - temperature) * profile.thermal_inertia
                + gaussian(rng, TEMPERATURE_NOISE_SIGMA)
                + effect.temperature * FRONT_TEMPERATURE_NUDGE,
        );

        let baseline = humidity_baseline(region, &ctx.time);
        let humidity_target = ((baseline + effect.humidity)
            * (1.0 - POLLUTION_HUMIDITY_SUPPRESSION * pollution))
            .clamp(0.0, 1.0);
        let humidity = region.climate.humidity();
        region
            .climate
            .set_humidity(humidity + (humidity_target - humidity) * HUMIDITY_RELAXATION);

        let trickle = rng.gen::<f64>() * MAX_TRICKLE;
        let rain = precipitation(region.climate.humidity(), region.climate.temperature(), trickle)
            * effect.precipitation_multiplier
            * (1.0 - POLLUTION_PRECIPITATION_SUPPRESSION * pollution);
        region.climate.set_precipitation(rain);

        let wind_target = (profile.wind + effect.wind).max(0.0);
        let wind = region.climate.wind_speed();
        region
            .climate
            .set_wind_speed(wind + (wind_target - wind) * WIND_RELAXATION);

        let dry = is_dry(region.climate.precipitation(), region.climate.humidity(), baseline);
        if !dry && !self.droughts.contains_key(&id) {
            return;
        }
        let drought = self.droughts.entry(id).or_default();
        let transition = drought.update(dry);
        if drought.active {
            region.climate.add_humidity(-DROUGHT_DRYING * drought.severity);
            region.climate.add_temperature(DROUGHT_HEATING * drought.severity);
        }
        let kind = match transition {
            DroughtTransition::Began => {
                tracing::info!(region = %id, name = %region.name, "drought began");
                Some(WorldEventKind::DroughtBegan)
            }
            DroughtTransition::Ended => {
                tracing::info!(region = %id, name = %region.name, "drought ended");
                Some(WorldEventKind::DroughtEnded)
            }
            DroughtTransition::None => None,
        };
        if drought.is_idle() {
            self.droughts.remove(&id);
        }
        if let Some(kind) = kind {
            world.push_event(WorldEvent::regional(tick, id, kind));
        }
    }

    fn update_volcanoes(&mut self, world: &mut World, rng: &mut SystemRng<'_>) {
        for id in world.region_ids() {
            let Some(region) = world.region(id) else {
                continue;
            };
            let potential = volcanic_potential(region.biome, region.layer, region.elevation);
            if potential <= 0.0 {
                continue;
            }
            self.volcanoes
                .entry(id)
                .or_default()
                .step(id, potential, world, rng);
        }
    }
}

/// Neighbour lists fronts may travel along; weather does not reach underground regions.
fn front_adjacency(world: &World) -> BTreeMap<RegionId, Vec<RegionId>> {
    let open = |id: &RegionId| {
        world
            .region(*id)
            .map_or(false, |region| region.layer != Layer::Underground)
    };
    world
        .regions()
        .filter(|region| region.layer != Layer::Underground)
        .map(|region| {
            let neighbors = world.neighbors(region.id).into_iter().filter(open).collect();
            (region.id, neighbors)
        })
        .collect()
}

impl System for ClimateSystem {
    fn name(&self) -> &str {
        "climate"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        self.advance_fronts(world, rng);
        self.spawn_fronts(world, rng);
        diffuse_pollution(world);
        apply_tides(world, &ctx.time);
        if let Some(eclipse) = roll_eclipse(&ctx.time, rng) {
            apply_eclipse(world, eclipse);
        }
        for id in world.region_ids() {
            self.update_region(id, ctx, world, rng);
        }
        self.update_volcanoes(world, rng);
        check_disasters(world, rng);
        Ok(())
    }
}
