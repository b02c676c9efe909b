use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use serde::Serialize;

use crate::rng::chance;
use crate::world::RegionId;

pub const INTENSITY_DECAY: f64 = 0.97;
pub const MIN_INTENSITY: f64 = 0.05;
pub const SPAWN_PROBABILITY: f64 = 0.01;
pub const MAX_FRONTS_PER_REGION: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrontKind {
    WarmFront,
    ColdFront,
    OccludedFront,
    HighPressure,
    LowPressure,
    TropicalStorm,
    Monsoon,
    Blizzard,
    Heatwave,
}

/// Modifiers a front applies at full intensity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrontModifiers {
    pub temperature: f64,
    pub humidity: f64,
    pub wind: f64,
    pub precipitation_multiplier: f64,
}

struct FrontProfile {
    modifiers: FrontModifiers,
    min_ticks: i32,
    max_ticks: i32,
    spread_probability: f64,
}

impl FrontKind {
    pub fn label(self) -> &'static str {
        match self {
            FrontKind::WarmFront => "warm_front",
            FrontKind::ColdFront => "cold_front",
            FrontKind::OccludedFront => "occluded_front",
            FrontKind::HighPressure => "high_pressure",
            FrontKind::LowPressure => "low_pressure",
            FrontKind::TropicalStorm => "tropical_storm",
            FrontKind::Monsoon => "monsoon",
            FrontKind::Blizzard => "blizzard",
            FrontKind::Heatwave => "heatwave",
        }
    }

    fn profile(self) -> FrontProfile {
        // (°C, humidity, wind, precipitation ×, min ticks, max ticks, spread)
        let (temperature, humidity, wind, precipitation_multiplier, min_ticks, max_ticks, spread) =
            match self {
                FrontKind::WarmFront => (3.0, 0.10, 2.0, 1.3, 24, 72, 0.15),
                FrontKind::ColdFront => (-5.0, -0.05, 5.0, 1.5, 24, 72, 0.20),
                FrontKind::OccludedFront => (-1.0, 0.10, 3.0, 1.4, 12, 48, 0.10),
                FrontKind::HighPressure => (1.0, -0.15, -2.0, 0.3, 48, 120, 0.10),
                FrontKind::LowPressure => (-1.0, 0.15, 4.0, 1.6, 24, 96, 0.15),
                FrontKind::TropicalStorm => (-2.0, 0.25, 25.0, 3.0, 24, 96, 0.25),
                FrontKind::Monsoon => (-1.0, 0.30, 6.0, 2.5, 96, 240, 0.12),
                FrontKind::Blizzard => (-10.0, 0.10, 20.0, 1.8, 12, 48, 0.20),
                FrontKind::Heatwave => (8.0, -0.20, -1.0, 0.2, 48, 168, 0.10),
            };
        FrontProfile {
            modifiers: FrontModifiers {
                temperature,
                humidity,
                wind,
                precipitation_multiplier,
            },
            min_ticks,
            max_ticks,
            spread_probability: spread,
        }
    }
}

/// Spawn weights for each front type given the origin's current weather.
pub fn front_weights(temperature: f64, humidity: f64) -> Vec<(FrontKind, f64)> {
    vec![
        (FrontKind::WarmFront, 1.0),
        (FrontKind::ColdFront, 1.0),
        (FrontKind::OccludedFront, 0.5),
        (FrontKind::HighPressure, 1.0),
        (FrontKind::LowPressure, if humidity > 0.5 { 1.2 } else { 0.8 }),
        (
            FrontKind::TropicalStorm,
            if temperature > 25.0 && humidity > 0.6 { 0.5 } else { 0.0 },
        ),
        (
            FrontKind::Monsoon,
            if temperature > 20.0 && humidity > 0.7 { 0.4 } else { 0.0 },
        ),
        (FrontKind::Blizzard, if temperature < 0.0 { 0.6 } else { 0.0 }),
        (FrontKind::Heatwave, if temperature > 30.0 { 0.5 } else { 0.0 }),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherFront {
    pub id: u64,
    pub kind: FrontKind,
    pub intensity: f64,
    pub remaining_ticks: i32,
    pub origin: RegionId,
    pub affected_regions: BTreeSet<RegionId>,
    pub spread_probability: f64,
    pub modifiers: FrontModifiers,
}

impl WeatherFront {
    pub fn new(id: u64, kind: FrontKind, origin: RegionId, intensity: f64, remaining_ticks: i32) -> Self {
        let profile = kind.profile();
        Self {
            id,
            kind,
            intensity: intensity.clamp(0.0, 1.0),
            remaining_ticks,
            origin,
            affected_regions: [origin].into_iter().collect(),
            spread_probability: profile.spread_probability,
            modifiers: profile.modifiers,
        }
    }

    pub fn spawn<R: Rng>(id: u64, kind: FrontKind, origin: RegionId, rng: &mut R) -> Self {
        let profile = kind.profile();
        let intensity = rng.gen_range(0.5..=1.0);
        let ticks = rng.gen_range(profile.min_ticks..=profile.max_ticks);
        Self::new(id, kind, origin, intensity, ticks)
    }

    pub fn affects(&self, region: RegionId) -> bool {
        self.affected_regions.contains(&region)
    }

    /// One tick of ageing: intensity decays and the countdown drops.
    pub fn decay(&mut self) {
        self.intensity *= INTENSITY_DECAY;
        self.remaining_ticks -= 1;
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_ticks <= 0 || self.intensity < MIN_INTENSITY
    }

    /// Tries to extend into every region adjacent to the current footprint. The footprint is
    /// read before any insertion so a region reached this tick does not spread further.
    pub fn spread<R: Rng>(&mut self, adjacency: &BTreeMap<RegionId, Vec<RegionId>>, rng: &mut R) {
        let mut frontier = BTreeSet::new();
        for region in &self.affected_regions {
            if let Some(neighbors) = adjacency.get(region) {
                for neighbor in neighbors {
                    if !self.affected_regions.contains(neighbor) {
                        frontier.insert(*neighbor);
                    }
                }
            }
        }
        for candidate in frontier {
            if chance(rng, self.spread_probability) {
                self.affected_regions.insert(candidate);
            }
        }
    }
}

/// Combined influence of all fronts over one region, each scaled by its intensity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontEffect {
    pub temperature: f64,
    pub humidity: f64,
    pub wind: f64,
    pub precipitation_multiplier: f64,
}

impl Default for FrontEffect {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            humidity: 0.0,
            wind: 0.0,
            precipitation_multiplier: 1.0,
        }
    }
}

pub fn aggregate_effect(fronts: &[WeatherFront], region: RegionId) -> FrontEffect {
    fronts
        .iter()
        .filter(|front| front.affects(region))
        .fold(FrontEffect::default(), |mut effect, front| {
            let scale = front.intensity;
            effect.temperature += front.modifiers.temperature * scale;
            effect.humidity += front.modifiers.humidity * scale;
            effect.wind += front.modifiers.wind * scale;
            effect.precipitation_multiplier *=
                1.0 + (front.modifiers.precipitation_multiplier - 1.0) * scale;
            effect
        })
}

pub fn fronts_affecting(fronts: &[WeatherFront], region: RegionId) -> usize {
    fronts.iter().filter(|front| front.affects(region)).count()
}
