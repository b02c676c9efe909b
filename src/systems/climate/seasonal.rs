//! Closed-form climate targets: temperature, humidity and precipitation as functions of
//! place and calendar.

use crate::biome::Layer;
use crate::time::{WorldTime, HOURS_PER_DAY};
use crate::world::Region;

pub const LAPSE_RATE_PER_KM: f64 = 6.5;
pub const DIURNAL_PEAK_HOUR: f64 = 14.0;
pub const GREENHOUSE_MAX_WARMING: f64 = 5.0;
pub const HUMIDITY_THRESHOLD_FOR_RAIN: f64 = 0.6;
const PRECIPITATION_SCALE: f64 = 50.0;
const WET_SEASON_SWING: f64 = 0.15;

/// 1.0 at the equator rising to 2.0 at the poles.
pub fn latitude_amplification(latitude: f64) -> f64 {
    1.0 + latitude.abs().min(90.0) / 90.0
}

fn hemisphere_sign(latitude: f64) -> f64 {
    if latitude < 0.0 {
        -1.0
    } else {
        1.0
    }
}

pub fn seasonal_term(region: &Region, time: &WorldTime) -> f64 {
    let profile = region.biome.profile();
    profile.seasonal_amplitude
        * latitude_amplification(region.latitude)
        * time.solstice_angle().cos()
        * hemisphere_sign(region.latitude)
        * region.layer.thermal_buffer()
}

/// Day/night swing peaking at 14:00, damped by the same layer buffer as the seasons.
pub fn diurnal_term(latitude: f64, layer: Layer, hour: u32) -> f64 {
    let amplitude = 3.0 + 0.05 * latitude.abs();
    let angle = 2.0 * std::f64::consts::PI * (hour as f64 - DIURNAL_PEAK_HOUR)
        / HOURS_PER_DAY as f64;
    amplitude * angle.cos() * layer.thermal_buffer()
}

/// Cooling with altitude; below sea level contributes nothing.
pub fn altitude_lapse(elevation_m: f64) -> f64 {
    -LAPSE_RATE_PER_KM * elevation_m.max(0.0) / 1_000.0
}

pub fn target_temperature(region: &Region, time: &WorldTime) -> f64 {
    region.biome.profile().base_temperature
        + seasonal_term(region, time)
        + diurnal_term(region.latitude, region.layer, time.hour)
        + altitude_lapse(region.elevation)
}

pub fn greenhouse_warming(pollution: f64) -> f64 {
    GREENHOUSE_MAX_WARMING * pollution.clamp(0.0, 1.0)
}

/// Biome humidity baseline, with a wet/dry season for savanna and grassland.
pub fn humidity_baseline(region: &Region, time: &WorldTime) -> f64 {
    let mut baseline = region.biome.profile().humidity;
    if region.biome.has_wet_season() {
        baseline += WET_SEASON_SWING * time.solstice_angle().cos() * hemisphere_sign(region.latitude);
    }
    baseline.clamp(0.0, 1.0)
}

/// Relative moisture the air can hold; warmer air holds more.
pub fn moisture_capacity(temperature: f64) -> f64 {
    (0.07 * temperature).exp().clamp(0.1, 12.0)
}

/// Rain from saturated air, or the given trickle when the air is too dry.
pub fn precipitation(humidity: f64, temperature: f64, trickle: f64) -> f64 {
    if humidity > HUMIDITY_THRESHOLD_FOR_RAIN {
        (humidity - HUMIDITY_THRESHOLD_FOR_RAIN) * PRECIPITATION_SCALE * moisture_capacity(temperature)
    } else {
        trickle.max(0.0)
    }
}
