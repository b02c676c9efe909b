//! Moon-driven effects: tides on coastal and underwater regions, and eclipses.

use rand::Rng;

use crate::biome::Layer;
use crate::events::{EclipseKind, WorldEvent, WorldEventKind};
use crate::rng::chance;
use crate::time::WorldTime;
use crate::world::World;

pub const TIDAL_RENEWAL_SWING: f64 = 0.15;
pub const SOLAR_ECLIPSE_PROBABILITY: f64 = 1.0 / 10_000.0;
pub const LUNAR_ECLIPSE_PROBABILITY: f64 = 1.0 / 1_000.0;
const SOLAR_COOLING: f64 = 5.0;
const SOLAR_WIND: f64 = 2.0;
const LUNAR_WARMING: f64 = 0.5;
const TIDAL_WIND: f64 = 0.5;
const TIDAL_HUMIDITY: f64 = 0.005;

/// Resource renewal multiplier in `[0.85, 1.15]`, highest at spring tides.
pub fn tidal_renewal_factor(tidal_force: f64) -> f64 {
    1.0 + TIDAL_RENEWAL_SWING * (2.0 * tidal_force.clamp(0.0, 1.0) - 1.0)
}

pub fn apply_tides(world: &mut World, time: &WorldTime) {
    let force = time.tidal_force();
    for region in world.regions.values_mut() {
        let tidal = region.layer == Layer::Underwater || region.biome.is_tidal();
        if !tidal {
            region.tidal_factor = 1.0;
            continue;
        }
        region.tidal_factor = tidal_renewal_factor(force);
        if region.layer == Layer::Surface {
            region.climate.add_wind_speed(TIDAL_WIND * force);
            region.climate.add_humidity(TIDAL_HUMIDITY * force);
        }
    }
}

/// Rolls for an eclipse this tick. Solar eclipses need a new moon, lunar ones a full moon.
pub fn roll_eclipse<R: Rng>(time: &WorldTime, rng: &mut R) -> Option<EclipseKind> {
    if time.is_new_moon() && chance(rng, SOLAR_ECLIPSE_PROBABILITY) {
        return Some(EclipseKind::Solar);
    }
    if time.is_full_moon() && chance(rng, LUNAR_ECLIPSE_PROBABILITY) {
        return Some(EclipseKind::Lunar);
    }
    None
}

/// One-off perturbation of every surface region, plus the global event.
pub fn apply_eclipse(world: &mut World, eclipse: EclipseKind) {
    for region in world.regions.values_mut() {
        if region.layer != Layer::Surface {
            continue;
        }
        match eclipse {
            EclipseKind::Solar => {
                region.climate.add_temperature(-SOLAR_COOLING);
                region.climate.add_wind_speed(SOLAR_WIND);
            }
            EclipseKind::Lunar => region.climate.add_temperature(LUNAR_WARMING),
        }
    }
    tracing::info!(?eclipse, tick = world.tick(), "eclipse");
    let tick = world.tick();
    world.push_event(WorldEvent::global(tick, WorldEventKind::Eclipse { eclipse }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::Biome;
    use crate::rng::RngManager;
    use crate::species::SpeciesRegistry;
    use crate::world::{Region, RegionId};

    #[test]
    fn tidal_factor_bounds() {
        assert!((tidal_renewal_factor(1.0) - 1.15).abs() < 1e-12);
        assert!((tidal_renewal_factor(0.0) - 0.85).abs() < 1e-12);
    }

    #[test]
    fn inland_regions_ignore_tides() {
        let mut world = World::new(WorldTime::default(), SpeciesRegistry::new());
        world.insert_region(Region::new(RegionId(1), "Shore", Layer::Surface, Biome::Coastal));
        world.insert_region(Region::new(RegionId(2), "Dunes", Layer::Surface, Biome::Desert));
        let new_moon = WorldTime::new(0, 0);
        apply_tides(&mut world, &new_moon);
        assert!(world.region(RegionId(1)).unwrap().tidal_factor > 1.1);
        assert_eq!(world.region(RegionId(2)).unwrap().tidal_factor, 1.0);
    }

    #[test]
    fn no_eclipse_away_from_syzygy() {
        let mut manager = RngManager::new(4);
        let mut rng = manager.stream("celestial");
        let mut quarter = WorldTime::new(7, 0);
        quarter.advance();
        assert!(!quarter.is_new_moon() && !quarter.is_full_moon());
        assert!((0..10_000).all(|_| roll_eclipse(&quarter, &mut rng).is_none()));
    }

    #[test]
    fn solar_eclipse_cools_surface_only() {
        let mut world = World::new(WorldTime::default(), SpeciesRegistry::new());
        world.insert_region(Region::new(RegionId(1), "Plain", Layer::Surface, Biome::Grassland));
        world.insert_region(Region::new(RegionId(2), "Grotto", Layer::Underground, Biome::Cave));
        let plain = world.region(RegionId(1)).unwrap().climate.temperature();
        let grotto = world.region(RegionId(2)).unwrap().climate.temperature();
        apply_eclipse(&mut world, EclipseKind::Solar);
        assert_eq!(world.region(RegionId(1)).unwrap().climate.temperature(), plain - 5.0);
        assert_eq!(world.region(RegionId(2)).unwrap().climate.temperature(), grotto);
        assert_eq!(world.pending_events().len(), 1);
        assert_eq!(world.pending_events()[0].region, None);
    }
}
