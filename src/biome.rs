use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Surface,
    Underwater,
    Underground,
}

impl Layer {
    /// How strongly the seasonal/diurnal cycle reaches this layer.
    pub fn thermal_buffer(self) -> f64 {
        match self {
            Layer::Surface => 1.0,
            Layer::Underwater => 0.4,
            Layer::Underground => 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Biome {
    Ocean,
    DeepOcean,
    CoralReef,
    KelpForest,
    HydrothermalVent,
    Coastal,
    Wetland,
    Rainforest,
    TemperateForest,
    BorealForest,
    Grassland,
    Savanna,
    Desert,
    Tundra,
    Mountain,
    Polar,
    Cave,
    LavaTube,
}

/// Per-biome climate constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiomeProfile {
    pub base_temperature: f64,
    pub seasonal_amplitude: f64,
    pub humidity: f64,
    pub wind: f64,
    pub thermal_inertia: f64,
    pub pollution_absorption: f64,
    pub volcanic_potential: f64,
}

impl Biome {
    pub const ALL: [Biome; 18] = [
        Biome::Ocean,
        Biome::DeepOcean,
        Biome::CoralReef,
        Biome::KelpForest,
        Biome::HydrothermalVent,
        Biome::Coastal,
        Biome::Wetland,
        Biome::Rainforest,
        Biome::TemperateForest,
        Biome::BorealForest,
        Biome::Grassland,
        Biome::Savanna,
        Biome::Desert,
        Biome::Tundra,
        Biome::Mountain,
        Biome::Polar,
        Biome::Cave,
        Biome::LavaTube,
    ];

    pub fn profile(self) -> BiomeProfile {
        // (base °C, seasonal amplitude, humidity, wind, absorption, volcanic potential)
        let (base, amplitude, humidity, wind, absorption, volcanic) = match self {
            Biome::Ocean => (17.0, 4.0, 0.80, 8.0, 0.004, 0.0),
            Biome::DeepOcean => (4.0, 1.0, 0.90, 2.0, 0.003, 0.0),
            Biome::CoralReef => (26.0, 2.0, 0.85, 5.0, 0.008, 0.0),
            Biome::KelpForest => (14.0, 3.0, 0.85, 5.0, 0.020, 0.0),
            Biome::HydrothermalVent => (30.0, 0.5, 0.95, 1.0, 0.003, 0.8),
            Biome::Coastal => (18.0, 6.0, 0.70, 9.0, 0.005, 0.0),
            Biome::Wetland => (16.0, 8.0, 0.85, 4.0, 0.020, 0.0),
            Biome::Rainforest => (26.0, 2.0, 0.90, 3.0, 0.025, 0.0),
            Biome::TemperateForest => (11.0, 10.0, 0.65, 5.0, 0.012, 0.0),
            Biome::BorealForest => (0.0, 15.0, 0.60, 5.0, 0.010, 0.0),
            Biome::Grassland => (12.0, 12.0, 0.50, 8.0, 0.006, 0.0),
            Biome::Savanna => (24.0, 4.0, 0.45, 7.0, 0.005, 0.0),
            Biome::Desert => (27.0, 10.0, 0.15, 7.0, 0.002, 0.0),
            Biome::Tundra => (-10.0, 15.0, 0.45, 10.0, 0.003, 0.0),
            Biome::Mountain => (2.0, 10.0, 0.50, 14.0, 0.004, 0.6),
            Biome::Polar => (-25.0, 15.0, 0.40, 12.0, 0.002, 0.0),
            Biome::Cave => (12.0, 1.0, 0.90, 0.5, 0.002, 0.2),
            Biome::LavaTube => (35.0, 0.5, 0.40, 0.5, 0.002, 0.9),
        };
        let thermal_inertia = match self {
            Biome::Ocean | Biome::DeepOcean | Biome::CoralReef | Biome::KelpForest => 0.02,
            Biome::Desert => 0.08,
            _ => 0.05,
        };
        BiomeProfile {
            base_temperature: base,
            seasonal_amplitude: amplitude,
            humidity,
            wind,
            thermal_inertia,
            pollution_absorption: absorption,
            volcanic_potential: volcanic,
        }
    }

    /// Biomes washed by tides.
    pub fn is_tidal(self) -> bool {
        matches!(
            self,
            Biome::Ocean | Biome::CoralReef | Biome::KelpForest | Biome::Coastal | Biome::Wetland
        )
    }

    pub fn is_forest(self) -> bool {
        matches!(
            self,
            Biome::Rainforest | Biome::TemperateForest | Biome::BorealForest
        )
    }

    /// Savanna and grassland humidity swings with the wet/dry season.
    pub fn has_wet_season(self) -> bool {
        matches!(self, Biome::Savanna | Biome::Grassland)
    }
}

/// Volcanic potential of a region, combining biome, elevation and layer.
pub fn volcanic_potential(biome: Biome, layer: Layer, elevation_m: f64) -> f64 {
    let mut potential = biome.profile().volcanic_potential;
    if elevation_m > 3_000.0 {
        potential = potential.max(0.4);
    }
    if layer == Layer::Underground {
        potential = potential.max(0.2);
    }
    potential
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inertia_classes() {
        assert_eq!(Biome::Ocean.profile().thermal_inertia, 0.02);
        assert_eq!(Biome::KelpForest.profile().thermal_inertia, 0.02);
        assert_eq!(Biome::Desert.profile().thermal_inertia, 0.08);
        assert_eq!(Biome::Grassland.profile().thermal_inertia, 0.05);
    }

    #[test]
    fn wetlands_absorb_more_than_default() {
        let wet = Biome::Wetland.profile().pollution_absorption;
        let rain = Biome::Rainforest.profile().pollution_absorption;
        let kelp = Biome::KelpForest.profile().pollution_absorption;
        for biome in Biome::ALL {
            let absorption = biome.profile().pollution_absorption;
            assert!(absorption <= rain);
            if !matches!(biome, Biome::Wetland | Biome::Rainforest | Biome::KelpForest) {
                assert!(absorption < wet.min(kelp));
            }
        }
    }

    #[test]
    fn volcanic_potential_sources() {
        assert_eq!(volcanic_potential(Biome::Grassland, Layer::Surface, 200.0), 0.0);
        assert!(volcanic_potential(Biome::Mountain, Layer::Surface, 1_000.0) > 0.0);
        assert!(volcanic_potential(Biome::Grassland, Layer::Surface, 3_500.0) > 0.0);
        assert!(volcanic_potential(Biome::Cave, Layer::Underground, -200.0) > 0.0);
        assert!(volcanic_potential(Biome::HydrothermalVent, Layer::Underwater, -2_000.0) > 0.0);
    }
}
