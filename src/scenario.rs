use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    biome::{Biome, Layer},
    species::{SpeciesId, SpeciesRegistry, SpeciesTraits},
    time::WorldTime,
    world::{
        CharacterId, ClimateState, FoodWebRelation, PlantPopulation, Population, Region, RegionId,
        Resource, ResourceKind, World,
    },
};

fn default_ticks() -> u64 {
    24 * 30
}

fn default_snapshot_interval_ticks() -> u64 {
    24 * 7
}

fn default_start_hour() -> u32 {
    6
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_spread_rate() -> f64 {
    0.01
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("region id {0} is declared more than once")]
    DuplicateRegion(u64),
    #[error("region {region} lists unknown neighbour {neighbor}")]
    UnknownAdjacency { region: u64, neighbor: u64 },
    #[error("region {region} seeds unknown species `{species}`")]
    UnknownSpecies { region: u64, species: String },
    #[error("food web references unknown species `{0}`")]
    UnknownFoodWebSpecies(String),
    #[error("scenario declares no regions")]
    NoRegions,
    #[error("region {region}: {characters} characters for {count} `{species}`")]
    TooManyCharacters {
        region: u64,
        species: String,
        count: u64,
        characters: usize,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    #[serde(default)]
    pub start_day: u32,
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,
    #[serde(default = "default_snapshot_interval_ticks")]
    pub snapshot_interval_ticks: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub species: BTreeMap<String, SpeciesTraits>,
    #[serde(default)]
    pub food_web: Vec<ScenarioFoodWebEdge>,
    pub regions: Vec<ScenarioRegion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioFoodWebEdge {
    pub predator: String,
    pub prey: String,
    pub efficiency: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioRegion {
    pub id: u64,
    pub name: String,
    pub layer: Layer,
    pub biome: Biome,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub elevation: f64,
    #[serde(default)]
    pub adjacent: Vec<u64>,
    pub carrying_capacity: f64,
    #[serde(default)]
    pub species_capacity: BTreeMap<String, f64>,
    #[serde(default)]
    pub climate: Option<ClimateInit>,
    #[serde(default)]
    pub resources: Vec<ResourceInit>,
    #[serde(default)]
    pub populations: Vec<PopulationInit>,
    #[serde(default)]
    pub plants: Vec<PlantInit>,
}

/// Starting weather; anything left out comes from the biome profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClimateInit {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub precipitation: Option<f64>,
    pub wind_speed: Option<f64>,
    pub pollution: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceInit {
    pub kind: ResourceKind,
    pub quantity: f64,
    pub max_quantity: f64,
    pub renewal_rate: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PopulationInit {
    pub species: String,
    pub count: u64,
    #[serde(default)]
    pub characters: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlantInit {
    pub plant: String,
    pub biomass: f64,
    pub max_biomass: f64,
    pub growth_rate: f64,
    #[serde(default = "default_spread_rate")]
    pub spread_rate: f64,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        Scenario::from_yaml(&data).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

impl Scenario {
    pub fn from_yaml(data: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(data)?)
    }

    pub fn registry(&self) -> SpeciesRegistry {
        let mut registry = SpeciesRegistry::new();
        for (id, traits) in &self.species {
            registry.insert(SpeciesId::new(id.as_str()), traits.clone());
        }
        registry
    }

    /// Checks every cross reference before anything is built.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.regions.is_empty() {
            return Err(ScenarioError::NoRegions);
        }
        let mut ids = BTreeSet::new();
        for region in &self.regions {
            if !ids.insert(region.id) {
                return Err(ScenarioError::DuplicateRegion(region.id));
            }
        }
        for region in &self.regions {
            if let Some(neighbor) = region.adjacent.iter().find(|n| !ids.contains(*n)) {
                return Err(ScenarioError::UnknownAdjacency {
                    region: region.id,
                    neighbor: *neighbor,
                });
            }
            let seeded = region
                .populations
                .iter()
                .map(|population| &population.species)
                .chain(region.species_capacity.keys());
            for species in seeded {
                if !self.species.contains_key(species) {
                    return Err(ScenarioError::UnknownSpecies {
                        region: region.id,
                        species: species.clone(),
                    });
                }
            }
            for population in &region.populations {
                if population.characters.len() as u64 > population.count {
                    return Err(ScenarioError::TooManyCharacters {
                        region: region.id,
                        species: population.species.clone(),
                        count: population.count,
                        characters: population.characters.len(),
                    });
                }
            }
        }
        for edge in &self.food_web {
            for species in [&edge.predator, &edge.prey] {
                if !self.species.contains_key(species) {
                    return Err(ScenarioError::UnknownFoodWebSpecies(species.clone()));
                }
            }
        }
        Ok(())
    }

    pub fn build_world(&self) -> Result<World, ScenarioError> {
        self.validate()?;
        let mut world = World::new(
            WorldTime::new(self.start_day, self.start_hour),
            self.registry(),
        );
        for entry in &self.regions {
            let id = RegionId(entry.id);
            let mut region = Region::new(id, entry.name.clone(), entry.layer, entry.biome)
                .with_location(entry.latitude, entry.longitude, entry.elevation);
            if let Some(init) = &entry.climate {
                let base = region.climate;
                region.climate = ClimateState::new(
                    init.temperature.unwrap_or(base.temperature()),
                    init.humidity.unwrap_or(base.humidity()),
                    init.precipitation.unwrap_or(base.precipitation()),
                    init.wind_speed.unwrap_or(base.wind_speed()),
                    init.pollution.unwrap_or(base.pollution()),
                );
            }
            region.resources = entry
                .resources
                .iter()
                .map(|resource| Resource {
                    kind: resource.kind,
                    quantity: resource.quantity.clamp(0.0, resource.max_quantity.max(0.0)),
                    renewal_rate: resource.renewal_rate,
                    max_quantity: resource.max_quantity,
                })
                .collect();
            region.populations = entry
                .populations
                .iter()
                .map(|init| {
                    let mut population = Population::new(SpeciesId::new(init.species.as_str()), init.count);
                    population.characters = init.characters.iter().copied().map(CharacterId).collect();
                    population
                })
                .collect();
            region.plants = entry
                .plants
                .iter()
                .map(|init| PlantPopulation {
                    plant: init.plant.clone(),
                    biomass: init.biomass.clamp(0.0, init.max_biomass.max(0.0)),
                    max_biomass: init.max_biomass,
                    growth_rate: init.growth_rate,
                    spread_rate: init.spread_rate,
                    destroyed: init.biomass <= 0.0,
                    ticks_below_threshold: 0,
                })
                .collect();
            world.insert_region(region);
            world.set_carrying_capacity(id, entry.carrying_capacity);
            for (species, capacity) in &entry.species_capacity {
                world.set_species_capacity(id, SpeciesId::new(species.as_str()), *capacity);
            }
        }
        for entry in &self.regions {
            for neighbor in &entry.adjacent {
                world.connect(RegionId(entry.id), RegionId(*neighbor));
            }
        }
        for edge in &self.food_web {
            world.add_food_web_relation(FoodWebRelation {
                predator: SpeciesId::new(edge.predator.as_str()),
                prey: SpeciesId::new(edge.prey.as_str()),
                efficiency: edge.efficiency.clamp(0.0, 1.0),
            });
        }
        tracing::debug!(
            scenario = %self.name,
            regions = self.regions.len(),
            species = self.species.len(),
            "world built"
        );
        Ok(world)
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.unwrap_or(self.ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
name: two-ponds
seed: 3
species:
  frog:
    diet: herbivore
    body_size: 0.1
    habitat: surface
    reproduction_rate: 0.01
    maturity_days: 300
    gestation_days: 10
regions:
  - id: 1
    name: Upper Pond
    layer: surface
    biome: wetland
    carrying_capacity: 500
    adjacent: [2]
    populations:
      - { species: frog, count: 40, characters: [900] }
  - id: 2
    name: Lower Pond
    layer: surface
    biome: wetland
    carrying_capacity: 300
    climate: { pollution: 0.2 }
"#;

    #[test]
    fn builds_symmetric_world() {
        let scenario = Scenario::from_yaml(YAML).expect("scenario parses");
        assert_eq!(scenario.ticks(None), default_ticks());
        let world = scenario.build_world().expect("world builds");
        assert_eq!(world.neighbors(RegionId(2)), vec![RegionId(1)]);
        let upper = world.region(RegionId(1)).unwrap();
        assert_eq!(upper.populations[0].characters, vec![CharacterId(900)]);
        assert_eq!(world.region(RegionId(2)).unwrap().climate.pollution(), 0.2);
        assert_eq!(world.carrying_capacity(RegionId(2)), 300.0);
    }

    #[test]
    fn rejects_unknown_references() {
        let mut scenario = Scenario::from_yaml(YAML).unwrap();
        scenario.regions[1].adjacent.push(9);
        assert!(matches!(
            scenario.build_world(),
            Err(ScenarioError::UnknownAdjacency { region: 2, neighbor: 9 })
        ));

        let mut scenario = Scenario::from_yaml(YAML).unwrap();
        scenario.regions[0].populations[0].species = "toad".into();
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::UnknownSpecies { region: 1, .. })
        ));

        let mut scenario = Scenario::from_yaml(YAML).unwrap();
        scenario.regions[1].id = 1;
        assert!(matches!(scenario.validate(), Err(ScenarioError::DuplicateRegion(1))));

        let mut scenario = Scenario::from_yaml(YAML).unwrap();
        scenario.regions[0].populations[0].count = 0;
        scenario.regions[0].populations[0].characters = vec![900];
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::TooManyCharacters { region: 1, count: 0, characters: 1, .. })
        ));
    }
}
