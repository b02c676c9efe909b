use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::biome::{Biome, Layer};
use crate::events::WorldEvent;
use crate::species::{SpeciesId, SpeciesRegistry};
use crate::time::WorldTime;

/// Floor applied wherever a capacity or maximum ends up in a denominator.
pub const MIN_CAPACITY: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u64);

impl RegionId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region#{}", self.0)
    }
}

/// A player-controlled character embodying one member of a population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(pub u64);

/// Per-region climate. Writes go through the setters, which clamp to the valid ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateState {
    temperature: f64,
    humidity: f64,
    precipitation: f64,
    wind_speed: f64,
    pollution: f64,
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    debug_assert!(value.is_finite(), "non-finite climate write: {value}");
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

impl ClimateState {
    pub fn new(
        temperature: f64,
        humidity: f64,
        precipitation: f64,
        wind_speed: f64,
        pollution: f64,
    ) -> Self {
        let mut climate = Self {
            temperature: 0.0,
            humidity: 0.0,
            precipitation: 0.0,
            wind_speed: 0.0,
            pollution: 0.0,
        };
        climate.set_temperature(temperature);
        climate.set_humidity(humidity);
        climate.set_precipitation(precipitation);
        climate.set_wind_speed(wind_speed);
        climate.set_pollution(pollution);
        climate
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn precipitation(&self) -> f64 {
        self.precipitation
    }

    pub fn wind_speed(&self) -> f64 {
        self.wind_speed
    }

    pub fn pollution(&self) -> f64 {
        self.pollution
    }

    pub fn set_temperature(&mut self, value: f64) {
        self.temperature = finite_or(value, self.temperature);
    }

    pub fn set_humidity(&mut self, value: f64) {
        self.humidity = finite_or(value, self.humidity).clamp(0.0, 1.0);
    }

    pub fn set_precipitation(&mut self, value: f64) {
        self.precipitation = finite_or(value, self.precipitation).max(0.0);
    }

    pub fn set_wind_speed(&mut self, value: f64) {
        self.wind_speed = finite_or(value, self.wind_speed).max(0.0);
    }

    pub fn set_pollution(&mut self, value: f64) {
        self.pollution = finite_or(value, self.pollution).clamp(0.0, 1.0);
    }

    pub fn add_temperature(&mut self, delta: f64) {
        self.set_temperature(self.temperature + delta);
    }

    pub fn add_humidity(&mut self, delta: f64) {
        self.set_humidity(self.humidity + delta);
    }

    pub fn add_precipitation(&mut self, delta: f64) {
        self.set_precipitation(self.precipitation + delta);
    }

    pub fn add_wind_speed(&mut self, delta: f64) {
        self.set_wind_speed(self.wind_speed + delta);
    }

    pub fn add_pollution(&mut self, delta: f64) {
        self.set_pollution(self.pollution + delta);
    }

    pub fn is_within_bounds(&self) -> bool {
        self.temperature.is_finite()
            && (0.0..=1.0).contains(&self.humidity)
            && (0.0..=1.0).contains(&self.pollution)
            && self.precipitation >= 0.0
            && self.wind_speed >= 0.0
    }
}

impl Default for ClimateState {
    fn default() -> Self {
        Self::new(15.0, 0.5, 0.0, 5.0, 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Vegetation,
    Fungi,
    Plankton,
    Minerals,
    Water,
}

impl ResourceKind {
    pub fn is_edible(self) -> bool {
        matches!(
            self,
            ResourceKind::Vegetation | ResourceKind::Fungi | ResourceKind::Plankton
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub kind: ResourceKind,
    pub quantity: f64,
    pub renewal_rate: f64,
    pub max_quantity: f64,
}

impl Resource {
    /// Takes up to `amount`, never driving the stock below zero. Returns what was taken.
    pub fn consume(&mut self, amount: f64) -> f64 {
        let taken = amount.max(0.0).min(self.quantity);
        self.quantity = (self.quantity - taken).max(0.0);
        taken
    }

    pub fn fill_fraction(&self) -> f64 {
        self.quantity / self.max_quantity.max(MIN_CAPACITY)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    pub species: SpeciesId,
    pub count: u64,
    #[serde(default)]
    pub characters: Vec<CharacterId>,
    /// Fractional births/deaths carried between ticks so slow growth is not rounded away.
    #[serde(skip)]
    pub remainder: f64,
}

impl Population {
    pub fn new(species: SpeciesId, count: u64) -> Self {
        Self {
            species,
            count,
            characters: Vec::new(),
            remainder: 0.0,
        }
    }

    /// Applies a real-valued change, carrying the fractional part. Never goes below zero.
    pub fn apply_delta(&mut self, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        let total = self.remainder + delta;
        let whole = total.trunc();
        self.remainder = total - whole;
        let next = self.count as f64 + whole;
        if next <= 0.0 {
            self.count = 0;
            self.remainder = 0.0;
        } else {
            self.count = next as u64;
        }
    }

    /// Removes up to `amount` individuals outright. Returns how many were removed.
    pub fn remove(&mut self, amount: u64) -> u64 {
        let removed = amount.min(self.count);
        self.count -= removed;
        removed
    }

    /// Characters no longer backed by a living individual, most recently added first out.
    /// Afterwards `characters.len() <= count`.
    pub fn release_surplus_characters(&mut self) -> Vec<CharacterId> {
        let keep = usize::try_from(self.count).unwrap_or(usize::MAX);
        if self.characters.len() <= keep {
            return Vec::new();
        }
        self.characters.split_off(keep)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantPopulation {
    pub plant: String,
    pub biomass: f64,
    pub max_biomass: f64,
    pub growth_rate: f64,
    pub spread_rate: f64,
    #[serde(default)]
    pub destroyed: bool,
    #[serde(default)]
    pub ticks_below_threshold: u32,
}

impl PlantPopulation {
    pub fn fill_fraction(&self) -> f64 {
        (self.biomass / self.max_biomass.max(MIN_CAPACITY)).clamp(0.0, 1.0)
    }

    /// Removes a fraction of the standing biomass; a stand with nothing left is destroyed.
    pub fn destroy_fraction(&mut self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        self.biomass = (self.biomass * (1.0 - fraction)).max(0.0);
        if self.biomass < 1e-6 {
            self.biomass = 0.0;
            self.destroyed = true;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodWebRelation {
    pub predator: SpeciesId,
    pub prey: SpeciesId,
    pub efficiency: f64,
}

fn unit_factor() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub layer: Layer,
    pub biome: Biome,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub climate: ClimateState,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub populations: Vec<Population>,
    #[serde(default)]
    pub plants: Vec<PlantPopulation>,
    #[serde(default)]
    pub adjacent: BTreeSet<RegionId>,
    /// Renewal multiplier from the tides, refreshed by the climate pass.
    #[serde(skip, default = "unit_factor")]
    pub tidal_factor: f64,
}

impl Region {
    pub fn new(id: RegionId, name: impl Into<String>, layer: Layer, biome: Biome) -> Self {
        let profile = biome.profile();
        Self {
            id,
            name: name.into(),
            layer,
            biome,
            latitude: 0.0,
            longitude: 0.0,
            elevation: 0.0,
            climate: ClimateState::new(
                profile.base_temperature,
                profile.humidity,
                0.0,
                profile.wind,
                0.0,
            ),
            resources: Vec::new(),
            populations: Vec::new(),
            plants: Vec::new(),
            adjacent: BTreeSet::new(),
            tidal_factor: 1.0,
        }
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64, elevation: f64) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self.elevation = elevation;
        self
    }

    pub fn total_population(&self) -> u64 {
        self.populations.iter().map(|p| p.count).sum()
    }

    pub fn population(&self, species: &SpeciesId) -> Option<&Population> {
        self.populations.iter().find(|p| &p.species == species)
    }

    pub fn population_mut(&mut self, species: &SpeciesId) -> Option<&mut Population> {
        self.populations.iter_mut().find(|p| &p.species == species)
    }

    /// Returns the population for `species`, creating an empty one if needed.
    pub fn population_entry(&mut self, species: &SpeciesId) -> &mut Population {
        let index = match self.populations.iter().position(|p| &p.species == species) {
            Some(index) => index,
            None => {
                self.populations.push(Population::new(species.clone(), 0));
                self.populations.len() - 1
            }
        };
        &mut self.populations[index]
    }

    pub fn plant(&self, plant: &str) -> Option<&PlantPopulation> {
        self.plants.iter().find(|p| p.plant == plant)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatastropheKind {
    DiseaseOutbreak,
    Plague,
    Flood,
    Landslide,
    ForestFire,
    Famine,
    Blight,
}

impl CatastropheKind {
    pub fn label(self) -> &'static str {
        match self {
            CatastropheKind::DiseaseOutbreak => "disease_outbreak",
            CatastropheKind::Plague => "plague",
            CatastropheKind::Flood => "flood",
            CatastropheKind::Landslide => "landslide",
            CatastropheKind::ForestFire => "forest_fire",
            CatastropheKind::Famine => "famine",
            CatastropheKind::Blight => "blight",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    PopulationKill,
    PlantDestroy,
    ClimateDisruption,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CatastropheEffect {
    pub kind: EffectKind,
    pub magnitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catastrophe {
    pub id: u64,
    pub kind: CatastropheKind,
    pub severity: f64,
    /// Region the catastrophe broke out in; always one of `affected_regions`.
    pub origin: RegionId,
    pub affected_regions: BTreeSet<RegionId>,
    pub tick_started: u64,
    pub duration_ticks: u32,
    pub ticks_remaining: u32,
    pub cause: String,
    pub effects: Vec<CatastropheEffect>,
    pub evolution_pressure: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityEntry {
    pub region: RegionId,
    pub capacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesCapacityEntry {
    pub region: RegionId,
    pub species: SpeciesId,
    pub capacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub scenario: String,
    pub time: WorldTime,
    pub total_population: u64,
    pub regions: Vec<Region>,
    pub food_web: Vec<FoodWebRelation>,
    pub carrying_capacity: Vec<CapacityEntry>,
    pub species_capacity: Vec<SpeciesCapacityEntry>,
    pub catastrophes: Vec<Catastrophe>,
    pub next_catastrophe_id: u64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("{region}: climate out of bounds ({climate:?})")]
    Climate {
        region: RegionId,
        climate: ClimateState,
    },
    #[error("{region}: resource {kind:?} quantity {quantity} outside 0..={max}")]
    Resource {
        region: RegionId,
        kind: ResourceKind,
        quantity: f64,
        max: f64,
    },
    #[error("{region}: plant {plant} biomass {biomass} is negative or non-finite")]
    Plant {
        region: RegionId,
        plant: String,
        biomass: f64,
    },
    #[error("{region}: {characters} characters outnumber {count} {species}")]
    Characters {
        region: RegionId,
        species: SpeciesId,
        count: u64,
        characters: usize,
    },
}

#[derive(Clone)]
pub struct World {
    time: WorldTime,
    pub(crate) regions: BTreeMap<RegionId, Region>,
    pub(crate) food_web: Vec<FoodWebRelation>,
    pub(crate) carrying_capacity: BTreeMap<RegionId, f64>,
    pub(crate) species_capacity: BTreeMap<(RegionId, SpeciesId), f64>,
    pub(crate) species: SpeciesRegistry,
    pub(crate) catastrophes: Vec<Catastrophe>,
    next_catastrophe_id: u64,
    pub(crate) events: Vec<WorldEvent>,
}

impl World {
    pub fn new(time: WorldTime, species: SpeciesRegistry) -> Self {
        Self {
            time,
            regions: BTreeMap::new(),
            food_web: Vec::new(),
            carrying_capacity: BTreeMap::new(),
            species_capacity: BTreeMap::new(),
            species,
            catastrophes: Vec::new(),
            next_catastrophe_id: 1,
            events: Vec::new(),
        }
    }

    pub fn insert_region(&mut self, region: Region) {
        self.regions.insert(region.id, region);
    }

    /// Links two regions in both directions.
    pub fn connect(&mut self, a: RegionId, b: RegionId) {
        if a == b || !self.regions.contains_key(&a) || !self.regions.contains_key(&b) {
            return;
        }
        if let Some(region) = self.regions.get_mut(&a) {
            region.adjacent.insert(b);
        }
        if let Some(region) = self.regions.get_mut(&b) {
            region.adjacent.insert(a);
        }
    }

    pub fn time(&self) -> &WorldTime {
        &self.time
    }

    pub fn tick(&self) -> u64 {
        self.time.tick
    }

    pub fn advance_time(&mut self) {
        self.time.advance();
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    pub fn region_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.regions.get_mut(&id)
    }

    pub fn region_ids(&self) -> Vec<RegionId> {
        self.regions.keys().copied().collect()
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    /// Adjacent regions that actually exist; dangling ids are skipped.
    pub fn neighbors(&self, id: RegionId) -> Vec<RegionId> {
        self.regions
            .get(&id)
            .map(|region| {
                region
                    .adjacent
                    .iter()
                    .copied()
                    .filter(|n| self.regions.contains_key(n))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn species(&self) -> &SpeciesRegistry {
        &self.species
    }

    pub fn food_web(&self) -> &[FoodWebRelation] {
        &self.food_web
    }

    pub fn add_food_web_relation(&mut self, relation: FoodWebRelation) {
        self.food_web.push(relation);
    }

    pub fn set_carrying_capacity(&mut self, region: RegionId, capacity: f64) {
        self.carrying_capacity.insert(region, capacity);
    }

    /// Region carrying capacity, floored so it can divide safely.
    pub fn carrying_capacity(&self, region: RegionId) -> f64 {
        self.carrying_capacity
            .get(&region)
            .copied()
            .unwrap_or(MIN_CAPACITY)
            .max(MIN_CAPACITY)
    }

    pub fn set_species_capacity(&mut self, region: RegionId, species: SpeciesId, capacity: f64) {
        self.species_capacity.insert((region, species), capacity);
    }

    /// Capacity for one species; falls back to the region capacity.
    pub fn species_capacity(&self, region: RegionId, species: &SpeciesId) -> f64 {
        self.species_capacity
            .get(&(region, species.clone()))
            .copied()
            .map(|capacity| capacity.max(MIN_CAPACITY))
            .unwrap_or_else(|| self.carrying_capacity(region))
    }

    pub fn total_population(&self) -> u64 {
        self.regions.values().map(Region::total_population).sum()
    }

    pub fn push_event(&mut self, event: WorldEvent) {
        self.events.push(event);
    }

    pub fn pending_events(&self) -> &[WorldEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn active_catastrophes(&self) -> &[Catastrophe] {
        &self.catastrophes
    }

    /// Inserts a catastrophe as-is, assigning a fresh id when it carries 0.
    pub fn add_catastrophe(&mut self, mut catastrophe: Catastrophe) -> u64 {
        if catastrophe.id == 0 {
            catastrophe.id = self.allocate_catastrophe_id();
        } else {
            self.next_catastrophe_id = self.next_catastrophe_id.max(catastrophe.id + 1);
        }
        let id = catastrophe.id;
        self.catastrophes.push(catastrophe);
        id
    }

    pub(crate) fn allocate_catastrophe_id(&mut self) -> u64 {
        let id = self.next_catastrophe_id;
        self.next_catastrophe_id += 1;
        id
    }

    /// Mutation-rate multiplier for the genetics layer: 1.0 unless a catastrophe is active here.
    pub fn evolution_pressure(&self, region: RegionId) -> f64 {
        self.catastrophes
            .iter()
            .filter(|c| c.affected_regions.contains(&region))
            .map(|c| c.evolution_pressure)
            .fold(1.0, f64::max)
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for region in self.regions.values() {
            if !region.climate.is_within_bounds() {
                return Err(InvariantViolation::Climate {
                    region: region.id,
                    climate: region.climate,
                });
            }
            for resource in &region.resources {
                if !(resource.quantity >= 0.0 && resource.quantity <= resource.max_quantity) {
                    return Err(InvariantViolation::Resource {
                        region: region.id,
                        kind: resource.kind,
                        quantity: resource.quantity,
                        max: resource.max_quantity,
                    });
                }
            }
            for plant in &region.plants {
                if !(plant.biomass >= 0.0 && plant.biomass.is_finite()) {
                    return Err(InvariantViolation::Plant {
                        region: region.id,
                        plant: plant.plant.clone(),
                        biomass: plant.biomass,
                    });
                }
            }
            for population in &region.populations {
                if population.characters.len() as u64 > population.count {
                    return Err(InvariantViolation::Characters {
                        region: region.id,
                        species: population.species.clone(),
                        count: population.count,
                        characters: population.characters.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Clamps anything `check_invariants` would reject.
    pub fn repair_invariants(&mut self) {
        for region in self.regions.values_mut() {
            let climate = region.climate;
            region.climate = ClimateState::new(
                if climate.temperature().is_finite() {
                    climate.temperature()
                } else {
                    region.biome.profile().base_temperature
                },
                climate.humidity(),
                climate.precipitation(),
                climate.wind_speed(),
                climate.pollution(),
            );
            for resource in &mut region.resources {
                resource.quantity = resource.quantity.clamp(0.0, resource.max_quantity.max(0.0));
            }
            for plant in &mut region.plants {
                if !(plant.biomass >= 0.0 && plant.biomass.is_finite()) {
                    plant.biomass = 0.0;
                }
            }
            for population in &mut region.populations {
                population.release_surplus_characters();
            }
        }
    }

    pub fn snapshot(&self, scenario: &str) -> WorldSnapshot {
        WorldSnapshot {
            scenario: scenario.to_string(),
            time: self.time,
            total_population: self.total_population(),
            regions: self.regions.values().cloned().collect(),
            food_web: self.food_web.clone(),
            carrying_capacity: self
                .carrying_capacity
                .iter()
                .map(|(region, capacity)| CapacityEntry {
                    region: *region,
                    capacity: *capacity,
                })
                .collect(),
            species_capacity: self
                .species_capacity
                .iter()
                .map(|((region, species), capacity)| SpeciesCapacityEntry {
                    region: *region,
                    species: species.clone(),
                    capacity: *capacity,
                })
                .collect(),
            catastrophes: self.catastrophes.clone(),
            next_catastrophe_id: self.next_catastrophe_id,
        }
    }

    /// Rebuilds a world from a snapshot. Species traits are not part of the snapshot and
    /// come from the registry.
    pub fn restore(snapshot: WorldSnapshot, species: SpeciesRegistry) -> Self {
        let mut world = World::new(snapshot.time, species);
        for region in snapshot.regions {
            world.insert_region(region);
        }
        world.food_web = snapshot.food_web;
        for entry in snapshot.carrying_capacity {
            world.set_carrying_capacity(entry.region, entry.capacity);
        }
        for entry in snapshot.species_capacity {
            world.set_species_capacity(entry.region, entry.species, entry.capacity);
        }
        world.catastrophes = snapshot.catastrophes;
        world.next_catastrophe_id = snapshot.next_catastrophe_id.max(1);
        world
    }
}
