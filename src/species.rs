use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::biome::Layer;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesId(pub String);

impl SpeciesId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diet {
    Herbivore,
    Carnivore,
    Omnivore,
    Detritivore,
}

impl Diet {
    pub fn grazes(self) -> bool {
        matches!(self, Diet::Herbivore | Diet::Omnivore)
    }
}

fn default_food_need() -> f64 {
    0.01
}

/// Read-only trait data owned by the taxonomy layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesTraits {
    pub diet: Diet,
    pub body_size: f64,
    pub habitat: Layer,
    /// Births per individual per tick before density regulation.
    pub reproduction_rate: f64,
    pub maturity_days: f64,
    pub gestation_days: f64,
    /// Food units one individual eats per tick.
    #[serde(default = "default_food_need")]
    pub food_need: f64,
}

impl SpeciesTraits {
    /// Per-tick intrinsic growth rate; long gestation and late maturity slow a species down.
    pub fn intrinsic_rate(&self) -> f64 {
        let generation_years = (self.gestation_days + self.maturity_days).max(0.0) / 365.0;
        self.reproduction_rate.max(0.0) / (1.0 + generation_years)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeciesRegistry {
    species: BTreeMap<SpeciesId, SpeciesTraits>,
}

impl SpeciesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: SpeciesId, traits: SpeciesTraits) {
        self.species.insert(id, traits);
    }

    pub fn get(&self, id: &SpeciesId) -> Option<&SpeciesTraits> {
        self.species.get(id)
    }

    pub fn contains(&self, id: &SpeciesId) -> bool {
        self.species.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }
}
