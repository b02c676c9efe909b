use serde::{Deserialize, Serialize};

use crate::species::SpeciesId;
use crate::world::{CatastropheKind, CharacterId, RegionId, ResourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisasterKind {
    Earthquake,
    Flood,
    Storm,
    Wildfire,
    Landslide,
    Tornado,
    Tsunami,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EclipseKind {
    Solar,
    Lunar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorldEventKind {
    NaturalDisaster {
        disaster: DisasterKind,
        severity: f64,
    },
    VolcanicEruption {
        duration_ticks: u32,
    },
    VolcanoQuiet,
    Eclipse {
        eclipse: EclipseKind,
    },
    WeatherFrontFormed {
        front_id: u64,
        front: String,
        intensity: f64,
    },
    DroughtBegan,
    DroughtEnded,
    LocalExtinction {
        species: SpeciesId,
    },
    ResourceDepletion {
        resource: ResourceKind,
        remaining_fraction: f64,
    },
    PollutionCrisis {
        pollution: f64,
    },
    CharacterKilled {
        character: CharacterId,
        species: SpeciesId,
        cause: String,
    },
    CatastropheStarted {
        catastrophe_id: u64,
        catastrophe: CatastropheKind,
        severity: f64,
        cause: String,
    },
    CatastropheResolved {
        catastrophe_id: u64,
        catastrophe: CatastropheKind,
    },
}

/// Something the narrative/broadcast layer may want to tell players about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEvent {
    pub tick: u64,
    /// `None` for global events such as eclipses.
    pub region: Option<RegionId>,
    #[serde(flatten)]
    pub kind: WorldEventKind,
}

impl WorldEvent {
    pub fn regional(tick: u64, region: RegionId, kind: WorldEventKind) -> Self {
        Self {
            tick,
            region: Some(region),
            kind,
        }
    }

    pub fn global(tick: u64, kind: WorldEventKind) -> Self {
        Self {
            tick,
            region: None,
            kind,
        }
    }
}
