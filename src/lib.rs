pub mod biome;
pub mod engine;
pub mod events;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod species;
pub mod systems;
pub mod time;
pub mod weighted;
pub mod web;
pub mod world;

pub use engine::{Engine, EngineBuilder, EngineSettings, TickReport};
pub use scenario::{Scenario, ScenarioLoader};
pub use world::{World, WorldSnapshot};
