use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use serde::Serialize;

use crate::{
    events::WorldEvent,
    rng::{RngManager, SystemRng},
    snapshot::SnapshotWriter,
    systems::{BookkeepingSystem, CatastropheSystem, ClimateSystem, EcosystemSystem},
    time::WorldTime,
    world::World,
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub snapshot_interval_ticks: u64,
    pub snapshot_dir: PathBuf,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_ticks,
            ),
            settings: self.settings,
        }
    }
}

/// Builder preloaded with the per-tick pass: climate, ecosystem, catastrophes, bookkeeping.
pub fn standard_builder(settings: EngineSettings) -> EngineBuilder {
    EngineBuilder::new(settings)
        .with_system(ClimateSystem::new())
        .with_system(EcosystemSystem::new())
        .with_system(CatastropheSystem::new())
        .with_system(BookkeepingSystem::new())
}

#[derive(Clone, Debug, Serialize)]
pub struct SystemRunReport {
    pub name: String,
    pub duration_ms: f64,
}

/// What one completed tick produced. `tick` counts completed ticks, starting at 1.
#[derive(Clone, Debug, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub time: WorldTime,
    pub events: Vec<WorldEvent>,
    pub total_population: u64,
    pub active_catastrophes: usize,
    pub system_reports: Vec<SystemRunReport>,
    pub snapshot_path: Option<PathBuf>,
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    snapshot_writer: SnapshotWriter,
    settings: EngineSettings,
}

impl Engine {
    pub fn run(&mut self, world: &mut World, ticks: u64) -> Result<()> {
        self.run_with_hook(world, ticks, |_| {})
    }

    pub fn run_with_hook<F>(&mut self, world: &mut World, ticks: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(TickReport),
    {
        for _ in 0..ticks {
            let report = self.step(world)?;
            hook(report);
        }
        Ok(())
    }

    /// Runs every system once, advances the clock and returns the tick's output.
    pub fn step(&mut self, world: &mut World) -> Result<TickReport> {
        let time = *world.time();
        let mut system_reports = Vec::with_capacity(self.systems.len());
        for system in &mut self.systems {
            let mut rng_stream = self.rng.stream(system.name());
            let ctx = SystemContext {
                tick: time.tick,
                time,
                scenario_name: &self.settings.scenario_name,
            };
            let start = Instant::now();
            system.run(&ctx, world, &mut rng_stream)?;
            system_reports.push(SystemRunReport {
                name: system.name().to_string(),
                duration_ms: start.elapsed().as_secs_f64() * 1_000.0,
            });
        }
        let events = world.drain_events();
        world.advance_time();
        let snapshot_path = self
            .snapshot_writer
            .maybe_write(world, &self.settings.scenario_name)?;
        tracing::debug!(
            tick = world.tick(),
            events = events.len(),
            population = world.total_population(),
            "tick complete"
        );
        Ok(TickReport {
            tick: world.tick(),
            time: *world.time(),
            events,
            total_population: world.total_population(),
            active_catastrophes: world.active_catastrophes().len(),
            system_reports,
            snapshot_path,
        })
    }

    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    /// Hands a world restored from a snapshot to every system before the first step.
    pub fn resume(&mut self, world: &World) {
        tracing::info!(tick = world.tick(), "resuming from restored world");
        for system in &mut self.systems {
            system.resume(world);
        }
    }
}

pub struct SystemContext<'a> {
    pub tick: u64,
    pub time: WorldTime,
    pub scenario_name: &'a str,
}

/// One stage of the per-tick pass. `Send` so an engine can run on a worker thread.
pub trait System: Send {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;

    /// Rebuilds whatever the system tracks between ticks from a restored world.
    fn resume(&mut self, _world: &World) {}
}
