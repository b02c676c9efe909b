use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use biosphere::{
    engine::{standard_builder, EngineSettings},
    scenario::ScenarioLoader,
    snapshot::load_world,
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Biosphere world simulation runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/archipelago.yaml")]
    scenario: PathBuf,

    /// Override tick count (uses scenario default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override snapshot interval in ticks (0 disables snapshots)
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Continue from a snapshot file instead of the scenario's initial world
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Serve the observation API while the simulation runs
    #[arg(long)]
    serve: bool,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8080)]
    port: u16,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&scenario.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let ticks = scenario.ticks(cli.ticks);
    let snapshot_interval = cli
        .snapshot_interval
        .unwrap_or(scenario.snapshot_interval_ticks);
    let snapshot_dir = cli
        .snapshot_dir
        .unwrap_or_else(|| PathBuf::from("snapshots"));

    if cli.serve {
        let runtime = tokio::runtime::Runtime::new()?;
        return runtime.block_on(web::run(WebServerConfig {
            scenario,
            ticks,
            snapshot_interval,
            snapshot_dir,
            resume: cli.resume,
            host: cli.host,
            port: cli.port,
        }));
    }

    let mut engine = standard_builder(EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: snapshot_interval,
        snapshot_dir,
    })
    .build();
    let mut world = match &cli.resume {
        Some(path) => {
            let world = load_world(path, scenario.registry())?;
            engine.resume(&world);
            world
        }
        None => scenario.build_world()?,
    };

    let mut events = 0;
    engine.run_with_hook(&mut world, ticks, |report| events += report.events.len())?;
    println!(
        "Scenario '{}' completed for {} ticks. Final population: {}, active catastrophes: {}, events: {}",
        scenario.name,
        ticks,
        world.total_population(),
        world.active_catastrophes().len(),
        events
    );
    Ok(())
}
