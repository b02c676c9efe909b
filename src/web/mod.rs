//! Read-only observation server: streams each tick's report and the latest world state.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::engine::{standard_builder, Engine, EngineSettings, TickReport};
use crate::scenario::Scenario;
use crate::snapshot::load_world;
use crate::world::{World, WorldSnapshot};

const BROADCAST_CAPACITY: usize = 512;
/// Reports kept for `/api/frames`; older ones are dropped first.
pub const MAX_REPORTS: usize = 1_024;

/// One tick as seen by observers: the engine's report plus the world it left behind.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub report: TickReport,
    pub world: WorldSnapshot,
    pub last: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateEnvelope {
    pub scenario: String,
    pub total_ticks: u64,
    pub finished: bool,
    pub frame: Option<Frame>,
}

#[derive(Debug, Serialize)]
pub struct ReportLog {
    pub scenario: String,
    pub total_ticks: u64,
    pub finished: bool,
    pub reports: Vec<TickReport>,
}

/// Everything the simulation thread publishes and the handlers read.
pub struct FrameLog {
    scenario: String,
    total_ticks: u64,
    latest: Mutex<Option<Frame>>,
    reports: Mutex<VecDeque<TickReport>>,
    capacity: usize,
    finished: AtomicBool,
    feed: broadcast::Sender<String>,
}

impl FrameLog {
    pub fn new(scenario: impl Into<String>, total_ticks: u64) -> Self {
        Self::with_capacity(scenario, total_ticks, MAX_REPORTS)
    }

    /// A log that keeps at most `capacity` reports, never fewer than one.
    pub fn with_capacity(scenario: impl Into<String>, total_ticks: u64, capacity: usize) -> Self {
        let (feed, _) = broadcast::channel(BROADCAST_CAPACITY);
        let capacity = capacity.max(1);
        Self {
            scenario: scenario.into(),
            total_ticks,
            latest: Mutex::new(None),
            reports: Mutex::new(VecDeque::with_capacity(capacity.min(MAX_REPORTS))),
            capacity,
            finished: AtomicBool::new(false),
            feed,
        }
    }

    /// Records a frame and pushes it to live subscribers; nobody listening is not an error.
    pub fn publish(&self, frame: Frame) {
        {
            let mut reports = self.reports.lock().unwrap_or_else(PoisonError::into_inner);
            if reports.len() == self.capacity {
                reports.pop_front();
            }
            reports.push_back(frame.report.clone());
        }
        match serde_json::to_string(&frame) {
            Ok(payload) => {
                let _ = self.feed.send(payload);
            }
            Err(err) => tracing::warn!(error = %err, tick = frame.report.tick, "frame not encoded"),
        }
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame);
    }

    pub fn finish(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> StateEnvelope {
        StateEnvelope {
            scenario: self.scenario.clone(),
            total_ticks: self.total_ticks,
            finished: self.is_finished(),
            frame: self
                .latest
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    pub fn reports(&self) -> ReportLog {
        ReportLog {
            scenario: self.scenario.clone(),
            total_ticks: self.total_ticks,
            finished: self.is_finished(),
            reports: self
                .reports
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .cloned()
                .collect(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.feed.subscribe()
    }
}

pub struct WebServerConfig {
    pub scenario: Scenario,
    pub ticks: u64,
    pub snapshot_interval: u64,
    pub snapshot_dir: PathBuf,
    pub resume: Option<PathBuf>,
    pub host: String,
    pub port: u16,
}

/// Runs the scenario on a blocking worker while serving its frames over HTTP.
pub async fn run(config: WebServerConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;

    let scenario = config.scenario;
    let mut engine = standard_builder(EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: config.snapshot_interval,
        snapshot_dir: config.snapshot_dir,
    })
    .build();
    let world = match &config.resume {
        Some(path) => {
            let world = load_world(path, scenario.registry())?;
            engine.resume(&world);
            world
        }
        None => scenario.build_world()?,
    };

    let log = Arc::new(FrameLog::new(scenario.name.as_str(), config.ticks));
    let simulation = spawn_simulation(engine, world, config.ticks, Arc::clone(&log));
    tokio::spawn(async move {
        match simulation.await {
            Ok(Ok(())) => tracing::info!("simulation finished"),
            Ok(Err(err)) => tracing::error!(error = ?err, "simulation stopped"),
            Err(err) => tracing::error!(error = ?err, "simulation worker panicked"),
        }
    });

    let app = Router::new()
        .route("/api/state", get(state_handler))
        .route("/api/frames", get(frames_handler))
        .route("/api/events", get(events_handler))
        .with_state(log);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, scenario = %scenario.name, "observation server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("observation server shutting down");
        })
        .await?;
    Ok(())
}

fn spawn_simulation(
    mut engine: Engine,
    mut world: World,
    ticks: u64,
    log: Arc<FrameLog>,
) -> JoinHandle<Result<()>> {
    tokio::task::spawn_blocking(move || {
        let scenario = engine.scenario_name().to_string();
        for done in 1..=ticks {
            let report = engine.step(&mut world)?;
            log.publish(Frame {
                report,
                world: world.snapshot(&scenario),
                last: done == ticks,
            });
        }
        log.finish();
        Ok(())
    })
}

async fn state_handler(State(log): State<Arc<FrameLog>>) -> Json<StateEnvelope> {
    Json(log.state())
}

async fn frames_handler(State(log): State<Arc<FrameLog>>) -> Json<ReportLog> {
    Json(log.reports())
}

async fn events_handler(
    State(log): State<Arc<FrameLog>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Lagged receivers skip the frames they missed rather than ending the stream.
    let frames = BroadcastStream::new(log.subscribe())
        .filter_map(|message| message.ok().map(|payload| Ok(Event::default().data(payload))));
    Sse::new(frames).keep_alive(KeepAlive::new().interval(Duration::from_secs(2)))
}
