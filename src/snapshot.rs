use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::species::SpeciesRegistry;
use crate::world::{World, WorldSnapshot};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk envelope: the world state plus when it was written.
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub written_at: DateTime<Utc>,
    pub world: WorldSnapshot,
}

/// Writes `<dir>/<scenario>/tick_NNNNNN.json` every `interval` completed ticks.
pub struct SnapshotWriter {
    dir: PathBuf,
    interval: u64,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>, interval: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            interval,
        }
    }

    pub fn maybe_write(
        &self,
        world: &World,
        scenario_name: &str,
    ) -> Result<Option<PathBuf>, SnapshotError> {
        if self.interval == 0 {
            return Ok(None);
        }
        let tick = world.tick();
        if tick == 0 || tick % self.interval != 0 {
            return Ok(None);
        }
        let dir = self.dir.join(scenario_name);
        fs::create_dir_all(&dir).map_err(|source| SnapshotError::Io {
            path: dir.clone(),
            source,
        })?;
        let path = dir.join(format!("tick_{tick:06}.json"));
        write_snapshot(&path, &world.snapshot(scenario_name))?;
        tracing::info!(path = %path.display(), tick, "snapshot written");
        Ok(Some(path))
    }
}

pub fn write_snapshot(path: &Path, snapshot: &WorldSnapshot) -> Result<(), SnapshotError> {
    let file = SnapshotFile {
        written_at: Utc::now(),
        world: snapshot.clone(),
    };
    let json = serde_json::to_string_pretty(&file)?;
    fs::write(path, json).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_snapshot(path: &Path) -> Result<WorldSnapshot, SnapshotError> {
    let data = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: SnapshotFile = serde_json::from_str(&data)?;
    Ok(file.world)
}

/// Reads a snapshot written by `SnapshotWriter` back into a world.
pub fn load_world(path: &Path, species: SpeciesRegistry) -> Result<World, SnapshotError> {
    let snapshot = read_snapshot(path)?;
    tracing::info!(path = %path.display(), tick = snapshot.time.tick, "snapshot loaded");
    Ok(World::restore(snapshot, species))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::{Biome, Layer};
    use crate::time::WorldTime;
    use crate::world::{Region, RegionId};

    fn tiny_world(ticks: u64) -> World {
        let mut world = World::new(WorldTime::default(), SpeciesRegistry::new());
        world.insert_region(Region::new(RegionId(1), "Reef", Layer::Underwater, Biome::CoralReef));
        for _ in 0..ticks {
            world.advance_time();
        }
        world
    }

    #[test]
    fn writes_only_on_interval() {
        let temp = tempfile::tempdir().expect("tempdir");
        let writer = SnapshotWriter::new(temp.path(), 10);
        assert!(writer.maybe_write(&tiny_world(9), "reef").unwrap().is_none());
        let path = writer
            .maybe_write(&tiny_world(10), "reef")
            .unwrap()
            .expect("snapshot on interval");
        assert!(path.ends_with("reef/tick_000010.json"));
        let restored = read_snapshot(&path).expect("snapshot reads back");
        assert_eq!(restored.time.tick, 10);
        assert_eq!(restored.regions.len(), 1);
    }

    #[test]
    fn written_snapshot_loads_as_a_world() {
        let temp = tempfile::tempdir().expect("tempdir");
        let writer = SnapshotWriter::new(temp.path(), 5);
        let path = writer
            .maybe_write(&tiny_world(5), "reef")
            .unwrap()
            .expect("snapshot on interval");
        let world = load_world(&path, SpeciesRegistry::new()).expect("loads");
        assert_eq!(world.tick(), 5);
        assert_eq!(world.region_ids(), vec![RegionId(1)]);
        assert!(load_world(&temp.path().join("missing.json"), SpeciesRegistry::new()).is_err());
    }

    #[test]
    fn disabled_writer_never_writes() {
        let temp = tempfile::tempdir().expect("tempdir");
        let writer = SnapshotWriter::new(temp.path(), 0);
        assert!(writer.maybe_write(&tiny_world(10), "reef").unwrap().is_none());
    }
}
