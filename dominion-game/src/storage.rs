//! Persistence boundary for run state.
//!
//! Stores keep one JSON document per run id together with a version that
//! rises by one on every successful write. A write that names a stale
//! version is refused; callers reload and retry.
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use thiserror::Error;

use crate::world::WorldState;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("run {run_id} is at version {found}, write expected {expected}")]
    VersionConflict {
        run_id: String,
        expected: u64,
        found: u64,
    },
    #[error("failed to (de)serialize run state: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Conflicts can be retried after reloading; other failures cannot.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

/// Load and store run state by id.
pub trait WorldStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load a run, or `None` if no run has that id.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored state cannot be read.
    fn load(&self, run_id: &str) -> Result<Option<WorldState>, Self::Error>;

    /// Store `world` if the stored version still equals `expected_version`
    /// (0 for a run never stored). Returns the new version.
    ///
    /// # Errors
    ///
    /// Returns an error on a version mismatch or a write failure.
    fn store(&self, world: &WorldState, expected_version: u64) -> Result<u64, Self::Error>;
}

/// In-process store holding serialized documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    runs: Rc<RefCell<BTreeMap<String, (u64, String)>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn version_of(&self, run_id: &str) -> Option<u64> {
        self.runs.borrow().get(run_id).map(|(version, _)| *version)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.borrow().is_empty()
    }
}

impl WorldStorage for MemoryStorage {
    type Error = StorageError;

    fn load(&self, run_id: &str) -> Result<Option<WorldState>, Self::Error> {
        let runs = self.runs.borrow();
        let Some((version, json)) = runs.get(run_id) else {
            return Ok(None);
        };
        let mut world: WorldState = serde_json::from_str(json)?;
        world.version = *version;
        Ok(Some(world))
    }

    fn store(&self, world: &WorldState, expected_version: u64) -> Result<u64, Self::Error> {
        let mut runs = self.runs.borrow_mut();
        let found = runs.get(&world.run_id).map_or(0, |(version, _)| *version);
        if found != expected_version {
            return Err(StorageError::VersionConflict {
                run_id: world.run_id.clone(),
                expected: expected_version,
                found,
            });
        }
        let version = found + 1;
        let mut stamped = world.clone();
        stamped.version = version;
        let json = serde_json::to_string(&stamped)?;
        runs.insert(world.run_id.clone(), (version, json));
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::SimConfig;
    use crate::race::Race;

    fn world(run_id: &str) -> WorldState {
        let catalog = Catalog::builtin().unwrap();
        WorldState::generate(run_id, 1, SimConfig::default(), &catalog, "Player", Race::Dwarf)
    }

    #[test]
    fn versions_rise_with_each_write() {
        let storage = MemoryStorage::new();
        let mut run = world("run-a");
        assert!(storage.load("run-a").unwrap().is_none());
        assert_eq!(storage.store(&run, 0).unwrap(), 1);
        run.round = 4;
        assert_eq!(storage.store(&run, 1).unwrap(), 2);

        let loaded = storage.load("run-a").unwrap().unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.round, 4);
        assert_eq!(storage.version_of("run-a"), Some(2));
    }

    #[test]
    fn stale_writes_conflict_without_changing_state() {
        let storage = MemoryStorage::new();
        let run = world("run-b");
        storage.store(&run, 0).unwrap();
        let err = storage.store(&run, 0).unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(
            err,
            StorageError::VersionConflict {
                expected: 0,
                found: 1,
                ..
            }
        ));
        assert_eq!(storage.version_of("run-b"), Some(1));
        assert_eq!(storage.len(), 1);
    }
}
