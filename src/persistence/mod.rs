use crate::baseline::BaselineSnapshot;
use parking_lot::RwLock;
use serde_json::Error as SerdeJsonError;
use std::collections::HashMap;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum PersistenceError {
    Serialization(SerdeJsonError),
    Io(io::Error),
    Csv(csv::Error),
    #[cfg(feature = "sqlite")]
    Sqlite(rusqlite::Error),
    InvalidData(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Serialization(err) => write!(f, "serialization error: {err}"),
            PersistenceError::Io(err) => write!(f, "io error: {err}"),
            PersistenceError::Csv(err) => write!(f, "csv error: {err}"),
            #[cfg(feature = "sqlite")]
            PersistenceError::Sqlite(err) => write!(f, "sqlite error: {err}"),
            PersistenceError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<SerdeJsonError> for PersistenceError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Serialization(value)
    }
}

impl From<io::Error> for PersistenceError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for PersistenceError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Key-value snapshot storage keyed by project id. Implementations must
/// make `save` atomic: the snapshot lands and becomes the project's active
/// baseline in one step, so readers never observe a half-applied write.
pub trait BaselineStore {
    fn save(&self, snapshot: &BaselineSnapshot) -> PersistenceResult<()>;
    fn active(&self, project_id: &str) -> PersistenceResult<Option<BaselineSnapshot>>;
    fn snapshot(&self, snapshot_id: &str) -> PersistenceResult<Option<BaselineSnapshot>>;
    fn snapshots(&self, project_id: &str) -> PersistenceResult<Vec<BaselineSnapshot>>;
    fn delete(&self, snapshot_id: &str) -> PersistenceResult<bool>;
}

#[derive(Default)]
struct MemoryStoreState {
    snapshots: HashMap<String, BaselineSnapshot>,
    /// project id -> active snapshot id
    active: HashMap<String, String>,
}

/// In-process store for tests and single-session use. Writers hold the
/// write lock for the whole save, which serializes saves across projects;
/// readers always observe the most recently completed write.
#[derive(Default)]
pub struct MemoryBaselineStore {
    inner: RwLock<MemoryStoreState>,
}

impl MemoryBaselineStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BaselineStore for MemoryBaselineStore {
    fn save(&self, snapshot: &BaselineSnapshot) -> PersistenceResult<()> {
        let mut state = self.inner.write();
        state
            .snapshots
            .insert(snapshot.id.clone(), snapshot.clone());
        state
            .active
            .insert(snapshot.project_id.clone(), snapshot.id.clone());
        Ok(())
    }

    fn active(&self, project_id: &str) -> PersistenceResult<Option<BaselineSnapshot>> {
        let state = self.inner.read();
        Ok(state
            .active
            .get(project_id)
            .and_then(|id| state.snapshots.get(id))
            .cloned())
    }

    fn snapshot(&self, snapshot_id: &str) -> PersistenceResult<Option<BaselineSnapshot>> {
        Ok(self.inner.read().snapshots.get(snapshot_id).cloned())
    }

    fn snapshots(&self, project_id: &str) -> PersistenceResult<Vec<BaselineSnapshot>> {
        let state = self.inner.read();
        let mut found: Vec<BaselineSnapshot> = state
            .snapshots
            .values()
            .filter(|snapshot| snapshot.project_id == project_id)
            .cloned()
            .collect();
        found.sort_by_key(|snapshot| snapshot.version);
        Ok(found)
    }

    fn delete(&self, snapshot_id: &str) -> PersistenceResult<bool> {
        let mut state = self.inner.write();
        let Some(removed) = state.snapshots.remove(snapshot_id) else {
            return Ok(false);
        };
        if state.active.get(&removed.project_id).map(String::as_str) == Some(snapshot_id) {
            state.active.remove(&removed.project_id);
        }
        Ok(true)
    }
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{load_tasks_from_csv, load_tasks_from_json, save_tasks_to_csv, save_tasks_to_json};
