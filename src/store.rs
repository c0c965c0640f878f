//! Store seams the pipeline reads from and writes to.
//!
//! The storage engine itself is external; these traits are the interface, and
//! the in-memory and JSON-file implementations back the binary and the tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::error::StoreError;
use crate::profile::{ScoreHistoryRecord, SocialSignalRecord};
use crate::signals::SignalState;

/// Per-subject last-applied signal state. Owned by the market-signal layer.
pub trait SignalStore: Send + Sync {
    fn load(&self, subject_id: &str) -> Result<Option<SignalState>, StoreError>;
    fn save(&self, subject_id: &str, state: &SignalState) -> Result<(), StoreError>;
}

/// Append-only score history.
pub trait ScoreHistoryStore: Send + Sync {
    fn records(&self, subject_id: &str) -> Result<Vec<ScoreHistoryRecord>, StoreError>;
    fn append(&self, record: ScoreHistoryRecord) -> Result<(), StoreError>;
}

/// Read-only feed of corroborating social signals.
pub trait SocialSignalSource: Send + Sync {
    fn records_for(&self, subject_id: &str) -> Result<Vec<SocialSignalRecord>, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemorySignalStore {
    inner: Mutex<HashMap<String, SignalState>>,
}

impl InMemorySignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SignalStore for InMemorySignalStore {
    fn load(&self, subject_id: &str) -> Result<Option<SignalState>, StoreError> {
        let map = self
            .inner
            .lock()
            .map_err(|_| StoreError::Poisoned("signal store"))?;
        Ok(map.get(subject_id).cloned())
    }

    fn save(&self, subject_id: &str, state: &SignalState) -> Result<(), StoreError> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| StoreError::Poisoned("signal store"))?;
        map.insert(subject_id.to_string(), state.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    inner: Mutex<Vec<ScoreHistoryRecord>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ScoreHistoryRecord>) -> Self {
        Self {
            inner: Mutex::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScoreHistoryStore for InMemoryHistoryStore {
    fn records(&self, subject_id: &str) -> Result<Vec<ScoreHistoryRecord>, StoreError> {
        let v = self
            .inner
            .lock()
            .map_err(|_| StoreError::Poisoned("history store"))?;
        Ok(v.iter().filter(|r| r.subject_id == subject_id).cloned().collect())
    }

    fn append(&self, record: ScoreHistoryRecord) -> Result<(), StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Poisoned("history store"))?
            .push(record);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemorySocialSource {
    inner: Mutex<Vec<SocialSignalRecord>>,
}

impl InMemorySocialSource {
    pub fn new(records: Vec<SocialSignalRecord>) -> Self {
        Self {
            inner: Mutex::new(records),
        }
    }

    pub fn push(&self, record: SocialSignalRecord) -> Result<(), StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Poisoned("social source"))?
            .push(record);
        Ok(())
    }
}

impl SocialSignalSource for InMemorySocialSource {
    fn records_for(&self, subject_id: &str) -> Result<Vec<SocialSignalRecord>, StoreError> {
        let v = self
            .inner
            .lock()
            .map_err(|_| StoreError::Poisoned("social source"))?;
        Ok(v.iter().filter(|r| r.subject_id == subject_id).cloned().collect())
    }
}

/// Signal state kept in one JSON object on disk, keyed by subject id.
/// Writes go to a sibling temp file first and are renamed into place.
#[derive(Debug)]
pub struct FileSignalStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSignalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, SignalState>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(s) if s.trim().is_empty() => Ok(HashMap::new()),
            Ok(s) => Ok(serde_json::from_str(&s)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, map: &HashMap<String, SignalState>) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(map)?)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            warn!(path = %self.path.display(), "rename failed: {e}");
            return Err(e.into());
        }
        Ok(())
    }
}

impl SignalStore for FileSignalStore {
    fn load(&self, subject_id: &str) -> Result<Option<SignalState>, StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Poisoned("file signal store"))?;
        Ok(self.read_all()?.remove(subject_id))
    }

    fn save(&self, subject_id: &str, state: &SignalState) -> Result<(), StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Poisoned("file signal store"))?;
        let mut map = self.read_all()?;
        map.insert(subject_id.to_string(), state.clone());
        self.write_all(&map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::HistorySource;
    use crate::signals::SignalDimensions;
    use chrono::Utc;

    fn state(bonus: f64) -> SignalState {
        SignalState {
            dimensions: SignalDimensions::default(),
            bonus,
            last_changed_at: Utc::now(),
        }
    }

    #[test]
    fn file_store_round_trip_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSignalStore::new(dir.path().join("state/signals.json"));
        assert_eq!(store.load("a").unwrap(), None);

        store.save("a", &state(2.5)).unwrap();
        store.save("b", &state(1.0)).unwrap();
        assert_eq!(store.load("a").unwrap().map(|s| s.bonus), Some(2.5));

        let reopened = FileSignalStore::new(store.path().to_path_buf());
        assert_eq!(reopened.load("b").unwrap().map(|s| s.bonus), Some(1.0));
    }

    #[test]
    fn corrupt_file_is_an_encoding_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signals.json");
        fs::write(&path, "{not json").unwrap();
        let store = FileSignalStore::new(path);
        assert!(matches!(store.load("a"), Err(StoreError::Encoding(_))));
    }

    #[test]
    fn history_is_filtered_by_subject() {
        let store = InMemoryHistoryStore::new();
        for id in ["a", "b", "a"] {
            store
                .append(ScoreHistoryRecord {
                    subject_id: id.into(),
                    old_score: 0.0,
                    new_score: 1.0,
                    recorded_at: Utc::now(),
                    source: HistorySource::Recalculation,
                })
                .unwrap();
        }
        assert_eq!(store.records("a").unwrap().len(), 2);
        assert_eq!(store.len(), 3);
    }
}
