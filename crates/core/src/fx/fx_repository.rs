use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::fx_errors::FxError;
use super::fx_model::RateSnapshot;
use super::fx_traits::RateSnapshotStore;

/// Snapshot store backed by a single JSON file.
///
/// Format: `{"rates": {"USD": 0.1408, ...}, "last_update": "<ISO-8601>"}`.
/// Writes go to a sibling temp file that is then renamed over the target,
/// so a crash mid-write never leaves a truncated snapshot behind.
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "exchange_rates.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RateSnapshotStore for JsonFileSnapshotStore {
    fn load(&self) -> Result<Option<RateSnapshot>, FxError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot: RateSnapshot = serde_json::from_str(&raw)?;
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &RateSnapshot) -> Result<(), FxError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path();
        fs::write(&temp, serde_json::to_vec_pretty(snapshot)?)?;
        fs::rename(&temp, &self.path)?;
        log::debug!("Saved rate snapshot to {}", self.path.display());
        Ok(())
    }
}

/// Snapshot store that keeps the snapshot in memory only.
#[derive(Default)]
pub struct InMemorySnapshotStore {
    snapshot: RwLock<Option<RateSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new(snapshot: Option<RateSnapshot>) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
        }
    }
}

impl RateSnapshotStore for InMemorySnapshotStore {
    fn load(&self) -> Result<Option<RateSnapshot>, FxError> {
        self.snapshot
            .read()
            .map(|s| s.clone())
            .map_err(|e| FxError::CacheError(e.to_string()))
    }

    fn save(&self, snapshot: &RateSnapshot) -> Result<(), FxError> {
        let mut guard = self
            .snapshot
            .write()
            .map_err(|e| FxError::CacheError(e.to_string()))?;
        *guard = Some(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample() -> RateSnapshot {
        RateSnapshot::new(
            vec![("USD".to_string(), 0.1408), ("EUR".to_string(), 0.1295)],
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSnapshotStore::new(dir.path().join("rates.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_creates_parent_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("exchange_rates.json");
        let store = JsonFileSnapshotStore::new(&path);

        store.save(&sample()).unwrap();
        assert!(path.exists());
        assert!(!store.temp_path().exists());

        let reopened = JsonFileSnapshotStore::new(&path);
        assert_eq!(reopened.load().unwrap(), Some(sample()));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonFileSnapshotStore::new(&path).load().unwrap_err();
        assert!(matches!(err, FxError::Storage(_)));
    }

    #[test]
    fn test_reads_naive_timestamps_written_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.json");
        fs::write(
            &path,
            r#"{"rates": {"USD": 0.1408}, "last_update": "2024-01-01T00:00:00"}"#,
        )
        .unwrap();

        let snapshot = JsonFileSnapshotStore::new(&path).load().unwrap().unwrap();
        assert_eq!(snapshot.last_update, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_in_memory_store() {
        let store = InMemorySnapshotStore::default();
        assert!(store.load().unwrap().is_none());
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));
    }
}
