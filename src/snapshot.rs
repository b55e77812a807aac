//! Snapshot store — last-known-good copies of list data, held in a JSON
//! file under the app data dir so a client can render immediately after
//! a restart, before the live read resolves.
//!
//! Writes are wholesale overwrites (no merge) and stamp the last-sync
//! time. Concurrent overwrites are last-write-wins; this is a
//! non-critical cache and the record store stays authoritative.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cached collections. Keys double as the JSON map keys on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Patients,
    Diagnoses,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patients => "patients",
            Self::Diagnoses => "diagnoses",
        }
    }
}

/// Errors from snapshot operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Internal lock error")]
    LockPoisoned,
}

/// On-disk layout of the snapshot file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotFile {
    collections: HashMap<String, Vec<serde_json::Value>>,
    last_sync: Option<DateTime<Utc>>,
}

/// Seed payload served to clients for instant first render.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSeed {
    pub patients: Option<Vec<serde_json::Value>>,
    pub diagnoses: Option<Vec<serde_json::Value>>,
    pub last_sync: Option<DateTime<Utc>>,
}

pub struct SnapshotStore {
    path: PathBuf,
    state: Mutex<SnapshotFile>,
}

impl SnapshotStore {
    /// Open the snapshot at `path`, loading any existing contents.
    /// A missing or unreadable file starts an empty snapshot; the
    /// cache must never block startup.
    pub fn open(path: PathBuf) -> Self {
        let state = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<SnapshotFile>(&bytes) {
                Ok(file) => file,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable snapshot");
                    SnapshotFile::default()
                }
            },
            Err(_) => SnapshotFile::default(),
        };

        Self {
            path,
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, SnapshotFile>, SnapshotError> {
        self.state.lock().map_err(|_| SnapshotError::LockPoisoned)
    }

    /// Overwrite a collection wholesale and stamp last-sync = now.
    pub fn save<T: Serialize>(
        &self,
        collection: Collection,
        items: &[T],
    ) -> Result<(), SnapshotError> {
        let values = items
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;

        let mut state = self.state()?;
        state
            .collections
            .insert(collection.as_str().to_string(), values);
        state.last_sync = Some(Utc::now());
        self.persist(&state)
    }

    /// Read a cached collection. `None` means never saved (or cleared).
    pub fn get<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Option<Vec<T>>, SnapshotError> {
        let state = self.state()?;
        let Some(values) = state.collections.get(collection.as_str()) else {
            return Ok(None);
        };
        let items = values
            .iter()
            .cloned()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(Some(items))
    }

    /// When the snapshot last absorbed a live read.
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.state().ok().and_then(|s| s.last_sync)
    }

    /// Drop every cached collection and the last-sync stamp.
    pub fn clear_all(&self) -> Result<(), SnapshotError> {
        let mut state = self.state()?;
        state.collections.clear();
        state.last_sync = None;
        self.persist(&state)
    }

    /// Seed payload for the snapshot endpoint.
    pub fn seed(&self) -> Result<SnapshotSeed, SnapshotError> {
        let state = self.state()?;
        Ok(SnapshotSeed {
            patients: state.collections.get(Collection::Patients.as_str()).cloned(),
            diagnoses: state
                .collections
                .get(Collection::Diagnoses.as_str())
                .cloned(),
            last_sync: state.last_sync,
        })
    }

    /// Atomic replace-on-write: serialize to a temp file in the same
    /// directory, then rename over the target.
    fn persist(&self, state: &SnapshotFile) -> Result<(), SnapshotError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&serde_json::to_vec_pretty(state)?)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::Gender;
    use crate::models::Patient;

    fn sample_patients() -> Vec<Patient> {
        vec![
            Patient {
                id: uuid::Uuid::new_v4(),
                name: "Asha".into(),
                age: 30,
                gender: Gender::Female,
                weight: Some(58.0),
                contact: None,
                address: None,
                created_at: Utc::now(),
            },
            Patient {
                id: uuid::Uuid::new_v4(),
                name: "Ravi".into(),
                age: 64,
                gender: Gender::Male,
                weight: None,
                contact: Some("98400 00000".into()),
                address: None,
                created_at: Utc::now(),
            },
        ]
    }

    fn store_in(dir: &tempfile::TempDir) -> SnapshotStore {
        SnapshotStore::open(dir.path().join("snapshot.json"))
    }

    #[test]
    fn save_then_get_is_deep_equal() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let patients = sample_patients();

        store.save(Collection::Patients, &patients).unwrap();

        let cached: Vec<Patient> = store.get(Collection::Patients).unwrap().unwrap();
        assert_eq!(cached, patients);
    }

    #[test]
    fn unsaved_collection_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let cached: Option<Vec<Patient>> = store.get(Collection::Diagnoses).unwrap();
        assert!(cached.is_none());
    }

    #[test]
    fn save_overwrites_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let patients = sample_patients();

        store.save(Collection::Patients, &patients).unwrap();
        store
            .save(Collection::Patients, &patients[..1])
            .unwrap();

        let cached: Vec<Patient> = store.get(Collection::Patients).unwrap().unwrap();
        assert_eq!(cached.len(), 1, "overwrite must not merge");
    }

    #[test]
    fn save_stamps_last_sync() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.last_sync().is_none());

        store.save(Collection::Patients, &sample_patients()).unwrap();
        assert!(store.last_sync().is_some());
    }

    #[test]
    fn clear_all_removes_collections_and_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(Collection::Patients, &sample_patients()).unwrap();

        store.clear_all().unwrap();

        let cached: Option<Vec<Patient>> = store.get(Collection::Patients).unwrap();
        assert!(cached.is_none());
        assert!(store.last_sync().is_none());
    }

    #[test]
    fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let patients = sample_patients();

        SnapshotStore::open(path.clone())
            .save(Collection::Patients, &patients)
            .unwrap();

        let reopened = SnapshotStore::open(path);
        let cached: Vec<Patient> = reopened.get(Collection::Patients).unwrap().unwrap();
        assert_eq!(cached, patients);
        assert!(reopened.last_sync().is_some());
    }

    #[test]
    fn corrupt_snapshot_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let store = SnapshotStore::open(path);
        let cached: Option<Vec<Patient>> = store.get(Collection::Patients).unwrap();
        assert!(cached.is_none());
    }

    #[test]
    fn seed_exposes_cached_collections() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(Collection::Patients, &sample_patients()).unwrap();

        let seed = store.seed().unwrap();
        assert_eq!(seed.patients.unwrap().len(), 2);
        assert!(seed.diagnoses.is_none());
        assert!(seed.last_sync.is_some());
    }
}
