//! Ledger snapshot persistence.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::models::Reservation;

/// Directory under the user data dir holding the backing file.
pub const DEFAULT_DATA_DIR: &str = "innkeep";

/// File name of the snapshot within the data directory.
pub const LEDGER_FILE: &str = "ledger.json";

/// Serialized representation of the reservation ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Live reservations in insertion order.
    pub reservations: Vec<Reservation>,
    /// Identifier the next successful booking will receive.
    pub next_id: u32,
    /// Timestamp when the snapshot was written.
    pub saved_at: DateTime<Utc>,
}

impl LedgerSnapshot {
    /// Build a snapshot of the given ledger state, stamped now.
    pub fn new(reservations: Vec<Reservation>, next_id: u32) -> Self {
        Self {
            reservations,
            next_id,
            saved_at: Utc::now(),
        }
    }
}

/// Store responsible for reading and writing the ledger backing file.
///
/// The store never holds live state; it only moves whole snapshots
/// between memory and disk.
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location under the user's data directory.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_DATA_DIR)
            .join(LEDGER_FILE)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted snapshot, returning `None` when the file does
    /// not exist.
    ///
    /// Read and decode failures are real errors; the caller decides
    /// whether to degrade to an empty ledger.
    pub fn load(&self) -> Result<Option<LedgerSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let snapshot = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok(Some(snapshot))
    }

    /// Overwrite the backing file with the given snapshot.
    ///
    /// The snapshot lands in a temporary file in the target directory and
    /// is renamed into place, so a crash mid-save never leaves a torn
    /// file behind.
    pub fn save(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;

        let serialised =
            serde_json::to_vec_pretty(snapshot).context("failed to serialize ledger snapshot")?;
        let tmp = NamedTempFile::new_in(parent)
            .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
        fs::write(tmp.path(), &serialised)
            .with_context(|| format!("failed to write {}", tmp.path().display()))?;
        tmp.persist(&self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_reservation(id: u32, customer: &str, room_id: u32) -> Reservation {
        Reservation {
            id,
            customer: customer.to_string(),
            room_id,
            reserved_at: Utc::now(),
        }
    }

    #[test]
    fn missing_file_is_not_an_error() -> Result<()> {
        let dir = tempdir()?;
        let store = LedgerStore::new(dir.path().join("ledger.json"));
        assert!(store.load()?.is_none());
        Ok(())
    }

    #[test]
    fn snapshot_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let store = LedgerStore::new(dir.path().join("ledger.json"));

        let snapshot = LedgerSnapshot::new(
            vec![
                sample_reservation(1, "Alice", 101),
                sample_reservation(2, "Bob", 202),
            ],
            3,
        );
        store.save(&snapshot)?;

        let loaded = store.load()?.expect("expected a persisted snapshot");
        assert_eq!(loaded.next_id, 3);
        assert_eq!(loaded.reservations, snapshot.reservations);
        Ok(())
    }

    #[test]
    fn save_replaces_previous_snapshot() -> Result<()> {
        let dir = tempdir()?;
        let store = LedgerStore::new(dir.path().join("ledger.json"));

        store.save(&LedgerSnapshot::new(
            vec![sample_reservation(1, "Alice", 101)],
            2,
        ))?;
        store.save(&LedgerSnapshot::new(Vec::new(), 2))?;

        let loaded = store.load()?.expect("expected a persisted snapshot");
        assert!(loaded.reservations.is_empty());
        assert_eq!(loaded.next_id, 2);
        Ok(())
    }

    #[test]
    fn corrupt_file_surfaces_a_decode_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("ledger.json");
        fs::write(&path, "not json at all")?;

        let store = LedgerStore::new(path);
        assert!(store.load().is_err());
        Ok(())
    }

    #[test]
    fn save_creates_missing_directories() -> Result<()> {
        let dir = tempdir()?;
        let store = LedgerStore::new(dir.path().join("nested/deeper/ledger.json"));
        store.save(&LedgerSnapshot::new(Vec::new(), 1))?;
        assert!(store.load()?.is_some());
        Ok(())
    }
}
