//! Durable storage for the catalog.
//!
//! The catalog is persisted as one JSON array of movie records in slot order.
//! A winner, when present, is written last and tagged with `"winner": true`.
//!
//! Files written before the winner got a marker put the winner copy at the
//! end of the array with nothing to tell it apart except that its category
//! repeats an earlier entry. `load` still recognizes that layout.
//!
//! Writes go to a temporary sibling first and are renamed over the target, so
//! a crash mid-write leaves either the old file or the new one, never half of
//! each.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::types::{MovieRecord, StoredCatalog};

/// Where the catalog lives between runs.
///
/// `load` reports a missing or unreadable resource as
/// `StoreError::StoreUnavailable` and malformed content as
/// `StoreError::CorruptData`; both are non-fatal for the caller, which carries
/// on with an empty catalog. `save` either replaces the whole stored sequence
/// or leaves the old one in place.
pub trait DurableStore: Send + Sync {
    /// Human readable location, for logs.
    fn location(&self) -> String;

    fn load(&self) -> Result<StoredCatalog, StoreError>;

    fn save(&self, catalog: &StoredCatalog) -> Result<(), StoreError>;
}

impl<T: DurableStore + ?Sized> DurableStore for Arc<T> {
    fn location(&self) -> String {
        (**self).location()
    }

    fn load(&self) -> Result<StoredCatalog, StoreError> {
        (**self).load()
    }

    fn save(&self, catalog: &StoredCatalog) -> Result<(), StoreError> {
        (**self).save(catalog)
    }
}

// =============================================================================
// On-disk record layout
// =============================================================================

#[derive(Deserialize)]
struct PersistedRecord {
    #[serde(flatten)]
    record: MovieRecord,
    #[serde(default)]
    winner: bool,
}

#[derive(Serialize)]
struct PersistedRecordRef<'a> {
    #[serde(flatten)]
    record: &'a MovieRecord,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    winner: bool,
}

/// Flatten a catalog into the sequence that goes on disk.
fn encode_records(catalog: &StoredCatalog) -> Vec<PersistedRecordRef<'_>> {
    let mut records: Vec<PersistedRecordRef<'_>> = catalog
        .slots
        .iter()
        .map(|record| PersistedRecordRef {
            record,
            winner: false,
        })
        .collect();

    if let Some(winner) = &catalog.winner {
        records.push(PersistedRecordRef {
            record: winner,
            winner: true,
        });
    }
    records
}

/// Rebuild slots and winner from a loaded sequence, checking the catalog
/// invariants along the way.
fn decode_records(records: Vec<PersistedRecord>) -> Result<StoredCatalog, String> {
    let has_marker = records.iter().any(|r| r.winner);
    let last = records.len().saturating_sub(1);
    let mut stored = StoredCatalog::default();

    for (position, entry) in records.into_iter().enumerate() {
        let record = entry.record;
        if record.id == 0 {
            return Err(format!("record at position {position} has no id"));
        }

        if entry.winner {
            if stored.winner.is_some() {
                return Err("more than one record is marked as winner".to_string());
            }
            stored.winner = Some(record);
            continue;
        }

        if record.category.is_empty() {
            return Err(format!(
                "record {} at position {position} has no category",
                record.id
            ));
        }

        if stored.slots.iter().any(|s| s.category == record.category) {
            // Legacy layout: unmarked winner copy in the final position.
            if position == last && !has_marker {
                debug!("Treating trailing record {} as legacy winner", record.id);
                stored.winner = Some(record);
                continue;
            }
            return Err(format!(
                "category {:?} appears more than once",
                record.category
            ));
        }

        stored.slots.push(record);
    }

    Ok(stored)
}

// =============================================================================
// JSON file store
// =============================================================================

/// Stores the catalog in a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by `path`.
    ///
    /// An empty path means there is nowhere to persist to at all, which is
    /// the one configuration error callers should treat as fatal.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(StoreError::NoStoragePath);
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_atomically(&self, bytes: &[u8]) -> io::Result<()> {
        let temp_path = self.temp_path();

        let result = (|| {
            let mut file = File::create(&temp_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            fs::rename(&temp_path, &self.path)
        })();

        if result.is_err() {
            // Leave the target as it was; the temp file is garbage now.
            let _ = fs::remove_file(&temp_path);
        }
        result
    }
}

impl DurableStore for JsonFileStore {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<StoredCatalog, StoreError> {
        let content = fs::read_to_string(&self.path).map_err(|source| {
            StoreError::StoreUnavailable {
                path: self.path.clone(),
                source,
            }
        })?;

        if content.trim().is_empty() {
            debug!("Store file {} is empty", self.path.display());
            return Ok(StoredCatalog::default());
        }

        let records: Vec<PersistedRecord> =
            serde_json::from_str(&content).map_err(|e| StoreError::CorruptData {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        let stored = decode_records(records).map_err(|reason| StoreError::CorruptData {
            path: self.path.clone(),
            reason,
        })?;

        info!(
            "Loaded {} category slots (winner: {}) from {}",
            stored.slots.len(),
            stored.winner.is_some(),
            self.path.display()
        );
        Ok(stored)
    }

    fn save(&self, catalog: &StoredCatalog) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&encode_records(catalog))?;

        self.write_atomically(&bytes).map_err(|source| {
            warn!("Failed to write catalog to {}: {}", self.path.display(), source);
            StoreError::WriteFailed {
                path: self.path.clone(),
                source,
            }
        })?;

        debug!(
            "Wrote {} bytes ({} slots) to {}",
            bytes.len(),
            catalog.slots.len(),
            self.path.display()
        );
        Ok(())
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Keeps the "persisted" catalog in memory.
///
/// Useful when persistence is not wanted and in tests, where
/// `set_fail_writes(true)` simulates a disk that refuses writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    contents: Mutex<StoredCatalog>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: StoredCatalog) -> Self {
        Self {
            contents: Mutex::new(contents),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every following `save` fail until switched back.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// What the last successful `save` stored.
    pub fn contents(&self) -> StoredCatalog {
        self.contents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl DurableStore for MemoryStore {
    fn location(&self) -> String {
        "<memory>".to_string()
    }

    fn load(&self) -> Result<StoredCatalog, StoreError> {
        Ok(self.contents())
    }

    fn save(&self, catalog: &StoredCatalog) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed {
                path: PathBuf::from(self.location()),
                source: io::Error::other("writes disabled"),
            });
        }
        *self
            .contents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = catalog.clone();
        Ok(())
    }
}
