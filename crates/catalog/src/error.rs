//! Error types for the catalog crate.
//!
//! Two layers of failure live here:
//! - `StoreError` comes from the durable store (reading or writing the file)
//! - `CatalogError` comes from the slot catalog operations themselves
//!
//! A catalog mutation that succeeded in memory but could not be flushed is
//! reported as `CatalogError::PersistenceWriteFailed`, never folded into a
//! validation failure, because memory and disk no longer agree.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::MovieId;

/// Errors raised by a `DurableStore`.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No storage location was configured at all. Fatal at startup.
    #[error("no storage path configured")]
    NoStoragePath,

    /// The backing file is missing or could not be read.
    #[error("store unavailable at {}: {source}", path.display())]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but its contents make no sense.
    #[error("corrupt data in {}: {reason}", path.display())]
    CorruptData { path: PathBuf, reason: String },

    /// Writing the new contents failed; the previous file is still in place.
    #[error("failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize catalog: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors raised by `Catalog` operations.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Input rejected before any mutation was attempted.
    #[error("validation failed: {0}")]
    ValidationError(String),

    /// Promotion referenced a movie that is not in any category slot.
    #[error("movie {movie_id} is not in any category slot")]
    NotFound { movie_id: MovieId },

    /// The mutation is applied in memory but did not reach disk.
    #[error("catalog updated in memory but not persisted: {source}")]
    PersistenceWriteFailed {
        #[source]
        source: StoreError,
    },
}

/// Convenience alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
