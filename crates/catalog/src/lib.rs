//! # Catalog Crate
//!
//! This crate holds the genre-slot catalog: one movie per category plus a
//! winner chosen from among them, persisted to disk after every change.
//!
//! ## Main Components
//!
//! - **types**: `MovieRecord` and the stored catalog shape
//! - **poster**: turns raw poster paths into display URLs
//! - **store**: the `DurableStore` trait, a JSON file store and an in-memory store
//! - **slots**: the `Catalog` with upsert-by-category and promote-to-winner
//! - **error**: store and catalog error types
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{Catalog, JsonFileStore, MovieRecord};
//!
//! let store = JsonFileStore::new("m.json")?;
//! let (mut catalog, warning) = Catalog::open(Box::new(store), Vec::new());
//! if let Some(e) = warning {
//!     eprintln!("starting empty: {e}");
//! }
//!
//! let slot = catalog.upsert_by_category(MovieRecord::new(603, "The Matrix"), "Action")?;
//! catalog.promote_to_winner(603)?;
//! ```

// Public modules
pub mod error;
pub mod poster;
pub mod slots;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{CatalogError, Result, StoreError};
pub use poster::{NO_IMAGE_PATH, POSTER_BASE_URL, normalize_poster_path};
pub use slots::Catalog;
pub use store::{DurableStore, JsonFileStore, MemoryStore};
pub use types::{MovieId, MovieRecord, SlotIndex, StoredCatalog};
