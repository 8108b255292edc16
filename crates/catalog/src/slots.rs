//! The category-slot catalog.
//!
//! The catalog holds one movie per category in insertion order, plus a
//! separate winner slot. It only ever grows or replaces: there is no way to
//! clear a slot once something is in it.
//!
//! Every successful mutation is written through to the durable store before
//! the call returns. If that write fails the in-memory change is kept and the
//! caller gets `CatalogError::PersistenceWriteFailed`.
//!
//! `Catalog` itself does no locking; whoever owns it wraps it in a lock so
//! that scan, mutation and flush happen as one unit.

use tracing::{debug, error, info, warn};

use crate::error::{CatalogError, Result, StoreError};
use crate::poster::normalize_poster_path;
use crate::store::DurableStore;
use crate::types::{MovieId, MovieRecord, SlotIndex, StoredCatalog};

/// In-memory catalog synchronized with a `DurableStore`.
pub struct Catalog {
    slots: Vec<MovieRecord>,
    winner: Option<MovieRecord>,
    /// Recognized category labels. Empty means any non-empty label is allowed.
    categories: Vec<String>,
    store: Box<dyn DurableStore>,
}

impl Catalog {
    /// Load the catalog from `store`.
    ///
    /// A store that cannot be read or holds garbage does not stop startup:
    /// the catalog starts empty and the store error is handed back so the
    /// caller can report it.
    pub fn open(
        store: Box<dyn DurableStore>,
        categories: Vec<String>,
    ) -> (Self, Option<StoreError>) {
        let (stored, warning) = match store.load() {
            Ok(stored) => (stored, None),
            Err(e) => {
                warn!("Starting with an empty catalog: {}", e);
                (StoredCatalog::default(), Some(e))
            }
        };

        for slot in &stored.slots {
            if !categories.is_empty() && !categories.contains(&slot.category) {
                warn!(
                    "Loaded slot for unrecognized category {:?} (movie {})",
                    slot.category, slot.id
                );
            }
        }

        info!(
            "Catalog opened from {} with {} category slots",
            store.location(),
            stored.slots.len()
        );

        let catalog = Self {
            slots: stored.slots,
            winner: stored.winner,
            categories,
            store,
        };
        (catalog, warning)
    }

    // Getters

    /// Category slots in order.
    pub fn slots(&self) -> &[MovieRecord] {
        &self.slots
    }

    pub fn winner(&self) -> Option<&MovieRecord> {
        self.winner.as_ref()
    }

    /// Number of occupied category slots (the winner is not counted).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty() && self.winner.is_none()
    }

    /// Whether an upsert to `category` would get past the category check.
    pub fn accepts_category(&self, category: &str) -> bool {
        let category = category.trim();
        !category.is_empty()
            && (self.categories.is_empty() || self.categories.iter().any(|c| c == category))
    }

    /// Logical capacity: one slot per recognized category plus the winner.
    /// `None` when any category label is accepted.
    pub fn capacity(&self) -> Option<usize> {
        if self.categories.is_empty() {
            None
        } else {
            Some(self.categories.len() + 1)
        }
    }

    /// The first `k` category slots.
    pub fn lineup(&self, k: usize) -> &[MovieRecord] {
        &self.slots[..k.min(self.slots.len())]
    }

    pub fn find_by_category(&self, category: &str) -> Option<(SlotIndex, &MovieRecord)> {
        self.slots
            .iter()
            .enumerate()
            .find(|(_, slot)| slot.category == category)
    }

    /// First category slot holding `movie_id`.
    pub fn find_by_id(&self, movie_id: MovieId) -> Option<(SlotIndex, &MovieRecord)> {
        self.slots
            .iter()
            .enumerate()
            .find(|(_, slot)| slot.id == movie_id)
    }

    /// Copy of everything the store persists.
    pub fn snapshot(&self) -> StoredCatalog {
        StoredCatalog {
            slots: self.slots.clone(),
            winner: self.winner.clone(),
        }
    }

    // Mutators

    /// Put `record` into the slot for `category`.
    ///
    /// Replaces the existing record for that category in place, or appends a
    /// new slot at the end. The stored record carries `category` as its label
    /// and a display-ready poster path whatever the lookup returned.
    ///
    /// # Returns
    /// The index of the slot that was written.
    pub fn upsert_by_category(
        &mut self,
        mut record: MovieRecord,
        category: &str,
    ) -> Result<SlotIndex> {
        let category = category.trim();
        self.validate_upsert(&record, category)?;

        record.category = category.to_string();
        record.poster_path = normalize_poster_path(&record.poster_path);

        let index = match self.slots.iter().position(|s| s.category == category) {
            Some(index) => {
                debug!(
                    "Replacing movie {} with {} in slot {} ({})",
                    self.slots[index].id, record.id, index, category
                );
                self.slots[index] = record;
                index
            }
            None => {
                debug!("Appending movie {} as new slot for {}", record.id, category);
                self.slots.push(record);
                self.slots.len() - 1
            }
        };

        self.flush()?;
        info!("Category {} now holds slot {}", category, index);
        Ok(index)
    }

    /// Copy the movie with `movie_id` into the winner slot.
    ///
    /// The movie keeps its category slot. If the id shows up in more than one
    /// slot, the first one wins.
    pub fn promote_to_winner(&mut self, movie_id: MovieId) -> Result<()> {
        let (index, record) = match self.find_by_id(movie_id) {
            Some((index, record)) => (index, record.clone()),
            None => return Err(CatalogError::NotFound { movie_id }),
        };

        debug!("Promoting movie {} from slot {} to winner", movie_id, index);
        self.winner = Some(record);

        self.flush()?;
        info!("Movie {} is the winner", movie_id);
        Ok(())
    }

    fn validate_upsert(&self, record: &MovieRecord, category: &str) -> Result<()> {
        if category.is_empty() {
            return Err(CatalogError::ValidationError(
                "category must not be empty".to_string(),
            ));
        }
        if record.id == 0 {
            return Err(CatalogError::ValidationError(
                "movie id must be non-zero".to_string(),
            ));
        }
        if !self.accepts_category(category) {
            return Err(CatalogError::ValidationError(format!(
                "unknown category {category:?}"
            )));
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.store.save(&self.snapshot()).map_err(|source| {
            error!(
                "Catalog changed in memory but write to {} failed: {}",
                self.store.location(),
                source
            );
            CatalogError::PersistenceWriteFailed { source }
        })
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("slots", &self.slots)
            .field("winner", &self.winner)
            .field("categories", &self.categories)
            .field("store", &self.store.location())
            .finish()
    }
}
