//! Core domain types for the slot catalog.
//!
//! `MovieRecord` is the one record shape that flows everywhere: it is what the
//! metadata lookup returns, what a slot holds, and what lands on disk. Field
//! names on the wire match the data file the catalog has always used, so an
//! existing `m.json` keeps loading.

use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// Type Aliases
// =============================================================================

/// External (TMDB) identifier of a movie. Zero is never a valid id.
pub type MovieId = u32;

/// Position of a record inside the category region of the catalog.
pub type SlotIndex = usize;

// =============================================================================
// MovieRecord
// =============================================================================

/// One movie as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    pub id: MovieId,
    /// Synopsis text.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub overview: String,
    /// Raw path from the lookup service, or a display URL once stored.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub poster_path: String,
    /// Kept in whatever format the source used; never parsed.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub release_date: String,
    #[serde(default)]
    pub vote_average: f64,
    /// Category label. Empty means the record is not assigned to a slot.
    #[serde(rename = "Genre", default, deserialize_with = "null_as_empty")]
    pub category: String,
}

impl MovieRecord {
    /// Create a record with only an id and title set.
    pub fn new(id: MovieId, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            id,
            overview: String::new(),
            poster_path: String::new(),
            release_date: String::new(),
            vote_average: 0.0,
            category: String::new(),
        }
    }

    /// Whether this record has been placed into a category slot.
    pub fn is_assigned(&self) -> bool {
        !self.category.is_empty()
    }
}

/// The lookup service sends `null` for missing strings; treat those as empty.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// Stored form
// =============================================================================

/// Everything the durable store persists: the category slots in order plus
/// the winner slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredCatalog {
    pub slots: Vec<MovieRecord>,
    pub winner: Option<MovieRecord>,
}

impl StoredCatalog {
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty() && self.winner.is_none()
    }
}
