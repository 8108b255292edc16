//! # Catalog Coordinator
//!
//! This module sits between inbound requests and the catalog:
//! 1. Validate the request fields (missing input never touches the catalog)
//! 2. Resolve movie metadata through the lookup service, outside any lock
//! 3. Apply the mutation under the catalog write lock (scan, mutate, flush),
//!    on the blocking pool since the flush is synchronous file I/O
//! 4. Return the current lineup so the caller can re-render from scratch
//!
//! Reads take the shared lock and get an owned snapshot back, so they never
//! see half of a mutation and never wait on a slow lookup.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use catalog::{Catalog, CatalogError, MovieId, MovieRecord, SlotIndex, normalize_poster_path};
use lookup_client::{LookupError, MovieLookup, Trailer};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::CoordinatorConfig;

// ============================================================================
// Requests and responses
// ============================================================================

/// "Put movie `movie_id` into `category`."
///
/// Fields are optional because that is how they arrive from a form; a missing
/// or blank field is a bad request.
#[derive(Debug, Clone, Default)]
pub struct AssignRequest {
    pub category: Option<String>,
    pub movie_id: Option<String>,
}

/// "Make movie `movie_id` the winner."
#[derive(Debug, Clone, Default)]
pub struct PromoteRequest {
    pub movie_id: Option<String>,
}

/// What a caller renders: the first slots of the catalog plus the winner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogView {
    pub lineup: Vec<MovieRecord>,
    pub winner: Option<MovieRecord>,
    /// Occupied category slots, including any beyond the lineup.
    pub total_slots: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignOutcome {
    pub slot: SlotIndex,
    pub view: CatalogView,
}

/// One movie with its trailers, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieDetails {
    pub movie: MovieRecord,
    pub trailers: Vec<Trailer>,
}

/// Everything the coordinator can report back.
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// Required input missing or unusable. Nothing was looked up or changed.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The blocking task applying a mutation panicked.
    #[error("catalog update did not complete: {0}")]
    Interrupted(#[from] tokio::task::JoinError),
}

impl CoordinatorError {
    /// True when the catalog changed in memory but the change is not on disk.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            CoordinatorError::Catalog(CatalogError::PersistenceWriteFailed { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, CoordinatorError>;

// ============================================================================
// Coordinator
// ============================================================================

/// Owns the catalog and mediates every access to it.
#[derive(Clone)]
pub struct CatalogCoordinator {
    catalog: Arc<RwLock<Catalog>>,
    lookup: Arc<dyn MovieLookup>,
    config: CoordinatorConfig,
}

impl CatalogCoordinator {
    pub fn new(catalog: Catalog, lookup: Arc<dyn MovieLookup>, config: CoordinatorConfig) -> Self {
        info!(
            "Coordinator ready: {} slots loaded, lineup size {}",
            catalog.len(),
            config.lineup_size
        );
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
            lookup,
            config,
        }
    }

    /// Look up a movie and put it into a category slot.
    ///
    /// # Returns
    /// The slot index written plus the catalog view after the write.
    pub async fn assign(&self, request: AssignRequest) -> Result<AssignOutcome> {
        let start = Instant::now();
        let category = required(request.category.as_deref(), "category")?;
        let movie_id = parse_movie_id(request.movie_id.as_deref())?;
        debug!("Assign request: movie {} -> {}", movie_id, category);

        // Categories never change after open, so this answer still holds
        // when the write lock is taken below.
        if !self.catalog.read().await.accepts_category(&category) {
            return Err(
                CatalogError::ValidationError(format!("unknown category {category:?}")).into(),
            );
        }

        // Network first, lock second.
        let record = self
            .bounded(format!("lookup of movie {movie_id}"), self.lookup.movie(movie_id))
            .await?;

        let lineup_size = self.config.lineup_size;
        let label = category.clone();
        let (slot, view) = self
            .mutate(move |catalog| {
                let slot = catalog.upsert_by_category(record, &label)?;
                Ok((slot, view_of(catalog, lineup_size)))
            })
            .await?;

        info!(
            "Assigned movie {} to {} (slot {}) in {:.2?}",
            movie_id,
            category,
            slot,
            start.elapsed()
        );
        Ok(AssignOutcome { slot, view })
    }

    /// Copy a curated movie into the winner slot.
    pub async fn promote(&self, request: PromoteRequest) -> Result<CatalogView> {
        let movie_id = parse_movie_id(request.movie_id.as_deref())?;

        let lineup_size = self.config.lineup_size;
        let view = self
            .mutate(move |catalog| {
                catalog.promote_to_winner(movie_id)?;
                Ok(view_of(catalog, lineup_size))
            })
            .await?;

        info!("Movie {} promoted to winner", movie_id);
        Ok(view)
    }

    /// Current lineup and winner.
    pub async fn lineup(&self) -> CatalogView {
        let catalog = self.catalog.read().await;
        view_of(&catalog, self.config.lineup_size)
    }

    /// Free-text search. Results carry display-ready poster paths and are cut
    /// to the configured window.
    pub async fn search(&self, query: &str) -> Result<Vec<MovieRecord>> {
        let query = required(Some(query), "query")?;

        let results = self
            .bounded(format!("search for {query:?}"), self.lookup.search(&query))
            .await?;

        if results.is_empty() {
            info!("No movies found for {:?}", query);
        }

        Ok(results
            .into_iter()
            .take(self.config.search_window)
            .map(for_display)
            .collect())
    }

    /// Movie details and trailers for one id.
    pub async fn about(&self, movie_id: &str) -> Result<MovieDetails> {
        let movie_id = parse_movie_id(Some(movie_id))?;

        let (movie, trailers) = tokio::join!(
            self.bounded(format!("lookup of movie {movie_id}"), self.lookup.movie(movie_id)),
            self.bounded(
                format!("trailers of movie {movie_id}"),
                self.lookup.trailers(movie_id)
            ),
        );

        let movie = movie?;
        // Details without trailers are still worth showing.
        let trailers = trailers.unwrap_or_else(|e| {
            warn!("No trailers for movie {}: {}", movie_id, e);
            Vec::new()
        });

        Ok(MovieDetails {
            movie: for_display(movie),
            trailers,
        })
    }

    /// Run `change` against the catalog while holding the write lock.
    ///
    /// Every mutation ends in a file write, so the work runs on the blocking
    /// pool. The owned guard moves into the task, which keeps the lock held
    /// until the flush is done even if the caller stops waiting.
    async fn mutate<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(&mut Catalog) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut catalog = self.catalog.clone().write_owned().await;
        tokio::task::spawn_blocking(move || change(&mut *catalog)).await?
    }

    /// Run a lookup with the coordinator's own deadline on top of whatever
    /// the client enforces.
    async fn bounded<T>(
        &self,
        what: String,
        lookup: impl Future<Output = std::result::Result<T, LookupError>>,
    ) -> std::result::Result<T, LookupError> {
        match tokio::time::timeout(self.config.lookup_timeout, lookup).await {
            Ok(result) => result.inspect_err(|e| warn!("{} failed: {}", what, e)),
            Err(_) => {
                warn!("{} timed out after {:?}", what, self.config.lookup_timeout);
                Err(LookupError::Unavailable(format!(
                    "{what} timed out after {:?}",
                    self.config.lookup_timeout
                )))
            }
        }
    }
}

fn view_of(catalog: &Catalog, lineup_size: usize) -> CatalogView {
    CatalogView {
        lineup: catalog.lineup(lineup_size).to_vec(),
        winner: catalog.winner().cloned(),
        total_slots: catalog.len(),
    }
}

/// Trimmed, non-empty value of a required field.
fn required(value: Option<&str>, field: &str) -> Result<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(CoordinatorError::BadRequest(format!("{field} is required"))),
    }
}

fn parse_movie_id(value: Option<&str>) -> Result<MovieId> {
    let raw = required(value, "movie id")?;
    match raw.parse::<MovieId>() {
        Ok(0) | Err(_) => Err(CoordinatorError::BadRequest(format!(
            "movie id {raw:?} is not a valid id"
        ))),
        Ok(id) => Ok(id),
    }
}

/// Copy of a lookup result with its poster ready to show.
fn for_display(mut movie: MovieRecord) -> MovieRecord {
    movie.poster_path = normalize_poster_path(&movie.poster_path);
    movie
}
