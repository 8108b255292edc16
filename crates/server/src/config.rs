//! Coordinator settings.

use std::time::Duration;

/// Genres offered when no category list is configured.
pub const DEFAULT_CATEGORIES: [&str; 7] = [
    "Action",
    "Comedy",
    "Drama",
    "Horror",
    "Romance",
    "Science Fiction",
    "Animation",
];

/// Knobs for `CatalogCoordinator`.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How many category slots a lineup view shows.
    pub lineup_size: usize,
    /// Search results beyond this many are dropped.
    pub search_window: usize,
    /// Upper bound on any single metadata lookup.
    pub lookup_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            lineup_size: DEFAULT_CATEGORIES.len(),
            search_window: 20,
            lookup_timeout: Duration::from_secs(10),
        }
    }
}

/// Default category list as owned strings.
pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}
