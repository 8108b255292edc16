//! Server crate for the genre-slot movie catalog.
//!
//! This crate contains the coordinator that owns the catalog and turns
//! inbound requests into catalog updates.

pub mod config;
pub mod coordinator;

pub use config::{CoordinatorConfig, DEFAULT_CATEGORIES, default_categories};
pub use coordinator::{
    AssignOutcome, AssignRequest, CatalogCoordinator, CatalogView, CoordinatorError,
    MovieDetails, PromoteRequest,
};
