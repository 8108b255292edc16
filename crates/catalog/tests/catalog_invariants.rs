//! Integration tests for the slot catalog.
//!
//! These tests run the catalog against a real JSON file and check the
//! invariants that have to hold across restarts and arbitrary update orders.

use std::fs;
use std::sync::Arc;

use catalog::{
    Catalog, CatalogError, DurableStore, JsonFileStore, MemoryStore, MovieRecord, StoredCatalog,
};
use proptest::prelude::*;
use tempfile::tempdir;

const CATEGORIES: [&str; 4] = ["Action", "Comedy", "Drama", "Horror"];

fn movie(id: u32) -> MovieRecord {
    let mut record = MovieRecord::new(id, format!("Movie {id}"));
    record.overview = format!("Synopsis for {id}");
    record.poster_path = format!("/{id}.jpg");
    record.release_date = "2001-01-01".to_string();
    record.vote_average = 7.25;
    record
}

fn open_file_catalog(path: &std::path::Path) -> Catalog {
    let store = JsonFileStore::new(path).unwrap();
    let (catalog, _) = Catalog::open(Box::new(store), Vec::new());
    catalog
}

#[test]
fn test_catalog_survives_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("m.json");

    {
        let mut catalog = open_file_catalog(&path);
        catalog.upsert_by_category(movie(1), "Action").unwrap();
        catalog.upsert_by_category(movie(2), "Comedy").unwrap();
        catalog.promote_to_winner(2).unwrap();
    }

    let reopened = open_file_catalog(&path);
    let ids: Vec<_> = reopened.slots().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(reopened.winner(), Some(&reopened.slots()[1]));
    assert_eq!(
        reopened.slots()[0].poster_path,
        "https://image.tmdb.org/t/p/w500/1.jpg"
    );
}

#[test]
fn test_resaving_a_loaded_file_reproduces_it() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("m.json");

    let mut catalog = open_file_catalog(&path);
    catalog.upsert_by_category(movie(10), "Drama").unwrap();
    catalog.upsert_by_category(movie(11), "Horror").unwrap();
    catalog.promote_to_winner(10).unwrap();
    let first = fs::read(&path).unwrap();

    let store = JsonFileStore::new(&path).unwrap();
    let loaded = store.load().unwrap();
    store.save(&loaded).unwrap();

    assert_eq!(fs::read(&path).unwrap(), first);
}

#[test]
fn test_missing_store_starts_empty_with_warning() {
    let dir = tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("absent.json")).unwrap();

    let (catalog, warning) = Catalog::open(Box::new(store), Vec::new());

    assert!(catalog.is_empty());
    assert!(matches!(
        warning,
        Some(catalog::StoreError::StoreUnavailable { .. })
    ));
}

#[test]
fn test_corrupt_store_starts_empty_with_warning() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("m.json");
    fs::write(&path, r#"[{"title": "no id"}]"#).unwrap();

    let (catalog, warning) =
        Catalog::open(Box::new(JsonFileStore::new(&path).unwrap()), Vec::new());

    assert!(catalog.is_empty());
    assert!(matches!(warning, Some(catalog::StoreError::CorruptData { .. })));
}

#[test]
fn test_unknown_promote_leaves_file_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("m.json");

    let mut catalog = open_file_catalog(&path);
    catalog.upsert_by_category(movie(1), "Action").unwrap();
    let before = fs::read(&path).unwrap();

    let result = catalog.promote_to_winner(77);

    assert!(matches!(result, Err(CatalogError::NotFound { movie_id: 77 })));
    assert_eq!(fs::read(&path).unwrap(), before);
}

proptest! {
    #[test]
    fn prop_at_most_one_slot_per_category(
        ops in prop::collection::vec((1u32..50, 0usize..CATEGORIES.len()), 0..40)
    ) {
        let store = Arc::new(MemoryStore::new());
        let (mut catalog, _) = Catalog::open(Box::new(store.clone()), Vec::new());

        for (id, category) in &ops {
            catalog.upsert_by_category(movie(*id), CATEGORIES[*category]).unwrap();
        }

        let mut seen: Vec<&str> = catalog.slots().iter().map(|s| s.category.as_str()).collect();
        let total = seen.len();
        seen.sort();
        seen.dedup();
        prop_assert_eq!(seen.len(), total);
        prop_assert!(total <= CATEGORIES.len());

        // The last write to each category is the one that stuck.
        for (index, name) in CATEGORIES.iter().enumerate() {
            let last = ops.iter().rev().find(|(_, c)| *c == index).map(|(id, _)| *id);
            let held = catalog.find_by_category(name).map(|(_, r)| r.id);
            prop_assert_eq!(held, last);
        }

        let persisted: StoredCatalog = store.contents();
        prop_assert_eq!(persisted, catalog.snapshot());
    }

    #[test]
    fn prop_replacing_never_moves_slots(
        ops in prop::collection::vec((1u32..50, 0usize..CATEGORIES.len()), 1..40)
    ) {
        let (mut catalog, _) = Catalog::open(Box::new(MemoryStore::new()), Vec::new());
        let mut first_position: Vec<Option<usize>> = vec![None; CATEGORIES.len()];

        for (id, category) in &ops {
            let index = catalog.upsert_by_category(movie(*id), CATEGORIES[*category]).unwrap();
            let expected = first_position[*category].get_or_insert(index);
            prop_assert_eq!(*expected, index);
        }
    }
}
