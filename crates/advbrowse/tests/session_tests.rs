//! Browser session integration tests.

#![cfg(feature = "sqlite")]

mod common;

use advbrowse::columns::ColumnDefinition;
use advbrowse::error::{BrowserError, RegistryError};
use advbrowse::prefs::{MemoryPreferenceStore, PreferenceStore};
use advbrowse::query::SearchStrategy;
use advbrowse::session::{BrowserSession, SessionBuilder};
use advbrowse::store::sqlite::SqliteStore;
use advbrowse::types::SortDirection;
use serde_json::json;

use common::*;

fn open_grouped(prefs: &MemoryPreferenceStore) -> BrowserSession<SqliteStore> {
    let mut builder = SessionBuilder::new(create_grouped_store());
    builder.register_column(due_column()).unwrap();
    builder.open(prefs).unwrap()
}

// ============================================================================
// Search Routing Tests
// ============================================================================

#[test]
fn test_custom_sort_column_is_compiled() {
    let mut session = open_grouped(&MemoryPreferenceStore::new());
    let ids = session.set_sort_column("due2").unwrap().to_vec();
    assert_eq!(ids, vec![1, 2, 3, 4]);

    let ids = session.set_sort_direction(SortDirection::Descending).to_vec();
    assert_eq!(ids, vec![4, 3, 2, 1]);
    assert_eq!(session.search("cid:2,3"), &[3, 2]);
}

#[test]
fn test_builtin_sort_column_uses_native_search() {
    let mut session = open_grouped(&MemoryPreferenceStore::new());
    assert_eq!(session.sort_type(), "noteFld");
    // Sort field "one" (records 1, 2, 4 by ordinal) before "two" (record 3).
    assert_eq!(session.search(""), &[1, 2, 4, 3]);
}

#[test]
fn test_unsortable_custom_column_uses_native_search() {
    let mut builder = SessionBuilder::new(create_grouped_store());
    builder
        .register_column(ColumnDefinition::new("label", "Label", |_, group, _| group.sort_field.clone()))
        .unwrap();
    let mut session = builder.open(&MemoryPreferenceStore::new()).unwrap();

    session.search("");
    let ids = session.set_sort_column("label").unwrap();
    // Native default order: group id, then ordinal.
    assert_eq!(ids, &[1, 2, 4, 3]);
}

#[test]
fn test_invalid_search_shows_nothing() {
    let mut session = open_grouped(&MemoryPreferenceStore::new());
    assert_eq!(session.search("").len(), 4);
    assert!(session.search("\"unbalanced").is_empty());
    assert!(session.results().is_empty());
    assert_eq!(session.last_search(), "\"unbalanced");
}

#[test]
fn test_forced_strategy_gives_same_results() {
    let prefs = MemoryPreferenceStore::new();
    let mut builder = SessionBuilder::new(create_sorted_value_store())
        .with_forced_strategy(SearchStrategy::Materialized);
    builder.register_column(sort_field_column("value")).unwrap();
    let mut session = builder.open(&prefs).unwrap();

    let ids = session.set_sort_column("value").unwrap();
    assert_eq!(ids, records_for(&ASCENDING_VALUES).as_slice());
}

// ============================================================================
// Unique Group Tests
// ============================================================================

#[test]
fn test_unique_groups_keep_first_record_of_each_group() {
    let mut session = open_grouped(&MemoryPreferenceStore::new());
    session.set_sort_column("due2").unwrap();

    assert!(session.toggle_unique_groups());
    assert_eq!(session.results(), &[1, 3]);

    session.set_sort_direction(SortDirection::Descending);
    assert_eq!(session.results(), &[4, 3]);

    assert!(!session.toggle_unique_groups());
    assert_eq!(session.results(), &[4, 3, 2, 1]);
}

#[test]
fn test_unique_groups_apply_to_native_search() {
    let mut prefs = MemoryPreferenceStore::new();
    prefs.set("advbrowse_uniqueNote", json!(true));
    let mut session = open_grouped(&prefs);

    assert!(session.unique_groups());
    assert_eq!(session.search(""), &[1, 3]);
}

// ============================================================================
// Column Management Tests
// ============================================================================

#[test]
fn test_unregister_active_column_preserves_others() {
    let mut prefs = MemoryPreferenceStore::new();
    prefs.set("advbrowse_activeCols", json!(["noteFld", "due2", "deck", "cardIvl"]));
    prefs.set("sortType", json!("due2"));
    let mut session = open_grouped(&prefs);
    assert_eq!(session.active_columns(), &["noteFld", "due2", "deck", "cardIvl"]);

    session.unregister_column("due2").unwrap();
    assert_eq!(session.active_columns(), &["noteFld", "deck", "cardIvl"]);
    assert_eq!(session.sort_type(), "noteFld");
    assert!(!session.is_custom_column("due2"));

    assert!(matches!(
        session.unregister_column("due2"),
        Err(BrowserError::Registry(RegistryError::NotFound { .. }))
    ));
}

#[test]
fn test_unregister_sort_column_appends_default() {
    let mut prefs = MemoryPreferenceStore::new();
    prefs.set("advbrowse_activeCols", json!(["due2", "deck"]));
    prefs.set("sortType", json!("due2"));
    let mut session = open_grouped(&prefs);

    session.unregister_column("due2").unwrap();
    assert_eq!(session.active_columns(), &["deck", "noteFld"]);
}

#[test]
fn test_toggle_column() {
    let mut session = open_grouped(&MemoryPreferenceStore::new());
    assert!(session.toggle_column("due2").unwrap());
    assert_eq!(session.active_columns().last().map(String::as_str), Some("due2"));
    assert!(!session.toggle_column("due2").unwrap());

    for column in ["template", "cardDue", "deck"] {
        assert!(!session.toggle_column(column).unwrap());
    }
    // The last column stays.
    assert!(session.toggle_column("noteFld").unwrap());
    assert_eq!(session.active_columns(), &["noteFld"]);
}

#[test]
fn test_remove_column_at_runtime() {
    let mut session = open_grouped(&MemoryPreferenceStore::new());
    session.remove_column("cardDue").unwrap();
    session.remove_column("due2").unwrap();

    assert!(!session.active_columns().iter().any(|c| c == "cardDue"));
    assert!(!session.is_custom_column("due2"));
    assert!(
        session
            .available_columns()
            .iter()
            .all(|c| c.column_type != "cardDue" && c.column_type != "due2")
    );
}

#[test]
fn test_runtime_registration() {
    let mut session = open_grouped(&MemoryPreferenceStore::new());
    session.register_column(sort_field_column("value")).unwrap();
    assert!(session.is_custom_column("value"));
    assert!(!session.active_columns().iter().any(|c| c == "value"));
    assert_eq!(session.set_sort_column("value").unwrap(), &[1, 2, 4, 3]);
}

// ============================================================================
// Cell Tests
// ============================================================================

#[test]
fn test_cell_values() {
    let session = open_grouped(&MemoryPreferenceStore::new());
    assert_eq!(session.cell_value(3, "due2").as_deref(), Some("3"));
    assert_eq!(session.cell_value(3, "noteFld"), None);
    assert_eq!(session.cell_value(99, "due2"), None);
}

#[test]
fn test_field_descriptors_are_cached() {
    let mut session = open_grouped(&MemoryPreferenceStore::new());

    assert!(session.is_rtl(3, "_field_Word"));
    assert!(!session.is_rtl(1, "_field_Word"));
    let front = session.field_descriptor(1, "_field_Front").unwrap();
    assert_eq!(front.ordinal, 0);
    assert!(session.field_descriptor(1, "noteFld").is_none());

    // Same schema and field: served from the cache.
    session.field_descriptor(2, "_field_Front").unwrap();
    session.field_descriptor(4, "_field_Word");
    assert_eq!(session.field_cache().lookups(), 3);
    assert_eq!(session.field_cache().hits(), 2);
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[test]
fn test_finalize_saves_state() {
    let mut prefs = MemoryPreferenceStore::new();
    let mut session = open_grouped(&prefs);
    session.toggle_column("due2").unwrap();
    session.set_sort_column("due2").unwrap();
    session.set_sort_direction(SortDirection::Descending);
    session.toggle_unique_groups();

    session.finalize(&mut prefs).unwrap();
    assert_eq!(
        prefs.get("advbrowse_activeCols"),
        Some(json!(["noteFld", "template", "cardDue", "deck", "due2"]))
    );
    assert_eq!(prefs.get("sortType"), Some(json!("due2")));
    assert_eq!(prefs.get("sortBackwards"), Some(json!(true)));
    assert_eq!(prefs.get("advbrowse_uniqueNote"), Some(json!(true)));
    assert_eq!(prefs.flush_count(), 1);
}

#[test]
fn test_reload_without_custom_column_drops_it() {
    let mut prefs = MemoryPreferenceStore::new();
    let mut session = open_grouped(&prefs);
    session.toggle_column("due2").unwrap();
    session.set_sort_column("due2").unwrap();
    session.finalize(&mut prefs).unwrap();

    let mut session = SessionBuilder::new(create_grouped_store()).open(&prefs).unwrap();
    assert_eq!(
        session.active_columns(),
        &["noteFld", "template", "cardDue", "deck"]
    );
    assert_eq!(session.sort_type(), "noteFld");
    assert_eq!(session.search("").len(), 4);
}

#[test]
fn test_reload_restores_direction_and_mode() {
    let mut prefs = MemoryPreferenceStore::new();
    let mut session = open_grouped(&prefs);
    session.set_sort_direction(SortDirection::Descending);
    session.toggle_unique_groups();
    session.finalize(&mut prefs).unwrap();

    let session = open_grouped(&prefs);
    assert_eq!(session.sort_direction(), SortDirection::Descending);
    assert!(session.unique_groups());
}
