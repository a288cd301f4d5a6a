//! Store fixtures.

use std::sync::Arc;

use advbrowse::columns::{ColumnDefinition, ColumnRegistry, SortKeyResolver};
use advbrowse::config::BrowserConfig;
use advbrowse::query::QueryCompiler;
use advbrowse::store::sqlite::SqliteStore;
use advbrowse::types::{FieldDescriptor, Group, Record, RecordId};
use parking_lot::RwLock;

/// Marker stored in the sort field for values that sort as NULL.
pub const NULL_MARKER: &str = "<null>";

/// Sort field values in insertion order. Record `i + 1` belongs to group
/// `101 + i` and carries `SHUFFLED_VALUES[i]`.
pub const SHUFFLED_VALUES: [&str; 8] = ["Banana", NULL_MARKER, "10", "apple", "", "2.5", "10a", "9"];

/// The expected ascending order of the sort values.
pub const ASCENDING_VALUES: [&str; 8] = ["2.5", "9", "10", "10a", "apple", "Banana", "", NULL_MARKER];

/// Scalar sort expression over the group's sort field.
pub const SORT_EXPR: &str = "NULLIF(n.sfld, '<null>')";

/// The same value computed through a correlated subquery.
pub const SUBQUERY_SORT_EXPR: &str =
    "(SELECT NULLIF(n2.sfld, '<null>') FROM notes n2 WHERE n2.id = c.nid)";

/// Schema with two left-to-right fields.
pub const BASIC_SCHEMA: i64 = 1;

/// Schema with a right-to-left field.
pub const RTL_SCHEMA: i64 = 2;

pub fn create_store() -> SqliteStore {
    let store = SqliteStore::in_memory().expect("Failed to create SQLite store");
    store.init_schema().expect("Failed to initialize schema");
    store
        .add_schema(
            BASIC_SCHEMA,
            "Basic",
            &[FieldDescriptor::new("Front", 0), FieldDescriptor::new("Back", 1)],
        )
        .expect("Failed to add schema");
    store
        .add_schema(
            RTL_SCHEMA,
            "Arabic",
            &[
                FieldDescriptor::new("Word", 0).right_to_left(),
                FieldDescriptor::new("Meaning", 1),
            ],
        )
        .expect("Failed to add schema");
    store
}

/// Store with one record per entry of [`SHUFFLED_VALUES`].
pub fn create_sorted_value_store() -> SqliteStore {
    let store = create_store();
    for (i, value) in SHUFFLED_VALUES.iter().enumerate() {
        let record_id = i as i64 + 1;
        let group_id = 101 + i as i64;
        let group = Group::new(group_id, BASIC_SCHEMA, vec![value.to_string(), format!("back {i}")])
            .with_tags(if i % 2 == 0 { "even" } else { "odd" });
        store.add_group(&group).expect("Failed to add group");

        let mut record = Record::new(record_id, group_id);
        record.interval = (i as i64 * 7) % 5;
        record.deck_id = if i < 4 { 1 } else { 2 };
        store.add_record(&record).expect("Failed to add record");
    }
    store
}

/// Record id holding a sort value of [`SHUFFLED_VALUES`].
pub fn record_for(value: &str) -> RecordId {
    let index = SHUFFLED_VALUES
        .iter()
        .position(|v| *v == value)
        .expect("value is part of the fixture");
    index as RecordId + 1
}

pub fn records_for(values: &[&str]) -> Vec<RecordId> {
    values.iter().map(|v| record_for(v)).collect()
}

/// Store with records `[1(g1), 2(g1), 3(g2), 4(g1)]`, due `1..=4`.
pub fn create_grouped_store() -> SqliteStore {
    let store = create_store();
    store
        .add_group(&Group::new(1, BASIC_SCHEMA, vec!["one".into(), "".into()]))
        .expect("Failed to add group");
    store
        .add_group(&Group::new(2, RTL_SCHEMA, vec!["two".into(), "".into()]))
        .expect("Failed to add group");

    for (id, group_id) in [(1, 1), (2, 1), (3, 2), (4, 1)] {
        let mut record = Record::new(id, group_id);
        record.due = id;
        record.ordinal = id - 1;
        store.add_record(&record).expect("Failed to add record");
    }
    store
}

/// Column sorting by the fixture sort expression.
pub fn sort_field_column(column_type: &str) -> ColumnDefinition {
    ColumnDefinition::new(column_type, "Sort value", |_, group, _| group.sort_field.clone())
        .with_sort_sql(SORT_EXPR)
}

/// Column sorting by record due, displaying it.
pub fn due_column() -> ColumnDefinition {
    ColumnDefinition::new("due2", "Due (raw)", |record, _, _| record.due.to_string())
        .with_sort_sql("c.due")
}

pub fn compiler_with(columns: Vec<ColumnDefinition>) -> QueryCompiler {
    let mut registry = ColumnRegistry::new();
    for column in columns {
        registry.register(column).expect("Failed to register column");
    }
    QueryCompiler::new(
        SortKeyResolver::new(Arc::new(RwLock::new(registry))),
        &BrowserConfig::default(),
    )
}

/// Returns true if a temporary table with this name exists.
pub fn temp_table_exists(store: &SqliteStore, name: &str) -> bool {
    let count: i64 = store
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM sqlite_temp_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )
        .expect("Failed to query sqlite_temp_master");
    count > 0
}
