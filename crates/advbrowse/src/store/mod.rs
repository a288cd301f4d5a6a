//! The relational store the search engine runs against.
//!
//! The engine only needs ad-hoc SQL execution with bound parameters, id
//! queries, and a few point lookups. [`RecordStore`] captures that surface;
//! [`SchemaSource`] answers group schema questions for the field cache.
//!
//! The store holds two tables the generated SQL refers to by alias:
//!
//! ```text
//! cards c  -- records:  id, nid (-> notes.id), did, ord, mod, type, queue, due, ivl, factor, reps, lapses
//! notes n  -- groups:   id, mid (-> models.id), mod, tags, flds, sfld
//! ```

use std::collections::HashMap;

use crate::error::StoreResult;
use crate::types::{FieldDescriptor, Group, GroupId, Record, RecordId, SchemaId, SqlParam};

#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Name of the record table.
pub const RECORD_TABLE: &str = "cards";

/// Name of the group table.
pub const GROUP_TABLE: &str = "notes";

/// A relational store holding records and their groups.
pub trait RecordStore {
    /// Executes a statement that returns no rows. Returns the number of
    /// changed rows.
    fn execute(&self, sql: &str, params: &[SqlParam]) -> StoreResult<usize>;

    /// Runs a query whose first column is a record id.
    fn query_ids(&self, sql: &str, params: &[SqlParam]) -> StoreResult<Vec<RecordId>>;

    /// Runs a query returning `(record id, is_blank)` rows, where the second
    /// column flags a NULL or empty sort value.
    fn query_ranked(&self, sql: &str, params: &[SqlParam]) -> StoreResult<Vec<(RecordId, bool)>>;

    /// Returns the owning group of each given record that exists.
    fn group_ids(&self, record_ids: &[RecordId]) -> StoreResult<HashMap<RecordId, GroupId>>;

    /// Loads a record.
    fn record(&self, id: RecordId) -> StoreResult<Option<Record>>;

    /// Loads a group.
    fn group(&self, id: GroupId) -> StoreResult<Option<Group>>;
}

/// Answers which fields a group schema has.
pub trait SchemaSource {
    /// Returns the fields of a schema, or `None` if the schema does not exist.
    fn schema_fields(&self, schema_id: SchemaId) -> StoreResult<Option<Vec<FieldDescriptor>>>;
}
