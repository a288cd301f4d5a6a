//! SQLite record store.
//!
//! Supports in-memory databases (used by the tests) and file-based ones.
//!
//! # Example
//!
//! ```
//! use advbrowse::store::sqlite::SqliteStore;
//! use advbrowse::store::RecordStore;
//! use advbrowse::types::{FieldDescriptor, Group, Record};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::in_memory()?;
//! store.init_schema()?;
//!
//! store.add_schema(1, "Basic", &[FieldDescriptor::new("Front", 0)])?;
//! store.add_group(&Group::new(10, 1, vec!["hello".to_string()]))?;
//! store.add_record(&Record::new(100, 10))?;
//!
//! let ids = store.query_ids("SELECT c.id FROM cards c", &[])?;
//! assert_eq!(ids, vec![100]);
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE models (id INTEGER PRIMARY KEY, name TEXT NOT NULL, flds TEXT NOT NULL);
//! CREATE TABLE notes (id INTEGER PRIMARY KEY, mid INTEGER NOT NULL, mod INTEGER NOT NULL,
//!                     tags TEXT NOT NULL, flds TEXT NOT NULL, sfld TEXT NOT NULL);
//! CREATE TABLE cards (id INTEGER PRIMARY KEY, nid INTEGER NOT NULL, did INTEGER NOT NULL,
//!                     ord INTEGER NOT NULL, mod INTEGER NOT NULL, type INTEGER NOT NULL,
//!                     queue INTEGER NOT NULL, due INTEGER NOT NULL, ivl INTEGER NOT NULL,
//!                     factor INTEGER NOT NULL, reps INTEGER NOT NULL, lapses INTEGER NOT NULL);
//! ```

mod schema;
mod store;

pub use schema::SCHEMA_VERSION;
pub use store::{SqliteStore, SqliteStoreConfig};
