//! Core types shared by the column registry, the query compiler and the store.
//!
//! - [`Record`], [`Group`] - A browsable record and the group that owns it
//! - [`FieldDescriptor`] - One field of a group schema
//! - [`SqlFragment`], [`SqlParam`] - SQL text with positional bound parameters
//! - [`SortDirection`] - Session-level sort direction
//!
//! # Building a Predicate Fragment
//!
//! ```
//! use advbrowse::types::{SqlFragment, SqlParam};
//!
//! let mut fragment = SqlFragment::new("");
//! let placeholder = fragment.add_param(SqlParam::string("%kanji%"));
//! fragment.sql = format!("n.flds LIKE {}", placeholder);
//!
//! assert_eq!(fragment.sql, "n.flds LIKE ?1");
//! assert!(fragment.references_alias("n"));
//! assert!(!fragment.references_alias("c"));
//! ```

mod record;
mod sort;
mod sql;

pub use record::{FieldDescriptor, Group, GroupId, Record, RecordId, SchemaId};
pub use sort::SortDirection;
pub use sql::{SqlFragment, SqlParam};

pub(crate) use sql::sql_references_alias;
