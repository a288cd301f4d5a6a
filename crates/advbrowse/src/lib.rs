//! Column-aware record search and sort engine for a tabular browser.
//!
//! A browser shows records (cards) belonging to groups (notes) as rows, one
//! column per attribute. Hosts extend it with custom columns; a custom column
//! may supply a SQL sort expression, and this crate turns a search plus that
//! expression into ordered record ids against a relational store.
//!
//! # Architecture
//!
//! - [`types`] - Records, groups, field descriptors and SQL fragments
//! - [`columns`] - Custom column registry, built-in columns, active column set
//! - [`query`] - Predicate parsing, the query compiler, native fallback search
//!   and unique-group filtering
//! - [`store`] - The store traits and the SQLite store
//! - [`fields`] - Per-session field descriptor cache
//! - [`prefs`] - Persisted session state
//! - [`session`] - The browser session tying it all together
//! - [`config`] - Session configuration
//! - [`error`] - Error types
//!
//! # Features
//!
//! - `sqlite` (default) - The rusqlite-backed [`store::sqlite::SqliteStore`]
//!
//! # Sorting
//!
//! Values are ordered numerically when they look like numbers and
//! case-insensitively otherwise, with NULL and empty values last in both
//! directions:
//!
//! ```
//! # #[cfg(feature = "sqlite")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//!
//! use advbrowse::columns::{ColumnDefinition, ColumnRegistry, SortKeyResolver};
//! use advbrowse::config::BrowserConfig;
//! use advbrowse::query::QueryCompiler;
//! use advbrowse::store::sqlite::SqliteStore;
//! use advbrowse::types::{Group, Record, SortDirection, SqlFragment};
//! use parking_lot::RwLock;
//!
//! let store = SqliteStore::in_memory()?;
//! store.init_schema()?;
//! for (id, value) in [(1, "10"), (2, ""), (3, "9"), (4, "apple")] {
//!     store.add_group(&Group::new(id, 1, vec![value.to_string()]))?;
//!     store.add_record(&Record::new(id, id))?;
//! }
//!
//! let mut registry = ColumnRegistry::new();
//! registry.register(
//!     ColumnDefinition::new("front", "Front", |_, group, _| group.sort_field.clone())
//!         .with_sort_sql("n.sfld"),
//! )?;
//! let resolver = SortKeyResolver::new(Arc::new(RwLock::new(registry)));
//! let compiler = QueryCompiler::new(resolver, &BrowserConfig::default());
//!
//! let predicate = SqlFragment::match_all();
//! let ascending = compiler.search(&store, &predicate, "front", SortDirection::Ascending);
//! assert_eq!(ascending.into_ids(), Some(vec![3, 1, 4, 2]));
//! let descending = compiler.search(&store, &predicate, "front", SortDirection::Descending);
//! assert_eq!(descending.into_ids(), Some(vec![4, 1, 3, 2]));
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "sqlite"))]
//! # fn main() {}
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod columns;
pub mod config;
pub mod error;
pub mod fields;
pub mod prefs;
pub mod query;
pub mod session;
pub mod store;
pub mod types;

// Re-export commonly used types at crate root
pub use columns::{ColumnDefinition, ColumnRegistry};
pub use config::BrowserConfig;
pub use error::{BrowserError, BrowserResult};
pub use query::{QueryCompiler, SearchStrategy};
pub use session::{BrowserSession, DisplayModel, SessionBuilder};
pub use types::{RecordId, SortDirection, SqlFragment};

// Re-export store traits
pub use store::{RecordStore, SchemaSource};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
