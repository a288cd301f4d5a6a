//! Column definitions and column state.
//!
//! - [`definition`] - A custom column: label, value provider, optional sort expression
//! - [`registry`] - Insertion-ordered registry of custom columns
//! - [`resolver`] - Resolves a column type to its SQL sort key
//! - [`builtin`] - The host's built-in column set
//! - [`active`] - The ordered set of displayed columns
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use advbrowse::columns::{ColumnDefinition, ColumnRegistry, SortKeyResolver};
//! use parking_lot::RwLock;
//!
//! let mut registry = ColumnRegistry::new();
//! registry
//!     .register(
//!         ColumnDefinition::new("cardIvl2", "Interval", |record, _group, _type| {
//!             record.interval.to_string()
//!         })
//!         .with_sort_sql("c.ivl"),
//!     )
//!     .unwrap();
//!
//! let resolver = SortKeyResolver::new(Arc::new(RwLock::new(registry)));
//! let key = resolver.resolve("cardIvl2").unwrap();
//! assert_eq!(key.expression.as_deref(), Some("c.ivl"));
//! assert!(!key.cache_sort_value);
//! ```

pub mod active;
pub mod builtin;
pub mod definition;
pub mod registry;
pub mod resolver;

pub use active::ActiveColumnSet;
pub use builtin::{BuiltinColumn, BuiltinColumns};
pub use definition::{ColumnDefinition, SortExpressionFn, ValueProvider};
pub use registry::ColumnRegistry;
pub use resolver::{ResolvedSortKey, SortKeyResolver};
