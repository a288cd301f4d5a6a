//! Sort key resolution.

use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use regex::Regex;

use super::registry::ColumnRegistry;

static NESTED_SELECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bselect\b").expect("select pattern is valid"));

/// The sort key of a managed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSortKey {
    /// SQL scalar expression to order by; `None` when the column requests no ordering.
    pub expression: Option<String>,
    /// Whether the value must be materialized before sorting.
    pub cache_sort_value: bool,
}

impl ResolvedSortKey {
    /// Returns true if the expression contains a nested `SELECT`.
    pub fn contains_subquery(&self) -> bool {
        self.expression
            .as_deref()
            .is_some_and(|e| NESTED_SELECT.is_match(e))
    }

    /// Returns true if evaluating the key per comparison would be expensive.
    pub fn requires_materialization(&self) -> bool {
        self.expression.is_some() && (self.cache_sort_value || self.contains_subquery())
    }
}

/// Resolves column types to sort keys through the shared registry.
#[derive(Debug, Clone)]
pub struct SortKeyResolver {
    registry: Arc<RwLock<ColumnRegistry>>,
}

impl SortKeyResolver {
    /// Creates a resolver over a shared registry.
    pub fn new(registry: Arc<RwLock<ColumnRegistry>>) -> Self {
        Self { registry }
    }

    /// Returns true if the column type is a registered custom column.
    pub fn is_managed(&self, column_type: &str) -> bool {
        self.registry.read().contains(column_type)
    }

    /// Resolves the sort key of a custom column.
    ///
    /// Returns `None` when the column is not registered, has no sort
    /// expression, or its sort expression callback fails. Each of these routes
    /// the search to the native fallback path.
    pub fn resolve(&self, column_type: &str) -> Option<ResolvedSortKey> {
        let definition = self.registry.read().lookup(column_type)?;

        match definition.sort_expression()? {
            Ok(expression) => {
                let expression = expression.trim();
                Some(ResolvedSortKey {
                    expression: (!expression.is_empty()).then(|| expression.to_string()),
                    cache_sort_value: definition.cache_sort_value(),
                })
            }
            Err(e) => {
                tracing::warn!(
                    column_type = %column_type,
                    error = %e,
                    "sort expression failed, using native search"
                );
                None
            }
        }
    }
}
