//! The host's built-in search, used for columns this crate does not manage.

use crate::columns::BuiltinColumns;
use crate::error::{BrowserResult, SearchStage};
use crate::store::RecordStore;
use crate::types::{RecordId, SortDirection, SqlFragment};

use super::compiler::from_where;

/// Fallback order when a column has no order clause.
pub const DEFAULT_ORDER: &str = "n.id, c.ord";

/// A search the session falls back to when the compiler does not handle the
/// sort column.
pub trait NativeSearch {
    /// Returns matching record ids ordered by `sort_type` in `direction`.
    fn find_records(
        &self,
        store: &dyn RecordStore,
        predicate: &SqlFragment,
        sort_type: &str,
        direction: SortDirection,
    ) -> BrowserResult<Vec<RecordId>>;
}

/// Native search ordering by the built-in columns' order clauses.
#[derive(Debug, Clone, Default)]
pub struct BuiltinNativeSearch {
    columns: BuiltinColumns,
}

impl BuiltinNativeSearch {
    /// Creates a native search over the standard built-in columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a native search over a custom built-in column list.
    pub fn with_columns(columns: BuiltinColumns) -> Self {
        Self { columns }
    }

    /// Builds the native query for a sort column.
    pub fn query(&self, predicate: &SqlFragment, sort_type: &str) -> SqlFragment {
        let order = self.columns.order_clause(sort_type).unwrap_or(DEFAULT_ORDER);
        // Every order clause refers to n or c; the join is always needed.
        let sql = format!("SELECT c.id {} ORDER BY {}", from_where(predicate, true), order);
        SqlFragment::with_params(sql, predicate.params.clone())
    }
}

impl NativeSearch for BuiltinNativeSearch {
    fn find_records(
        &self,
        store: &dyn RecordStore,
        predicate: &SqlFragment,
        sort_type: &str,
        direction: SortDirection,
    ) -> BrowserResult<Vec<RecordId>> {
        let query = self.query(predicate, sort_type);
        tracing::debug!(sort_type = %sort_type, sql = %query.sql, "native search");

        let mut ids = store
            .query_ids(&query.sql, &query.params)
            .map_err(|e| e.at_stage(SearchStage::Native))?;
        if direction.is_descending() {
            ids.reverse();
        }
        Ok(ids)
    }
}
