//! Custom column definitions.

use std::fmt;
use std::sync::Arc;

use crate::error::QueryError;
use crate::types::{Group, Record};

/// Produces the display value of a cell: `(record, group, column_type) -> text`.
///
/// Called on every repaint, so it must be cheap and free of side effects.
pub type ValueProvider = Arc<dyn Fn(&Record, &Group, &str) -> String + Send + Sync>;

/// Produces the SQL scalar expression a column sorts by.
///
/// The expression may reference the record alias `c` and the group alias `n`,
/// and may itself be a correlated sub-select. An empty string means the
/// column requests no ordering at all.
pub type SortExpressionFn = Arc<dyn Fn() -> Result<String, QueryError> + Send + Sync>;

/// A user-defined column.
///
/// Capabilities are plain fields: a column without a sort expression is not
/// sortable and can never drive the query compiler.
#[derive(Clone)]
pub struct ColumnDefinition {
    column_type: String,
    display_name: String,
    value_provider: ValueProvider,
    sort_expression: Option<SortExpressionFn>,
    cache_sort_value: bool,
}

impl ColumnDefinition {
    /// Creates an unsortable column.
    pub fn new<F>(
        column_type: impl Into<String>,
        display_name: impl Into<String>,
        value_provider: F,
    ) -> Self
    where
        F: Fn(&Record, &Group, &str) -> String + Send + Sync + 'static,
    {
        Self {
            column_type: column_type.into(),
            display_name: display_name.into(),
            value_provider: Arc::new(value_provider),
            sort_expression: None,
            cache_sort_value: false,
        }
    }

    /// Sets the sort expression callback.
    pub fn with_sort_expression<F>(mut self, sort_expression: F) -> Self
    where
        F: Fn() -> Result<String, QueryError> + Send + Sync + 'static,
    {
        self.sort_expression = Some(Arc::new(sort_expression));
        self
    }

    /// Sets a constant sort expression.
    pub fn with_sort_sql(self, sql: impl Into<String>) -> Self {
        let sql = sql.into();
        self.with_sort_expression(move || Ok(sql.clone()))
    }

    /// Marks the sort value as expensive: it is materialized once per search.
    pub fn with_cached_sort_value(mut self, cache_sort_value: bool) -> Self {
        self.cache_sort_value = cache_sort_value;
        self
    }

    /// The unique column type identifier.
    pub fn column_type(&self) -> &str {
        &self.column_type
    }

    /// The human-readable label.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Whether the sort value should be materialized.
    pub fn cache_sort_value(&self) -> bool {
        self.cache_sort_value
    }

    /// Whether the column has a sort expression.
    pub fn is_sortable(&self) -> bool {
        self.sort_expression.is_some()
    }

    /// Computes the display value of a cell.
    pub fn value(&self, record: &Record, group: &Group) -> String {
        (self.value_provider)(record, group, &self.column_type)
    }

    /// Evaluates the sort expression callback, if any.
    pub fn sort_expression(&self) -> Option<Result<String, QueryError>> {
        self.sort_expression.as_ref().map(|f| f())
    }
}

impl fmt::Debug for ColumnDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDefinition")
            .field("column_type", &self.column_type)
            .field("display_name", &self.display_name)
            .field("sortable", &self.is_sortable())
            .field("cache_sort_value", &self.cache_sort_value)
            .finish_non_exhaustive()
    }
}
