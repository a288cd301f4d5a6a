//! The column-aware query compiler.
//!
//! Combines a predicate fragment with the sort key of the active column and
//! runs one of three strategies:
//!
//! | Sort key | Strategy |
//! |---|---|
//! | expression is empty (no ordering requested) | [`SearchStrategy::Direct`] |
//! | cheap scalar expression | [`SearchStrategy::Inline`] |
//! | `cache_sort_value`, or a nested `SELECT` | [`SearchStrategy::Materialized`] |
//!
//! Materialized searches compute every sort value exactly once into a
//! temporary table and sort that table; the table is dropped whether or not
//! the final query succeeds.
//!
//! Predicates and sort expressions reference records as `c` and groups as
//! `n`. The join to the group table is only emitted when one of them uses
//! `n.`. Sort expressions are spliced into the statement verbatim and must
//! not contain parameter placeholders.

use std::time::{Duration, Instant};

use crate::columns::{ResolvedSortKey, SortKeyResolver};
use crate::config::BrowserConfig;
use crate::error::{SearchStage, StoreResult};
use crate::store::{GROUP_TABLE, RECORD_TABLE, RecordStore};
use crate::types::{RecordId, SortDirection, SqlFragment, sql_references_alias};

use super::ordering::{apply_direction, blank_flag, order_terms};

/// How a search is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchStrategy {
    /// Predicate only, no ORDER BY.
    Direct,
    /// Single select with the sort expression in ORDER BY.
    Inline,
    /// Sort values materialized into a temporary table first.
    Materialized,
}

/// The SQL plan of a search.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSearch {
    /// The chosen strategy.
    pub strategy: SearchStrategy,
    /// Statements run before the query (temporary table setup).
    pub prepare: Vec<SqlFragment>,
    /// The final query. Direct queries select ids; the others select
    /// `(id, is_blank)` in ascending order.
    pub query: SqlFragment,
    /// Statement that always runs after the query.
    pub cleanup: Option<String>,
}

/// Result of compiling a search.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileOutcome {
    /// The sort column is not managed here; use the native search.
    NotHandled,
    /// The search plan.
    Compiled(CompiledSearch),
}

/// Result of running a search through the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The sort column is not managed here; use the native search.
    NotHandled,
    /// Ordered record ids. Empty when the store failed.
    Handled(Vec<RecordId>),
}

impl SearchOutcome {
    /// Returns true if the compiler handled the search.
    pub fn is_handled(&self) -> bool {
        matches!(self, SearchOutcome::Handled(_))
    }

    /// Returns the record ids of a handled search.
    pub fn into_ids(self) -> Option<Vec<RecordId>> {
        match self {
            SearchOutcome::Handled(ids) => Some(ids),
            SearchOutcome::NotHandled => None,
        }
    }
}

/// Compiles and runs searches sorted by custom columns.
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    resolver: SortKeyResolver,
    sort_table: String,
    slow_search_threshold: Duration,
    forced_strategy: Option<SearchStrategy>,
}

impl QueryCompiler {
    /// Creates a compiler. `config.sort_table_name` must already be validated.
    pub fn new(resolver: SortKeyResolver, config: &BrowserConfig) -> Self {
        Self {
            resolver,
            sort_table: config.sort_table_name.clone(),
            slow_search_threshold: config.slow_search_threshold(),
            forced_strategy: None,
        }
    }

    /// Forces a strategy for every ordered search.
    ///
    /// Strategy choice never changes results, only cost; this exists so the
    /// strategies can be compared against each other.
    pub fn with_forced_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.forced_strategy = Some(strategy);
        self
    }

    /// Returns the sort key resolver.
    pub fn resolver(&self) -> &SortKeyResolver {
        &self.resolver
    }

    /// Compiles a search without running it.
    pub fn compile(&self, predicate: &SqlFragment, sort_type: &str) -> CompileOutcome {
        match self.resolver.resolve(sort_type) {
            Some(key) => CompileOutcome::Compiled(self.plan(predicate, &key)),
            None => CompileOutcome::NotHandled,
        }
    }

    /// Builds the plan for a resolved sort key.
    pub fn plan(&self, predicate: &SqlFragment, key: &ResolvedSortKey) -> CompiledSearch {
        match (self.select_strategy(key), key.expression.as_deref()) {
            (SearchStrategy::Inline, Some(expr)) => self.plan_inline(predicate, expr),
            (SearchStrategy::Materialized, Some(expr)) => self.plan_materialized(predicate, expr),
            _ => self.plan_direct(predicate),
        }
    }

    fn select_strategy(&self, key: &ResolvedSortKey) -> SearchStrategy {
        if key.expression.is_none() {
            return SearchStrategy::Direct;
        }
        if let Some(forced) = self.forced_strategy {
            return forced;
        }
        if key.requires_materialization() {
            SearchStrategy::Materialized
        } else {
            SearchStrategy::Inline
        }
    }

    fn plan_direct(&self, predicate: &SqlFragment) -> CompiledSearch {
        let sql = format!(
            "SELECT c.id {}",
            from_where(predicate, predicate.references_alias("n"))
        );
        CompiledSearch {
            strategy: SearchStrategy::Direct,
            prepare: Vec::new(),
            query: SqlFragment::with_params(sql, predicate.params.clone()),
            cleanup: None,
        }
    }

    fn plan_inline(&self, predicate: &SqlFragment, expr: &str) -> CompiledSearch {
        let needs_group = predicate.references_alias("n") || sql_references_alias(expr, "n");
        let sql = format!(
            "SELECT c.id, {} {} ORDER BY {}, c.id",
            blank_flag(expr),
            from_where(predicate, needs_group),
            order_terms(expr)
        );
        CompiledSearch {
            strategy: SearchStrategy::Inline,
            prepare: Vec::new(),
            query: SqlFragment::with_params(sql, predicate.params.clone()),
            cleanup: None,
        }
    }

    fn plan_materialized(&self, predicate: &SqlFragment, expr: &str) -> CompiledSearch {
        let needs_group = predicate.references_alias("n") || sql_references_alias(expr, "n");
        let drop = format!("DROP TABLE IF EXISTS temp.{}", self.sort_table);
        let create = format!(
            "CREATE TEMP TABLE {} AS SELECT c.id AS id, ({}) AS srt {}",
            self.sort_table,
            expr,
            from_where(predicate, needs_group)
        );
        let query = format!(
            "SELECT id, {} FROM temp.{} ORDER BY {}, id",
            blank_flag("srt"),
            self.sort_table,
            order_terms("srt")
        );

        CompiledSearch {
            strategy: SearchStrategy::Materialized,
            // The predicate's parameters are consumed by the CREATE statement.
            prepare: vec![
                SqlFragment::new(drop.clone()),
                SqlFragment::with_params(create, predicate.params.clone()),
            ],
            query: SqlFragment::new(query),
            cleanup: Some(drop),
        }
    }

    /// Runs a compiled search.
    ///
    /// Store failures are logged and produce an empty result. The cleanup
    /// statement runs regardless of the outcome.
    pub fn execute<S>(
        &self,
        store: &S,
        compiled: &CompiledSearch,
        direction: SortDirection,
    ) -> Vec<RecordId>
    where
        S: RecordStore + ?Sized,
    {
        let started = Instant::now();
        let result = run(store, compiled, direction);

        if let Some(cleanup) = &compiled.cleanup {
            if let Err(e) = store.execute(cleanup, &[]) {
                tracing::warn!(error = %e.at_stage(SearchStage::Cleanup), "failed to drop sort table");
            }
        }

        let elapsed = started.elapsed();
        match result {
            Ok(ids) => {
                if elapsed >= self.slow_search_threshold {
                    tracing::info!(
                        strategy = ?compiled.strategy,
                        elapsed_ms = elapsed.as_millis() as u64,
                        results = ids.len(),
                        "slow search"
                    );
                } else {
                    tracing::debug!(
                        strategy = ?compiled.strategy,
                        elapsed_ms = elapsed.as_millis() as u64,
                        results = ids.len(),
                        "search finished"
                    );
                }
                ids
            }
            Err(e) => {
                tracing::warn!(
                    strategy = ?compiled.strategy,
                    error = %e,
                    "search failed, returning no results"
                );
                Vec::new()
            }
        }
    }

    /// Compiles and runs a search.
    pub fn search<S>(
        &self,
        store: &S,
        predicate: &SqlFragment,
        sort_type: &str,
        direction: SortDirection,
    ) -> SearchOutcome
    where
        S: RecordStore + ?Sized,
    {
        match self.compile(predicate, sort_type) {
            CompileOutcome::NotHandled => {
                tracing::debug!(sort_type = %sort_type, "sort column not managed, deferring to native search");
                SearchOutcome::NotHandled
            }
            CompileOutcome::Compiled(compiled) => {
                tracing::debug!(
                    sort_type = %sort_type,
                    strategy = ?compiled.strategy,
                    sql = %compiled.query.sql,
                    "compiled search"
                );
                SearchOutcome::Handled(self.execute(store, &compiled, direction))
            }
        }
    }
}

fn run<S>(store: &S, compiled: &CompiledSearch, direction: SortDirection) -> StoreResult<Vec<RecordId>>
where
    S: RecordStore + ?Sized,
{
    for statement in &compiled.prepare {
        store
            .execute(&statement.sql, &statement.params)
            .map_err(|e| e.at_stage(SearchStage::Projection))?;
    }

    let query = &compiled.query;
    match compiled.strategy {
        SearchStrategy::Direct => {
            let mut ids = store
                .query_ids(&query.sql, &query.params)
                .map_err(|e| e.at_stage(SearchStage::FinalQuery))?;
            if direction.is_descending() {
                ids.reverse();
            }
            Ok(ids)
        }
        SearchStrategy::Inline | SearchStrategy::Materialized => {
            let rows = store
                .query_ranked(&query.sql, &query.params)
                .map_err(|e| e.at_stage(SearchStage::FinalQuery))?;
            Ok(apply_direction(rows, direction))
        }
    }
}

/// Builds the FROM and WHERE clauses, joining groups only when needed.
pub(crate) fn from_where(predicate: &SqlFragment, needs_group: bool) -> String {
    if needs_group {
        format!(
            "FROM {} c, {} n WHERE c.nid = n.id AND {}",
            RECORD_TABLE,
            GROUP_TABLE,
            predicate.as_condition()
        )
    } else {
        format!("FROM {} c WHERE {}", RECORD_TABLE, predicate.as_condition())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::sync::Arc;

    use parking_lot::RwLock;

    use super::*;
    use crate::columns::{ColumnDefinition, ColumnRegistry};
    use crate::error::StoreError;
    use crate::types::{Group, GroupId, Record, SqlParam};

    fn compiler_with(columns: Vec<ColumnDefinition>) -> QueryCompiler {
        let mut registry = ColumnRegistry::new();
        for column in columns {
            registry.register(column).unwrap();
        }
        let resolver = SortKeyResolver::new(Arc::new(RwLock::new(registry)));
        QueryCompiler::new(resolver, &BrowserConfig::default())
    }

    fn column(column_type: &str) -> ColumnDefinition {
        ColumnDefinition::new(column_type, column_type, |_, _, _| String::new())
    }

    fn compiled(outcome: CompileOutcome) -> CompiledSearch {
        match outcome {
            CompileOutcome::Compiled(c) => c,
            CompileOutcome::NotHandled => panic!("expected a compiled search"),
        }
    }

    /// Records every statement and fails the ones matching `fail_on`.
    #[derive(Default)]
    struct RecordingStore {
        statements: RefCell<Vec<String>>,
        fail_on: Option<&'static str>,
        rows: Vec<(RecordId, bool)>,
    }

    impl RecordingStore {
        fn check(&self, sql: &str) -> StoreResult<()> {
            self.statements.borrow_mut().push(sql.to_string());
            match self.fail_on {
                Some(pattern) if sql.contains(pattern) => Err(StoreError::Internal {
                    backend_name: "test".to_string(),
                    message: "no such column: n.missing".to_string(),
                    source: None,
                }),
                _ => Ok(()),
            }
        }
    }

    impl RecordStore for RecordingStore {
        fn execute(&self, sql: &str, _params: &[SqlParam]) -> StoreResult<usize> {
            self.check(sql)?;
            Ok(0)
        }

        fn query_ids(&self, sql: &str, _params: &[SqlParam]) -> StoreResult<Vec<RecordId>> {
            self.check(sql)?;
            Ok(self.rows.iter().map(|(id, _)| *id).collect())
        }

        fn query_ranked(
            &self,
            sql: &str,
            _params: &[SqlParam],
        ) -> StoreResult<Vec<(RecordId, bool)>> {
            self.check(sql)?;
            Ok(self.rows.clone())
        }

        fn group_ids(&self, _ids: &[RecordId]) -> StoreResult<HashMap<RecordId, GroupId>> {
            Ok(HashMap::new())
        }

        fn record(&self, _id: RecordId) -> StoreResult<Option<Record>> {
            Ok(None)
        }

        fn group(&self, _id: GroupId) -> StoreResult<Option<Group>> {
            Ok(None)
        }
    }

    #[test]
    fn test_unmanaged_and_unsortable_columns_are_not_handled() {
        let compiler = compiler_with(vec![column("plain")]);
        let predicate = SqlFragment::match_all();
        assert_eq!(compiler.compile(&predicate, "noteFld"), CompileOutcome::NotHandled);
        assert_eq!(compiler.compile(&predicate, "plain"), CompileOutcome::NotHandled);
    }

    #[test]
    fn test_direct_strategy_without_join() {
        let compiler = compiler_with(vec![column("unordered").with_sort_sql("")]);
        let predicate = SqlFragment::with_params("c.did = ?1", vec![SqlParam::integer(3)]);
        let plan = compiled(compiler.compile(&predicate, "unordered"));

        assert_eq!(plan.strategy, SearchStrategy::Direct);
        assert_eq!(plan.query.sql, "SELECT c.id FROM cards c WHERE (c.did = ?1)");
        assert_eq!(plan.query.params, vec![SqlParam::integer(3)]);
        assert!(plan.prepare.is_empty());
        assert!(plan.cleanup.is_none());
    }

    #[test]
    fn test_inline_strategy() {
        let compiler = compiler_with(vec![column("ivl").with_sort_sql("c.ivl")]);
        let plan = compiled(compiler.compile(&SqlFragment::new(""), "ivl"));

        assert_eq!(plan.strategy, SearchStrategy::Inline);
        assert!(plan.query.sql.starts_with("SELECT c.id, ((c.ivl) IS NULL OR (c.ivl) IS '') FROM cards c WHERE 1 ORDER BY (c.ivl) IS NULL"));
        assert!(plan.query.sql.ends_with("COLLATE NOCASE, c.id"));
        assert!(!plan.query.sql.contains("notes"));
    }

    #[test]
    fn test_group_join_when_referenced() {
        let compiler = compiler_with(vec![
            column("sfld").with_sort_sql("n.sfld"),
            column("ivl").with_sort_sql("c.ivl"),
        ]);

        let plan = compiled(compiler.compile(&SqlFragment::match_all(), "sfld"));
        assert!(plan.query.sql.contains("FROM cards c, notes n WHERE c.nid = n.id AND (1)"));

        let predicate = SqlFragment::with_params("n.tags LIKE ?1", vec![SqlParam::string("% a %")]);
        let plan = compiled(compiler.compile(&predicate, "ivl"));
        assert!(plan.query.sql.contains("FROM cards c, notes n WHERE c.nid = n.id AND (n.tags LIKE ?1)"));
    }

    #[test]
    fn test_materialized_strategy_triggers() {
        let compiler = compiler_with(vec![
            column("cached").with_sort_sql("c.ivl").with_cached_sort_value(true),
            column("sub").with_sort_sql("(select count() from cards c2 where c2.nid = c.nid)"),
        ]);
        let predicate = SqlFragment::with_params("c.did = ?1", vec![SqlParam::integer(1)]);

        for sort_type in ["cached", "sub"] {
            let plan = compiled(compiler.compile(&predicate, sort_type));
            assert_eq!(plan.strategy, SearchStrategy::Materialized);
            assert_eq!(plan.prepare.len(), 2);
            assert_eq!(plan.prepare[0].sql, "DROP TABLE IF EXISTS temp.tmp");
            assert!(plan.prepare[1].sql.starts_with("CREATE TEMP TABLE tmp AS SELECT c.id AS id, ("));
            assert_eq!(plan.prepare[1].params, vec![SqlParam::integer(1)]);
            assert!(plan.query.params.is_empty());
            assert!(plan.query.sql.contains("FROM temp.tmp ORDER BY (srt) IS NULL"));
            assert_eq!(plan.cleanup.as_deref(), Some("DROP TABLE IF EXISTS temp.tmp"));
        }
    }

    #[test]
    fn test_forced_strategy() {
        let compiler = compiler_with(vec![
            column("ivl").with_sort_sql("c.ivl"),
            column("none").with_sort_sql(""),
        ])
        .with_forced_strategy(SearchStrategy::Materialized);

        let plan = compiled(compiler.compile(&SqlFragment::match_all(), "ivl"));
        assert_eq!(plan.strategy, SearchStrategy::Materialized);
        let plan = compiled(compiler.compile(&SqlFragment::match_all(), "none"));
        assert_eq!(plan.strategy, SearchStrategy::Direct);
    }

    #[test]
    fn test_projection_failure_still_cleans_up() {
        let compiler = compiler_with(vec![
            column("sub").with_sort_sql("(select n.missing from notes n where n.id = c.nid)"),
        ]);
        let store = RecordingStore {
            fail_on: Some("CREATE TEMP TABLE"),
            rows: vec![(1, false)],
            ..Default::default()
        };

        let outcome = compiler.search(&store, &SqlFragment::match_all(), "sub", SortDirection::Ascending);
        assert_eq!(outcome, SearchOutcome::Handled(vec![]));

        let statements = store.statements.borrow();
        assert_eq!(statements.len(), 3);
        assert!(statements[1].starts_with("CREATE TEMP TABLE"));
        assert_eq!(statements[2], "DROP TABLE IF EXISTS temp.tmp");
    }

    #[test]
    fn test_final_query_failure_returns_empty_and_cleans_up() {
        let compiler = compiler_with(vec![
            column("cached").with_sort_sql("c.ivl").with_cached_sort_value(true),
        ]);
        let store = RecordingStore {
            fail_on: Some("FROM temp.tmp ORDER BY"),
            rows: vec![(1, false)],
            ..Default::default()
        };

        let ids = compiler.search(&store, &SqlFragment::match_all(), "cached", SortDirection::Ascending);
        assert_eq!(ids.into_ids(), Some(vec![]));
        let statements = store.statements.borrow();
        assert_eq!(statements.last().unwrap(), "DROP TABLE IF EXISTS temp.tmp");
    }

    #[test]
    fn test_direct_descending_reverses_everything() {
        let compiler = compiler_with(vec![column("unordered").with_sort_sql("")]);
        let store = RecordingStore {
            rows: vec![(1, false), (2, true), (3, false)],
            ..Default::default()
        };
        let outcome = compiler.search(
            &store,
            &SqlFragment::match_all(),
            "unordered",
            SortDirection::Descending,
        );
        assert_eq!(outcome, SearchOutcome::Handled(vec![3, 2, 1]));
    }
}
