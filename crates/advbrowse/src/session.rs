//! Browser sessions.
//!
//! A [`BrowserSession`] owns the state of one open browser: the column
//! registry, the displayed columns, the sort column and direction, the
//! unique-group toggle and the current result. It is built by a
//! [`SessionBuilder`], which is where hosts register and remove columns
//! before the persisted state is loaded.
//!
//! Every operation that changes what the display shows runs between
//! [`DisplayModel::begin_reset`] and [`DisplayModel::end_reset`].
//!
//! ```
//! # #[cfg(feature = "sqlite")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use advbrowse::columns::ColumnDefinition;
//! use advbrowse::prefs::MemoryPreferenceStore;
//! use advbrowse::session::SessionBuilder;
//! use advbrowse::store::sqlite::SqliteStore;
//!
//! let store = SqliteStore::in_memory()?;
//! store.init_schema()?;
//!
//! let mut builder = SessionBuilder::new(store);
//! builder.register_column(
//!     ColumnDefinition::new("cardIvl2", "Interval", |record, _, _| record.interval.to_string())
//!         .with_sort_sql("c.ivl"),
//! )?;
//!
//! let mut prefs = MemoryPreferenceStore::new();
//! let mut session = builder.open(&prefs)?;
//! session.set_sort_column("cardIvl2")?;
//! assert!(session.search("deck:1").is_empty());
//!
//! let closed = session.finalize(&mut prefs)?;
//! assert_eq!(closed.builtins.len(), 15);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "sqlite"))]
//! # fn main() {}
//! ```

use std::sync::Arc;

use parking_lot::RwLock;

use crate::columns::{
    ActiveColumnSet, BuiltinColumn, BuiltinColumns, ColumnDefinition, ColumnRegistry,
    SortKeyResolver,
};
use crate::config::BrowserConfig;
use crate::error::{BrowserError, BrowserResult, RegistryError};
use crate::fields::FieldValueCache;
use crate::prefs::{BrowserPreferences, PreferenceStore};
use crate::query::{
    BasicPredicateParser, BuiltinNativeSearch, NativeSearch, PredicateParser, QueryCompiler,
    ResultPostFilter, SearchOutcome, SearchStrategy,
};
use crate::store::{RecordStore, SchemaSource};
use crate::types::{FieldDescriptor, Group, Record, RecordId, SortDirection};

/// The view that displays search results.
pub trait DisplayModel {
    /// Called before the displayed rows or columns change.
    fn begin_reset(&mut self);

    /// Called after the change is complete.
    fn end_reset(&mut self);
}

/// A display model that ignores resets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoopDisplay;

impl DisplayModel for NoopDisplay {
    fn begin_reset(&mut self) {}

    fn end_reset(&mut self) {}
}

/// Ends the reset bracket when dropped.
struct ResetGuard<'a, D: DisplayModel> {
    display: &'a mut D,
}

impl<'a, D: DisplayModel> ResetGuard<'a, D> {
    fn begin(display: &'a mut D) -> Self {
        display.begin_reset();
        Self { display }
    }
}

impl<D: DisplayModel> Drop for ResetGuard<'_, D> {
    fn drop(&mut self) {
        self.display.end_reset();
    }
}

/// A column that can be shown in the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableColumn {
    /// Column type identifier.
    pub column_type: String,
    /// Human-readable label.
    pub display_name: String,
    /// Whether the column is a registered custom column.
    pub custom: bool,
}

/// Builds a [`BrowserSession`].
pub struct SessionBuilder<S, D = NoopDisplay> {
    store: S,
    display: D,
    config: BrowserConfig,
    parser: Box<dyn PredicateParser>,
    native: Option<Box<dyn NativeSearch>>,
    registry: ColumnRegistry,
    builtins: BuiltinColumns,
    columns_to_remove: Vec<String>,
    forced_strategy: Option<SearchStrategy>,
}

impl<S> SessionBuilder<S, NoopDisplay>
where
    S: RecordStore + SchemaSource,
{
    /// Creates a builder with the default configuration, the basic
    /// predicate parser and the standard built-in columns.
    pub fn new(store: S) -> Self {
        Self {
            store,
            display: NoopDisplay,
            config: BrowserConfig::default(),
            parser: Box::new(BasicPredicateParser::new()),
            native: None,
            registry: ColumnRegistry::new(),
            builtins: BuiltinColumns::standard(),
            columns_to_remove: Vec::new(),
            forced_strategy: None,
        }
    }
}

impl<S, D> SessionBuilder<S, D>
where
    S: RecordStore + SchemaSource,
    D: DisplayModel,
{
    /// Sets the display model.
    pub fn with_display<D2: DisplayModel>(self, display: D2) -> SessionBuilder<S, D2> {
        SessionBuilder {
            store: self.store,
            display,
            config: self.config,
            parser: self.parser,
            native: self.native,
            registry: self.registry,
            builtins: self.builtins,
            columns_to_remove: self.columns_to_remove,
            forced_strategy: self.forced_strategy,
        }
    }

    /// Sets the configuration. It is validated by [`open`](Self::open).
    pub fn with_config(mut self, config: BrowserConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the predicate parser.
    pub fn with_parser<P: PredicateParser + 'static>(mut self, parser: P) -> Self {
        self.parser = Box::new(parser);
        self
    }

    /// Sets the native search. Defaults to [`BuiltinNativeSearch`].
    pub fn with_native_search<N: NativeSearch + 'static>(mut self, native: N) -> Self {
        self.native = Some(Box::new(native));
        self
    }

    /// Replaces the built-in column set.
    pub fn with_builtin_columns(mut self, builtins: BuiltinColumns) -> Self {
        self.builtins = builtins;
        self
    }

    /// Forces a search strategy for every custom column sort.
    pub fn with_forced_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.forced_strategy = Some(strategy);
        self
    }

    /// Registers a custom column.
    pub fn register_column(
        &mut self,
        definition: ColumnDefinition,
    ) -> BrowserResult<Arc<ColumnDefinition>> {
        Ok(self.registry.register(definition)?)
    }

    /// Hides a built-in or custom column for the lifetime of the session.
    pub fn remove_column(&mut self, column_type: impl Into<String>) {
        self.columns_to_remove.push(column_type.into());
    }

    /// Loads the persisted state and opens the session.
    ///
    /// Persisted columns that no longer exist are dropped. An unknown sort
    /// column is replaced by the default sort column, which is then shown.
    /// Fails if the default sort column is neither built in nor registered
    /// once the removals are applied.
    pub fn open(self, prefs: &dyn PreferenceStore) -> BrowserResult<BrowserSession<S, D>> {
        self.config.validate()?;

        let config = self.config;
        let mut registry = self.registry;
        let mut builtins = self.builtins;
        let mut removed_builtins = Vec::new();

        for column_type in &self.columns_to_remove {
            if *column_type == config.default_sort_type {
                tracing::warn!(column_type = %column_type, "the default sort column cannot be removed");
                continue;
            }
            if !hide_column(&mut registry, &mut builtins, &mut removed_builtins, column_type) {
                tracing::debug!(column_type = %column_type, "column to remove is not known");
            }
        }

        let is_valid = |column_type: &str| {
            builtins.contains(column_type) || registry.contains(column_type)
        };
        if !is_valid(&config.default_sort_type) {
            return Err(BrowserError::Config {
                message: format!(
                    "default sort column '{}' is neither built in nor registered",
                    config.default_sort_type
                ),
            });
        }

        let saved = BrowserPreferences::load(prefs, &config.keys);

        let persisted = saved
            .active_columns
            .filter(|columns| !columns.is_empty())
            .unwrap_or_else(|| config.default_active_columns.clone());
        let (mut active, dropped) = ActiveColumnSet::from_persisted(&persisted, &is_valid);
        if !dropped.is_empty() {
            tracing::warn!(dropped = ?dropped, "dropping unknown persisted columns");
        }

        let sort_type = match saved.sort_type {
            Some(sort_type) if is_valid(&sort_type) => sort_type,
            other => {
                if let Some(sort_type) = other {
                    tracing::warn!(sort_type = %sort_type, "unknown persisted sort column, using default");
                }
                active.push(config.default_sort_type.clone());
                config.default_sort_type.clone()
            }
        };
        if active.is_empty() {
            active.push(sort_type.clone());
        }

        tracing::info!(
            custom_columns = registry.len(),
            active_columns = active.len(),
            sort_type = %sort_type,
            "browser session opened"
        );

        let registry = Arc::new(RwLock::new(registry));
        let mut compiler = QueryCompiler::new(SortKeyResolver::new(Arc::clone(&registry)), &config);
        if let Some(strategy) = self.forced_strategy {
            compiler = compiler.with_forced_strategy(strategy);
        }

        Ok(BrowserSession {
            display: self.display,
            state: SessionState {
                store: self.store,
                fields: FieldValueCache::new(config.field_column_prefix.clone()),
                parser: self.parser,
                native: self
                    .native
                    .unwrap_or_else(|| Box::new(BuiltinNativeSearch::new())),
                registry,
                compiler,
                builtins,
                removed_builtins,
                active,
                sort_type,
                direction: SortDirection::from_backwards(saved.sort_backwards),
                post_filter: ResultPostFilter::new(saved.unique_groups),
                last_search: String::new(),
                results: Vec::new(),
                config,
            },
        })
    }
}

/// Removes a column from the registry and the built-in list. Returns false
/// if it was in neither.
fn hide_column(
    registry: &mut ColumnRegistry,
    builtins: &mut BuiltinColumns,
    removed_builtins: &mut Vec<BuiltinColumn>,
    column_type: &str,
) -> bool {
    let custom = registry.unregister(column_type).is_ok();
    let builtin = match builtins.remove(column_type) {
        Some(column) => {
            removed_builtins.push(column);
            true
        }
        None => false,
    };
    custom || builtin
}

/// What remains of a session after [`BrowserSession::finalize`].
#[derive(Debug)]
pub struct ClosedSession<S, D> {
    /// The record store.
    pub store: S,
    /// The display model.
    pub display: D,
    /// The built-in columns, with removed ones restored.
    pub builtins: BuiltinColumns,
}

/// An open browser.
pub struct BrowserSession<S, D = NoopDisplay> {
    display: D,
    state: SessionState<S>,
}

struct SessionState<S> {
    store: S,
    config: BrowserConfig,
    parser: Box<dyn PredicateParser>,
    native: Box<dyn NativeSearch>,
    registry: Arc<RwLock<ColumnRegistry>>,
    compiler: QueryCompiler,
    builtins: BuiltinColumns,
    removed_builtins: Vec<BuiltinColumn>,
    active: ActiveColumnSet,
    sort_type: String,
    direction: SortDirection,
    post_filter: ResultPostFilter,
    fields: FieldValueCache,
    last_search: String,
    results: Vec<RecordId>,
}

impl<S> SessionState<S>
where
    S: RecordStore + SchemaSource,
{
    fn is_known(&self, column_type: &str) -> bool {
        self.builtins.contains(column_type) || self.registry.read().contains(column_type)
    }

    fn run_search(&mut self) {
        let predicate = match self.parser.parse(&self.last_search) {
            Ok(predicate) => predicate,
            Err(e) => {
                tracing::warn!(error = %e, "invalid search, showing no results");
                self.results.clear();
                return;
            }
        };

        let outcome =
            self.compiler
                .search(&self.store, &predicate, &self.sort_type, self.direction);
        let ids = match outcome {
            SearchOutcome::Handled(ids) => ids,
            SearchOutcome::NotHandled => match self.native.find_records(
                &self.store,
                &predicate,
                &self.sort_type,
                self.direction,
            ) {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::warn!(error = %e, "native search failed, showing no results");
                    Vec::new()
                }
            },
        };

        self.results = self.post_filter.apply(&self.store, ids);
        tracing::debug!(
            sort_type = %self.sort_type,
            direction = ?self.direction,
            results = self.results.len(),
            "search complete"
        );
    }

    /// Drops a column that no longer exists from the displayed state.
    /// Returns true if the sort column had to be reset.
    fn forget_column(&mut self, column_type: &str) -> bool {
        self.active.remove(column_type);
        let reset_sort = self.sort_type == column_type;
        if reset_sort {
            self.sort_type = self.config.default_sort_type.clone();
            self.active.push(self.sort_type.clone());
        }
        if self.active.is_empty() {
            self.active.push(self.sort_type.clone());
        }
        reset_sort
    }

    fn load_cell(&self, record_id: RecordId) -> Option<(Record, Group)> {
        let record = match self.store.record(record_id) {
            Ok(record) => record?,
            Err(e) => {
                tracing::warn!(record_id, error = %e, "failed to load record");
                return None;
            }
        };
        match self.store.group(record.group_id) {
            Ok(group) => group.map(|group| (record, group)),
            Err(e) => {
                tracing::warn!(group_id = record.group_id, error = %e, "failed to load group");
                None
            }
        }
    }
}

impl<S, D> BrowserSession<S, D>
where
    S: RecordStore + SchemaSource,
    D: DisplayModel,
{
    /// Runs a search and returns the ordered record ids.
    ///
    /// Never fails: invalid search text and store failures produce an empty
    /// result.
    pub fn search(&mut self, text: &str) -> &[RecordId] {
        let _reset = ResetGuard::begin(&mut self.display);
        self.state.last_search = text.to_string();
        self.state.run_search();
        &self.state.results
    }

    /// The result of the last search.
    pub fn results(&self) -> &[RecordId] {
        &self.state.results
    }

    /// The text of the last search.
    pub fn last_search(&self) -> &str {
        &self.state.last_search
    }

    /// Shows or hides a column. The last displayed column cannot be hidden.
    ///
    /// Returns whether the column is displayed afterwards.
    pub fn toggle_column(&mut self, column_type: &str) -> BrowserResult<bool> {
        if !self.state.is_known(column_type) {
            return Err(RegistryError::NotFound {
                column_type: column_type.to_string(),
            }
            .into());
        }
        let _reset = ResetGuard::begin(&mut self.display);
        Ok(self.state.active.toggle(column_type))
    }

    /// Sorts by a column and re-runs the last search.
    pub fn set_sort_column(&mut self, column_type: &str) -> BrowserResult<&[RecordId]> {
        if !self.state.is_known(column_type) {
            return Err(RegistryError::NotFound {
                column_type: column_type.to_string(),
            }
            .into());
        }
        let _reset = ResetGuard::begin(&mut self.display);
        self.state.sort_type = column_type.to_string();
        self.state.run_search();
        Ok(&self.state.results)
    }

    /// Changes the sort direction and re-runs the last search.
    pub fn set_sort_direction(&mut self, direction: SortDirection) -> &[RecordId] {
        let _reset = ResetGuard::begin(&mut self.display);
        self.state.direction = direction;
        self.state.run_search();
        &self.state.results
    }

    /// Flips unique-group mode and re-runs the last search.
    ///
    /// Returns whether the mode is on afterwards.
    pub fn toggle_unique_groups(&mut self) -> bool {
        let _reset = ResetGuard::begin(&mut self.display);
        let enabled = !self.state.post_filter.unique_groups();
        self.state.post_filter = ResultPostFilter::new(enabled);
        self.state.run_search();
        enabled
    }

    /// Registers a custom column. It is not displayed until toggled on.
    pub fn register_column(
        &mut self,
        definition: ColumnDefinition,
    ) -> BrowserResult<Arc<ColumnDefinition>> {
        Ok(self.state.registry.write().register(definition)?)
    }

    /// Unregisters a custom column and removes it from the displayed columns.
    /// A custom default sort column cannot be unregistered.
    ///
    /// If it was the sort column, the default sort column takes over and the
    /// last search is re-run.
    pub fn unregister_column(&mut self, column_type: &str) -> BrowserResult<Arc<ColumnDefinition>> {
        if column_type == self.state.config.default_sort_type
            && !self.state.builtins.contains(column_type)
        {
            return Err(RegistryError::Protected {
                column_type: column_type.to_string(),
            }
            .into());
        }

        let definition = self.state.registry.write().unregister(column_type)?;

        let _reset = ResetGuard::begin(&mut self.display);
        if self.state.forget_column(column_type) {
            self.state.run_search();
        }
        Ok(definition)
    }

    /// Hides a built-in or custom column until the session is finalized.
    pub fn remove_column(&mut self, column_type: &str) -> BrowserResult<()> {
        if column_type == self.state.config.default_sort_type {
            return Err(RegistryError::Protected {
                column_type: column_type.to_string(),
            }
            .into());
        }

        let hidden = {
            let state = &mut self.state;
            let mut registry = state.registry.write();
            hide_column(
                &mut registry,
                &mut state.builtins,
                &mut state.removed_builtins,
                column_type,
            )
        };
        if !hidden {
            return Err(RegistryError::NotFound {
                column_type: column_type.to_string(),
            }
            .into());
        }

        let _reset = ResetGuard::begin(&mut self.display);
        if self.state.forget_column(column_type) {
            self.state.run_search();
        }
        Ok(())
    }

    /// Built-in and custom columns sorted case-insensitively by label.
    pub fn available_columns(&self) -> Vec<AvailableColumn> {
        let registry = self.state.registry.read();
        let mut columns: Vec<AvailableColumn> = self
            .state
            .builtins
            .iter()
            .filter(|c| !registry.contains(c.column_type))
            .map(|c| AvailableColumn {
                column_type: c.column_type.to_string(),
                display_name: c.display_name.to_string(),
                custom: false,
            })
            .collect();
        columns.extend(registry.iter().map(|c| AvailableColumn {
            column_type: c.column_type().to_string(),
            display_name: c.display_name().to_string(),
            custom: true,
        }));
        columns.sort_by_cached_key(|c| c.display_name.to_lowercase());
        columns
    }

    /// Returns true if the column type is a registered custom column.
    pub fn is_custom_column(&self, column_type: &str) -> bool {
        self.state.registry.read().contains(column_type)
    }

    /// Computes the value of a custom column cell. Built-in columns are
    /// rendered by the host and return `None`.
    pub fn cell_value(&self, record_id: RecordId, column_type: &str) -> Option<String> {
        let definition = self.state.registry.read().lookup(column_type)?;
        let (record, group) = self.state.load_cell(record_id)?;
        Some(definition.value(&record, &group))
    }

    /// Returns the descriptor of the field a field column shows for a record.
    pub fn field_descriptor(
        &mut self,
        record_id: RecordId,
        column_type: &str,
    ) -> Option<Arc<FieldDescriptor>> {
        self.state.fields.field_name(column_type)?;
        let (_, group) = self.state.load_cell(record_id)?;
        self.state
            .fields
            .field_descriptor(&self.state.store, group.schema_id, column_type)
    }

    /// Returns true if the field a field column shows for a record is
    /// right-to-left.
    pub fn is_rtl(&mut self, record_id: RecordId, column_type: &str) -> bool {
        self.field_descriptor(record_id, column_type)
            .is_some_and(|f| f.rtl)
    }

    /// Displayed columns in order.
    pub fn active_columns(&self) -> &[String] {
        self.state.active.as_slice()
    }

    /// The sort column type.
    pub fn sort_type(&self) -> &str {
        &self.state.sort_type
    }

    /// The sort direction.
    pub fn sort_direction(&self) -> SortDirection {
        self.state.direction
    }

    /// Whether unique-group mode is on.
    pub fn unique_groups(&self) -> bool {
        self.state.post_filter.unique_groups()
    }

    /// The built-in columns currently offered.
    pub fn builtin_columns(&self) -> &BuiltinColumns {
        &self.state.builtins
    }

    /// The field descriptor cache.
    pub fn field_cache(&self) -> &FieldValueCache {
        &self.state.fields
    }

    /// The session configuration.
    pub fn config(&self) -> &BrowserConfig {
        &self.state.config
    }

    /// The record store.
    pub fn store(&self) -> &S {
        &self.state.store
    }

    /// The display model.
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Saves the session state, restores removed built-in columns and closes
    /// the session.
    pub fn finalize(self, prefs: &mut dyn PreferenceStore) -> BrowserResult<ClosedSession<S, D>> {
        let BrowserSession { display, state } = self;

        let saved = BrowserPreferences {
            active_columns: Some(state.active.into_vec()),
            sort_type: Some(state.sort_type),
            sort_backwards: state.direction.is_descending(),
            unique_groups: state.post_filter.unique_groups(),
        };
        saved.save(prefs, &state.config.keys);
        prefs.flush()?;

        let mut builtins = state.builtins;
        builtins.restore(state.removed_builtins);

        tracing::info!(builtin_columns = builtins.len(), "browser session finalized");
        Ok(ClosedSession {
            store: state.store,
            display,
            builtins,
        })
    }
}
