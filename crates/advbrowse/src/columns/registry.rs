//! Custom column registry.
//!
//! The registry maps column type identifiers to their definitions and keeps
//! registration order for enumeration. It knows nothing about which columns
//! are displayed; callers that unregister an active column also remove it
//! from the [`ActiveColumnSet`](super::ActiveColumnSet).

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RegistryError;

use super::definition::ColumnDefinition;

/// In-memory registry of custom column definitions.
pub struct ColumnRegistry {
    /// Definitions indexed by column type.
    columns: HashMap<String, Arc<ColumnDefinition>>,

    /// Column types in registration order.
    order: Vec<String>,
}

impl ColumnRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            columns: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Returns the number of registered columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Registers a column, replacing any definition with the same type.
    ///
    /// A replaced column keeps its original position in the enumeration order.
    pub fn register(
        &mut self,
        definition: ColumnDefinition,
    ) -> Result<Arc<ColumnDefinition>, RegistryError> {
        if definition.column_type().is_empty() {
            return Err(RegistryError::InvalidIdentifier {
                column_type: definition.column_type().to_string(),
            });
        }

        let column_type = definition.column_type().to_string();
        let definition = Arc::new(definition);
        let previous = self
            .columns
            .insert(column_type.clone(), Arc::clone(&definition));

        if previous.is_some() {
            tracing::debug!(column_type = %column_type, "replaced custom column definition");
        } else {
            self.order.push(column_type);
        }

        Ok(definition)
    }

    /// Removes a column from the registry.
    pub fn unregister(&mut self, column_type: &str) -> Result<Arc<ColumnDefinition>, RegistryError> {
        let definition =
            self.columns
                .remove(column_type)
                .ok_or_else(|| RegistryError::NotFound {
                    column_type: column_type.to_string(),
                })?;
        self.order.retain(|t| t != column_type);
        Ok(definition)
    }

    /// Looks up a column by type.
    pub fn lookup(&self, column_type: &str) -> Option<Arc<ColumnDefinition>> {
        self.columns.get(column_type).cloned()
    }

    /// Returns true if a column with this type is registered.
    pub fn contains(&self, column_type: &str) -> bool {
        self.columns.contains_key(column_type)
    }

    /// Iterates over the definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ColumnDefinition>> {
        self.order.iter().filter_map(|t| self.columns.get(t))
    }

    /// Returns all registered column types in registration order.
    pub fn column_types(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Returns the definitions sorted case-insensitively by display name.
    pub fn sorted_by_display_name(&self) -> Vec<Arc<ColumnDefinition>> {
        let mut columns: Vec<_> = self.iter().cloned().collect();
        columns.sort_by_cached_key(|c| c.display_name().to_lowercase());
        columns
    }
}

impl Default for ColumnRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ColumnRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnRegistry")
            .field("columns", &self.order)
            .finish()
    }
}
