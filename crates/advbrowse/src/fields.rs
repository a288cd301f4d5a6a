//! Per-session cache of field descriptors for field columns.
//!
//! A field column displays one named field of a group, and its column type
//! is the field name behind a configurable prefix (`_field_Front`). Rendering
//! asks for the field's descriptor once per cell, so the answer is cached per
//! `(schema, field name)`, including negative answers.

use std::collections::HashMap;
use std::sync::Arc;

use crate::store::SchemaSource;
use crate::types::{FieldDescriptor, SchemaId};

/// Cache of field descriptors keyed by schema and field name.
#[derive(Debug)]
pub struct FieldValueCache {
    prefix: String,
    entries: HashMap<(SchemaId, String), Option<Arc<FieldDescriptor>>>,
    lookups: usize,
    hits: usize,
}

impl FieldValueCache {
    /// Creates an empty cache for column types starting with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            entries: HashMap::new(),
            lookups: 0,
            hits: 0,
        }
    }

    /// Returns the field name a column type refers to, if it is a field column.
    pub fn field_name<'a>(&self, column_type: &'a str) -> Option<&'a str> {
        column_type
            .strip_prefix(self.prefix.as_str())
            .filter(|name| !name.is_empty())
    }

    /// Returns the descriptor of the field a column shows for a schema.
    ///
    /// Non-field columns return `None` without touching the source. A cache
    /// miss performs exactly one schema lookup; a missing schema, missing
    /// field, or failed lookup is remembered as absent.
    pub fn field_descriptor<S>(
        &mut self,
        source: &S,
        schema_id: SchemaId,
        column_type: &str,
    ) -> Option<Arc<FieldDescriptor>>
    where
        S: SchemaSource + ?Sized,
    {
        let name = self.field_name(column_type)?;
        let key = (schema_id, name.to_string());

        if let Some(entry) = self.entries.get(&key) {
            self.hits += 1;
            return entry.clone();
        }

        self.lookups += 1;
        let descriptor = match source.schema_fields(schema_id) {
            Ok(Some(fields)) => fields.into_iter().find(|f| f.name == name).map(Arc::new),
            Ok(None) => {
                tracing::debug!(schema_id, field = %name, "schema not found");
                None
            }
            Err(e) => {
                tracing::warn!(schema_id, field = %name, error = %e, "schema lookup failed");
                None
            }
        };

        self.entries.insert(key, descriptor.clone());
        descriptor
    }

    /// Returns true if the field a column shows is right-to-left.
    pub fn is_rtl<S>(&mut self, source: &S, schema_id: SchemaId, column_type: &str) -> bool
    where
        S: SchemaSource + ?Sized,
    {
        self.field_descriptor(source, schema_id, column_type)
            .is_some_and(|f| f.rtl)
    }

    /// Number of cached entries, absent ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of schema lookups performed.
    pub fn lookups(&self) -> usize {
        self.lookups
    }

    /// Number of answers served from the cache.
    pub fn hits(&self) -> usize {
        self.hits
    }
}
