//! Persisted browser state.
//!
//! The host keeps a flat key-value store of JSON values. A session reads its
//! state from it once at open and writes it back once at finalize. Values
//! written by other versions may be malformed; they are dropped with a
//! warning instead of failing the session.

mod store;

pub use store::{JsonFilePreferenceStore, MemoryPreferenceStore};

use serde_json::Value;

use crate::config::PreferenceKeys;
use crate::error::PreferenceError;

/// Flat key-value preference storage.
pub trait PreferenceStore {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores a value under `key`.
    fn set(&mut self, key: &str, value: Value);

    /// Makes previous writes durable.
    fn flush(&mut self) -> Result<(), PreferenceError>;
}

/// The session state kept in the preference store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowserPreferences {
    /// Ordered active column types; `None` when never persisted.
    pub active_columns: Option<Vec<String>>,
    /// Active sort column type.
    pub sort_type: Option<String>,
    /// Whether the sort direction is descending.
    pub sort_backwards: bool,
    /// Whether unique-group mode is enabled.
    pub unique_groups: bool,
}

impl BrowserPreferences {
    /// Reads the session state, dropping malformed values.
    pub fn load(store: &dyn PreferenceStore, keys: &PreferenceKeys) -> Self {
        Self {
            active_columns: store
                .get(&keys.active_columns)
                .and_then(|v| string_list(&keys.active_columns, v)),
            sort_type: store.get(&keys.sort_type).and_then(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s),
                other => {
                    malformed(&keys.sort_type, &other);
                    None
                }
            }),
            sort_backwards: store
                .get(&keys.sort_backwards)
                .map(|v| flag(&keys.sort_backwards, v))
                .unwrap_or(false),
            unique_groups: store
                .get(&keys.unique_groups)
                .map(|v| flag(&keys.unique_groups, v))
                .unwrap_or(false),
        }
    }

    /// Writes the session state. Does not flush.
    pub fn save(&self, store: &mut dyn PreferenceStore, keys: &PreferenceKeys) {
        if let Some(columns) = &self.active_columns {
            store.set(&keys.active_columns, Value::from(columns.clone()));
        }
        if let Some(sort_type) = &self.sort_type {
            store.set(&keys.sort_type, Value::from(sort_type.as_str()));
        }
        store.set(&keys.sort_backwards, Value::Bool(self.sort_backwards));
        store.set(&keys.unique_groups, Value::Bool(self.unique_groups));
    }
}

fn malformed(key: &str, value: &Value) {
    tracing::warn!(key = %key, value = %value, "dropping malformed preference");
}

fn string_list(key: &str, value: Value) -> Option<Vec<String>> {
    let Value::Array(items) = value else {
        malformed(key, &value);
        return None;
    };

    let mut columns = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => columns.push(s),
            other => malformed(key, &other),
        }
    }
    Some(columns)
}

/// Accepts booleans and the integers 0 and 1.
fn flag(key: &str, value: Value) -> bool {
    match value {
        Value::Bool(b) => b,
        Value::Number(n) if n.as_i64() == Some(0) => false,
        Value::Number(n) if n.as_i64() == Some(1) => true,
        other => {
            malformed(key, &other);
            false
        }
    }
}
