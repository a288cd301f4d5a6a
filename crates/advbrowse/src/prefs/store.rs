//! Preference store implementations.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::PreferenceStore;
use crate::error::PreferenceError;

/// In-memory preference store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryPreferenceStore {
    values: HashMap<String, Value>,
    flushes: usize,
}

impl MemoryPreferenceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `flush` was called.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    fn flush(&mut self) -> Result<(), PreferenceError> {
        self.flushes += 1;
        Ok(())
    }
}

/// Preference store backed by a JSON object in a file.
///
/// A missing file starts empty. A file that is not a JSON object is logged
/// and replaced on the next flush.
#[derive(Debug, Clone)]
pub struct JsonFilePreferenceStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFilePreferenceStore {
    /// Opens the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PreferenceError> {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    tracing::warn!(path = %path.display(), "preference file is not a JSON object, starting empty");
                    Map::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Map::new(),
            Err(e) => {
                return Err(PreferenceError::Io {
                    path: path.display().to_string(),
                    message: e.to_string(),
                });
            }
        };

        tracing::debug!(path = %path.display(), keys = values.len(), "opened preference file");
        Ok(Self { path, values })
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonFilePreferenceStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    fn flush(&mut self) -> Result<(), PreferenceError> {
        let text = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, text).map_err(|e| PreferenceError::Io {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }
}
