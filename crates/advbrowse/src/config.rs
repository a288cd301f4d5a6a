//! Browser session configuration.
//!
//! All fields have serde defaults, so an empty JSON object is a valid
//! configuration:
//!
//! ```
//! use advbrowse::config::BrowserConfig;
//!
//! let config = BrowserConfig::from_json("{}").unwrap();
//! assert_eq!(config.default_sort_type, "noteFld");
//! assert_eq!(config.sort_table_name, "tmp");
//!
//! let config = BrowserConfig::from_json(r#"{"slow_search_threshold_ms": 50}"#).unwrap();
//! assert_eq!(config.slow_search_threshold_ms, 50);
//! ```

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{BrowserError, BrowserResult};

static SQL_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Configuration for a browser session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Sort column used when the persisted one is missing or invalid.
    #[serde(default = "default_sort_type")]
    pub default_sort_type: String,

    /// Columns shown when no column set has been persisted yet.
    #[serde(default = "default_active_columns")]
    pub default_active_columns: Vec<String>,

    /// Prefix marking a column type as a per-record field reference.
    #[serde(default = "default_field_column_prefix")]
    pub field_column_prefix: String,

    /// Name of the temporary table holding materialized sort values.
    #[serde(default = "default_sort_table_name")]
    pub sort_table_name: String,

    /// Searches slower than this are logged at info level.
    #[serde(default = "default_slow_search_threshold_ms")]
    pub slow_search_threshold_ms: u64,

    /// Keys used in the preference store.
    #[serde(default)]
    pub keys: PreferenceKeys,
}

/// Keys of the persisted session state in the preference store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceKeys {
    /// Ordered list of active column types.
    #[serde(default = "default_active_columns_key")]
    pub active_columns: String,

    /// Active sort column type.
    #[serde(default = "default_sort_type_key")]
    pub sort_type: String,

    /// Whether the sort direction is descending.
    #[serde(default = "default_sort_backwards_key")]
    pub sort_backwards: String,

    /// Whether unique-group mode is enabled.
    #[serde(default = "default_unique_groups_key")]
    pub unique_groups: String,
}

fn default_sort_type() -> String {
    "noteFld".to_string()
}

fn default_active_columns() -> Vec<String> {
    ["noteFld", "template", "cardDue", "deck"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_field_column_prefix() -> String {
    "_field_".to_string()
}

fn default_sort_table_name() -> String {
    "tmp".to_string()
}

fn default_slow_search_threshold_ms() -> u64 {
    500
}

fn default_active_columns_key() -> String {
    "advbrowse_activeCols".to_string()
}

fn default_sort_type_key() -> String {
    "sortType".to_string()
}

fn default_sort_backwards_key() -> String {
    "sortBackwards".to_string()
}

fn default_unique_groups_key() -> String {
    "advbrowse_uniqueNote".to_string()
}

impl Default for PreferenceKeys {
    fn default() -> Self {
        Self {
            active_columns: default_active_columns_key(),
            sort_type: default_sort_type_key(),
            sort_backwards: default_sort_backwards_key(),
            unique_groups: default_unique_groups_key(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            default_sort_type: default_sort_type(),
            default_active_columns: default_active_columns(),
            field_column_prefix: default_field_column_prefix(),
            sort_table_name: default_sort_table_name(),
            slow_search_threshold_ms: default_slow_search_threshold_ms(),
            keys: PreferenceKeys::default(),
        }
    }
}

impl BrowserConfig {
    /// Parses a configuration from JSON and validates it.
    pub fn from_json(json: &str) -> BrowserResult<Self> {
        let config: BrowserConfig =
            serde_json::from_str(json).map_err(|e| BrowserError::Config {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values that end up interpolated into SQL or used as
    /// lookup keys.
    pub fn validate(&self) -> BrowserResult<()> {
        if !SQL_IDENTIFIER.is_match(&self.sort_table_name) {
            return Err(BrowserError::Config {
                message: format!(
                    "sort table name '{}' is not a plain SQL identifier",
                    self.sort_table_name
                ),
            });
        }
        if self.default_sort_type.is_empty() {
            return Err(BrowserError::Config {
                message: "default sort type must not be empty".to_string(),
            });
        }
        if self.field_column_prefix.is_empty() {
            return Err(BrowserError::Config {
                message: "field column prefix must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the slow search threshold as a duration.
    pub fn slow_search_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_search_threshold_ms)
    }
}
