//! Error types for the browser search engine.
//!
//! Errors are split by the layer they originate from: query parsing, the
//! record store, the column registry and the preference store. Most of them
//! never reach the end user: a search absorbs failures and degrades to an
//! empty result or to the native fallback path.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::fmt;

use thiserror::Error;

/// The primary error type for fallible browser operations.
#[derive(Error, Debug)]
pub enum BrowserError {
    /// Query parsing errors
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Record store errors
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Column registry errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Preference persistence errors
    #[error(transparent)]
    Preference(#[from] PreferenceError),

    /// The session configuration is unusable.
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

/// Errors produced while turning user input into SQL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The predicate parser rejected the search text.
    #[error("invalid search syntax in '{query}': {message}")]
    InvalidSyntax { query: String, message: String },

    /// A column's sort expression callback failed.
    #[error("sort expression for column '{column_type}' failed: {message}")]
    SortExpression {
        column_type: String,
        message: String,
    },
}

impl QueryError {
    /// Creates an invalid syntax error.
    pub fn invalid_syntax(query: impl Into<String>, message: impl Into<String>) -> Self {
        QueryError::InvalidSyntax {
            query: query.into(),
            message: message.into(),
        }
    }
}

/// The stage of a search at which a store failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStage {
    /// Creating the temporary sort projection.
    Projection,
    /// Running the final ordered (or unordered) select.
    FinalQuery,
    /// Dropping the temporary sort projection.
    Cleanup,
    /// Resolving record to group mappings after the search.
    PostFilter,
    /// The host's native search path.
    Native,
}

impl fmt::Display for SearchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStage::Projection => write!(f, "projection"),
            SearchStage::FinalQuery => write!(f, "final query"),
            SearchStage::Cleanup => write!(f, "cleanup"),
            SearchStage::PostFilter => write!(f, "post filter"),
            SearchStage::Native => write!(f, "native search"),
        }
    }
}

/// Errors originating from the relational store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Opening the store failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// A statement failed at a known search stage.
    #[error("{stage} failed: {message}")]
    Execution { stage: SearchStage, message: String },

    /// Schema creation or migration failed.
    #[error("schema migration failed: {message}")]
    Migration { message: String },

    /// Stored JSON could not be decoded.
    #[error("serialization error: {message}")]
    Serialization { message: String },

    /// Internal store error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StoreError {
    /// Tags this error with the search stage it happened in.
    pub fn at_stage(self, stage: SearchStage) -> Self {
        match self {
            StoreError::Execution { .. } => self,
            other => StoreError::Execution {
                stage,
                message: other.to_string(),
            },
        }
    }
}

/// Errors raised by the column registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Column type identifiers must be non-empty.
    #[error("invalid column type identifier: '{column_type}'")]
    InvalidIdentifier { column_type: String },

    /// No column with this type is registered.
    #[error("column not registered: {column_type}")]
    NotFound { column_type: String },

    /// The column cannot be removed from the session.
    #[error("column cannot be removed: {column_type}")]
    Protected { column_type: String },
}

/// Errors raised while reading or writing persisted preferences.
#[derive(Error, Debug)]
pub enum PreferenceError {
    /// The preference file could not be read or written.
    #[error("preference file {path}: {message}")]
    Io { path: String, message: String },

    /// Preferences could not be encoded.
    #[error("preference serialization error: {message}")]
    Serialization { message: String },
}

/// Result type alias for fallible browser operations.
pub type BrowserResult<T> = Result<T, BrowserError>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for PreferenceError {
    fn from(err: serde_json::Error) -> Self {
        PreferenceError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_display() {
        let err = QueryError::invalid_syntax("tag:", "missing value");
        assert_eq!(
            err.to_string(),
            "invalid search syntax in 'tag:': missing value"
        );
    }

    #[test]
    fn test_store_error_at_stage() {
        let err = StoreError::Migration {
            message: "boom".to_string(),
        }
        .at_stage(SearchStage::Projection);
        assert_eq!(
            err.to_string(),
            "projection failed: schema migration failed: boom"
        );

        let tagged = StoreError::Execution {
            stage: SearchStage::FinalQuery,
            message: "no such column".to_string(),
        };
        let retagged = tagged.at_stage(SearchStage::Cleanup);
        assert!(matches!(
            retagged,
            StoreError::Execution {
                stage: SearchStage::FinalQuery,
                ..
            }
        ));
    }

    #[test]
    fn test_browser_error_from_registry() {
        let err: BrowserError = RegistryError::NotFound {
            column_type: "overdue".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "column not registered: overdue");
    }
}
