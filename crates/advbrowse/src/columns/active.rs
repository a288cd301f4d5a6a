//! The ordered set of displayed columns.

/// Ordered, duplicate-free list of the column types currently displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveColumnSet {
    columns: Vec<String>,
}

impl ActiveColumnSet {
    /// Creates a column set, dropping duplicates and empty identifiers.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        for column in columns {
            set.push(column);
        }
        set
    }

    /// Builds a column set from persisted identifiers, keeping only those
    /// accepted by `is_valid`.
    ///
    /// Returns the set together with the identifiers that were dropped.
    pub fn from_persisted<F>(persisted: &[String], is_valid: F) -> (Self, Vec<String>)
    where
        F: Fn(&str) -> bool,
    {
        let mut dropped = Vec::new();
        let mut set = Self::default();
        for column in persisted {
            if is_valid(column) {
                set.push(column.clone());
            } else {
                dropped.push(column.clone());
            }
        }
        (set, dropped)
    }

    /// Appends a column if not already present. Returns true if it was added.
    pub fn push(&mut self, column_type: impl Into<String>) -> bool {
        let column_type = column_type.into();
        if column_type.is_empty() || self.contains(&column_type) {
            return false;
        }
        self.columns.push(column_type);
        true
    }

    /// Removes a column, preserving the order of the others.
    pub fn remove(&mut self, column_type: &str) -> bool {
        let before = self.columns.len();
        self.columns.retain(|c| c != column_type);
        self.columns.len() != before
    }

    /// Shows a hidden column or hides a shown one.
    ///
    /// The last remaining column cannot be hidden. Returns whether the column
    /// is active afterwards.
    pub fn toggle(&mut self, column_type: &str) -> bool {
        if self.contains(column_type) {
            if self.columns.len() > 1 {
                self.remove(column_type);
                false
            } else {
                true
            }
        } else {
            self.push(column_type)
        }
    }

    /// Returns true if the column is displayed.
    pub fn contains(&self, column_type: &str) -> bool {
        self.columns.iter().any(|c| c == column_type)
    }

    /// Returns the position of a column.
    pub fn position(&self, column_type: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column_type)
    }

    /// Returns the column type displayed at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(String::as_str)
    }

    /// Returns the columns in display order.
    pub fn as_slice(&self) -> &[String] {
        &self.columns
    }

    /// Iterates over the columns in display order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    /// Returns the number of displayed columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if no column is displayed.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Consumes the set, returning the column types.
    pub fn into_vec(self) -> Vec<String> {
        self.columns
    }
}
