//! Sort direction.

use serde::{Deserialize, Serialize};

/// The session-level sort direction.
///
/// Persisted as the boolean `sortBackwards` preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Ascending,
    /// Descending order.
    Descending,
}

impl SortDirection {
    /// Maps the persisted `sortBackwards` flag to a direction.
    pub fn from_backwards(backwards: bool) -> Self {
        if backwards {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }

    /// Returns true for [`SortDirection::Descending`].
    pub fn is_descending(&self) -> bool {
        *self == SortDirection::Descending
    }

    /// Returns the opposite direction.
    pub fn toggled(&self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_backwards() {
        assert_eq!(SortDirection::from_backwards(true), SortDirection::Descending);
        assert_eq!(SortDirection::from_backwards(false), SortDirection::Ascending);
        assert!(SortDirection::Ascending.toggled().is_descending());
    }
}
