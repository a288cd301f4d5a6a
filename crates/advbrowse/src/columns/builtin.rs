//! The host's built-in columns.
//!
//! Built-in columns are rendered and sorted by the host. They take part in
//! column validation, and their order clauses drive the native search path.

/// A built-in column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinColumn {
    /// Column type identifier.
    pub column_type: &'static str,
    /// Human-readable label.
    pub display_name: &'static str,
    /// ORDER BY clause used by the native search, if the column is sortable.
    pub order_clause: Option<&'static str>,
}

const STANDARD: &[BuiltinColumn] = &[
    BuiltinColumn {
        column_type: "question",
        display_name: "Question",
        order_clause: None,
    },
    BuiltinColumn {
        column_type: "answer",
        display_name: "Answer",
        order_clause: None,
    },
    BuiltinColumn {
        column_type: "template",
        display_name: "Card",
        order_clause: None,
    },
    BuiltinColumn {
        column_type: "deck",
        display_name: "Deck",
        order_clause: None,
    },
    BuiltinColumn {
        column_type: "noteFld",
        display_name: "Sort Field",
        order_clause: Some("n.sfld COLLATE NOCASE, c.ord"),
    },
    BuiltinColumn {
        column_type: "noteCrt",
        display_name: "Created",
        order_clause: Some("n.id, c.ord"),
    },
    BuiltinColumn {
        column_type: "noteMod",
        display_name: "Edited",
        order_clause: Some("n.mod, c.ord"),
    },
    BuiltinColumn {
        column_type: "cardMod",
        display_name: "Changed",
        order_clause: Some("c.mod"),
    },
    BuiltinColumn {
        column_type: "cardDue",
        display_name: "Due",
        order_clause: Some("c.type, c.due"),
    },
    BuiltinColumn {
        column_type: "cardIvl",
        display_name: "Interval",
        order_clause: Some("c.ivl"),
    },
    BuiltinColumn {
        column_type: "cardEase",
        display_name: "Ease",
        order_clause: Some("(c.type = 0), c.factor"),
    },
    BuiltinColumn {
        column_type: "cardReps",
        display_name: "Reviews",
        order_clause: Some("c.reps"),
    },
    BuiltinColumn {
        column_type: "cardLapses",
        display_name: "Lapses",
        order_clause: Some("c.lapses"),
    },
    BuiltinColumn {
        column_type: "noteTags",
        display_name: "Tags",
        order_clause: None,
    },
    BuiltinColumn {
        column_type: "note",
        display_name: "Note",
        order_clause: None,
    },
];

/// The set of built-in columns currently offered by the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinColumns {
    columns: Vec<BuiltinColumn>,
}

impl BuiltinColumns {
    /// The host's standard column set.
    pub fn standard() -> Self {
        Self {
            columns: STANDARD.to_vec(),
        }
    }

    /// Creates a column set from explicit columns.
    pub fn from_columns(columns: Vec<BuiltinColumn>) -> Self {
        Self { columns }
    }

    /// Returns true if the column type is a built-in column.
    pub fn contains(&self, column_type: &str) -> bool {
        self.get(column_type).is_some()
    }

    /// Looks up a built-in column.
    pub fn get(&self, column_type: &str) -> Option<&BuiltinColumn> {
        self.columns.iter().find(|c| c.column_type == column_type)
    }

    /// Returns the native ORDER BY clause of a column.
    pub fn order_clause(&self, column_type: &str) -> Option<&'static str> {
        self.get(column_type).and_then(|c| c.order_clause)
    }

    /// Iterates over the columns.
    pub fn iter(&self) -> impl Iterator<Item = &BuiltinColumn> {
        self.columns.iter()
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Removes a column, returning it so it can be restored later.
    pub fn remove(&mut self, column_type: &str) -> Option<BuiltinColumn> {
        let index = self
            .columns
            .iter()
            .position(|c| c.column_type == column_type)?;
        Some(self.columns.remove(index))
    }

    /// Re-adds previously removed columns.
    pub fn restore(&mut self, removed: impl IntoIterator<Item = BuiltinColumn>) {
        for column in removed {
            if !self.contains(column.column_type) {
                self.columns.push(column);
            }
        }
    }
}

impl Default for BuiltinColumns {
    fn default() -> Self {
        Self::standard()
    }
}
