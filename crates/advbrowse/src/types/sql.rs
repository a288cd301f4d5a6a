//! SQL text with bound parameters.

use std::sync::LazyLock;

use regex::Regex;

static QUALIFIED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\.").expect("qualified name pattern is valid")
});

/// A fragment of SQL with bound parameters.
///
/// Placeholders are numbered (`?1`, `?2`, ...) in the order parameters were
/// added, so a placeholder may be referenced more than once in `sql`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    /// The SQL clause.
    pub sql: String,
    /// Bound parameter values.
    pub params: Vec<SqlParam>,
}

/// A bound SQL parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// String parameter.
    String(String),
    /// Integer parameter.
    Integer(i64),
    /// Float parameter.
    Float(f64),
    /// Null parameter.
    Null,
}

impl SqlParam {
    /// Creates a string parameter.
    pub fn string(s: impl Into<String>) -> Self {
        SqlParam::String(s.into())
    }

    /// Creates an integer parameter.
    pub fn integer(i: i64) -> Self {
        SqlParam::Integer(i)
    }

    /// Creates a float parameter.
    pub fn float(f: f64) -> Self {
        SqlParam::Float(f)
    }
}

impl SqlFragment {
    /// Creates a new SQL fragment.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Creates a fragment with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// The fragment matching every record.
    pub fn match_all() -> Self {
        Self::new("1")
    }

    /// Adds a parameter placeholder and returns the placeholder string.
    pub fn add_param(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("?{}", self.params.len())
    }

    /// Returns true if this fragment is empty.
    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }

    /// Returns the fragment as a WHERE condition: parenthesized, or `1` when empty.
    pub fn as_condition(&self) -> String {
        if self.is_empty() {
            "1".to_string()
        } else {
            format!("({})", self.sql)
        }
    }

    /// Returns true if the SQL references columns through `alias.`.
    pub fn references_alias(&self, alias: &str) -> bool {
        sql_references_alias(&self.sql, alias)
    }
}

/// Returns true if `sql` contains `alias.` as a whole identifier.
pub(crate) fn sql_references_alias(sql: &str, alias: &str) -> bool {
    QUALIFIED_NAME
        .captures_iter(sql)
        .any(|caps| &caps[1] == alias)
}
