//! Numeric-aware, blanks-last ordering.
//!
//! Sort values are compared by, in order:
//!
//! 1. NULL values last,
//! 2. empty strings after every non-empty value,
//! 3. values containing any character other than a digit or `.` as text,
//!    all other values as real numbers (SQLite orders numbers before text),
//! 4. case-insensitively.
//!
//! Plain SQL ordering would put NULL and `''` first and compare `"10a"`
//! before `"9"`.

use crate::types::{RecordId, SortDirection};

/// Builds the ORDER BY terms for a sort value expression.
pub fn order_terms(expr: &str) -> String {
    format!(
        "({e}) IS NULL, ({e}) IS '', \
         CASE WHEN ({e}) GLOB '*[^0-9.]*' THEN ({e}) ELSE CAST(({e}) AS REAL) END COLLATE NOCASE",
        e = expr
    )
}

/// Builds a select column flagging NULL or empty sort values.
pub fn blank_flag(expr: &str) -> String {
    format!("(({e}) IS NULL OR ({e}) IS '')", e = expr)
}

/// Applies the session direction to rows ordered ascending.
///
/// Rows flagged blank sit at the tail of an ascending result. A descending
/// result reverses the ranked head and leaves the blank tail in place, so
/// NULL and empty values stay last in both directions.
pub fn apply_direction(rows: Vec<(RecordId, bool)>, direction: SortDirection) -> Vec<RecordId> {
    if !direction.is_descending() {
        return rows.into_iter().map(|(id, _)| id).collect();
    }

    let split = rows
        .iter()
        .position(|(_, blank)| *blank)
        .unwrap_or(rows.len());
    let mut ids: Vec<RecordId> = rows.iter().map(|(id, _)| *id).collect();
    ids[..split].reverse();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_terms_shape() {
        let terms = order_terms("srt");
        assert!(terms.starts_with("(srt) IS NULL, (srt) IS '', CASE WHEN (srt) GLOB"));
        assert!(terms.ends_with("COLLATE NOCASE"));
        assert_eq!(blank_flag("srt"), "((srt) IS NULL OR (srt) IS '')");
    }

    #[test]
    fn test_apply_direction_ascending_keeps_order() {
        let rows = vec![(1, false), (2, false), (3, true)];
        assert_eq!(apply_direction(rows, SortDirection::Ascending), vec![1, 2, 3]);
    }

    #[test]
    fn test_apply_direction_descending_keeps_blanks_last() {
        let rows = vec![(1, false), (2, false), (3, false), (4, true), (5, true)];
        assert_eq!(
            apply_direction(rows, SortDirection::Descending),
            vec![3, 2, 1, 4, 5]
        );
    }

    #[test]
    fn test_apply_direction_edge_cases() {
        assert!(apply_direction(vec![], SortDirection::Descending).is_empty());
        assert_eq!(
            apply_direction(vec![(1, true), (2, true)], SortDirection::Descending),
            vec![1, 2]
        );
        assert_eq!(
            apply_direction(vec![(1, false), (2, false)], SortDirection::Descending),
            vec![2, 1]
        );
    }
}
