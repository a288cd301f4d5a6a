//! Search text to SQL predicate translation.
//!
//! The session asks a [`PredicateParser`] for the WHERE fragment of every
//! search. Hosts normally plug in their own parser; [`BasicPredicateParser`]
//! covers the common search syntax:
//!
//! | Term | Matches |
//! |---|---|
//! | `word`, `"two words"` | sort field or any field contains the text (`*` is a wildcard) |
//! | `-term` | negation of any term |
//! | `tag:name` | groups tagged `name` (`*` is a wildcard) |
//! | `nid:1,2` / `cid:1,2` | records of the listed groups / the listed records |
//! | `deck:3` | records in deck 3 |
//! | `card:2` | records with template ordinal 2 (1-based) |
//! | `is:new`, `is:learn`, `is:review`, `is:due`, `is:suspended` | scheduling state |
//!
//! ```
//! use advbrowse::query::{BasicPredicateParser, PredicateParser};
//!
//! let parser = BasicPredicateParser::new();
//! let fragment = parser.parse("deck:1 -is:suspended").unwrap();
//! assert_eq!(fragment.sql, "c.did = ?1 AND NOT (c.queue = -1)");
//!
//! assert_eq!(parser.parse("   ").unwrap().sql, "1");
//! assert!(parser.parse("\"unbalanced").is_err());
//! ```

use crate::error::QueryError;
use crate::types::{SqlFragment, SqlParam};

/// Converts search text into a predicate over `cards c` and `notes n`.
pub trait PredicateParser {
    /// Parses search text. Empty text must produce a fragment matching
    /// every record.
    fn parse(&self, text: &str) -> Result<SqlFragment, QueryError>;
}

impl<F> PredicateParser for F
where
    F: Fn(&str) -> Result<SqlFragment, QueryError>,
{
    fn parse(&self, text: &str) -> Result<SqlFragment, QueryError> {
        self(text)
    }
}

/// Parser for the basic search syntax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicPredicateParser {
    today: i64,
}

impl BasicPredicateParser {
    /// Creates a parser whose `is:due` cutoff is day 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current day number used by `is:due`.
    pub fn with_today(mut self, today: i64) -> Self {
        self.today = today;
        self
    }

    fn term(&self, text: &str, term: &str, fragment: &mut SqlFragment) -> Result<String, QueryError> {
        let Some((qualifier, value)) = term.split_once(':') else {
            return Ok(text_condition(term, fragment));
        };

        let qualifier = qualifier.to_ascii_lowercase();
        let known = matches!(
            qualifier.as_str(),
            "tag" | "nid" | "cid" | "deck" | "card" | "is"
        );
        if !known {
            return Ok(text_condition(term, fragment));
        }
        if value.is_empty() {
            return Err(QueryError::invalid_syntax(
                text,
                format!("'{}:' needs a value", qualifier),
            ));
        }

        match qualifier.as_str() {
            "tag" => {
                let placeholder =
                    fragment.add_param(SqlParam::string(format!("% {} %", like_pattern(value))));
                Ok(format!("n.tags LIKE {} ESCAPE '\\'", placeholder))
            }
            "nid" => Ok(format!("c.nid IN ({})", id_list(text, value)?)),
            "cid" => Ok(format!("c.id IN ({})", id_list(text, value)?)),
            "deck" => {
                let deck = parse_int(text, value)?;
                Ok(format!("c.did = {}", fragment.add_param(SqlParam::integer(deck))))
            }
            "card" => {
                let ordinal = parse_int(text, value)?;
                if ordinal < 1 {
                    return Err(QueryError::invalid_syntax(
                        text,
                        "card ordinals start at 1",
                    ));
                }
                Ok(format!(
                    "c.ord = {}",
                    fragment.add_param(SqlParam::integer(ordinal - 1))
                ))
            }
            _ => match value.to_ascii_lowercase().as_str() {
                "new" => Ok("c.type = 0".to_string()),
                "learn" => Ok("c.queue IN (1, 3)".to_string()),
                "review" => Ok("c.type = 2".to_string()),
                "suspended" => Ok("c.queue = -1".to_string()),
                "due" => Ok(format!(
                    "(c.queue IN (2, 3) AND c.due <= {})",
                    fragment.add_param(SqlParam::integer(self.today))
                )),
                other => Err(QueryError::invalid_syntax(
                    text,
                    format!("unknown state 'is:{}'", other),
                )),
            },
        }
    }
}

impl PredicateParser for BasicPredicateParser {
    fn parse(&self, text: &str) -> Result<SqlFragment, QueryError> {
        let mut fragment = SqlFragment::default();
        let mut conditions = Vec::new();

        for token in tokenize(text)? {
            let (negated, term) = match token.strip_prefix('-') {
                Some(rest) if !rest.is_empty() => (true, rest),
                _ => (false, token.as_str()),
            };
            let condition = self.term(text, term, &mut fragment)?;
            if negated {
                conditions.push(format!("NOT ({})", condition));
            } else {
                conditions.push(condition);
            }
        }

        if conditions.is_empty() {
            return Ok(SqlFragment::match_all());
        }
        fragment.sql = conditions.join(" AND ");
        Ok(fragment)
    }
}

/// Splits search text on whitespace outside double quotes. Quotes are
/// removed; a quote may start anywhere in a term (`tag:"a b"`, `-"a b"`).
fn tokenize(text: &str) -> Result<Vec<String>, QueryError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut has_token = false;

    for ch in text.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                has_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if quoted {
        return Err(QueryError::invalid_syntax(text, "unbalanced quotes"));
    }
    if has_token {
        tokens.push(current);
    }
    // `""` is a token with no content and matches everything.
    tokens.retain(|t| !t.is_empty());
    Ok(tokens)
}

fn text_condition(term: &str, fragment: &mut SqlFragment) -> String {
    let placeholder = fragment.add_param(SqlParam::string(format!("%{}%", like_pattern(term))));
    format!(
        "(n.sfld LIKE {p} ESCAPE '\\' OR n.flds LIKE {p} ESCAPE '\\')",
        p = placeholder
    )
}

/// Escapes LIKE metacharacters and turns `*` into `%`.
fn like_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' | '%' | '_' => {
                pattern.push('\\');
                pattern.push(ch);
            }
            '*' => pattern.push('%'),
            c => pattern.push(c),
        }
    }
    pattern
}

fn parse_int(text: &str, value: &str) -> Result<i64, QueryError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| QueryError::invalid_syntax(text, format!("'{}' is not a number", value)))
}

/// Validates a comma separated id list and renders it for an IN clause.
fn id_list(text: &str, value: &str) -> Result<String, QueryError> {
    let ids = value
        .split(',')
        .map(|part| parse_int(text, part))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> SqlFragment {
        BasicPredicateParser::new().parse(text).unwrap()
    }

    #[test]
    fn test_empty_text_matches_all() {
        assert_eq!(parse(""), SqlFragment::match_all());
        assert_eq!(parse("  \"\" "), SqlFragment::match_all());
    }

    #[test]
    fn test_plain_text_is_escaped() {
        let fragment = parse("50%_off");
        assert_eq!(
            fragment.sql,
            "(n.sfld LIKE ?1 ESCAPE '\\' OR n.flds LIKE ?1 ESCAPE '\\')"
        );
        assert_eq!(fragment.params, vec![SqlParam::string("%50\\%\\_off%")]);
    }

    #[test]
    fn test_quoted_phrase_and_wildcard() {
        let fragment = parse("\"big dog\" ca*t");
        assert_eq!(
            fragment.params,
            vec![SqlParam::string("%big dog%"), SqlParam::string("%ca%t%")]
        );
        assert!(fragment.sql.contains(" AND "));
        assert!(fragment.sql.contains("?2"));
    }

    #[test]
    fn test_qualifiers() {
        let fragment = parse("tag:verb nid:1,2 cid:7 deck:3 card:2 is:new");
        assert_eq!(
            fragment.sql,
            "n.tags LIKE ?1 ESCAPE '\\' AND c.nid IN (1, 2) AND c.id IN (7) \
             AND c.did = ?2 AND c.ord = ?3 AND c.type = 0"
        );
        assert_eq!(
            fragment.params,
            vec![
                SqlParam::string("% verb %"),
                SqlParam::integer(3),
                SqlParam::integer(1)
            ]
        );
    }

    #[test]
    fn test_card_qualifiers_do_not_touch_groups() {
        let fragment = parse("deck:1 is:review -is:suspended cid:4,5");
        assert!(!fragment.references_alias("n"));
    }

    #[test]
    fn test_is_due_uses_today() {
        let fragment = BasicPredicateParser::new()
            .with_today(120)
            .parse("is:due")
            .unwrap();
        assert_eq!(fragment.sql, "(c.queue IN (2, 3) AND c.due <= ?1)");
        assert_eq!(fragment.params, vec![SqlParam::integer(120)]);
    }

    #[test]
    fn test_negation() {
        let fragment = parse("-tag:old -\"a b\"");
        assert!(fragment.sql.starts_with("NOT (n.tags LIKE ?1"));
        assert!(fragment.sql.contains("AND NOT ((n.sfld LIKE ?2"));
        // A lone dash is plain text.
        assert_eq!(parse("-").params, vec![SqlParam::string("%-%")]);
    }

    #[test]
    fn test_unknown_qualifier_is_text() {
        let fragment = parse("front:hello");
        assert_eq!(fragment.params, vec![SqlParam::string("%front:hello%")]);
    }

    #[test]
    fn test_syntax_errors() {
        let parser = BasicPredicateParser::new();
        for text in ["\"open", "tag:", "nid:1,x", "deck:main", "card:0", "is:sleeping"] {
            let result = parser.parse(text);
            assert!(
                matches!(result, Err(QueryError::InvalidSyntax { .. })),
                "expected syntax error for {text:?}"
            );
        }
    }

    #[test]
    fn test_closure_parser() {
        let parser = |text: &str| -> Result<SqlFragment, QueryError> {
            Ok(SqlFragment::new(format!("c.id = {}", text.len())))
        };
        assert_eq!(parser.parse("abc").unwrap().sql, "c.id = 3");
    }
}
