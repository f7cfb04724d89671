//! Attribute filters for dataset queries.
//!
//! Supports the subset of SQL-like `where` clauses used to select OSM features:
//! `key IS NOT NULL`, `key IS NULL`, `key='value'`, `key!='value'` (or `<>`), clauses
//! joined with `AND` and `OR`, and `*` or an empty string to match everything. `AND`
//! binds tighter than `OR`; there are no parentheses. Keywords and operators inside
//! single-quoted values are literal text.
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AttributePredicate {
    #[default]
    All,
    IsNull(String),
    NotNull(String),
    Equals(String, String),
    NotEquals(String, String),
    And(Vec<AttributePredicate>),
    Or(Vec<AttributePredicate>),
}

impl AttributePredicate {
    pub fn not_null(key: impl Into<String>) -> Self {
        Self::NotNull(key.into())
    }

    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals(key.into(), value.into())
    }

    /// Evaluates the predicate against a feature's properties. Missing properties count
    /// as null.
    pub fn matches(&self, properties: &Map<String, Value>) -> bool {
        match self {
            Self::All => true,
            Self::IsNull(key) => properties.get(key).is_none_or(Value::is_null),
            Self::NotNull(key) => properties.get(key).is_some_and(|v| !v.is_null()),
            Self::Equals(key, expected) => properties
                .get(key)
                .and_then(value_text)
                .is_some_and(|v| v == *expected),
            Self::NotEquals(key, expected) => properties
                .get(key)
                .and_then(value_text)
                .is_some_and(|v| v != *expected),
            Self::And(clauses) => clauses.iter().all(|c| c.matches(properties)),
            Self::Or(alternatives) => alternatives.iter().any(|c| c.matches(properties)),
        }
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn unquote(raw: &str, quote: char) -> &str {
    let raw = raw.trim();
    raw.strip_prefix(quote)
        .and_then(|s| s.strip_suffix(quote))
        .unwrap_or(raw)
}

fn parse_key(raw: &str) -> Result<String> {
    let key = unquote(raw, '"');
    if key.is_empty() {
        return Err(Error::Parse("predicate is missing an attribute name".into()));
    }
    Ok(key.to_owned())
}

/// Byte offsets of `needle` in `input` that lie outside single-quoted spans.
fn unquoted_matches<'a>(input: &'a str, needle: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
    let bytes = input.as_bytes();
    let mut quoted = false;
    (0..bytes.len()).filter(move |&i| {
        if bytes[i] == b'\'' {
            quoted = !quoted;
            return false;
        }
        !quoted
            && bytes.len() - i >= needle.len()
            && bytes[i..i + needle.len()].eq_ignore_ascii_case(needle)
    })
}

/// Splits on `keyword` (any case) surrounded by whitespace, outside of quoted values.
fn split_keyword<'a>(input: &'a str, keyword: &[u8]) -> Vec<&'a str> {
    let bytes = input.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    for i in unquoted_matches(input, keyword) {
        let end = i + keyword.len();
        let before = i > start && bytes[i - 1].is_ascii_whitespace();
        let after = end < bytes.len() && bytes[end].is_ascii_whitespace();
        if before && after {
            parts.push(&input[start..i]);
            start = end;
        }
    }
    parts.push(&input[start..]);
    parts
}

fn find_operator<'a>(clause: &'a str, op: &str) -> Option<(&'a str, &'a str)> {
    let i = unquoted_matches(clause, op.as_bytes()).next()?;
    Some((&clause[..i], &clause[i + op.len()..]))
}

fn parse_clause(clause: &str) -> Result<AttributePredicate> {
    let clause = clause.trim();
    if clause.is_empty() || clause == "*" {
        return Ok(AttributePredicate::All);
    }

    let upper = clause.to_ascii_uppercase();
    if let Some(key) = upper.strip_suffix(" IS NOT NULL") {
        return Ok(AttributePredicate::NotNull(parse_key(&clause[..key.len()])?));
    }
    if let Some(key) = upper.strip_suffix(" IS NULL") {
        return Ok(AttributePredicate::IsNull(parse_key(&clause[..key.len()])?));
    }

    for op in ["!=", "<>"] {
        if let Some((key, value)) = find_operator(clause, op) {
            return Ok(AttributePredicate::NotEquals(
                parse_key(key)?,
                unquote(value, '\'').to_owned(),
            ));
        }
    }
    if let Some((key, value)) = find_operator(clause, "=") {
        return Ok(AttributePredicate::Equals(
            parse_key(key)?,
            unquote(value, '\'').to_owned(),
        ));
    }

    Err(Error::Parse(format!("unsupported predicate clause '{clause}'")))
}

fn parse_conjunction(input: &str) -> Result<AttributePredicate> {
    let mut clauses = split_keyword(input, b"and")
        .into_iter()
        .map(parse_clause)
        .collect::<Result<Vec<_>>>()?;
    clauses.retain(|c| *c != AttributePredicate::All);
    Ok(match clauses.len() {
        0 => AttributePredicate::All,
        1 => clauses.remove(0),
        _ => AttributePredicate::And(clauses),
    })
}

impl FromStr for AttributePredicate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let alternatives = split_keyword(s, b"or");
        if alternatives.len() == 1 {
            return parse_conjunction(s);
        }
        let mut parsed = Vec::with_capacity(alternatives.len());
        for alternative in alternatives {
            if alternative.trim().is_empty() {
                return Err(Error::Parse(format!("empty alternative in '{}'", s.trim())));
            }
            match parse_conjunction(alternative)? {
                // Anything OR everything is everything.
                AttributePredicate::All => return Ok(AttributePredicate::All),
                p => parsed.push(p),
            }
        }
        Ok(AttributePredicate::Or(parsed))
    }
}

impl fmt::Display for AttributePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "*"),
            Self::IsNull(key) => write!(f, "{key} IS NULL"),
            Self::NotNull(key) => write!(f, "{key} IS NOT NULL"),
            Self::Equals(key, value) => write!(f, "{key}='{value}'"),
            Self::NotEquals(key, value) => write!(f, "{key}!='{value}'"),
            Self::And(clauses) => write_joined(f, clauses, " AND "),
            Self::Or(alternatives) => write_joined(f, alternatives, " OR "),
        }
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    parts: &[AttributePredicate],
    separator: &str,
) -> fmt::Result {
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{part}")?;
    }
    Ok(())
}
