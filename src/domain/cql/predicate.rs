//! Predicate tree produced by the translator.
//!
//! Text matching is expressed as a regular expression written in the common
//! subset of the `regex` crate and PostgreSQL's ARE dialect, so the same
//! pattern string is evaluated in memory and pushed to the database with `~`.

use regex::Regex;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;

use super::parser::SortDirection;

/// Characters between words: anything that is not a letter or digit.
const WORD_GAP: &str = "[^[:alnum:]]";

#[derive(Debug, Clone)]
pub enum Predicate {
    /// Matches every record (empty query, `cql.allRecords=1`).
    All,
    /// Literal equality against the record key column, outside the document.
    KeyEquals(String),
    Field {
        path: Vec<String>,
        matcher: Matcher,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

#[derive(Debug, Clone)]
pub enum Matcher {
    /// The field's text matches `pattern`; when `numeric` is set a JSON number
    /// equal to it matches as well. `negate` inverts the result for present fields.
    Pattern {
        pattern: String,
        regex: Regex,
        numeric: Option<f64>,
        negate: bool,
    },
    Compare {
        op: CompareOp,
        value: CompareValue,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn sql(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    fn accepts(&self, ord: Ordering) -> bool {
        match self {
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Le => ord != Ordering::Greater,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Ge => ord != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompareValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub path: Vec<String>,
    pub direction: SortDirection,
}

enum TermPiece {
    Literal(char),
    AnyRun,
    AnyOne,
}

fn term_pieces(word: &str) -> Vec<TermPiece> {
    let mut pieces = Vec::new();
    let mut chars = word.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => pieces.push(TermPiece::Literal(escaped)),
                None => pieces.push(TermPiece::Literal('\\')),
            },
            '*' => pieces.push(TermPiece::AnyRun),
            '?' => pieces.push(TermPiece::AnyOne),
            other => pieces.push(TermPiece::Literal(other)),
        }
    }
    pieces
}

fn escape_char(c: char) -> String {
    regex::escape(c.encode_utf8(&mut [0u8; 4]))
}

/// Regex for one word; wildcards stay inside the word.
fn word_regex(word: &str) -> String {
    term_pieces(word)
        .into_iter()
        .map(|p| match p {
            TermPiece::Literal(c) => escape_char(c),
            TermPiece::AnyRun => "[[:alnum:]]*".to_string(),
            TermPiece::AnyOne => "[[:alnum:]]".to_string(),
        })
        .collect()
}

/// Splits a term into words on whitespace.
pub fn term_words(term: &str) -> Vec<&str> {
    term.split_whitespace().collect()
}

/// Removes wildcard escapes, for terms used as plain literals.
pub fn unescape_term(term: &str) -> String {
    term_pieces(term)
        .into_iter()
        .map(|p| match p {
            TermPiece::Literal(c) => c,
            TermPiece::AnyRun => '*',
            TermPiece::AnyOne => '?',
        })
        .collect()
}

/// Case-insensitive match of the words in sequence, on word boundaries.
/// No words matches any present value.
pub fn phrase_pattern(words: &[&str]) -> String {
    if words.is_empty() {
        return "(?is)^".to_string();
    }
    let body: Vec<String> = words.iter().map(|w| word_regex(w)).collect();
    format!(
        "(?is)(^|{gap}){body}({gap}|$)",
        gap = WORD_GAP,
        body = body.join(&format!("{}+", WORD_GAP))
    )
}

/// Case-sensitive match of the whole value.
pub fn exact_pattern(term: &str) -> String {
    let body: String = term_pieces(term)
        .into_iter()
        .map(|p| match p {
            TermPiece::Literal(c) => escape_char(c),
            TermPiece::AnyRun => ".*".to_string(),
            TermPiece::AnyOne => ".".to_string(),
        })
        .collect();
    format!("(?s)^{}$", body)
}

/// Parses a term as a finite number.
pub fn numeric_term(term: &str) -> Option<f64> {
    let trimmed = term.trim();
    if trimmed.is_empty()
        || !trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
    {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

impl Matcher {
    pub fn pattern(pattern: String, numeric: Option<f64>, negate: bool) -> Result<Self, regex::Error> {
        let regex = Regex::new(&pattern)?;
        Ok(Matcher::Pattern {
            pattern,
            regex,
            numeric,
            negate,
        })
    }

    fn matches(&self, value: &JsonValue) -> bool {
        match self {
            Matcher::Pattern {
                regex,
                numeric,
                negate,
                ..
            } => {
                let numeric_hit = match (numeric, value.as_f64()) {
                    (Some(n), Some(v)) if value.is_number() => *n == v,
                    _ => false,
                };
                let hit = numeric_hit || regex.is_match(&value_text(value));
                hit != *negate
            }
            Matcher::Compare { op, value: target } => match target {
                CompareValue::Number(n) => match value {
                    JsonValue::Number(num) => num
                        .as_f64()
                        .and_then(|v| v.partial_cmp(n))
                        .map(|ord| op.accepts(ord))
                        .unwrap_or(false),
                    _ => false,
                },
                CompareValue::Text(t) => op.accepts(value_text(value).as_str().cmp(t.as_str())),
            },
        }
    }
}

/// Text of a JSON value as PostgreSQL's `#>>` renders it.
pub fn value_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Walks `path` through nested objects. JSON `null` reads as absent, like `#>>`.
pub fn lookup<'a>(doc: &'a JsonValue, path: &[String]) -> Option<&'a JsonValue> {
    lookup_raw(doc, path).filter(|v| !v.is_null())
}

fn lookup_raw<'a>(doc: &'a JsonValue, path: &[String]) -> Option<&'a JsonValue> {
    let mut current = doc;
    for segment in path {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

impl Predicate {
    pub fn and(left: Predicate, right: Predicate) -> Predicate {
        Predicate::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Predicate, right: Predicate) -> Predicate {
        Predicate::Or(Box::new(left), Box::new(right))
    }

    pub fn negate(inner: Predicate) -> Predicate {
        Predicate::Not(Box::new(inner))
    }

    /// Evaluates the predicate against a stored record.
    pub fn matches(&self, key: &str, doc: &JsonValue) -> bool {
        match self {
            Predicate::All => true,
            Predicate::KeyEquals(id) => id == key,
            Predicate::Field { path, matcher } => match lookup(doc, path) {
                Some(value) => matcher.matches(value),
                None => false,
            },
            Predicate::And(l, r) => l.matches(key, doc) && r.matches(key, doc),
            Predicate::Or(l, r) => l.matches(key, doc) || r.matches(key, doc),
            Predicate::Not(inner) => !inner.matches(key, doc),
        }
    }
}

fn jsonb_rank(value: &JsonValue) -> u8 {
    match value {
        JsonValue::Null => 0,
        JsonValue::String(_) => 1,
        JsonValue::Number(_) => 2,
        JsonValue::Bool(_) => 3,
        JsonValue::Array(_) => 4,
        JsonValue::Object(_) => 5,
    }
}

fn compare_present(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a, b) {
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Number(x), JsonValue::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        (x, y) if jsonb_rank(x) == jsonb_rank(y) => x.to_string().cmp(&y.to_string()),
        (x, y) => jsonb_rank(x).cmp(&jsonb_rank(y)),
    }
}

/// Orders two documents by `keys` the way PostgreSQL orders `jsonb`:
/// null < string < number < boolean < array < object, absent paths last.
pub fn compare_documents(keys: &[SortKey], a: &JsonValue, b: &JsonValue) -> Ordering {
    for key in keys {
        let ord = match (lookup_raw(a, &key.path), lookup_raw(b, &key.path)) {
            (Some(x), Some(y)) => compare_present(x, y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ord = match key.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
