//! CQL → predicate translation over a JSON document column.
//!
//! The translator is bound to one document column (`<table>.jsonb`) and,
//! optionally, to the set of fields the entity schema declares. A query either
//! translates completely or fails with a [`TranslationError`].

pub mod lexer;
pub mod parser;
pub mod predicate;
pub mod schema;

use std::sync::Arc;
use thiserror::Error;

use parser::{BoolOp, CqlNode, Relation};
pub use parser::SortDirection;
pub use predicate::{CompareOp, CompareValue, Matcher, Predicate, SortKey};
pub use schema::{FieldSchema, SchemaError};

const ALL_RECORDS_INDEX: &str = "cql.allRecords";
const SERVER_CHOICE_INDEX: &str = "cql.serverChoice";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    /// The query text is not well-formed CQL.
    #[error("{0}")]
    Syntax(String),
    /// The query references a field the schema does not declare.
    #[error("{message}")]
    UnknownField { field: String, message: String },
}

impl TranslationError {
    /// Builds an `UnknownField` from a validation message, recovering the
    /// field name with [`extract_field_name`].
    pub fn from_validation_message(message: String) -> Self {
        TranslationError::UnknownField {
            field: extract_field_name(&message),
            message,
        }
    }
}

/// Takes the text between the first and the last `'` of a validation message.
/// Without a quoted section the whole message is returned.
///
/// Callers depend on the exact behaviour: validation messages carry the field
/// name only as quoted text.
pub fn extract_field_name(message: &str) -> String {
    match (message.find('\''), message.rfind('\'')) {
        (Some(start), Some(end)) if end > start => message[start + 1..end].to_string(),
        _ => message.to_string(),
    }
}

/// A fully translated query.
#[derive(Debug, Clone)]
pub struct Translation {
    /// Qualified document column the predicate applies to.
    pub column: String,
    pub predicate: Predicate,
    pub sort: Vec<SortKey>,
}

impl Translation {
    /// Matches every record, no ordering.
    pub fn all(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            predicate: Predicate::All,
            sort: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryTranslator {
    column: String,
    schema: Option<Arc<FieldSchema>>,
    server_choice: Vec<String>,
}

impl QueryTranslator {
    /// Translator over `<table>.jsonb`, accepting any field.
    pub fn new(table: &str) -> Self {
        Self {
            column: format!("{}.jsonb", table),
            schema: None,
            server_choice: Vec::new(),
        }
    }

    pub fn with_schema(mut self, schema: Arc<FieldSchema>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Fields searched by a bare term.
    pub fn with_server_choice<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.server_choice = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn validates_fields(&self) -> bool {
        self.schema.is_some()
    }

    pub fn translate(&self, cql: &str) -> Result<Translation, TranslationError> {
        let query = parser::parse(cql)?;

        let predicate = match &query.root {
            Some(node) => self.node(node)?,
            None => Predicate::All,
        };

        let mut sort = Vec::with_capacity(query.sort.len());
        for spec in &query.sort {
            sort.push(SortKey {
                path: self.field_path(&spec.index)?,
                direction: spec.direction,
            });
        }

        Ok(Translation {
            column: self.column.clone(),
            predicate,
            sort,
        })
    }

    fn node(&self, node: &CqlNode) -> Result<Predicate, TranslationError> {
        match node {
            CqlNode::Clause {
                index,
                relation,
                term,
            } => self.clause(index.as_deref(), *relation, term),
            CqlNode::Boolean { op, left, right } => {
                let left = self.node(left)?;
                let right = self.node(right)?;
                Ok(match op {
                    BoolOp::And => Predicate::and(left, right),
                    BoolOp::Or => Predicate::or(left, right),
                    BoolOp::Not => Predicate::and(left, Predicate::negate(right)),
                })
            }
        }
    }

    fn clause(
        &self,
        index: Option<&str>,
        relation: Relation,
        term: &str,
    ) -> Result<Predicate, TranslationError> {
        match index {
            Some(i) if i.eq_ignore_ascii_case(ALL_RECORDS_INDEX) => Ok(Predicate::All),
            Some(i) if i.eq_ignore_ascii_case(SERVER_CHOICE_INDEX) => {
                self.server_choice_clause(relation, term)
            }
            None => self.server_choice_clause(relation, term),
            Some(i) => {
                let path = self.field_path(i)?;
                field_clause(path, relation, term)
            }
        }
    }

    fn server_choice_clause(
        &self,
        relation: Relation,
        term: &str,
    ) -> Result<Predicate, TranslationError> {
        let mut fields = self.server_choice.iter();
        let Some(first) = fields.next() else {
            return Err(TranslationError::from_validation_message(
                "cql.serverChoice requested, but no serverChoiceIndexes defined.".to_string(),
            ));
        };
        let mut predicate = field_clause(split_path(first)?, relation, term)?;
        for field in fields {
            predicate = Predicate::or(predicate, field_clause(split_path(field)?, relation, term)?);
        }
        Ok(predicate)
    }

    fn field_path(&self, index: &str) -> Result<Vec<String>, TranslationError> {
        if let Some(schema) = &self.schema {
            if !schema.contains(index) {
                return Err(TranslationError::from_validation_message(format!(
                    "Field name '{}' is not present in index.",
                    index
                )));
            }
        }
        split_path(index)
    }
}

fn split_path(index: &str) -> Result<Vec<String>, TranslationError> {
    let path: Vec<String> = index.split('.').map(|s| s.to_string()).collect();
    if path.iter().any(|s| s.is_empty()) {
        return Err(TranslationError::Syntax(format!("invalid index name {}", index)));
    }
    Ok(path)
}

fn pattern_field(
    path: &[String],
    pattern: String,
    numeric: Option<f64>,
    negate: bool,
) -> Result<Predicate, TranslationError> {
    let matcher = Matcher::pattern(pattern, numeric, negate)
        .map_err(|e| TranslationError::Syntax(format!("invalid search term: {}", e)))?;
    Ok(Predicate::Field {
        path: path.to_vec(),
        matcher,
    })
}

fn field_clause(
    path: Vec<String>,
    relation: Relation,
    term: &str,
) -> Result<Predicate, TranslationError> {
    let numeric = predicate::numeric_term(term);
    let words = predicate::term_words(term);

    let compare = |op: CompareOp| Predicate::Field {
        path: path.clone(),
        matcher: Matcher::Compare {
            op,
            value: match numeric {
                Some(n) => CompareValue::Number(n),
                None => CompareValue::Text(predicate::unescape_term(term)),
            },
        },
    };

    match relation {
        Relation::Phrase => {
            pattern_field(&path, predicate::phrase_pattern(&words), numeric, false)
        }
        Relation::Exact => pattern_field(&path, predicate::exact_pattern(term), numeric, false),
        Relation::NotExact => pattern_field(&path, predicate::exact_pattern(term), numeric, true),
        Relation::Lt => Ok(compare(CompareOp::Lt)),
        Relation::Le => Ok(compare(CompareOp::Le)),
        Relation::Gt => Ok(compare(CompareOp::Gt)),
        Relation::Ge => Ok(compare(CompareOp::Ge)),
        Relation::AllWords | Relation::AnyWord => {
            if words.is_empty() {
                return pattern_field(&path, predicate::phrase_pattern(&[]), None, false);
            }
            let mut combined: Option<Predicate> = None;
            for word in words {
                let single = pattern_field(&path, predicate::phrase_pattern(&[word]), None, false)?;
                combined = Some(match combined {
                    None => single,
                    Some(acc) if relation == Relation::AllWords => Predicate::and(acc, single),
                    Some(acc) => Predicate::or(acc, single),
                });
            }
            // words is non-empty, so combined is set
            combined.ok_or_else(|| TranslationError::Syntax("empty search term".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn notify_translator() -> QueryTranslator {
        QueryTranslator::new("notify_data")
            .with_schema(Arc::new(FieldSchema::from_fields([
                "id",
                "text",
                "seen",
                "metadata",
                "metadata.createdByUserId",
            ])))
            .with_server_choice(["text"])
    }

    #[test]
    fn test_extract_field_name() {
        assert_eq!(
            extract_field_name("Field name 'metadata.foo' is not present in index."),
            "metadata.foo"
        );
        assert_eq!(extract_field_name("no quotes here"), "no quotes here");
        assert_eq!(extract_field_name("a 'b' c 'd' e"), "b' c 'd");
        assert_eq!(extract_field_name("one ' quote"), "one ' quote");
    }

    #[test]
    fn test_empty_query_matches_all() {
        let t = notify_translator().translate("").unwrap();
        assert!(matches!(t.predicate, Predicate::All));
        assert_eq!(t.column, "notify_data.jsonb");
    }

    #[test]
    fn test_unknown_field_reports_exact_name() {
        for field in ["nosuch", "metadata.nosuch", "x_y"] {
            let err = notify_translator()
                .translate(&format!("{}=1", field))
                .unwrap_err();
            match err {
                TranslationError::UnknownField { field: f, message } => {
                    assert_eq!(f, field);
                    assert!(message.contains(field));
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_unknown_sort_field() {
        let err = notify_translator()
            .translate("text=a sortBy bogus")
            .unwrap_err();
        assert_eq!(
            err,
            TranslationError::UnknownField {
                field: "bogus".into(),
                message: "Field name 'bogus' is not present in index.".into()
            }
        );
    }

    #[test]
    fn test_syntax_error_is_distinct() {
        let err = notify_translator().translate("text=(").unwrap_err();
        assert!(matches!(err, TranslationError::Syntax(_)));
    }

    #[test]
    fn test_known_fields_match_documents() {
        let t = notify_translator();
        let doc = json!({
            "id": "n1",
            "text": "Your book is overdue",
            "seen": false,
            "metadata": {"createdByUserId": "e037b3a1-7f27-4a52-9c60-1f2b5c2d6e9a"}
        });
        for q in [
            "text=overdue",
            "text=\"book is\"",
            "seen==false",
            "metadata.createdByUserId=e037b3a1-7f27-4a52-9c60-1f2b5c2d6e9a",
            "text all \"overdue book\"",
            "text any \"missing overdue\"",
            "overdue",
            "cql.allRecords=1",
            "text=overdue not seen==true",
            "id==n1 or text=nothing",
        ] {
            let translation = t.translate(q).unwrap();
            assert!(translation.predicate.matches("n1", &doc), "query {:?} should match", q);
        }
        for q in ["text=\"is book\"", "seen==true", "text=over", "text all \"overdue library\""] {
            let translation = t.translate(q).unwrap();
            assert!(!translation.predicate.matches("n1", &doc), "query {:?} should not match", q);
        }
    }

    #[test]
    fn test_bare_term_without_server_choice() {
        let err = QueryTranslator::new("t").translate("hello").unwrap_err();
        match err {
            TranslationError::UnknownField { field, message } => assert_eq!(field, message),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_schemaless_translator_accepts_any_field() {
        let t = QueryTranslator::new("t").translate("x=1 sortBy x/sort.descending").unwrap();
        assert!(t.predicate.matches("a", &json!({"x": 1})));
        assert!(!t.predicate.matches("b", &json!({"x": 2})));
        assert_eq!(t.sort.len(), 1);
        assert_eq!(t.sort[0].direction, SortDirection::Descending);
    }

    #[test]
    fn test_overly_complex_queries_are_rejected() {
        let translator = QueryTranslator::new("t");
        let deep = format!("{}x=1{}", "(".repeat(3000), ")".repeat(3000));
        let chain = vec!["x=1"; 5000].join(" or ");
        for query in [deep, chain] {
            match translator.translate(&query) {
                Err(TranslationError::Syntax(m)) => assert!(m.starts_with("query too complex"), "{}", m),
                other => panic!("unexpected {:?}", other),
            }
        }

        let wide = vec!["text=a"; 200].join(" and ");
        let t = notify_translator().translate(&wide).unwrap();
        assert!(t.predicate.matches("k", &json!({"text": "a"})));
    }
}
