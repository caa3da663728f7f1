//! Known query fields, derived from the entity's JSON schema.

use lazy_static::lazy_static;
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;
use tracing::error;

const NOTIFICATION_SCHEMA_JSON: &str = include_str!("../../../schemas/notification.json");

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unable to read schema {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("schema is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema has no properties")]
    NoProperties,
}

/// Dotted field paths a query may reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSchema {
    fields: BTreeSet<String>,
}

impl FieldSchema {
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Collects `properties` recursively. Nested objects contribute both their own
    /// path and their children's; array items with properties are flattened in place.
    pub fn from_json_schema(schema: &JsonValue) -> Result<Self, SchemaError> {
        let mut fields = BTreeSet::new();
        collect(schema, "", &mut fields);
        if fields.is_empty() {
            return Err(SchemaError::NoProperties);
        }
        Ok(Self { fields })
    }

    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        let schema: JsonValue = serde_json::from_str(text)?;
        Self::from_json_schema(&schema)
    }

    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// The bundled notification schema, parsed on first use.
    ///
    /// `None` if it could not be parsed; query field validation is then inactive.
    pub fn notification() -> Option<&'static FieldSchema> {
        NOTIFICATION_SCHEMA.as_ref()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|s| s.as_str())
    }
}

lazy_static! {
    static ref NOTIFICATION_SCHEMA: Option<FieldSchema> =
        match FieldSchema::from_json_str(NOTIFICATION_SCHEMA_JSON) {
            Ok(schema) => Some(schema),
            Err(e) => {
                error!(
                    "unable to load notification schema ({}), validation of query fields will not be active",
                    e
                );
                None
            }
        };
}

fn collect(node: &JsonValue, prefix: &str, out: &mut BTreeSet<String>) {
    if let Some(items) = node.get("items") {
        collect(items, prefix, out);
    }
    let Some(props) = node.get("properties").and_then(|p| p.as_object()) else {
        return;
    };
    for (name, child) in props {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        out.insert(path.clone());
        collect(child, &path, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_properties_are_flattened() {
        let schema = json!({
            "type": "object",
            "properties": {
                "id": {"type": "string"},
                "metadata": {
                    "type": "object",
                    "properties": {"createdByUserId": {"type": "string"}}
                },
                "tags": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"value": {"type": "string"}}}
                }
            }
        });
        let fields = FieldSchema::from_json_schema(&schema).unwrap();
        let all: Vec<&str> = fields.fields().collect();
        assert_eq!(
            all,
            vec!["id", "metadata", "metadata.createdByUserId", "tags", "tags.value"]
        );
    }

    #[test]
    fn test_bundled_notification_schema() {
        let schema = FieldSchema::notification().expect("bundled schema parses");
        assert!(schema.contains("text"));
        assert!(schema.contains("metadata.createdByUserId"));
        assert!(!schema.contains("nosuchfield"));
    }

    #[test]
    fn test_schema_without_properties_is_rejected() {
        let err = FieldSchema::from_json_str(r#"{"type": "string"}"#).unwrap_err();
        assert!(matches!(err, SchemaError::NoProperties));
    }
}
