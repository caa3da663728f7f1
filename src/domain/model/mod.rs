//! Entities served by the API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use utoipa::ToSchema;

pub mod errors;
pub mod resource;

pub use errors::{Error, Errors, Parameter};
pub use resource::ResourceSpec;

/// A notification: an opaque id plus a caller-owned JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub body: Map<String, JsonValue>,
}

impl Notification {
    /// Reads a stored document back into an entity.
    pub fn from_document(document: JsonValue) -> Result<Self, serde_json::Error> {
        serde_json::from_value(document)
    }

    /// The document as stored: the body with `id` stamped in.
    pub fn to_document(&self, id: &str) -> JsonValue {
        let mut doc = self.body.clone();
        doc.insert("id".to_string(), JsonValue::String(id.to_string()));
        JsonValue::Object(doc)
    }
}

/// One page of notifications plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotifyCollection {
    pub notifications: Vec<Notification>,
    pub total_records: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_is_split_from_body() {
        let n: Notification = serde_json::from_value(json!({"id": "a", "text": "hi"})).unwrap();
        assert_eq!(n.id.as_deref(), Some("a"));
        assert_eq!(n.body.get("text"), Some(&json!("hi")));
        assert!(!n.body.contains_key("id"));
        assert_eq!(serde_json::to_value(&n).unwrap(), json!({"id": "a", "text": "hi"}));
    }

    #[test]
    fn test_to_document_stamps_id() {
        let n: Notification = serde_json::from_value(json!({"text": "hi"})).unwrap();
        assert_eq!(n.to_document("gen"), json!({"id": "gen", "text": "hi"}));
    }

    #[test]
    fn test_collection_field_names() {
        let c = NotifyCollection {
            notifications: vec![],
            total_records: 3,
        };
        assert_eq!(
            serde_json::to_value(&c).unwrap(),
            json!({"notifications": [], "totalRecords": 3})
        );
    }
}
