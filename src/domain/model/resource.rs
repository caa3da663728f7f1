//! Descriptor for a document-backed resource.

use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use crate::domain::cql::{FieldSchema, QueryTranslator};

/// What the CRUD layer needs to know about one resource.
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    /// Table holding the documents.
    pub table: String,
    /// Name of the identifier property inside documents and request bodies.
    pub id_field: String,
    /// Prefix of the `Location` header for created records.
    pub location_prefix: String,
    /// Fields a bare CQL term searches.
    pub server_choice: Vec<String>,
    /// Known query fields; `None` disables field validation.
    pub schema: Option<Arc<FieldSchema>>,
}

impl ResourceSpec {
    /// The notifications resource, validating query fields against the bundled schema.
    pub fn notifications() -> Self {
        Self {
            table: "notify_data".to_string(),
            id_field: "id".to_string(),
            location_prefix: "/notify/".to_string(),
            server_choice: vec!["text".to_string()],
            schema: FieldSchema::notification().cloned().map(Arc::new),
        }
    }

    /// Replaces the schema with one loaded from `path`. On failure the error is
    /// logged and field validation is turned off.
    pub fn with_schema_file(mut self, path: &Path) -> Self {
        match FieldSchema::load(path) {
            Ok(schema) => {
                info!("Loaded query schema from {}", path.display());
                self.schema = Some(Arc::new(schema));
            }
            Err(e) => {
                error!(
                    "unable to load schema - {}, validation of query fields will not be active: {}",
                    path.display(),
                    e
                );
                self.schema = None;
            }
        }
        self
    }

    pub fn without_field_validation(mut self) -> Self {
        self.schema = None;
        self
    }

    pub fn translator(&self) -> QueryTranslator {
        let translator =
            QueryTranslator::new(&self.table).with_server_choice(self.server_choice.iter().cloned());
        match &self.schema {
            Some(schema) => translator.with_schema(schema.clone()),
            None => translator,
        }
    }

    pub fn location(&self, id: &str) -> String {
        format!("{}{}", self.location_prefix, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifications_resource() {
        let resource = ResourceSpec::notifications();
        assert_eq!(resource.location("abc"), "/notify/abc");
        let translator = resource.translator();
        assert_eq!(translator.column(), "notify_data.jsonb");
        assert!(translator.validates_fields());
        assert!(!resource.without_field_validation().translator().validates_fields());
    }

    #[test]
    fn test_missing_schema_file_disables_validation() {
        let resource = ResourceSpec::notifications().with_schema_file(Path::new("/nonexistent/schema.json"));
        assert!(resource.schema.is_none());
    }
}
