//! Validation error body returned with 422 responses.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Parameter {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Error {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
    pub code: String,
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Errors {
    pub errors: Vec<Error>,
    pub total_records: u32,
}

impl Errors {
    /// A single field-scoped validation error.
    pub fn validation(field: &str, value: &str, message: &str) -> Self {
        Errors {
            errors: vec![Error {
                message: message.to_string(),
                error_type: "1".to_string(),
                code: "-1".to_string(),
                parameters: vec![Parameter {
                    key: field.to_string(),
                    value: value.to_string(),
                }],
            }],
            total_records: 1,
        }
    }

    /// The first error's first parameter, if any.
    pub fn field(&self) -> Option<&Parameter> {
        self.errors.first().and_then(|e| e.parameters.first())
    }
}
