//! Document store: records keyed by an opaque string id, each holding one JSON document.

pub mod memory;
pub mod postgres;
pub mod registry;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::domain::query::BoundedQuery;

pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use registry::{FixedStore, RegistryError, StoreRegistry, TenantStores};

/// SQLSTATE of a unique-constraint violation.
pub const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backend rejected the statement.
    #[error("{message}")]
    Database {
        /// SQLSTATE, when the backend reported one.
        code: Option<String>,
        message: String,
        detail: Option<String>,
    },
    /// A stored row could not be read back.
    #[error("unable to decode stored record: {0}")]
    Decode(String),
    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn code(&self) -> Option<&str> {
        match self {
            StoreError::Database { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// The duplicate-key error PostgreSQL raises for `<table>_pkey`.
    pub fn duplicate_key(table: &str, id: &str) -> Self {
        StoreError::Database {
            code: Some(UNIQUE_VIOLATION.to_string()),
            message: format!(
                "duplicate key value violates unique constraint \"{}_pkey\"",
                table
            ),
            detail: Some(format!("Key (id)=({}) already exists.", id)),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One page of raw documents.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPage {
    pub documents: Vec<JsonValue>,
    /// Matches of the unpaged predicate; `None` unless a count was requested.
    pub total: Option<u64>,
}

/// Asynchronous operations over one store. Every write touches a single row.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents matching `query`, in sort order (store order without `sortBy`).
    /// With `want_count` the total covers all matches, not just the page.
    async fn list(&self, table: &str, query: &BoundedQuery, want_count: bool)
        -> StoreResult<DocumentPage>;

    /// The document stored under `id`, or `None`.
    async fn get_by_id(&self, table: &str, id: &str) -> StoreResult<Option<JsonValue>>;

    /// Stores `document` under `id`, generating a UUID when `id` is absent.
    /// Returns the id the record was stored under.
    async fn insert(&self, table: &str, id: Option<&str>, document: JsonValue)
        -> StoreResult<String>;

    /// Replaces the document stored under `id`. Returns the number of rows updated.
    async fn update(&self, table: &str, document: JsonValue, id: &str) -> StoreResult<u64>;

    /// Removes the record stored under `id`. Returns the number of rows deleted.
    async fn delete_by_id(&self, table: &str, id: &str) -> StoreResult<u64>;
}

/// Id for a record inserted without one.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Writes `id` into the document's `id` property.
pub fn stamp_id(mut document: JsonValue, id: &str) -> JsonValue {
    if let Some(obj) = document.as_object_mut() {
        obj.insert("id".to_string(), JsonValue::String(id.to_string()));
    }
    document
}
