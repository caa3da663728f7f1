//! In-process document store for tests and local development.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{generate_id, stamp_id, DocumentPage, DocumentStore, StoreError, StoreResult};
use crate::domain::cql::predicate::compare_documents;
use crate::domain::cql::Predicate;
use crate::domain::query::BoundedQuery;

/// Tables of `(id, document)` rows kept in insertion order.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    tables: RwLock<HashMap<String, Vec<(String, JsonValue)>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows in `table`.
    pub async fn len(&self, table: &str) -> usize {
        self.tables.read().await.get(table).map(|rows| rows.len()).unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn list(
        &self,
        table: &str,
        query: &BoundedQuery,
        want_count: bool,
    ) -> StoreResult<DocumentPage> {
        let tables = self.tables.read().await;
        let rows = tables.get(table).map(|r| r.as_slice()).unwrap_or(&[]);

        let mut matched: Vec<&JsonValue> = rows
            .iter()
            .filter(|(id, doc)| query.predicate.matches(id, doc))
            .map(|(_, doc)| doc)
            .collect();
        if !query.sort.is_empty() {
            matched.sort_by(|a, b| compare_documents(&query.sort, a, b));
        }

        let total = want_count.then_some(matched.len() as u64);
        let documents = query.window(matched).into_iter().cloned().collect();
        Ok(DocumentPage { documents, total })
    }

    async fn get_by_id(&self, table: &str, id: &str) -> StoreResult<Option<JsonValue>> {
        let predicate = Predicate::KeyEquals(id.to_string());
        let tables = self.tables.read().await;
        Ok(tables.get(table).and_then(|rows| {
            rows.iter()
                .find(|(key, doc)| predicate.matches(key, doc))
                .map(|(_, doc)| doc.clone())
        }))
    }

    async fn insert(
        &self,
        table: &str,
        id: Option<&str>,
        document: JsonValue,
    ) -> StoreResult<String> {
        if !document.is_object() {
            return Err(StoreError::Database {
                code: Some("22P02".to_string()),
                message: "invalid input syntax for type json".to_string(),
                detail: Some("document must be a JSON object".to_string()),
            });
        }
        let id = id.map(|s| s.to_string()).unwrap_or_else(generate_id);
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();
        if rows.iter().any(|(key, _)| *key == id) {
            return Err(StoreError::duplicate_key(table, &id));
        }
        rows.push((id.clone(), stamp_id(document, &id)));
        Ok(id)
    }

    async fn update(&self, table: &str, document: JsonValue, id: &str) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        match rows.iter_mut().find(|(key, _)| key == id) {
            Some(row) => {
                row.1 = stamp_id(document, id);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_by_id(&self, table: &str, id: &str) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|(key, _)| key != id);
        Ok((before - rows.len()) as u64)
    }
}
