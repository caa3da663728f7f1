//! Resolves a tenant to the document store holding its data.

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use super::{DocumentStore, InMemoryDocumentStore, PostgresDocumentStore, StoreError};
use crate::infra::tenant::TenantId;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unable to prepare store for tenant {tenant}: {source}")]
    Setup {
        tenant: String,
        #[source]
        source: StoreError,
    },
}

#[async_trait]
pub trait StoreRegistry: Send + Sync {
    async fn store_for(&self, tenant: &TenantId) -> Result<Arc<dyn DocumentStore>, RegistryError>;
}

enum Backend {
    Postgres { pool: PgPool, module: String },
    Memory,
}

/// One store per tenant, created on first use and cached.
///
/// The Postgres backend shares a single pool; each tenant maps to its own schema.
pub struct TenantStores {
    backend: Backend,
    tables: Vec<String>,
    stores: RwLock<HashMap<TenantId, Arc<dyn DocumentStore>>>,
}

impl TenantStores {
    /// `tables` are created in a tenant's schema when its store is first resolved.
    pub fn postgres(pool: PgPool, module: &str, tables: Vec<String>) -> Self {
        Self {
            backend: Backend::Postgres {
                pool,
                module: module.to_string(),
            },
            tables,
            stores: RwLock::new(HashMap::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory,
            tables: Vec::new(),
            stores: RwLock::new(HashMap::new()),
        }
    }

    async fn open(&self, tenant: &TenantId) -> Result<Arc<dyn DocumentStore>, RegistryError> {
        match &self.backend {
            Backend::Memory => Ok(Arc::new(InMemoryDocumentStore::new())),
            Backend::Postgres { pool, module } => {
                let store = PostgresDocumentStore::new(pool.clone(), tenant.schema_name(module));
                for table in &self.tables {
                    store
                        .ensure_table(table)
                        .await
                        .map_err(|source| RegistryError::Setup {
                            tenant: tenant.to_string(),
                            source,
                        })?;
                }
                info!("Opened store for tenant {} (schema {})", tenant, store.schema());
                Ok(Arc::new(store))
            }
        }
    }
}

#[async_trait]
impl StoreRegistry for TenantStores {
    async fn store_for(&self, tenant: &TenantId) -> Result<Arc<dyn DocumentStore>, RegistryError> {
        if let Some(store) = self.stores.read().await.get(tenant) {
            return Ok(store.clone());
        }
        // Held across open so a tenant's tables are created by one request only.
        let mut stores = self.stores.write().await;
        if let Some(store) = stores.get(tenant) {
            return Ok(store.clone());
        }
        let opened = self.open(tenant).await?;
        stores.insert(tenant.clone(), opened.clone());
        Ok(opened)
    }
}

/// The same store for every tenant.
pub struct FixedStore(pub Arc<dyn DocumentStore>);

#[async_trait]
impl StoreRegistry for FixedStore {
    async fn store_for(&self, _tenant: &TenantId) -> Result<Arc<dyn DocumentStore>, RegistryError> {
        Ok(self.0.clone())
    }
}
