pub mod app;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{NotifyService, Outcome};
pub use domain::cql::{QueryTranslator, TranslationError};
pub use domain::model::{Notification, NotifyCollection, ResourceSpec};
pub use infra::messages::Messages;
pub use infra::tenant::TenantId;
pub use storage::{DocumentStore, InMemoryDocumentStore, PostgresDocumentStore, StoreRegistry, TenantStores};
