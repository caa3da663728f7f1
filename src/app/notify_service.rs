//! The notification service.
//!
//! Sits between the HTTP handlers and the tenant's document store. Each operation:
//! 1.  Resolves the tenant's store.
//! 2.  Runs a single store call (a list also runs its count).
//! 3.  Turns the result, or the failure, into an [`Outcome`].
//!
//! Raw backend messages are logged here and never handed to the caller, except for
//! the bad-input hints the classifier allows through.

use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::app::classifier::classify;
use crate::app::outcome::Outcome;
use crate::domain::cql::{QueryTranslator, TranslationError};
use crate::domain::model::{Errors, Notification, NotifyCollection, ResourceSpec};
use crate::domain::query::paginate;
use crate::infra::messages::Messages;
use crate::infra::tenant::TenantId;
use crate::storage::{DocumentStore, StoreRegistry};

pub const NOT_SUPPORTED: &str = "Not supported yet.";
pub const ID_CHANGE: &str = "Can not change the id";
pub const CQL_PARSE_ERROR: &str = "CQL parse error ";
pub const INVALID_ID: &str = "Id must not contain control characters";

pub struct NotifyService {
    resource: ResourceSpec,
    translator: QueryTranslator,
    stores: Arc<dyn StoreRegistry>,
    messages: Messages,
}

impl NotifyService {
    pub fn new(resource: ResourceSpec, stores: Arc<dyn StoreRegistry>, messages: Messages) -> Self {
        let translator = resource.translator();
        Self {
            resource,
            translator,
            stores,
            messages,
        }
    }

    /// The tenant's store, or the failure outcome to return instead.
    pub async fn store<T>(&self, tenant: &TenantId, lang: &str) -> Result<Arc<dyn DocumentStore>, Outcome<T>> {
        self.stores.store_for(tenant).await.map_err(|e| {
            error!("{}", e);
            Outcome::InternalError(self.messages.internal_server_error(lang))
        })
    }

    fn internal<T>(&self, lang: &str) -> Outcome<T> {
        Outcome::InternalError(self.messages.internal_server_error(lang))
    }

    pub async fn list(
        &self,
        tenant: &TenantId,
        query: Option<&str>,
        offset: u32,
        limit: u32,
        lang: &str,
    ) -> Outcome<NotifyCollection> {
        let translation = match self.translator.translate(query.unwrap_or("")) {
            Ok(t) => t,
            Err(TranslationError::UnknownField { field, message }) => {
                warn!("rejected query {:?}: {}", query, message);
                return Outcome::ValidationError(Errors::validation(&field, "", &message));
            }
            Err(TranslationError::Syntax(detail)) => {
                warn!("unparsable query {:?}: {}", query, detail);
                return Outcome::InternalError(format!("{}{}", CQL_PARSE_ERROR, detail));
            }
        };
        let bounded = paginate(translation, limit, offset);

        let store = match self.store(tenant, lang).await {
            Ok(s) => s,
            Err(outcome) => return outcome,
        };
        let page = match store.list(&self.resource.table, &bounded, true).await {
            Ok(page) => page,
            Err(e) => return classify(&e, "", lang, &self.messages),
        };

        let mut notifications = Vec::with_capacity(page.documents.len());
        for document in page.documents {
            match Notification::from_document(document) {
                Ok(n) => notifications.push(n),
                Err(e) => {
                    error!("unreadable {} document: {}", self.resource.table, e);
                    return self.internal(lang);
                }
            }
        }
        debug!(
            "listed {} of {:?} notifications for tenant {}",
            notifications.len(),
            page.total,
            tenant
        );
        Outcome::Ok(NotifyCollection {
            notifications,
            total_records: page.total.unwrap_or(0),
        })
    }

    pub async fn get(&self, tenant: &TenantId, id: &str, lang: &str) -> Outcome<Notification> {
        let store = match self.store(tenant, lang).await {
            Ok(s) => s,
            Err(outcome) => return outcome,
        };
        match store.get_by_id(&self.resource.table, id).await {
            Ok(Some(document)) => match Notification::from_document(document) {
                Ok(n) => Outcome::Ok(n),
                Err(e) => {
                    error!("unreadable {} document {}: {}", self.resource.table, id, e);
                    self.internal(lang)
                }
            },
            Ok(None) => Outcome::NotFound(id.to_string()),
            Err(e) => classify(&e, id, lang, &self.messages),
        }
    }

    pub async fn create(&self, tenant: &TenantId, mut entity: Notification, lang: &str) -> Outcome<Notification> {
        // The id ends up in the Location header.
        if let Some(id) = entity.id.as_deref() {
            if id.chars().any(char::is_control) {
                warn!("refused id {:?}", id);
                return Outcome::ValidationError(Errors::validation(&self.resource.id_field, id, INVALID_ID));
            }
        }
        let store = match self.store(tenant, lang).await {
            Ok(s) => s,
            Err(outcome) => return outcome,
        };
        let attempted = entity.id.clone().unwrap_or_default();
        let document = JsonValue::Object(entity.body.clone());
        match store.insert(&self.resource.table, entity.id.as_deref(), document).await {
            Ok(id) => {
                info!("created notification {} for tenant {}", id, tenant);
                let location = self.resource.location(&id);
                entity.id = Some(id);
                Outcome::Created {
                    location,
                    body: entity,
                }
            }
            Err(e) => classify(&e, &attempted, lang, &self.messages),
        }
    }

    pub async fn update(&self, tenant: &TenantId, id: &str, entity: Notification, lang: &str) -> Outcome<()> {
        if let Some(body_id) = entity.id.as_deref() {
            if body_id != id {
                warn!("refused to change id {} to {}", id, body_id);
                return Outcome::ValidationError(Errors::validation(
                    &self.resource.id_field,
                    body_id,
                    ID_CHANGE,
                ));
            }
        }
        let store = match self.store(tenant, lang).await {
            Ok(s) => s,
            Err(outcome) => return outcome,
        };
        match store.update(&self.resource.table, entity.to_document(id), id).await {
            Ok(0) => {
                warn!("update of {} touched no rows", id);
                Outcome::InternalError(self.messages.no_records_updated(lang))
            }
            Ok(_) => Outcome::NoContent,
            Err(e) => {
                error!("update {} failed: {:?}", id, e);
                self.internal(lang)
            }
        }
    }

    pub async fn delete(&self, tenant: &TenantId, id: &str, lang: &str) -> Outcome<()> {
        let store = match self.store(tenant, lang).await {
            Ok(s) => s,
            Err(outcome) => return outcome,
        };
        match store.delete_by_id(&self.resource.table, id).await {
            Ok(1) => {
                info!("deleted notification {} for tenant {}", id, tenant);
                Outcome::NoContent
            }
            Ok(n) => Outcome::NotFound(self.messages.deleted_count_error(lang, 1, n)),
            Err(e) => classify(&e, id, lang, &self.messages),
        }
    }

    /// Notifications addressed to the calling user.
    pub fn get_self(&self) -> Outcome<NotifyCollection> {
        Outcome::Unsupported(NOT_SUPPORTED.to_string())
    }

    pub fn post_self(&self) -> Outcome<Notification> {
        Outcome::Unsupported(NOT_SUPPORTED.to_string())
    }
}
