use crate::app::Outcome;
use crate::domain::model::{Errors, Notification};
use crate::infra::tenant::TenantId;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use axum::Json;
use tracing::warn;

/// The request's tenant, or the 400 to return instead.
pub fn tenant_from<T>(headers: &HeaderMap) -> Result<TenantId, Outcome<T>> {
    TenantId::from_headers(headers).map_err(|e| {
        warn!("{}", e);
        Outcome::BadRequest(e.to_string())
    })
}

/// A body that is well-formed JSON of the wrong shape is a 422; anything else is a 400.
pub fn json_body<T>(body: Result<Json<Notification>, JsonRejection>) -> Result<Notification, Outcome<T>> {
    match body {
        Ok(Json(entity)) => Ok(entity),
        Err(JsonRejection::JsonDataError(e)) => {
            warn!("invalid body: {}", e.body_text());
            Err(Outcome::ValidationError(Errors::validation(
                "body",
                "",
                &e.body_text(),
            )))
        }
        Err(e) => {
            warn!("rejected body: {}", e.body_text());
            Err(Outcome::BadRequest(e.body_text()))
        }
    }
}
