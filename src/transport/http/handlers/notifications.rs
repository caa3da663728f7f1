use crate::app::Outcome;
use crate::domain::model::{Notification, NotifyCollection};
use crate::transport::http::handlers::common::{json_body, tenant_from};
use crate::transport::http::types::{AppState, LangParam, ListParams};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;

#[utoipa::path(
    get,
    path = "/notify",
    params(
        ListParams,
        ("x-okapi-tenant" = Option<String>, Header, description = "Tenant id (default folio_shared)")
    ),
    responses(
        (status = 200, description = "One page of notifications", body = NotifyCollection),
        (status = 400, description = "Bad request", body = String, content_type = "text/plain"),
        (status = 422, description = "Query names an unknown field", body = crate::domain::model::Errors),
        (status = 500, description = "Internal error or unparsable query", body = String, content_type = "text/plain")
    )
)]
pub async fn list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Outcome<NotifyCollection> {
    let tenant = match tenant_from(&headers) {
        Ok(t) => t,
        Err(outcome) => return outcome,
    };
    let lang = state.lang(&params.lang);
    state
        .service
        .list(&tenant, params.query.as_deref(), params.offset, params.limit, lang)
        .await
}

#[utoipa::path(
    post,
    path = "/notify",
    request_body = Notification,
    params(
        LangParam,
        ("x-okapi-tenant" = Option<String>, Header, description = "Tenant id (default folio_shared)")
    ),
    responses(
        (status = 201, description = "Created; Location addresses the record", body = Notification),
        (status = 400, description = "Bad request", body = String, content_type = "text/plain"),
        (status = 422, description = "Duplicate id or invalid body", body = crate::domain::model::Errors),
        (status = 500, description = "Internal error", body = String, content_type = "text/plain")
    )
)]
pub async fn create_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<LangParam>,
    body: Result<Json<Notification>, JsonRejection>,
) -> Outcome<Notification> {
    let tenant = match tenant_from(&headers) {
        Ok(t) => t,
        Err(outcome) => return outcome,
    };
    let entity = match json_body(body) {
        Ok(e) => e,
        Err(outcome) => return outcome,
    };
    state.service.create(&tenant, entity, state.lang(&params.lang)).await
}

#[utoipa::path(
    get,
    path = "/notify/{id}",
    params(
        ("id" = String, Path, description = "Notification id"),
        LangParam,
        ("x-okapi-tenant" = Option<String>, Header, description = "Tenant id (default folio_shared)")
    ),
    responses(
        (status = 200, description = "The notification", body = Notification),
        (status = 404, description = "No notification with this id", body = String, content_type = "text/plain"),
        (status = 500, description = "Internal error", body = String, content_type = "text/plain")
    )
)]
pub async fn get_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<LangParam>,
) -> Outcome<Notification> {
    let tenant = match tenant_from(&headers) {
        Ok(t) => t,
        Err(outcome) => return outcome,
    };
    state.service.get(&tenant, &id, state.lang(&params.lang)).await
}

#[utoipa::path(
    put,
    path = "/notify/{id}",
    request_body = Notification,
    params(
        ("id" = String, Path, description = "Notification id"),
        LangParam,
        ("x-okapi-tenant" = Option<String>, Header, description = "Tenant id (default folio_shared)")
    ),
    responses(
        (status = 204, description = "Updated"),
        (status = 400, description = "Bad request", body = String, content_type = "text/plain"),
        (status = 422, description = "Body id differs from the path id", body = crate::domain::model::Errors),
        (status = 500, description = "Internal error or nothing updated", body = String, content_type = "text/plain")
    )
)]
pub async fn update_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<LangParam>,
    body: Result<Json<Notification>, JsonRejection>,
) -> Outcome<()> {
    let tenant = match tenant_from(&headers) {
        Ok(t) => t,
        Err(outcome) => return outcome,
    };
    let entity = match json_body(body) {
        Ok(e) => e,
        Err(outcome) => return outcome,
    };
    state
        .service
        .update(&tenant, &id, entity, state.lang(&params.lang))
        .await
}

#[utoipa::path(
    delete,
    path = "/notify/{id}",
    params(
        ("id" = String, Path, description = "Notification id"),
        LangParam,
        ("x-okapi-tenant" = Option<String>, Header, description = "Tenant id (default folio_shared)")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Bad request", body = String, content_type = "text/plain"),
        (status = 404, description = "Nothing deleted", body = String, content_type = "text/plain"),
        (status = 500, description = "Internal error", body = String, content_type = "text/plain")
    )
)]
pub async fn delete_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<LangParam>,
) -> Outcome<()> {
    let tenant = match tenant_from(&headers) {
        Ok(t) => t,
        Err(outcome) => return outcome,
    };
    state.service.delete(&tenant, &id, state.lang(&params.lang)).await
}

#[utoipa::path(
    get,
    path = "/notify/_self",
    responses((status = 501, description = "Not supported yet", body = String, content_type = "text/plain"))
)]
pub async fn get_self_handler(State(state): State<AppState>) -> Outcome<NotifyCollection> {
    state.service.get_self()
}

#[utoipa::path(
    post,
    path = "/notify/_self",
    responses((status = 501, description = "Not supported yet", body = String, content_type = "text/plain"))
)]
pub async fn post_self_handler(State(state): State<AppState>) -> Outcome<Notification> {
    state.service.post_self()
}
