use crate::domain::model::{Error, Errors, Notification, NotifyCollection, Parameter};
use crate::transport::http::handlers::{health, notifications};
use crate::transport::http::response::internal_error_response;
use crate::transport::http::types::{AppState, HealthResponse};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::error;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        notifications::list_handler,
        notifications::create_handler,
        notifications::get_handler,
        notifications::update_handler,
        notifications::delete_handler,
        notifications::get_self_handler,
        notifications::post_self_handler
    ),
    components(schemas(
        Notification,
        NotifyCollection,
        Errors,
        Error,
        Parameter,
        HealthResponse
    ))
)]
pub struct ApiDoc;

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("handler panicked: {}", detail);
    internal_error_response()
}

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/admin/health", get(health::healthcheck_handler))
        .route(
            "/notify",
            get(notifications::list_handler).post(notifications::create_handler),
        )
        .route(
            "/notify/_self",
            get(notifications::get_self_handler).post(notifications::post_self_handler),
        )
        .route(
            "/notify/:id",
            get(notifications::get_handler)
                .put(notifications::update_handler)
                .delete(notifications::delete_handler),
        )
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
