//! Renders an [`Outcome`] as an HTTP response.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use crate::app::Outcome;
use crate::infra::messages::Messages;

/// Status code an outcome is rendered with.
pub fn status_of<T>(outcome: &Outcome<T>) -> StatusCode {
    match outcome {
        Outcome::Ok(_) => StatusCode::OK,
        Outcome::Created { .. } => StatusCode::CREATED,
        Outcome::NoContent => StatusCode::NO_CONTENT,
        Outcome::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Outcome::NotFound(_) => StatusCode::NOT_FOUND,
        Outcome::BadRequest(_) => StatusCode::BAD_REQUEST,
        Outcome::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        Outcome::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
    }
}

/// The generic 500, used when a response cannot be built at all.
pub fn internal_error_response() -> Response {
    text(
        StatusCode::INTERNAL_SERVER_ERROR,
        Messages::default().internal_server_error("en"),
    )
}

pub fn text(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        body,
    )
        .into_response()
}

fn json<B: Serialize>(status: StatusCode, body: &B) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!("unable to serialize response body: {}", e);
            internal_error_response()
        }
    }
}

impl<T: Serialize> IntoResponse for Outcome<T> {
    fn into_response(self) -> Response {
        let status = status_of(&self);
        match self {
            Outcome::Ok(body) => json(status, &body),
            Outcome::Created { location, body } => {
                let Ok(location) = HeaderValue::from_str(&location) else {
                    error!("invalid Location header value: {}", location);
                    return internal_error_response();
                };
                let mut response = json(status, &body);
                if response.status() == status {
                    response.headers_mut().insert(header::LOCATION, location);
                }
                response
            }
            Outcome::NoContent => status.into_response(),
            Outcome::ValidationError(errors) => json(status, &errors),
            Outcome::NotFound(m)
            | Outcome::BadRequest(m)
            | Outcome::InternalError(m)
            | Outcome::Unsupported(m) => text(status, m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Errors;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_of(&Outcome::<()>::NoContent), StatusCode::NO_CONTENT);
        assert_eq!(
            status_of(&Outcome::<()>::ValidationError(Errors::validation("id", "", "x"))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(&Outcome::<()>::Unsupported("Not supported yet.".into())),
            StatusCode::NOT_IMPLEMENTED
        );
    }

    #[test]
    fn test_created_sets_location() {
        let response = Outcome::Created {
            location: "/notify/a".to_string(),
            body: serde_json::json!({"id": "a"}),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::LOCATION], "/notify/a");
    }

    #[test]
    fn test_plain_text_errors() {
        let response = Outcome::<()>::NotFound("a".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
    }
}
