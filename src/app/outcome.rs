//! Result of one resource operation, before it is rendered as a response.

use crate::domain::model::Errors;

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ok(T),
    /// A record was stored; `location` addresses it.
    Created { location: String, body: T },
    NoContent,
    ValidationError(Errors),
    NotFound(String),
    BadRequest(String),
    InternalError(String),
    Unsupported(String),
}
