//! Maps store failures to caller-facing outcomes.

use tracing::{error, warn};

use crate::app::outcome::Outcome;
use crate::domain::model::Errors;
use crate::infra::messages::Messages;
use crate::storage::StoreError;

pub const DUPLICATE_KEY: &str = "duplicate key value violates unique constraint";

/// SQLSTATEs whose detail (falling back to the message) is safe to return.
const DETAIL_CODES: &[&str] = &["23503", "23505"];
/// SQLSTATEs whose message is safe to return.
const MESSAGE_CODES: &[&str] = &["22P02", "22007", "22003", "23502", "23514"];

/// The caller-facing text of an error caused by bad input, if it is one.
pub fn bad_request_message(err: &StoreError) -> Option<String> {
    let StoreError::Database {
        code: Some(code),
        message,
        detail,
    } = err
    else {
        return None;
    };
    if DETAIL_CODES.contains(&code.as_str()) {
        return Some(detail.clone().unwrap_or_else(|| message.clone()));
    }
    if MESSAGE_CODES.contains(&code.as_str()) {
        return Some(message.clone());
    }
    None
}

pub fn classify<T>(err: &StoreError, attempted_id: &str, lang: &str, messages: &Messages) -> Outcome<T> {
    let raw = err.to_string();
    if raw.contains(DUPLICATE_KEY) {
        warn!("duplicate id '{}': {}", attempted_id, raw);
        return Outcome::ValidationError(Errors::validation("id", attempted_id, "Duplicate id"));
    }
    if let Some(hint) = bad_request_message(err) {
        warn!("rejected by store: {}", raw);
        return Outcome::BadRequest(hint);
    }
    error!("store failure: {:?}", err);
    Outcome::InternalError(messages.internal_server_error(lang))
}
