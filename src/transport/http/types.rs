use crate::app::NotifyService;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<NotifyService>,
    /// Pinged by the health check; `None` for the in-memory backend.
    pub pool: Option<PgPool>,
    /// Language used when a request carries no `lang`.
    pub default_lang: String,
}

impl AppState {
    pub fn lang<'a>(&'a self, requested: &'a Option<String>) -> &'a str {
        requested
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(self.default_lang.as_str())
    }
}

fn default_limit() -> u32 {
    10
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// CQL query, e.g. `recipientId=1234 sortBy metadata.createdDate/sort.descending`.
    #[serde(default)]
    pub query: Option<String>,
    /// Records to skip.
    #[serde(default)]
    #[param(minimum = 0, default = 0)]
    pub offset: u32,
    /// Maximum records to return.
    #[serde(default = "default_limit")]
    #[param(minimum = 0, default = 10)]
    pub limit: u32,
    /// Language of error messages.
    #[serde(default)]
    pub lang: Option<String>,
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LangParam {
    /// Language of error messages.
    #[serde(default)]
    pub lang: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
