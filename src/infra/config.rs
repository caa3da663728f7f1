//! Centralized configuration (environment variables + defaults).

use anyhow::Context;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8081";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_LANG: &str = "en";

/// Loads `.env` when present. Safe to call more than once.
pub fn load_dotenv() {
    dotenv::dotenv().ok();
}

/// Database URL. No default; the in-memory backend does not need one.
pub fn database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty())
}

pub fn max_connections() -> anyhow::Result<u32> {
    match std::env::var("DB_MAX_CONNECTIONS") {
        Ok(v) => Ok(v
            .trim()
            .parse::<u32>()
            .with_context(|| format!("DB_MAX_CONNECTIONS must be a valid u32, got '{}'", v))?
            .max(1)),
        Err(_) => Ok(DEFAULT_MAX_CONNECTIONS),
    }
}

pub fn bind_addr() -> anyhow::Result<SocketAddr> {
    let raw = std::env::var("NOTIFY_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    raw.parse()
        .with_context(|| format!("NOTIFY_BIND_ADDR is not a socket address: '{}'", raw))
}

/// Optional path of a JSON schema replacing the bundled query schema.
pub fn query_schema_path() -> Option<PathBuf> {
    std::env::var("NOTIFY_QUERY_SCHEMA")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

pub fn validate_query_fields() -> bool {
    match std::env::var("NOTIFY_VALIDATE_QUERY_FIELDS") {
        Ok(v) => !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no" | "off"),
        Err(_) => true,
    }
}

pub fn default_lang() -> String {
    std::env::var("NOTIFY_DEFAULT_LANG")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LANG.to_string())
}

/// Everything the server needs at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    pub query_schema: Option<PathBuf>,
    pub validate_query_fields: bool,
    pub default_lang: String,
}

impl ServiceConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        load_dotenv();
        Ok(Self {
            database_url: database_url(),
            max_connections: max_connections()?,
            bind_addr: bind_addr()?,
            query_schema: query_schema_path(),
            validate_query_fields: validate_query_fields(),
            default_lang: default_lang(),
        })
    }
}
