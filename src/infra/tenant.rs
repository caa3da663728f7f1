//! Tenant resolution from request headers.

use axum::http::HeaderMap;
use thiserror::Error;

/// Header carrying the tenant id.
pub const TENANT_HEADER: &str = "x-okapi-tenant";
/// Tenant used when the header is absent.
pub const DEFAULT_TENANT: &str = "folio_shared";
/// Suffix of per-tenant database schemas.
pub const MODULE_NAME: &str = "mod_notify";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TenantError {
    #[error("Invalid tenant id '{0}'")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantId(String);

impl TenantId {
    pub fn parse(raw: &str) -> Result<Self, TenantError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::default());
        }
        if !validate_ident(raw) {
            return Err(TenantError::Invalid(raw.to_string()));
        }
        Ok(TenantId(raw.to_string()))
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, TenantError> {
        match headers.get(TENANT_HEADER) {
            None => Ok(Self::default()),
            Some(value) => {
                let raw = value
                    .to_str()
                    .map_err(|_| TenantError::Invalid(String::from_utf8_lossy(value.as_bytes()).into_owned()))?;
                Self::parse(raw)
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Database schema holding this tenant's tables for `module`.
    pub fn schema_name(&self, module: &str) -> String {
        format!("{}_{}", self.0, module)
    }
}

impl Default for TenantId {
    fn default() -> Self {
        TenantId(DEFAULT_TENANT.to_string())
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A plain SQL identifier: a letter or underscore, then letters, digits, underscores.
pub fn validate_ident(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
