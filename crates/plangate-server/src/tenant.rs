use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

pub const TENANT_HEADER: &str = "x-tenant-id";

/// The authenticated tenant, as forwarded by the upstream auth layer.
#[derive(Debug, Clone)]
pub struct TenantId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for TenantId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| TenantId(value.to_string()))
            .ok_or(AppError::Unauthorized)
    }
}
