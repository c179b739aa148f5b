use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use plangate_core::plan::ResourceKind;
use plangate_core::recorder::UsageRecord;
use plangate_core::LimitDecision;

use crate::{error::AppError, state::AppState, tenant::TenantId};

const MAX_NAME_LEN: usize = 200;

#[derive(Debug, Deserialize)]
pub struct CreateResourceRequest {
    #[serde(default)]
    pub name: String,
}

fn validate_name(raw: &str) -> Result<&str, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name)
}

/// Check the tenant's ceiling for `kind`, insert the row, then record the
/// post-creation count.
///
/// The check and the insert are not atomic: two concurrent requests at
/// `limit - 1` can both pass.
async fn create_guarded(
    state: &AppState,
    tenant_id: &str,
    kind: ResourceKind,
    req: CreateResourceRequest,
) -> Result<impl IntoResponse, AppError> {
    let name = validate_name(&req.name)?;

    let (used, limit, plan, subscription_id) =
        match state.limits.check_limit(tenant_id, kind).await? {
            LimitDecision::Allowed {
                used,
                limit,
                plan,
                subscription_id,
            } => (used, limit, plan, subscription_id),
            LimitDecision::Blocked {
                required_plan,
                used,
                limit,
            } => {
                return Err(AppError::LimitExceeded {
                    resource: kind,
                    required_plan,
                    used,
                    limit,
                })
            }
        };

    let resource = state.db.create_resource(tenant_id, kind, name).await?;

    state
        .limits
        .record_usage(UsageRecord {
            tenant_id: tenant_id.to_string(),
            subscription_id,
            resource_kind: kind,
            used_after: used.saturating_add(1),
            limit,
            plan_slug: plan,
        })
        .await;

    Ok((StatusCode::CREATED, Json(json!({ "data": resource }))))
}

/// `POST /api/expenses`
#[tracing::instrument(skip(state, req))]
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    Json(req): Json<CreateResourceRequest>,
) -> Result<impl IntoResponse, AppError> {
    create_guarded(&state, &tenant_id, ResourceKind::Expenses, req).await
}

/// `POST /api/cards`
#[tracing::instrument(skip(state, req))]
pub async fn create_card(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    Json(req): Json<CreateResourceRequest>,
) -> Result<impl IntoResponse, AppError> {
    create_guarded(&state, &tenant_id, ResourceKind::Cards, req).await
}

/// `POST /api/categories`
#[tracing::instrument(skip(state, req))]
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    Json(req): Json<CreateResourceRequest>,
) -> Result<impl IntoResponse, AppError> {
    create_guarded(&state, &tenant_id, ResourceKind::Categories, req).await
}

/// `POST /api/loans`
#[tracing::instrument(skip(state, req))]
pub async fn create_loan(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    Json(req): Json<CreateResourceRequest>,
) -> Result<impl IntoResponse, AppError> {
    create_guarded(&state, &tenant_id, ResourceKind::Loans, req).await
}
