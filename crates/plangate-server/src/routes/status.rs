use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use plangate_core::plan::ResourceKind;

use crate::{error::AppError, state::AppState, tenant::TenantId};

/// `GET /api/subscription/status`: the tenant's effective plan next to its
/// current usage.
///
/// ```json
/// {
///   "plan": { "slug": "pro", "name": "Pro" },
///   "status": "active",
///   "limits": { "expenses": 1000, "cards": 10, "categories": 50, "loans": 5 },
///   "usage": { "expenses": 12, "cards": 1, "categories": 4, "loans": 0 },
///   "features": ["csv_export"],
///   "currentPeriodEnd": "2026-11-30T23:59:59Z"
/// }
/// ```
///
/// Unlimited ceilings are reported as `-1`.
#[tracing::instrument(skip(state))]
pub async fn subscription_status(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
) -> Result<impl IntoResponse, AppError> {
    let (plan, usage) = tokio::try_join!(
        state.limits.get_plan_for_user(&tenant_id),
        state.limits.get_usage(&tenant_id),
    )?;

    Ok(Json(json!({
        "plan": { "slug": plan.slug, "name": plan.name },
        "status": plan.status,
        "limits": {
            "expenses": plan.limits.ceiling(ResourceKind::Expenses),
            "cards": plan.limits.ceiling(ResourceKind::Cards),
            "categories": plan.limits.ceiling(ResourceKind::Categories),
            "loans": plan.limits.ceiling(ResourceKind::Loans),
        },
        "usage": usage,
        "features": plan.features,
        "currentPeriodEnd": plan.current_period_end,
    })))
}
