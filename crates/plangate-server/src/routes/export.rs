use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
};

use plangate_core::feature::FeatureCheck;
use plangate_core::store::UsageSnapshot;

use crate::{error::AppError, state::AppState, tenant::TenantId};

pub const CSV_EXPORT_FEATURE: &str = "csv_export";

/// Prefix values a spreadsheet would evaluate as a formula.
fn sanitize_csv_field(val: &str) -> std::borrow::Cow<'_, str> {
    if val.starts_with(['=', '+', '-', '@', '\t', '\r']) {
        std::borrow::Cow::Owned(format!("'{val}"))
    } else {
        std::borrow::Cow::Borrowed(val)
    }
}

fn build_csv(rows: &[UsageSnapshot]) -> anyhow::Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::with_capacity(rows.len().saturating_mul(64)));
    wtr.write_record(["timestamp", "plan", "resource", "used", "limit"])
        .map_err(|e| anyhow::anyhow!("csv write_record failed: {e}"))?;

    for row in rows {
        let plan = sanitize_csv_field(&row.plan_slug);
        wtr.write_record([
            row.timestamp.to_rfc3339().as_str(),
            plan.as_ref(),
            row.resource_kind.as_str(),
            row.used.to_string().as_str(),
            row.limit_value.as_wire().to_string().as_str(),
        ])
        .map_err(|e| anyhow::anyhow!("csv write_record failed: {e}"))?;
    }

    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("csv flush failed: {e}"))
}

/// `GET /api/export/usage.csv`: the tenant's usage snapshots, oldest first.
///
/// Requires the `csv_export` feature; otherwise 402 `feature_locked`.
#[tracing::instrument(skip(state))]
pub async fn export_usage(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
) -> Result<Response, AppError> {
    if let FeatureCheck::Locked { required_plan, .. } =
        state.limits.check_feature(&tenant_id, CSV_EXPORT_FEATURE).await?
    {
        return Err(AppError::FeatureLocked {
            feature: CSV_EXPORT_FEATURE.to_string(),
            required_plan,
        });
    }

    let rows = state.db.list_usage_snapshots(&tenant_id).await?;
    let csv_bytes = build_csv(&rows)?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"usage.csv\"",
        )
        .body(Body::from(csv_bytes))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("response build failed: {e}")))
}
