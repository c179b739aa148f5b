use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::state::AppState;

fn health_body(status: StatusCode, label: &str) -> Response {
    (
        status,
        Json(json!({
            "status": label,
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
        .into_response()
}

/// `GET /health`: liveness check behind `plangate health`.
///
/// Every limit check reads plans, subscriptions and resource counts from
/// DuckDB, so the service is only healthy while the database answers. A
/// failed ping (file locked by another process, memory limit exhausted,
/// closed connection) reports `503` with `"status": "degraded"`; creation
/// endpoints would answer `500` in that state.
#[tracing::instrument(skip(state))]
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    if let Err(e) = state.db.ping().await {
        tracing::error!(error = %e, "Health check: DuckDB unreachable, limit checks will fail");
        return health_body(StatusCode::SERVICE_UNAVAILABLE, "degraded");
    }
    health_body(StatusCode::OK, "ok")
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_degraded_body_keeps_version() {
        let response = health_body(StatusCode::SERVICE_UNAVAILABLE, "degraded");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
