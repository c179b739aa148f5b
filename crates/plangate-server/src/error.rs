use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use plangate_core::plan::{Ceiling, ResourceKind};

/// Application-level errors that map directly to HTTP responses.
///
/// Plan denials (`LimitExceeded`, `FeatureLocked`) are business responses:
/// they carry a flat 402 body the client uses to render an upgrade prompt.
/// Everything else uses the `{ error: { code, message, field } }` envelope.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("{resource} limit reached ({used}/{limit})")]
    LimitExceeded {
        resource: ResourceKind,
        required_plan: String,
        used: u64,
        limit: Ceiling,
    },

    #[error("feature {feature} requires the {required_plan} plan")]
    FeatureLocked {
        feature: String,
        required_plan: String,
    },

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

fn upgrade_url(required_plan: &str) -> String {
    format!("/pricing?highlight={required_plan}")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::LimitExceeded {
                resource,
                required_plan,
                used,
                limit,
            } => {
                return (
                    StatusCode::PAYMENT_REQUIRED,
                    Json(json!({
                        "error": "limit_exceeded",
                        "message": format!(
                            "You have reached your plan's {resource} limit. \
                             Upgrade to {required_plan} to add more."
                        ),
                        "upgradeUrl": upgrade_url(required_plan),
                        "resource": resource,
                        "requiredPlan": required_plan,
                        "used": used,
                        "limit": limit,
                    })),
                )
                    .into_response();
            }
            AppError::FeatureLocked {
                feature,
                required_plan,
            } => {
                return (
                    StatusCode::PAYMENT_REQUIRED,
                    Json(json!({
                        "error": "feature_locked",
                        "message": format!(
                            "{feature} is not included in your plan. \
                             Upgrade to {required_plan} to unlock it."
                        ),
                        "upgradeUrl": upgrade_url(required_plan),
                        "resource": feature,
                        "requiredPlan": required_plan,
                        "used": null,
                        "limit": null,
                    })),
                )
                    .into_response();
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.as_str()),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.as_str())
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Missing tenant identity",
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };

        (
            status,
            Json(json!({
                "error": {
                    "code": code,
                    "message": message,
                    "field": null
                }
            })),
        )
            .into_response()
    }
}
