use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(parsed)
}

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order:
///
/// 1. `TraceLayer` for structured request/response logging via `tracing`.
/// 2. `CorsLayer`, permissive unless `PLANGATE_CORS_ORIGINS` lists origins.
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/api/subscription/status",
            get(routes::status::subscription_status),
        )
        .route("/api/expenses", post(routes::resources::create_expense))
        .route("/api/cards", post(routes::resources::create_card))
        .route("/api/categories", post(routes::resources::create_category))
        .route("/api/loans", post(routes::resources::create_loan))
        .route("/api/export/usage.csv", get(routes::export::export_usage))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
