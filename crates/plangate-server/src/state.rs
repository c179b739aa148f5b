use std::sync::Arc;

use plangate_core::audit::{AuditLogger, JsonLinesEventSink, LimitEventSink};
use plangate_core::PlanLimitService;
use plangate_duckdb::DuckDbBackend;

use crate::config::Config;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
pub struct AppState {
    /// The DuckDB backend. Also serves as the subscription store, usage
    /// counter and history store behind `limits`.
    pub db: Arc<DuckDbBackend>,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,

    pub limits: PlanLimitService,
}

impl AppState {
    /// Construct state with the JSON-lines audit sink at
    /// `config.audit_log_path`.
    pub fn new(db: DuckDbBackend, config: Config) -> Self {
        let sink = Arc::new(JsonLinesEventSink::new(config.audit_log_path.clone()));
        Self::with_audit_sink(db, config, sink)
    }

    pub fn with_audit_sink(
        db: DuckDbBackend,
        config: Config,
        sink: Arc<dyn LimitEventSink>,
    ) -> Self {
        let db = Arc::new(db);
        let limits = PlanLimitService::new(
            db.clone(),
            db.clone(),
            db.clone(),
            AuditLogger::new(config.audit_log_enabled, sink),
            config.feature_limits_enabled,
        );
        Self {
            db,
            config: Arc::new(config),
            limits,
        }
    }
}
