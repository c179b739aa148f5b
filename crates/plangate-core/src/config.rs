#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub duckdb_memory_limit: String,
    pub cors_origins: Vec<String>,
    /// When `false`, every resource kind is treated as unlimited and every
    /// feature flag is granted.
    pub feature_limits_enabled: bool,
    /// When `false`, limit decisions are not written to the audit sink at all.
    pub audit_log_enabled: bool,
    pub audit_log_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let data_dir =
            std::env::var("PLANGATE_DATA_DIR").unwrap_or_else(|_| "./data".to_string());
        Ok(Self {
            port: std::env::var("PLANGATE_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            duckdb_memory_limit: std::env::var("PLANGATE_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
            cors_origins: std::env::var("PLANGATE_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            feature_limits_enabled: flag_enabled(
                std::env::var("PLANGATE_FEATURE_LIMITS").ok().as_deref(),
            ),
            audit_log_enabled: flag_enabled(std::env::var("PLANGATE_AUDIT_LOG").ok().as_deref()),
            audit_log_path: std::env::var("PLANGATE_AUDIT_LOG_PATH")
                .unwrap_or_else(|_| format!("{data_dir}/limit-events.jsonl")),
            data_dir,
        })
    }
}

/// Toggles default to enabled; only an explicit "off" value disables them.
pub fn flag_enabled(raw: Option<&str>) -> bool {
    match raw.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) => !matches!(v.as_str(), "false" | "0" | "off" | "no" | "disabled"),
        None => true,
    }
}
