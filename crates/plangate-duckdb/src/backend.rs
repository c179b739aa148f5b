use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::info;

use plangate_core::plan::ResourceKind;

use crate::schema::init_sql;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Render a UTC timestamp the way DuckDB's `TIMESTAMP` casts it back.
pub(crate) fn to_db_timestamp(ts: &DateTime<Utc>) -> String {
    ts.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Parse `CAST(ts AS VARCHAR)` output as UTC.
pub(crate) fn from_db_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|e| anyhow::anyhow!("invalid timestamp {raw:?}: {e}"))?;
    Ok(naive.and_utc())
}

/// Table holding rows of `kind`. Identifiers are fixed, never user input.
pub(crate) fn resource_table(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Expenses => "expenses",
        ResourceKind::Cards => "cards",
        ResourceKind::Categories => "categories",
        ResourceKind::Loans => "loans",
    }
}

/// A DuckDB backend for plangate.
///
/// DuckDB is single-writer: concurrent reads are fine, but concurrent writes
/// cause contention. The connection sits behind `Arc<Mutex<_>>` so the struct
/// can be shared across Axum handlers while statements run one at a time.
pub struct DuckDbBackend {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl DuckDbBackend {
    /// Open (or create) a DuckDB database file at `path`.
    ///
    /// `memory_limit` is a DuckDB size string such as `"1GB"` or `"512MB"`.
    pub fn open(path: &str, memory_limit: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit))?;
        info!(
            "DuckDB opened at {} with memory_limit={}, threads=2",
            path, memory_limit
        );
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an **in-memory** DuckDB database.
    ///
    /// Intended for tests only; data is discarded when the struct is dropped.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Execute `SELECT 1` as a lightweight liveness check.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch("SELECT 1")?;
        Ok(())
    }

    /// Acquire the DuckDB connection lock for direct queries.
    ///
    /// Intended for integration tests that need to verify stored data.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_round_trip() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 5).unwrap();
        let raw = to_db_timestamp(&ts);
        assert_eq!(raw, "2026-03-01 12:30:05.000000");
        assert_eq!(from_db_timestamp(&raw).unwrap(), ts);
        assert_eq!(from_db_timestamp("2026-03-01 12:30:05").unwrap(), ts);
    }

    #[tokio::test]
    async fn test_open_in_memory_creates_schema() {
        let db = DuckDbBackend::open_in_memory().unwrap();
        db.ping().await.unwrap();

        let conn = db.conn_for_test().await;
        for kind in ResourceKind::ALL {
            let count: i64 = conn
                .prepare(&format!("SELECT COUNT(*) FROM {}", resource_table(kind)))
                .unwrap()
                .query_row([], |row| row.get(0))
                .unwrap();
            assert_eq!(count, 0);
        }

        let tables: Vec<String> = conn
            .prepare("SELECT table_name FROM information_schema.tables ORDER BY table_name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            tables,
            vec![
                "cards",
                "categories",
                "expenses",
                "loans",
                "plans",
                "subscriptions",
                "usage_history",
                "usage_snapshots",
            ]
        );
    }
}
