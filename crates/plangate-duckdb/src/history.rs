use anyhow::Result;

use plangate_core::plan::{Ceiling, ResourceKind};
use plangate_core::store::{HistoryEntry, UsageSnapshot};

use crate::backend::{from_db_timestamp, to_db_timestamp};
use crate::DuckDbBackend;

fn wire_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn decode_kind(raw: &str) -> Result<ResourceKind> {
    raw.parse().map_err(|e| anyhow::anyhow!("{e}"))
}

impl DuckDbBackend {
    pub async fn insert_usage_history(&self, entry: &HistoryEntry) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO usage_history
                   (id, subscription_id, resource_kind, used, limit_value, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            duckdb::params![
                uuid::Uuid::new_v4().to_string(),
                entry.subscription_id,
                entry.resource_kind.as_str(),
                wire_count(entry.used),
                entry.limit_value.as_wire(),
                to_db_timestamp(&entry.timestamp),
            ],
        )?;
        Ok(())
    }

    pub async fn insert_usage_snapshot(&self, snapshot: &UsageSnapshot) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO usage_snapshots
                   (id, tenant_id, plan_slug, resource_kind, used, limit_value, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
            duckdb::params![
                uuid::Uuid::new_v4().to_string(),
                snapshot.tenant_id,
                snapshot.plan_slug,
                snapshot.resource_kind.as_str(),
                wire_count(snapshot.used),
                snapshot.limit_value.as_wire(),
                to_db_timestamp(&snapshot.timestamp),
            ],
        )?;
        Ok(())
    }

    /// History entries of a subscription, oldest first.
    pub async fn list_usage_history(&self, subscription_id: &str) -> Result<Vec<HistoryEntry>> {
        let rows: Vec<(String, String, i64, i64, String)> = {
            let conn = self.conn.lock().await;
            let mut stmt = conn.prepare(
                r#"SELECT subscription_id, resource_kind, used, limit_value,
                          CAST(created_at AS VARCHAR)
                   FROM usage_history
                   WHERE subscription_id = ?1
                   ORDER BY created_at ASC"#,
            )?;
            let mapped = stmt.query_map(duckdb::params![subscription_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })?;
            mapped.collect::<Result<_, _>>()?
        };

        rows.into_iter()
            .map(|(subscription_id, kind, used, limit, created_at)| {
                Ok(HistoryEntry {
                    subscription_id,
                    resource_kind: decode_kind(&kind)?,
                    used: u64::try_from(used).unwrap_or(0),
                    limit_value: Ceiling::from_wire(limit),
                    timestamp: from_db_timestamp(&created_at)?,
                })
            })
            .collect()
    }

    /// Usage snapshots of a tenant across all plans, oldest first.
    pub async fn list_usage_snapshots(&self, tenant_id: &str) -> Result<Vec<UsageSnapshot>> {
        let rows: Vec<(String, String, String, i64, i64, String)> = {
            let conn = self.conn.lock().await;
            let mut stmt = conn.prepare(
                r#"SELECT tenant_id, plan_slug, resource_kind, used, limit_value,
                          CAST(created_at AS VARCHAR)
                   FROM usage_snapshots
                   WHERE tenant_id = ?1
                   ORDER BY created_at ASC"#,
            )?;
            let mapped = stmt.query_map(duckdb::params![tenant_id], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })?;
            mapped.collect::<Result<_, _>>()?
        };

        rows.into_iter()
            .map(|(tenant_id, plan_slug, kind, used, limit, created_at)| {
                Ok(UsageSnapshot {
                    tenant_id,
                    plan_slug,
                    resource_kind: decode_kind(&kind)?,
                    used: u64::try_from(used).unwrap_or(0),
                    limit_value: Ceiling::from_wire(limit),
                    timestamp: from_db_timestamp(&created_at)?,
                })
            })
            .collect()
    }
}
