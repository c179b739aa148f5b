use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use plangate_core::plan::ResourceKind;

use crate::backend::{resource_table, to_db_timestamp};
use crate::DuckDbBackend;

/// A countable tenant resource (expense, card, category or loan).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub tenant_id: String,
    pub kind: ResourceKind,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

fn id_prefix(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Expenses => "exp",
        ResourceKind::Cards => "card",
        ResourceKind::Categories => "cat",
        ResourceKind::Loans => "loan",
    }
}

impl DuckDbBackend {
    pub async fn create_resource(
        &self,
        tenant_id: &str,
        kind: ResourceKind,
        name: &str,
    ) -> Result<Resource> {
        let resource = Resource {
            id: format!("{}_{}", id_prefix(kind), uuid::Uuid::new_v4().simple()),
            tenant_id: tenant_id.to_string(),
            kind,
            name: name.to_string(),
            created_at: Utc::now(),
        };

        let conn = self.conn.lock().await;
        conn.execute(
            &format!(
                "INSERT INTO {} (id, tenant_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
                resource_table(kind)
            ),
            duckdb::params![
                resource.id,
                resource.tenant_id,
                resource.name,
                to_db_timestamp(&resource.created_at),
            ],
        )?;

        Ok(resource)
    }

    /// Number of live `kind` rows owned by `tenant_id`.
    pub async fn count_resources(&self, tenant_id: &str, kind: ResourceKind) -> Result<u64> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .prepare(&format!(
                "SELECT COUNT(*) FROM {} WHERE tenant_id = ?1",
                resource_table(kind)
            ))?
            .query_row(duckdb::params![tenant_id], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
