use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tracing::warn;

use plangate_core::plan::{PlanRecord, FREE_PLAN_SLUG, PREMIUM_PLAN_SLUG, PRO_PLAN_SLUG};
use plangate_core::subscription::{SubscriptionRecord, SubscriptionStatus};

use crate::backend::{from_db_timestamp, to_db_timestamp};
use crate::DuckDbBackend;

/// Plans seeded into a fresh database.
///
/// Existing rows are left alone on later startups so that edits made by
/// billing administration survive restarts.
pub fn builtin_plans() -> Vec<PlanRecord> {
    fn plan(slug: &str, name: &str, limits: Value, features: &[&str]) -> PlanRecord {
        PlanRecord {
            id: format!("plan_{slug}"),
            slug: slug.to_string(),
            name: name.to_string(),
            limits: limits.as_object().cloned().unwrap_or_default(),
            features: features.iter().map(|f| f.to_string()).collect(),
        }
    }

    vec![
        plan(
            FREE_PLAN_SLUG,
            "Free",
            json!({
                "maxExpensesPerMonth": 50,
                "maxCards": 2,
                "maxCategories": 10,
                "maxLoans": 0
            }),
            &[],
        ),
        plan(
            PRO_PLAN_SLUG,
            "Pro",
            json!({
                "maxExpensesPerMonth": 1000,
                "maxCards": 10,
                "maxCategories": 50,
                "maxLoans": 5
            }),
            &["csv_export"],
        ),
        plan(
            PREMIUM_PLAN_SLUG,
            "Premium",
            json!({
                "maxExpensesPerMonth": -1,
                "maxCards": -1,
                "maxCategories": -1,
                "maxLoans": -1
            }),
            &["csv_export", "pdf_export", "investments"],
        ),
    ]
}

fn decode_limits(plan_slug: &str, raw: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            warn!(plan = plan_slug, "Plan limits are not a JSON object, using defaults");
            Map::new()
        }
    }
}

fn decode_features(plan_slug: &str, raw: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<Value>>(raw) {
        Ok(values) => values
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Err(_) => {
            warn!(plan = plan_slug, "Plan features are not a JSON array, using none");
            Vec::new()
        }
    }
}

fn decode_status(tenant_id: &str, raw: &str) -> SubscriptionStatus {
    raw.parse().unwrap_or_else(|_| {
        warn!(tenant_id, status = raw, "Unknown subscription status, treating as inactive");
        SubscriptionStatus::Inactive
    })
}

struct SubscriptionRow {
    id: String,
    tenant_id: String,
    status: String,
    current_period_end: Option<String>,
    plan_id: String,
    plan_slug: String,
    plan_name: String,
    limits: String,
    features: String,
}

impl DuckDbBackend {
    /// Insert the built-in plans unless rows with the same id already exist.
    pub async fn seed_default_plans(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        for plan in builtin_plans() {
            conn.execute(
                "INSERT OR IGNORE INTO plans (id, slug, name, limits, features) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                duckdb::params![
                    plan.id,
                    plan.slug,
                    plan.name,
                    Value::Object(plan.limits).to_string(),
                    serde_json::to_string(&plan.features)?,
                ],
            )?;
        }
        Ok(())
    }

    /// Insert or update a plan by id. The slug of an existing plan is kept.
    pub async fn upsert_plan(&self, plan: &PlanRecord) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO plans (id, slug, name, limits, features)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT (id) DO UPDATE SET
                   name = EXCLUDED.name,
                   limits = EXCLUDED.limits,
                   features = EXCLUDED.features,
                   updated_at = CURRENT_TIMESTAMP"#,
            duckdb::params![
                plan.id,
                plan.slug,
                plan.name,
                Value::Object(plan.limits.clone()).to_string(),
                serde_json::to_string(&plan.features)?,
            ],
        )?;
        Ok(())
    }

    /// Bind `tenant_id` to the plan with `plan_slug`, replacing any previous
    /// binding. Returns the subscription id.
    ///
    /// Intended for test fixtures and local setup; production subscriptions
    /// are written by the billing integration.
    pub async fn seed_subscription(
        &self,
        tenant_id: &str,
        plan_slug: &str,
        status: SubscriptionStatus,
        current_period_end: Option<DateTime<Utc>>,
    ) -> Result<String> {
        let conn = self.conn.lock().await;
        let plan_id: String = match conn
            .prepare("SELECT id FROM plans WHERE slug = ?1")?
            .query_row(duckdb::params![plan_slug], |row| row.get(0))
        {
            Ok(id) => id,
            Err(duckdb::Error::QueryReturnedNoRows) => {
                anyhow::bail!("unknown plan slug: {plan_slug}")
            }
            Err(e) => return Err(e.into()),
        };

        let new_id = format!("sub_{}", uuid::Uuid::new_v4().simple());
        conn.execute(
            r#"INSERT INTO subscriptions (id, tenant_id, plan_id, status, current_period_end)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT (tenant_id) DO UPDATE SET
                   plan_id = EXCLUDED.plan_id,
                   status = EXCLUDED.status,
                   current_period_end = EXCLUDED.current_period_end,
                   updated_at = CURRENT_TIMESTAMP"#,
            duckdb::params![
                new_id,
                tenant_id,
                plan_id,
                status.as_str(),
                current_period_end.as_ref().map(to_db_timestamp),
            ],
        )?;

        let id: String = conn
            .prepare("SELECT id FROM subscriptions WHERE tenant_id = ?1")?
            .query_row(duckdb::params![tenant_id], |row| row.get(0))?;
        Ok(id)
    }

    /// The tenant's subscription joined to its plan.
    ///
    /// A subscription pointing at a missing plan is reported as absent.
    pub async fn find_subscription(&self, tenant_id: &str) -> Result<Option<SubscriptionRecord>> {
        let row = {
            let conn = self.conn.lock().await;
            let mut stmt = conn.prepare(
                r#"SELECT s.id, s.tenant_id, s.status, CAST(s.current_period_end AS VARCHAR),
                          p.id, p.slug, p.name, p.limits, p.features
                   FROM subscriptions s
                   JOIN plans p ON p.id = s.plan_id
                   WHERE s.tenant_id = ?1"#,
            )?;
            match stmt.query_row(duckdb::params![tenant_id], |row| {
                Ok(SubscriptionRow {
                    id: row.get(0)?,
                    tenant_id: row.get(1)?,
                    status: row.get(2)?,
                    current_period_end: row.get(3)?,
                    plan_id: row.get(4)?,
                    plan_slug: row.get(5)?,
                    plan_name: row.get(6)?,
                    limits: row.get(7)?,
                    features: row.get(8)?,
                })
            }) {
                Ok(row) => row,
                Err(duckdb::Error::QueryReturnedNoRows) => return Ok(None),
                Err(e) => return Err(anyhow::anyhow!(e)),
            }
        };

        let current_period_end = row
            .current_period_end
            .as_deref()
            .map(from_db_timestamp)
            .transpose()?;

        Ok(Some(SubscriptionRecord {
            status: decode_status(&row.tenant_id, &row.status),
            current_period_end,
            plan: PlanRecord {
                limits: decode_limits(&row.plan_slug, &row.limits),
                features: decode_features(&row.plan_slug, &row.features),
                id: row.plan_id,
                slug: row.plan_slug,
                name: row.plan_name,
            },
            id: row.id,
            tenant_id: row.tenant_id,
        }))
    }
}
