use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::plan::{Ceiling, ResourceKind};
use crate::subscription::SubscriptionRecord;

/// Written once after a successful creation, attached to the subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub subscription_id: String,
    pub resource_kind: ResourceKind,
    pub used: u64,
    pub limit_value: Ceiling,
    pub timestamp: DateTime<Utc>,
}

/// Tenant-keyed counterpart of [`HistoryEntry`], kept across plan changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    pub tenant_id: String,
    pub plan_slug: String,
    pub resource_kind: ResourceKind,
    pub used: u64,
    pub limit_value: Ceiling,
    pub timestamp: DateTime<Utc>,
}

/// Read access to subscriptions joined to their plan.
#[async_trait]
pub trait SubscriptionStore: Send + Sync + 'static {
    /// `Ok(None)` means the tenant has never subscribed.
    async fn find_subscription(&self, tenant_id: &str)
        -> anyhow::Result<Option<SubscriptionRecord>>;
}

/// Live row counts per tenant.
#[async_trait]
pub trait UsageCounter: Send + Sync + 'static {
    async fn count_resources(&self, tenant_id: &str, kind: ResourceKind) -> anyhow::Result<u64>;
}

/// Append-only storage for usage history and snapshots.
#[async_trait]
pub trait UsageHistoryStore: Send + Sync + 'static {
    async fn append_history(&self, entry: &HistoryEntry) -> anyhow::Result<()>;
    async fn append_snapshot(&self, snapshot: &UsageSnapshot) -> anyhow::Result<()>;
}
