use std::sync::Arc;

use chrono::Utc;
use tracing::error;

use crate::plan::{Ceiling, ResourceKind};
use crate::store::{HistoryEntry, UsageHistoryStore, UsageSnapshot};

/// Usage after a successful creation, as handed to [`UsageRecorder`].
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRecord {
    pub tenant_id: String,
    pub subscription_id: Option<String>,
    pub resource_kind: ResourceKind,
    pub used_after: u64,
    pub limit: Ceiling,
    pub plan_slug: String,
}

/// Appends usage history after the caller's write has committed.
///
/// Never returns an error: a failed history write must not undo a creation
/// that already happened.
#[derive(Clone)]
pub struct UsageRecorder {
    store: Arc<dyn UsageHistoryStore>,
}

impl UsageRecorder {
    pub fn new(store: Arc<dyn UsageHistoryStore>) -> Self {
        Self { store }
    }

    /// No-op for tenants without a subscription.
    pub async fn record_usage(&self, record: UsageRecord) {
        let Some(subscription_id) = record.subscription_id else {
            return;
        };
        let timestamp = Utc::now();

        let entry = HistoryEntry {
            subscription_id,
            resource_kind: record.resource_kind,
            used: record.used_after,
            limit_value: record.limit,
            timestamp,
        };
        if let Err(e) = self.store.append_history(&entry).await {
            error!(
                subscription_id = %entry.subscription_id,
                resource = %entry.resource_kind,
                error = %e,
                "Failed to record usage history"
            );
        }

        let snapshot = UsageSnapshot {
            tenant_id: record.tenant_id,
            plan_slug: record.plan_slug,
            resource_kind: record.resource_kind,
            used: record.used_after,
            limit_value: record.limit,
            timestamp,
        };
        if let Err(e) = self.store.append_snapshot(&snapshot).await {
            error!(
                tenant_id = %snapshot.tenant_id,
                resource = %snapshot.resource_kind,
                error = %e,
                "Failed to record usage snapshot"
            );
        }
    }
}
