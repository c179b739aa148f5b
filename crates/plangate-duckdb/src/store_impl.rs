use async_trait::async_trait;

use plangate_core::plan::ResourceKind;
use plangate_core::store::{
    HistoryEntry, SubscriptionStore, UsageCounter, UsageHistoryStore, UsageSnapshot,
};
use plangate_core::subscription::SubscriptionRecord;

use crate::DuckDbBackend;

#[async_trait]
impl SubscriptionStore for DuckDbBackend {
    async fn find_subscription(
        &self,
        tenant_id: &str,
    ) -> anyhow::Result<Option<SubscriptionRecord>> {
        DuckDbBackend::find_subscription(self, tenant_id).await
    }
}

#[async_trait]
impl UsageCounter for DuckDbBackend {
    async fn count_resources(&self, tenant_id: &str, kind: ResourceKind) -> anyhow::Result<u64> {
        DuckDbBackend::count_resources(self, tenant_id, kind).await
    }
}

#[async_trait]
impl UsageHistoryStore for DuckDbBackend {
    async fn append_history(&self, entry: &HistoryEntry) -> anyhow::Result<()> {
        self.insert_usage_history(entry).await
    }

    async fn append_snapshot(&self, snapshot: &UsageSnapshot) -> anyhow::Result<()> {
        self.insert_usage_snapshot(snapshot).await
    }
}
