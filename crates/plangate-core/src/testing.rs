use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::plan::{PlanRecord, ResourceKind};
use crate::store::{HistoryEntry, SubscriptionStore, UsageCounter, UsageHistoryStore, UsageSnapshot};
use crate::subscription::{SubscriptionRecord, SubscriptionStatus};

/// In-memory implementation of every store trait, for unit tests.
#[derive(Default)]
pub(crate) struct MemoryStore {
    subscriptions: Mutex<HashMap<String, SubscriptionRecord>>,
    counts: Mutex<HashMap<(String, ResourceKind), u64>>,
    history: Mutex<Vec<HistoryEntry>>,
    snapshots: Mutex<Vec<UsageSnapshot>>,
    write_attempts: AtomicUsize,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryStore {
    pub(crate) fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    pub(crate) fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub(crate) fn subscribe(
        &self,
        tenant_id: &str,
        slug: &str,
        status: SubscriptionStatus,
        limits: Value,
        features: &[&str],
    ) {
        let record = SubscriptionRecord {
            id: format!("sub_{tenant_id}"),
            tenant_id: tenant_id.to_string(),
            status,
            current_period_end: None,
            plan: PlanRecord {
                id: format!("plan_{slug}"),
                slug: slug.to_string(),
                name: slug.to_uppercase(),
                limits: limits.as_object().cloned().unwrap_or_default(),
                features: features.iter().map(|f| f.to_string()).collect(),
            },
        };
        self.subscriptions
            .lock()
            .unwrap()
            .insert(tenant_id.to_string(), record);
    }

    pub(crate) fn set_count(&self, tenant_id: &str, kind: ResourceKind, count: u64) {
        self.counts
            .lock()
            .unwrap()
            .insert((tenant_id.to_string(), kind), count);
    }

    pub(crate) fn history(&self) -> Vec<HistoryEntry> {
        self.history.lock().unwrap().clone()
    }

    pub(crate) fn snapshots(&self) -> Vec<UsageSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }

    pub(crate) fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn find_subscription(
        &self,
        tenant_id: &str,
    ) -> anyhow::Result<Option<SubscriptionRecord>> {
        if self.fail_reads {
            anyhow::bail!("subscription store unreachable");
        }
        Ok(self.subscriptions.lock().unwrap().get(tenant_id).cloned())
    }
}

#[async_trait]
impl UsageCounter for MemoryStore {
    async fn count_resources(&self, tenant_id: &str, kind: ResourceKind) -> anyhow::Result<u64> {
        if self.fail_reads {
            anyhow::bail!("usage counter unreachable");
        }
        Ok(self
            .counts
            .lock()
            .unwrap()
            .get(&(tenant_id.to_string(), kind))
            .copied()
            .unwrap_or(0))
    }
}

#[async_trait]
impl UsageHistoryStore for MemoryStore {
    async fn append_history(&self, entry: &HistoryEntry) -> anyhow::Result<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            anyhow::bail!("history table locked");
        }
        self.history.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn append_snapshot(&self, snapshot: &UsageSnapshot) -> anyhow::Result<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            anyhow::bail!("snapshot table locked");
        }
        self.snapshots.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}
