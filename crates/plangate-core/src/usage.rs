use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::plan::ResourceKind;
use crate::store::UsageCounter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounts {
    pub expenses: u64,
    pub cards: u64,
    pub categories: u64,
    pub loans: u64,
}

impl UsageCounts {
    pub fn get(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Expenses => self.expenses,
            ResourceKind::Cards => self.cards,
            ResourceKind::Categories => self.categories,
            ResourceKind::Loans => self.loans,
        }
    }
}

/// Counts a tenant's live resources of every kind.
#[derive(Clone)]
pub struct UsageReader {
    counter: Arc<dyn UsageCounter>,
}

impl UsageReader {
    pub fn new(counter: Arc<dyn UsageCounter>) -> Self {
        Self { counter }
    }

    /// Issue the four counts concurrently and wait for all of them.
    ///
    /// The counts are not a consistent snapshot of each other.
    pub async fn read_usage(&self, tenant_id: &str) -> anyhow::Result<UsageCounts> {
        let (expenses, cards, categories, loans) = tokio::try_join!(
            self.counter.count_resources(tenant_id, ResourceKind::Expenses),
            self.counter.count_resources(tenant_id, ResourceKind::Cards),
            self.counter.count_resources(tenant_id, ResourceKind::Categories),
            self.counter.count_resources(tenant_id, ResourceKind::Loans),
        )?;
        Ok(UsageCounts {
            expenses,
            cards,
            categories,
            loans,
        })
    }
}
