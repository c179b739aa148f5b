use std::sync::Arc;

use crate::store::SubscriptionStore;
use crate::subscription::EffectivePlan;

/// Resolves the plan a tenant is currently on.
#[derive(Clone)]
pub struct PlanResolver {
    store: Arc<dyn SubscriptionStore>,
}

impl PlanResolver {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    /// Tenants without a subscription resolve to [`EffectivePlan::default_free`].
    /// Only a store failure is an error.
    pub async fn resolve_effective_plan(&self, tenant_id: &str) -> anyhow::Result<EffectivePlan> {
        match self.store.find_subscription(tenant_id).await? {
            Some(record) => Ok(EffectivePlan::from_subscription(record)),
            None => Ok(EffectivePlan::default_free()),
        }
    }
}
