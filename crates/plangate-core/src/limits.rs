use std::sync::Arc;

use crate::audit::AuditLogger;
use crate::evaluator::{LimitDecision, LimitEvaluator};
use crate::feature::{FeatureCheck, FeatureGate};
use crate::plan::ResourceKind;
use crate::recorder::{UsageRecord, UsageRecorder};
use crate::resolver::PlanResolver;
use crate::store::{SubscriptionStore, UsageCounter, UsageHistoryStore};
use crate::subscription::EffectivePlan;
use crate::usage::{UsageCounts, UsageReader};

/// Entry point used by request handlers: limit checks, feature checks,
/// usage recording, and the read-only plan/usage queries behind the status
/// endpoint.
#[derive(Clone)]
pub struct PlanLimitService {
    resolver: PlanResolver,
    usage: UsageReader,
    evaluator: LimitEvaluator,
    features: FeatureGate,
    recorder: UsageRecorder,
}

impl PlanLimitService {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionStore>,
        counter: Arc<dyn UsageCounter>,
        history: Arc<dyn UsageHistoryStore>,
        audit: AuditLogger,
        enforcement_enabled: bool,
    ) -> Self {
        let resolver = PlanResolver::new(subscriptions);
        let usage = UsageReader::new(counter);
        Self {
            evaluator: LimitEvaluator::new(
                resolver.clone(),
                usage.clone(),
                audit,
                enforcement_enabled,
            ),
            features: FeatureGate::new(resolver.clone(), enforcement_enabled),
            recorder: UsageRecorder::new(history),
            resolver,
            usage,
        }
    }

    pub async fn check_limit(
        &self,
        tenant_id: &str,
        kind: ResourceKind,
    ) -> anyhow::Result<LimitDecision> {
        self.evaluator.check_limit(tenant_id, kind).await
    }

    pub async fn check_limit_delta(
        &self,
        tenant_id: &str,
        kind: ResourceKind,
        delta: u64,
    ) -> anyhow::Result<LimitDecision> {
        self.evaluator.check_limit_delta(tenant_id, kind, delta).await
    }

    pub async fn has_feature_access(&self, tenant_id: &str, feature: &str) -> anyhow::Result<bool> {
        self.features.has_feature_access(tenant_id, feature).await
    }

    pub async fn check_feature(&self, tenant_id: &str, feature: &str) -> anyhow::Result<FeatureCheck> {
        self.features.check_feature(tenant_id, feature).await
    }

    pub async fn record_usage(&self, record: UsageRecord) {
        self.recorder.record_usage(record).await
    }

    pub async fn get_plan_for_user(&self, tenant_id: &str) -> anyhow::Result<EffectivePlan> {
        self.resolver.resolve_effective_plan(tenant_id).await
    }

    pub async fn get_usage(&self, tenant_id: &str) -> anyhow::Result<UsageCounts> {
        self.usage.read_usage(tenant_id).await
    }
}
