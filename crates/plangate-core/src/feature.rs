use crate::plan::required_plan_for;
use crate::resolver::PlanResolver;
use crate::subscription::EffectivePlan;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureCheck {
    Granted,
    Locked {
        current_plan: String,
        required_plan: String,
    },
}

impl FeatureCheck {
    pub fn is_granted(&self) -> bool {
        matches!(self, FeatureCheck::Granted)
    }
}

/// Whether `plan` grants `feature` under its current subscription status.
///
/// A lapsed subscription keeps only what the Free plan includes.
pub fn plan_grants_feature(plan: &EffectivePlan, feature: &str) -> bool {
    if plan.status.is_entitled() {
        plan.has_feature(feature)
    } else {
        plan.is_free() && plan.has_feature(feature)
    }
}

/// Boolean feature-flag checks. Does not touch usage and does not audit.
#[derive(Clone)]
pub struct FeatureGate {
    resolver: PlanResolver,
    enforcement_enabled: bool,
}

impl FeatureGate {
    pub fn new(resolver: PlanResolver, enforcement_enabled: bool) -> Self {
        Self {
            resolver,
            enforcement_enabled,
        }
    }

    pub async fn has_feature_access(&self, tenant_id: &str, feature: &str) -> anyhow::Result<bool> {
        Ok(self.check_feature(tenant_id, feature).await?.is_granted())
    }

    /// Like [`FeatureGate::has_feature_access`], but reports the upgrade
    /// target when the feature is locked.
    pub async fn check_feature(&self, tenant_id: &str, feature: &str) -> anyhow::Result<FeatureCheck> {
        if !self.enforcement_enabled {
            return Ok(FeatureCheck::Granted);
        }
        let plan = self.resolver.resolve_effective_plan(tenant_id).await?;
        if plan_grants_feature(&plan, feature) {
            Ok(FeatureCheck::Granted)
        } else {
            Ok(FeatureCheck::Locked {
                required_plan: required_plan_for(&plan.slug).to_string(),
                current_plan: plan.slug,
            })
        }
    }
}
