use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::audit::{AuditLogger, LimitAction, LimitEvent};
use crate::plan::{required_plan_for, Ceiling, ResourceKind};
use crate::resolver::PlanResolver;
use crate::usage::UsageReader;

/// Outcome of one limit evaluation.
///
/// Serializes as `{ "ok": true, "used", "limit", "plan", "subscriptionId" }`
/// or `{ "ok": false, "requiredPlan", "used", "limit" }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitDecision {
    Allowed {
        /// Count before the operation.
        used: u64,
        limit: Ceiling,
        plan: String,
        subscription_id: Option<String>,
    },
    Blocked {
        required_plan: String,
        used: u64,
        limit: Ceiling,
    },
}

impl LimitDecision {
    pub fn is_ok(&self) -> bool {
        matches!(self, LimitDecision::Allowed { .. })
    }

    pub fn used(&self) -> u64 {
        match self {
            LimitDecision::Allowed { used, .. } | LimitDecision::Blocked { used, .. } => *used,
        }
    }

    pub fn limit(&self) -> Ceiling {
        match self {
            LimitDecision::Allowed { limit, .. } | LimitDecision::Blocked { limit, .. } => *limit,
        }
    }
}

impl Serialize for LimitDecision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LimitDecision::Allowed {
                used,
                limit,
                plan,
                subscription_id,
            } => {
                let mut state = serializer.serialize_struct("LimitDecision", 5)?;
                state.serialize_field("ok", &true)?;
                state.serialize_field("used", used)?;
                state.serialize_field("limit", limit)?;
                state.serialize_field("plan", plan)?;
                state.serialize_field("subscriptionId", subscription_id)?;
                state.end()
            }
            LimitDecision::Blocked {
                required_plan,
                used,
                limit,
            } => {
                let mut state = serializer.serialize_struct("LimitDecision", 4)?;
                state.serialize_field("ok", &false)?;
                state.serialize_field("requiredPlan", required_plan)?;
                state.serialize_field("used", used)?;
                state.serialize_field("limit", limit)?;
                state.end()
            }
        }
    }
}

/// Decides whether a tenant may create more resources of a kind.
///
/// Usage is read, compared, and returned without any lock held across the
/// caller's subsequent insert. Two concurrent requests can both see
/// `used = limit - 1`, both be allowed, and leave the tenant one over the
/// ceiling. Limits are soft quotas checked per request.
#[derive(Clone)]
pub struct LimitEvaluator {
    resolver: PlanResolver,
    usage: UsageReader,
    audit: AuditLogger,
    enforcement_enabled: bool,
}

impl LimitEvaluator {
    pub fn new(
        resolver: PlanResolver,
        usage: UsageReader,
        audit: AuditLogger,
        enforcement_enabled: bool,
    ) -> Self {
        Self {
            resolver,
            usage,
            audit,
            enforcement_enabled,
        }
    }

    /// May one more resource of `kind` be created?
    pub async fn check_limit(
        &self,
        tenant_id: &str,
        kind: ResourceKind,
    ) -> anyhow::Result<LimitDecision> {
        self.check_limit_delta(tenant_id, kind, 1).await
    }

    /// May `delta` more resources of `kind` be created?
    pub async fn check_limit_delta(
        &self,
        tenant_id: &str,
        kind: ResourceKind,
        delta: u64,
    ) -> anyhow::Result<LimitDecision> {
        let (plan, usage) = tokio::try_join!(
            self.resolver.resolve_effective_plan(tenant_id),
            self.usage.read_usage(tenant_id),
        )?;
        let used = usage.get(kind);
        let limit = plan.limits.ceiling(kind);

        if !self.enforcement_enabled || limit.is_unlimited() {
            return Ok(LimitDecision::Allowed {
                used,
                limit,
                plan: plan.slug,
                subscription_id: plan.subscription_id,
            });
        }

        let next = used.saturating_add(delta);
        let allowed = limit.admits(next);

        self.audit
            .log_limit_event(LimitEvent {
                tenant_id: tenant_id.to_string(),
                plan: plan.slug.clone(),
                resource_kind: kind,
                used,
                limit,
                action: if allowed {
                    LimitAction::Allow
                } else {
                    LimitAction::Block
                },
            })
            .await;

        if allowed {
            Ok(LimitDecision::Allowed {
                used,
                limit,
                plan: plan.slug,
                subscription_id: plan.subscription_id,
            })
        } else {
            tracing::info!(
                tenant_id,
                resource = %kind,
                plan = %plan.slug,
                used,
                limit = %limit,
                "Plan limit reached"
            );
            Ok(LimitDecision::Blocked {
                required_plan: required_plan_for(&plan.slug).to_string(),
                used,
                limit,
            })
        }
    }
}
