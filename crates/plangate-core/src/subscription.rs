use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::plan::{PlanLimits, PlanRecord, FREE_PLAN_SLUG};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Incomplete,
    IncompleteExpired,
    Unpaid,
    Canceled,
    /// Reported for tenants without a subscription row; never stored.
    Inactive,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::IncompleteExpired => "incomplete_expired",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Inactive => "inactive",
        }
    }

    /// Whether the plan's paid entitlements apply.
    pub fn is_entitled(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trialing)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "trialing" => Ok(SubscriptionStatus::Trialing),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "incomplete" => Ok(SubscriptionStatus::Incomplete),
            "incomplete_expired" => Ok(SubscriptionStatus::IncompleteExpired),
            "unpaid" => Ok(SubscriptionStatus::Unpaid),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            "inactive" => Ok(SubscriptionStatus::Inactive),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

/// A tenant's subscription joined to its plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: String,
    pub tenant_id: String,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<DateTime<Utc>>,
    pub plan: PlanRecord,
}

/// The plan that applies to a tenant right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectivePlan {
    pub slug: String,
    pub name: String,
    pub plan_id: Option<String>,
    pub status: SubscriptionStatus,
    pub subscription_id: Option<String>,
    pub limits: PlanLimits,
    pub features: Vec<String>,
    pub current_period_end: Option<DateTime<Utc>>,
}

impl EffectivePlan {
    /// The built-in Free plan, used when a tenant has no subscription.
    pub fn default_free() -> Self {
        Self {
            slug: FREE_PLAN_SLUG.to_string(),
            name: "Free".to_string(),
            plan_id: None,
            status: SubscriptionStatus::Inactive,
            subscription_id: None,
            limits: PlanLimits::free_defaults(),
            features: Vec::new(),
            current_period_end: None,
        }
    }

    pub fn from_subscription(record: SubscriptionRecord) -> Self {
        let limits = PlanLimits::merged(&PlanLimits::free_defaults(), &record.plan.limits);
        Self {
            slug: record.plan.slug,
            name: record.plan.name,
            plan_id: Some(record.plan.id),
            status: record.status,
            subscription_id: Some(record.id),
            limits,
            features: record.plan.features,
            current_period_end: record.current_period_end,
        }
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    pub fn is_free(&self) -> bool {
        self.slug == FREE_PLAN_SLUG
    }
}
