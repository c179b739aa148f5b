use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::CoreError;

pub const FREE_PLAN_SLUG: &str = "free";
pub const PRO_PLAN_SLUG: &str = "pro";
pub const PREMIUM_PLAN_SLUG: &str = "premium";

/// Countable resources a plan can put a ceiling on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Expenses,
    Cards,
    Categories,
    Loans,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Expenses,
        ResourceKind::Cards,
        ResourceKind::Categories,
        ResourceKind::Loans,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Expenses => "expenses",
            ResourceKind::Cards => "cards",
            ResourceKind::Categories => "categories",
            ResourceKind::Loans => "loans",
        }
    }

    /// The plan limit key that caps this kind.
    pub fn limit_key(&self) -> LimitKey {
        match self {
            ResourceKind::Expenses => LimitKey::MaxExpensesPerMonth,
            ResourceKind::Cards => LimitKey::MaxCards,
            ResourceKind::Categories => LimitKey::MaxCategories,
            ResourceKind::Loans => LimitKey::MaxLoans,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expenses" => Ok(ResourceKind::Expenses),
            "cards" => Ok(ResourceKind::Cards),
            "categories" => Ok(ResourceKind::Categories),
            "loans" => Ok(ResourceKind::Loans),
            other => Err(CoreError::UnknownResourceKind(other.to_string())),
        }
    }
}

/// Keys of the plan `limits` mapping that hold resource ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LimitKey {
    #[serde(rename = "maxExpensesPerMonth")]
    MaxExpensesPerMonth,
    #[serde(rename = "maxCards")]
    MaxCards,
    #[serde(rename = "maxCategories")]
    MaxCategories,
    #[serde(rename = "maxLoans")]
    MaxLoans,
}

impl LimitKey {
    pub const ALL: [LimitKey; 4] = [
        LimitKey::MaxExpensesPerMonth,
        LimitKey::MaxCards,
        LimitKey::MaxCategories,
        LimitKey::MaxLoans,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LimitKey::MaxExpensesPerMonth => "maxExpensesPerMonth",
            LimitKey::MaxCards => "maxCards",
            LimitKey::MaxCategories => "maxCategories",
            LimitKey::MaxLoans => "maxLoans",
        }
    }
}

/// Wire value of [`Ceiling::Unlimited`].
pub const UNLIMITED_SENTINEL: i64 = -1;

/// Maximum number of resources of one kind that may exist.
///
/// Serialized as a plain integer, with `-1` standing for [`Ceiling::Unlimited`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ceiling {
    Unlimited,
    Bounded(u64),
}

impl Ceiling {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Ceiling::Unlimited)
    }

    pub fn as_wire(&self) -> i64 {
        match self {
            Ceiling::Unlimited => UNLIMITED_SENTINEL,
            Ceiling::Bounded(n) => i64::try_from(*n).unwrap_or(i64::MAX),
        }
    }

    /// `-1` is unlimited; any other negative value admits nothing.
    pub fn from_wire(value: i64) -> Self {
        match value {
            UNLIMITED_SENTINEL => Ceiling::Unlimited,
            n => Ceiling::Bounded(u64::try_from(n).unwrap_or(0)),
        }
    }

    /// Inclusive check: `next` resources may exist under this ceiling.
    pub fn admits(&self, next: u64) -> bool {
        match self {
            Ceiling::Unlimited => true,
            Ceiling::Bounded(limit) => next <= *limit,
        }
    }

    /// Parse a stored limit value.
    ///
    /// Numbers stay numeric: fractions are floored and negatives other than
    /// `-1` become `Bounded(0)`. Returns `None` only when the value is not a
    /// number or a numeric string.
    pub fn parse_stored(value: &Value) -> Option<Ceiling> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(Ceiling::from_wire)
                .or_else(|| n.as_u64().map(Ceiling::Bounded))
                .or_else(|| n.as_f64().and_then(Ceiling::from_f64)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .map(Ceiling::from_wire)
                    .or_else(|| s.parse::<f64>().ok().and_then(Ceiling::from_f64))
            }
            _ => None,
        }
    }

    fn from_f64(f: f64) -> Option<Ceiling> {
        if !f.is_finite() {
            return None;
        }
        if f == UNLIMITED_SENTINEL as f64 {
            return Some(Ceiling::Unlimited);
        }
        if f < 0.0 {
            return Some(Ceiling::Bounded(0));
        }
        // `as` saturates at u64::MAX.
        Some(Ceiling::Bounded(f.floor() as u64))
    }
}

impl fmt::Display for Ceiling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ceiling::Unlimited => f.write_str("unlimited"),
            Ceiling::Bounded(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for Ceiling {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for Ceiling {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Ceiling::from_wire)
    }
}

/// Resolved ceilings for all resource kinds, plus any extra limit entries
/// (boolean flags and the like) carried verbatim from the plan record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanLimits {
    #[serde(rename = "maxExpensesPerMonth")]
    pub max_expenses_per_month: Ceiling,
    #[serde(rename = "maxCards")]
    pub max_cards: Ceiling,
    #[serde(rename = "maxCategories")]
    pub max_categories: Ceiling,
    #[serde(rename = "maxLoans")]
    pub max_loans: Ceiling,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PlanLimits {
    /// Limits of the built-in Free plan.
    pub fn free_defaults() -> Self {
        Self {
            max_expenses_per_month: Ceiling::Bounded(50),
            max_cards: Ceiling::Bounded(2),
            max_categories: Ceiling::Bounded(10),
            max_loans: Ceiling::Bounded(0),
            extra: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: LimitKey) -> Ceiling {
        match key {
            LimitKey::MaxExpensesPerMonth => self.max_expenses_per_month,
            LimitKey::MaxCards => self.max_cards,
            LimitKey::MaxCategories => self.max_categories,
            LimitKey::MaxLoans => self.max_loans,
        }
    }

    pub fn ceiling(&self, kind: ResourceKind) -> Ceiling {
        self.get(kind.limit_key())
    }

    fn set(&mut self, key: LimitKey, ceiling: Ceiling) {
        match key {
            LimitKey::MaxExpensesPerMonth => self.max_expenses_per_month = ceiling,
            LimitKey::MaxCards => self.max_cards = ceiling,
            LimitKey::MaxCategories => self.max_categories = ceiling,
            LimitKey::MaxLoans => self.max_loans = ceiling,
        }
    }

    /// Overlay a stored plan's `limits` object on `base`.
    ///
    /// Keys missing from `stored` (or explicitly `null`) keep the value from
    /// `base`. A present ceiling that cannot be read as a number resolves to
    /// [`Ceiling::Unlimited`].
    pub fn merged(base: &PlanLimits, stored: &Map<String, Value>) -> Self {
        let mut limits = base.clone();
        for key in LimitKey::ALL {
            let Some(value) = stored.get(key.as_str()).filter(|v| !v.is_null()) else {
                continue;
            };
            let ceiling = Ceiling::parse_stored(value).unwrap_or_else(|| {
                tracing::warn!(
                    limit_key = key.as_str(),
                    value = %value,
                    "Malformed plan limit, treating as unlimited"
                );
                Ceiling::Unlimited
            });
            limits.set(key, ceiling);
        }
        for (name, value) in stored {
            if LimitKey::ALL.iter().all(|key| key.as_str() != name) {
                limits.extra.insert(name.clone(), value.clone());
            }
        }
        limits
    }
}

/// A pricing tier as stored by billing administration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub id: String,
    pub slug: String,
    pub name: String,
    /// Raw `limits` JSON object; see [`PlanLimits::merged`].
    pub limits: Map<String, Value>,
    pub features: Vec<String>,
}

/// Plan a blocked tenant should upgrade to.
///
/// `pro` escalates to `premium`; every other slug escalates to `pro`.
pub fn required_plan_for(current_slug: &str) -> &'static str {
    if current_slug == PRO_PLAN_SLUG {
        PREMIUM_PLAN_SLUG
    } else {
        PRO_PLAN_SLUG
    }
}
