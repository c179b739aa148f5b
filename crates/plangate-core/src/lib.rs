pub mod audit;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod feature;
pub mod limits;
pub mod plan;
pub mod recorder;
pub mod resolver;
pub mod store;
pub mod subscription;
pub mod usage;

#[cfg(test)]
pub(crate) mod testing;

pub use evaluator::LimitDecision;
pub use limits::PlanLimitService;
pub use plan::{Ceiling, ResourceKind};
