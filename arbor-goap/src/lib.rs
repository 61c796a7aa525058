//! Deterministic GOAP planning over typed world states.
//!
//! [`GoapPlanner`] searches for the cheapest action sequence that reaches a
//! [`Goal`]. With the `bt` feature the planner also runs inside a behavior
//! tree: [`GoapPlannerNode`] plans over its [`GoapActionNode`] children and
//! executes the result step by step.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod planner;
pub mod state;
#[cfg(feature = "bt")]
#[cfg_attr(docsrs, doc(cfg(feature = "bt")))]
pub mod bt;

pub use planner::{GoapAction, GoapPlanner, Plan, PlanError, PlanStep, PlannerConfig};
pub use state::{Check, Compare, Effect, Goal, PlanContext, Predicate, WorldState};
#[cfg(feature = "bt")]
#[cfg_attr(docsrs, doc(cfg(feature = "bt")))]
pub use bt::{GoapActionNode, GoapPlannerNode};
