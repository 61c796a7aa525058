//! Deterministic, engine-agnostic primitives shared by arbor trees and planners.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod agent;
pub mod blackboard;
pub mod rng;
pub mod tick;
pub mod value;
pub mod world;

pub use agent::AgentId;
pub use blackboard::{BbKey, Blackboard, BlackboardError, BlackboardKey, KeyDef, KeyOverride};
pub use rng::{DeterministicRng, SplitMix64};
pub use tick::TickContext;
pub use value::{BbType, EntityRef, Value, ValueType};
pub use world::{NoWorld, WorldMut, WorldView};
