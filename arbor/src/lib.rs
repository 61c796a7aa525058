//! Umbrella crate that re-exports the `arbor-*` building blocks.
//!
//! - [`core`]: blackboard, values, tick context and world traits
//! - [`bt`]: behavior tree engine and the stock node library
//! - [`goap`]: A* action planner and its behavior tree nodes
//! - [`tools`]: trace sinks for inspecting tree execution

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use arbor_core as core;

#[cfg(feature = "tools")]
#[cfg_attr(docsrs, doc(cfg(feature = "tools")))]
pub use arbor_tools as tools;

#[cfg(feature = "bt")]
#[cfg_attr(docsrs, doc(cfg(feature = "bt")))]
pub use arbor_bt as bt;

#[cfg(feature = "goap")]
#[cfg_attr(docsrs, doc(cfg(feature = "goap")))]
pub use arbor_goap as goap;

/// The names most trees need.
#[cfg(all(feature = "core", feature = "bt"))]
pub mod prelude {
    pub use arbor_bt::{
        BehaviorTree, BtStatus, NodeCtx, NodeGuid, Selector, Sequence, Status, TreeBuilder,
    };
    pub use arbor_core::{Blackboard, KeyOverride, NoWorld, TickContext, Value, WorldMut, WorldView};

    #[cfg(feature = "goap")]
    pub use arbor_goap::{GoapAction, GoapActionNode, GoapPlannerNode, Goal, Predicate};
}
