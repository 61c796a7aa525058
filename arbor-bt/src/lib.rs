//! Tick-driven behavior trees built on `arbor-core`.
//!
//! Trees are authored with a [`TreeBuilder`], which validates links and
//! produces a [`BehaviorTree`] for one agent. Per-agent copies come from
//! [`BehaviorTree::instantiate`]; each copy owns its node arena and its
//! blackboard.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod bt;
pub mod builder;
pub mod ctx;
mod graph;
pub mod nodes;
pub mod tree;

pub use bt::{AsAny, Behavior, BtStatus, NodeGuid, NodeId, NodeKind, Status};
pub use builder::{TreeBuilder, TreeError};
pub use ctx::NodeCtx;
pub use graph::{InterruptEvent, InterruptFn, ListenerId};
pub use nodes::{
    AlwaysFail, AlwaysSucceed, BranchSelector, CheckConditionVariable, Condition, Cooldown,
    DynamicSelector, Inverter, Parallel, ParallelPolicy, Policy, PreconditionDecorator,
    RandomRateSelector, RandomSelector, RateMode, Repeater, Root, Selector, Sequence,
    ServiceConfig, ServiceNode, SetValue, Succeeder, Task, TimeLimit, Wait,
};
pub use tree::{BehaviorTree, NodeInfo, TreeId};
