use std::any::Any;

use arbor_core::WorldMut;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ctx::NodeCtx;

/// Outcome of one `on_process` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BtStatus {
    Running,
    Success,
    Failure,
}

impl BtStatus {
    pub fn is_done(self) -> bool {
        self != BtStatus::Running
    }

    pub fn invert(self) -> Self {
        match self {
            BtStatus::Running => BtStatus::Running,
            BtStatus::Success => BtStatus::Failure,
            BtStatus::Failure => BtStatus::Success,
        }
    }
}

/// Status a node reports between ticks. `None` means "not run since reset".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Status {
    #[default]
    None,
    Running,
    Success,
    Failure,
}

impl From<BtStatus> for Status {
    fn from(value: BtStatus) -> Self {
        match value {
            BtStatus::Running => Status::Running,
            BtStatus::Success => Status::Success,
            BtStatus::Failure => Status::Failure,
        }
    }
}

impl Status {
    pub fn outcome(self) -> Option<BtStatus> {
        match self {
            Status::None => None,
            Status::Running => Some(BtStatus::Running),
            Status::Success => Some(BtStatus::Success),
            Status::Failure => Some(BtStatus::Failure),
        }
    }
}

/// Index of a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Authored node identity. Preserved by cloning, so the same guid names
/// corresponding nodes in a template and every instance made from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeGuid(pub u64);

/// Which links a node may own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeKind {
    /// Exactly one child; the entry point of a tree.
    Root,
    /// Ordered children plus attached decorators and services.
    Composite,
    /// At most one child.
    Decorator,
    /// No child; ticked by its owning composite.
    Service,
    /// No links.
    Leaf,
}

pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Per-kind node logic.
///
/// The engine owns the lifecycle: `on_enter` runs the first time a node is
/// processed after finishing (or after a reset), `on_process` every tick,
/// `on_exit` once the node reports `Success`/`Failure` or is reset/aborted
/// while running. `reset` clears run state; it is called on every reset,
/// abort and clone.
pub trait Behavior<W>: AsAny
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind;

    fn type_name(&self) -> &'static str;

    fn on_enter(&mut self, _ctx: &mut NodeCtx<'_, '_, W>) {}

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus;

    fn on_exit(&mut self, _ctx: &mut NodeCtx<'_, '_, W>) {}

    fn reset(&mut self) {}

    fn clone_box(&self) -> Box<dyn Behavior<W>>;
}
