use crate::AgentId;

/// Host world as seen by node logic.
///
/// No queries are required here. A leaf that needs pathing or sensing
/// declares its own trait and bounds its world type on it.
pub trait WorldView {
    type Agent: AgentId;
}

/// Mutable host world; node callbacks receive `&mut` to it every tick.
pub trait WorldMut: WorldView {}

/// Placeholder world for trees whose logic only reads and writes the
/// blackboard. Agents are plain `u64`s.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NoWorld;

impl WorldView for NoWorld {
    type Agent = u64;
}

impl WorldMut for NoWorld {}
