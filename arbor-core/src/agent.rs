use core::fmt::Debug;

use crate::EntityRef;

/// The agent a tree runs for.
///
/// A tree holds only this id; the agent itself lives with the host. The
/// value of `stable_id` seeds per-node random streams, so two runs with the
/// same ids replay the same choices.
pub trait AgentId: Copy + Ord + Eq + Debug + 'static {
    fn stable_id(self) -> u64;
}

macro_rules! integer_agent_id {
    ($($ty:ty),*) => {
        $(
            impl AgentId for $ty {
                fn stable_id(self) -> u64 {
                    self as u64
                }
            }
        )*
    };
}

integer_agent_id!(u16, u32, u64, usize);

impl AgentId for EntityRef {
    fn stable_id(self) -> u64 {
        self.0
    }
}
