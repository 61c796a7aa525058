mod composite;
mod decorator;
mod leaf;
mod service;

pub use composite::{
    BranchSelector, DynamicSelector, Parallel, ParallelPolicy, Policy, RandomRateSelector,
    RandomSelector, RateMode, Selector, Sequence,
};
pub use decorator::{
    CheckConditionVariable, Cooldown, Inverter, PreconditionDecorator, Repeater, Root, Succeeder,
    TimeLimit,
};
pub use leaf::{AlwaysFail, AlwaysSucceed, Condition, SetValue, Task, Wait};
pub use service::{ServiceConfig, ServiceNode};
