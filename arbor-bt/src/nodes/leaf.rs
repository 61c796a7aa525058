use arbor_core::{Blackboard, Value, WorldMut};

use crate::bt::{Behavior, BtStatus, NodeKind};
use crate::ctx::NodeCtx;

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysSucceed;

impl<W> Behavior<W> for AlwaysSucceed
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Leaf
    }

    fn type_name(&self) -> &'static str {
        "AlwaysSucceed"
    }

    fn on_process(&mut self, _ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        BtStatus::Success
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(*self)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysFail;

impl<W> Behavior<W> for AlwaysFail
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Leaf
    }

    fn type_name(&self) -> &'static str {
        "AlwaysFail"
    }

    fn on_process(&mut self, _ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        BtStatus::Failure
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(*self)
    }
}

/// Blackboard predicate leaf: `Success` when `f` holds, else `Failure`.
#[derive(Clone)]
pub struct Condition<F> {
    f: F,
}

impl<F> Condition<F>
where
    F: FnMut(&Blackboard) -> bool + Clone + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<W, F> Behavior<W> for Condition<F>
where
    W: WorldMut + 'static,
    F: FnMut(&Blackboard) -> bool + Clone + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Leaf
    }

    fn type_name(&self) -> &'static str {
        "Condition"
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        if (self.f)(ctx.blackboard()) {
            BtStatus::Success
        } else {
            BtStatus::Failure
        }
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(self.clone())
    }
}

/// Closure leaf with full access to the node context.
///
/// ```ignore
/// let chop = Task::new(|ctx: &mut NodeCtx<'_, '_, Forest>| {
///     ctx.world_mut().chop(ctx.agent());
///     BtStatus::Success
/// });
/// ```
#[derive(Clone)]
pub struct Task<F> {
    name: &'static str,
    f: F,
}

impl<F> Task<F> {
    pub fn new<W>(f: F) -> Self
    where
        W: WorldMut + 'static,
        F: FnMut(&mut NodeCtx<'_, '_, W>) -> BtStatus + Clone + 'static,
    {
        Self { name: "Task", f }
    }

    /// Reported as the node's type name.
    pub fn labeled(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl<W, F> Behavior<W> for Task<F>
where
    W: WorldMut + 'static,
    F: FnMut(&mut NodeCtx<'_, '_, W>) -> BtStatus + Clone + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Leaf
    }

    fn type_name(&self) -> &'static str {
        self.name
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        (self.f)(ctx)
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(self.clone())
    }
}

/// Writes `value` into blackboard key `key` and succeeds.
#[derive(Debug, Clone)]
pub struct SetValue {
    key: String,
    value: Value,
}

impl SetValue {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl<W> Behavior<W> for SetValue
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Leaf
    }

    fn type_name(&self) -> &'static str {
        "SetValue"
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        match ctx.blackboard_mut().set_raw(&self.key, self.value.clone()) {
            Ok(()) => BtStatus::Success,
            Err(err) => {
                tracing::warn!(node = ctx.guid().0, %err, "set value failed");
                BtStatus::Failure
            }
        }
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(self.clone())
    }
}

/// `Running` until `seconds` have passed since entry, then `Success`.
#[derive(Debug, Clone)]
pub struct Wait {
    seconds: f64,
    started_at: Option<f64>,
}

impl Wait {
    pub fn new(seconds: f64) -> Self {
        Self {
            seconds: seconds.max(0.0),
            started_at: None,
        }
    }

    pub fn seconds(&self) -> f64 {
        self.seconds
    }
}

impl<W> Behavior<W> for Wait
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Leaf
    }

    fn type_name(&self) -> &'static str {
        "Wait"
    }

    fn on_enter(&mut self, ctx: &mut NodeCtx<'_, '_, W>) {
        self.started_at = Some(ctx.now());
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        let start = *self.started_at.get_or_insert(ctx.now());
        if ctx.now() - start >= self.seconds {
            BtStatus::Success
        } else {
            BtStatus::Running
        }
    }

    fn reset(&mut self) {
        self.started_at = None;
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(self.clone())
    }
}
