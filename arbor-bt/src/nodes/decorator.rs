use arbor_core::WorldMut;

use crate::bt::{Behavior, BtStatus, NodeKind};
use crate::ctx::NodeCtx;

/// Entry point of every tree; runs its single child.
#[derive(Debug, Clone, Copy, Default)]
pub struct Root;

impl<W> Behavior<W> for Root
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Root
    }

    fn type_name(&self) -> &'static str {
        "Root"
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        match ctx.child(0) {
            Some(child) => ctx.process(child),
            None => {
                tracing::warn!(node = ctx.guid().0, "root has no child");
                BtStatus::Failure
            }
        }
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(*self)
    }
}

/// Swaps `Success` and `Failure`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inverter;

impl<W> Behavior<W> for Inverter
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Decorator
    }

    fn type_name(&self) -> &'static str {
        "Inverter"
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        match ctx.child(0) {
            Some(child) => ctx.process(child).invert(),
            None => BtStatus::Success,
        }
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(*self)
    }
}

/// Turns any finished child result into `Success`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Succeeder;

impl<W> Behavior<W> for Succeeder
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Decorator
    }

    fn type_name(&self) -> &'static str {
        "Succeeder"
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        let Some(child) = ctx.child(0) else {
            return BtStatus::Success;
        };
        match ctx.process(child) {
            BtStatus::Running => BtStatus::Running,
            _ => BtStatus::Success,
        }
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(*self)
    }
}

/// Re-runs its child after each success, `count` times in total.
///
/// A count of 0 repeats forever. The child is reset between runs and the
/// repeater reports `Running` until the count is reached.
#[derive(Debug, Clone, Default)]
pub struct Repeater {
    count: u32,
    done: u32,
}

impl Repeater {
    pub fn new(count: u32) -> Self {
        Self { count, done: 0 }
    }

    pub fn forever() -> Self {
        Self::new(0)
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Successful child runs since the repeater was entered.
    pub fn completed(&self) -> u32 {
        self.done
    }
}

impl<W> Behavior<W> for Repeater
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Decorator
    }

    fn type_name(&self) -> &'static str {
        "Repeater"
    }

    fn on_enter(&mut self, _ctx: &mut NodeCtx<'_, '_, W>) {
        self.done = 0;
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        let Some(child) = ctx.child(0) else {
            tracing::warn!(node = ctx.guid().0, "repeater has no child");
            return BtStatus::Failure;
        };
        match ctx.process(child) {
            BtStatus::Running => BtStatus::Running,
            BtStatus::Failure => BtStatus::Failure,
            BtStatus::Success => {
                self.done = self.done.saturating_add(1);
                if self.count != 0 && self.done >= self.count {
                    return BtStatus::Success;
                }
                ctx.reset(child);
                BtStatus::Running
            }
        }
    }

    fn reset(&mut self) {
        self.done = 0;
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(self.clone())
    }
}

/// Blocks its child for `duration` seconds after each success.
///
/// The ready time is kept across `reset`, so restarting the tree does not
/// lift the cooldown. Clones start ready.
#[derive(Debug, Clone)]
pub struct Cooldown {
    duration: f64,
    ready_at: Option<f64>,
}

impl Cooldown {
    pub fn new(duration_seconds: f64) -> Self {
        Self {
            duration: duration_seconds.max(0.0),
            ready_at: None,
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Seconds left until the child may run again; 0 when ready.
    pub fn remaining(&self, now: f64) -> f64 {
        self.ready_at.map(|t| (t - now).max(0.0)).unwrap_or(0.0)
    }

    pub fn is_ready(&self, now: f64) -> bool {
        self.remaining(now) <= 0.0
    }
}

impl<W> Behavior<W> for Cooldown
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Decorator
    }

    fn type_name(&self) -> &'static str {
        "Cooldown"
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        let Some(child) = ctx.child(0) else {
            tracing::warn!(node = ctx.guid().0, "cooldown has no child");
            return BtStatus::Failure;
        };
        let now = ctx.now();
        if !self.is_ready(now) {
            return BtStatus::Failure;
        }
        let status = ctx.process(child);
        if status == BtStatus::Success {
            self.ready_at = Some(now + self.duration);
        }
        status
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(Cooldown::new(self.duration))
    }
}

/// Fails (and aborts) its child once it has been running for longer than
/// `duration` seconds.
#[derive(Debug, Clone)]
pub struct TimeLimit {
    duration: f64,
    started_at: Option<f64>,
}

impl TimeLimit {
    pub fn new(duration_seconds: f64) -> Self {
        Self {
            duration: duration_seconds.max(0.0),
            started_at: None,
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn elapsed(&self, now: f64) -> f64 {
        self.started_at.map(|t| now - t).unwrap_or(0.0)
    }
}

impl<W> Behavior<W> for TimeLimit
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Decorator
    }

    fn type_name(&self) -> &'static str {
        "TimeLimit"
    }

    fn on_enter(&mut self, ctx: &mut NodeCtx<'_, '_, W>) {
        self.started_at = Some(ctx.now());
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        let Some(child) = ctx.child(0) else {
            tracing::warn!(node = ctx.guid().0, "time limit has no child");
            return BtStatus::Failure;
        };
        if self.elapsed(ctx.now()) > self.duration {
            if ctx.is_processing(child) {
                ctx.abort(child);
            }
            return BtStatus::Failure;
        }
        ctx.process(child)
    }

    fn reset(&mut self) {
        self.started_at = None;
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(self.clone())
    }
}

/// Gate on a boolean blackboard key.
///
/// Passes when `value != invert`: ticks the child, or succeeds when there is
/// none. A missing or non-boolean key fails.
#[derive(Debug, Clone)]
pub struct CheckConditionVariable {
    key: String,
    invert: bool,
}

impl CheckConditionVariable {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            invert: false,
        }
    }

    pub fn inverted(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            invert: true,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn invert(&self) -> bool {
        self.invert
    }
}

impl<W> Behavior<W> for CheckConditionVariable
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Decorator
    }

    fn type_name(&self) -> &'static str {
        "CheckConditionVariable"
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        let value = match ctx.blackboard().get_value::<bool>(&self.key) {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!(node = ctx.guid().0, %err, "condition variable unreadable");
                return BtStatus::Failure;
            }
        };
        if value == self.invert {
            return BtStatus::Failure;
        }
        match ctx.child(0) {
            Some(child) => ctx.process(child),
            None => BtStatus::Success,
        }
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(self.clone())
    }
}

/// Passes its child's status through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreconditionDecorator;

impl<W> Behavior<W> for PreconditionDecorator
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Decorator
    }

    fn type_name(&self) -> &'static str {
        "PreconditionDecorator"
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        match ctx.child(0) {
            Some(child) => ctx.process(child),
            None => BtStatus::Success,
        }
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(*self)
    }
}
