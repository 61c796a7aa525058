use arbor_core::WorldMut;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bt::{Behavior, BtStatus, NodeKind};
use crate::ctx::NodeCtx;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ServiceConfig {
    /// Minimum host time between two runs. 0 runs on every tick.
    pub interval_seconds: f64,
    /// Run once as soon as the owning composite is entered.
    pub run_on_enter: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 0.0,
            run_on_enter: true,
        }
    }
}

/// Side-effect node attached to a composite.
///
/// Processed by its owner before the owner's own logic on every tick the
/// owner runs; the closure fires when the interval has elapsed. Always
/// reports `Running`, and is reset when the owner finishes.
#[derive(Clone)]
pub struct ServiceNode<F> {
    config: ServiceConfig,
    next_run: Option<f64>,
    runs: u64,
    f: F,
}

impl<F> ServiceNode<F> {
    pub fn new<W>(f: F) -> Self
    where
        W: WorldMut + 'static,
        F: FnMut(&mut NodeCtx<'_, '_, W>) + Clone + 'static,
    {
        Self {
            config: ServiceConfig::default(),
            next_run: None,
            runs: 0,
            f,
        }
    }

    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_interval(mut self, interval_seconds: f64) -> Self {
        self.config.interval_seconds = interval_seconds.max(0.0);
        self
    }

    pub fn config(&self) -> ServiceConfig {
        self.config
    }

    /// Times the closure ran since the service was last entered.
    pub fn runs(&self) -> u64 {
        self.runs
    }
}

impl<W, F> Behavior<W> for ServiceNode<F>
where
    W: WorldMut + 'static,
    F: FnMut(&mut NodeCtx<'_, '_, W>) + Clone + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Service
    }

    fn type_name(&self) -> &'static str {
        "Service"
    }

    fn on_enter(&mut self, ctx: &mut NodeCtx<'_, '_, W>) {
        let now = ctx.now();
        self.runs = 0;
        self.next_run = Some(if self.config.run_on_enter {
            now
        } else {
            now + self.config.interval_seconds
        });
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        let now = ctx.now();
        let due = self.next_run.map(|t| now >= t).unwrap_or(true);
        if due {
            (self.f)(ctx);
            self.runs += 1;
            self.next_run = Some(now + self.config.interval_seconds);
        }
        BtStatus::Running
    }

    fn reset(&mut self) {
        self.next_run = None;
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(Self {
            config: self.config,
            next_run: None,
            runs: 0,
            f: self.f.clone(),
        })
    }
}
