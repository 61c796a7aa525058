use arbor_core::{Blackboard, DeterministicRng, WorldMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bt::{Behavior, BtStatus, NodeKind};
use crate::ctx::NodeCtx;

/// Runs children left to right; fails on the first failure.
///
/// The cursor survives `Running`, so a child that already succeeded is not
/// re-run while a later sibling is still working.
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    cursor: usize,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl<W> Behavior<W> for Sequence
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Composite
    }

    fn type_name(&self) -> &'static str {
        "Sequence"
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        if ctx.child_count() == 0 {
            return BtStatus::Failure;
        }
        while let Some(child) = ctx.child(self.cursor) {
            match ctx.process(child) {
                BtStatus::Running => return BtStatus::Running,
                BtStatus::Failure => {
                    self.cursor = 0;
                    return BtStatus::Failure;
                }
                BtStatus::Success => self.cursor += 1,
            }
        }
        self.cursor = 0;
        BtStatus::Success
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(self.clone())
    }
}

/// Tries children left to right; succeeds on the first success.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    cursor: usize,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl<W> Behavior<W> for Selector
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Composite
    }

    fn type_name(&self) -> &'static str {
        "Selector"
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        while let Some(child) = ctx.child(self.cursor) {
            match ctx.process(child) {
                BtStatus::Running => return BtStatus::Running,
                BtStatus::Success => {
                    self.cursor = 0;
                    return BtStatus::Success;
                }
                BtStatus::Failure => self.cursor += 1,
            }
        }
        self.cursor = 0;
        BtStatus::Failure
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(self.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Policy {
    RequireOne,
    RequireAll,
}

impl Policy {
    fn met(self, count: usize, total: usize) -> bool {
        match self {
            Policy::RequireOne => count >= 1,
            Policy::RequireAll => count == total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParallelPolicy {
    pub success: Policy,
    pub failure: Policy,
}

impl Default for ParallelPolicy {
    fn default() -> Self {
        Self {
            success: Policy::RequireAll,
            failure: Policy::RequireOne,
        }
    }
}

/// Ticks every unfinished child each tick.
///
/// The failure policy is checked before the success policy. Children still
/// running when a policy is met are aborted. If every child finished without
/// meeting either policy the result is `Failure`.
#[derive(Debug, Clone, Default)]
pub struct Parallel {
    policy: ParallelPolicy,
    results: Vec<Option<BtStatus>>,
}

impl Parallel {
    pub fn new(policy: ParallelPolicy) -> Self {
        Self {
            policy,
            results: Vec::new(),
        }
    }

    pub fn policy(&self) -> ParallelPolicy {
        self.policy
    }
}

impl<W> Behavior<W> for Parallel
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Composite
    }

    fn type_name(&self) -> &'static str {
        "Parallel"
    }

    fn on_enter(&mut self, ctx: &mut NodeCtx<'_, '_, W>) {
        self.results = vec![None; ctx.child_count()];
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        let children = ctx.children();
        let total = children.len();
        if total == 0 {
            return BtStatus::Failure;
        }
        self.results.resize(total, None);

        for (i, &child) in children.iter().enumerate() {
            if self.results[i].is_none() {
                let status = ctx.process(child);
                if status.is_done() {
                    self.results[i] = Some(status);
                }
            }
        }

        let successes = self
            .results
            .iter()
            .filter(|r| **r == Some(BtStatus::Success))
            .count();
        let failures = self
            .results
            .iter()
            .filter(|r| **r == Some(BtStatus::Failure))
            .count();

        let outcome = if self.policy.failure.met(failures, total) {
            BtStatus::Failure
        } else if self.policy.success.met(successes, total) {
            BtStatus::Success
        } else if successes + failures == total {
            BtStatus::Failure
        } else {
            return BtStatus::Running;
        };

        for (i, &child) in children.iter().enumerate() {
            if self.results[i].is_none() {
                ctx.abort(child);
            }
        }
        self.results.clear();
        outcome
    }

    fn reset(&mut self) {
        self.results.clear();
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(self.clone())
    }
}

/// Picks one child uniformly at random and reports its result.
///
/// The pick sticks while the child is `Running`; no alternates are tried.
#[derive(Debug, Clone, Default)]
pub struct RandomSelector {
    chosen: Option<usize>,
}

impl RandomSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chosen(&self) -> Option<usize> {
        self.chosen
    }
}

impl<W> Behavior<W> for RandomSelector
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Composite
    }

    fn type_name(&self) -> &'static str {
        "RandomSelector"
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        let count = ctx.child_count();
        if count == 0 {
            return BtStatus::Failure;
        }
        let index = match self.chosen {
            Some(i) => i,
            None => ctx.rng().next_below(count),
        };
        run_sticky(&mut self.chosen, index, ctx)
    }

    fn reset(&mut self) {
        self.chosen = None;
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(self.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RateMode {
    /// weight = priority
    #[default]
    HigherIsBetter,
    /// weight = (max priority - priority) + 1
    LowerIsBetter,
}

/// Like [`RandomSelector`], but the pick is weighted by child priority.
///
/// Children with priority <= 0 are never picked.
#[derive(Debug, Clone, Default)]
pub struct RandomRateSelector {
    mode: RateMode,
    chosen: Option<usize>,
}

impl RandomRateSelector {
    pub fn new(mode: RateMode) -> Self {
        Self { mode, chosen: None }
    }

    pub fn chosen(&self) -> Option<usize> {
        self.chosen
    }

    /// Selection weights for the given child priorities.
    pub fn weights(mode: RateMode, priorities: &[f32]) -> Vec<f64> {
        let max = priorities.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
        priorities
            .iter()
            .map(|&p| {
                let p = p as f64;
                if p <= 0.0 {
                    return 0.0;
                }
                match mode {
                    RateMode::HigherIsBetter => p,
                    RateMode::LowerIsBetter => (max - p) + 1.0,
                }
            })
            .collect()
    }

    /// Walk the weights subtracting until the draw lands. `draw` is in `[0, 1)`.
    pub fn pick(weights: &[f64], draw: f64) -> Option<usize> {
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return None;
        }
        let mut remaining = draw * total;
        let mut last = None;
        for (i, &w) in weights.iter().enumerate() {
            if w <= 0.0 {
                continue;
            }
            if remaining < w {
                return Some(i);
            }
            remaining -= w;
            last = Some(i);
        }
        last
    }
}

impl<W> Behavior<W> for RandomRateSelector
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Composite
    }

    fn type_name(&self) -> &'static str {
        "RandomRateSelector"
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        let index = match self.chosen {
            Some(i) => i,
            None => {
                let priorities: Vec<f32> =
                    ctx.children().into_iter().map(|c| ctx.priority(c)).collect();
                let weights = Self::weights(self.mode, &priorities);
                let draw = ctx.rng().next_f64_unit();
                match Self::pick(&weights, draw) {
                    Some(i) => i,
                    None => {
                        tracing::warn!(
                            node = ctx.guid().0,
                            "random rate selector has no child with positive priority"
                        );
                        return BtStatus::Failure;
                    }
                }
            }
        };
        run_sticky(&mut self.chosen, index, ctx)
    }

    fn reset(&mut self) {
        self.chosen = None;
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(self.clone())
    }
}

/// Injected branch choice for [`DynamicSelector`].
pub trait BranchSelector<W>: 'static
where
    W: WorldMut + 'static,
{
    /// Index of the child to run, or `None` to fail this tick.
    fn try_select_branch(
        &mut self,
        agent: W::Agent,
        world: &W,
        blackboard: &Blackboard,
    ) -> Option<usize>;

    fn clone_box(&self) -> Box<dyn BranchSelector<W>>;
}

impl<W, F> BranchSelector<W> for F
where
    W: WorldMut + 'static,
    F: FnMut(W::Agent, &W, &Blackboard) -> Option<usize> + Clone + 'static,
{
    fn try_select_branch(
        &mut self,
        agent: W::Agent,
        world: &W,
        blackboard: &Blackboard,
    ) -> Option<usize> {
        self(agent, world, blackboard)
    }

    fn clone_box(&self) -> Box<dyn BranchSelector<W>> {
        Box::new(self.clone())
    }
}

/// Asks a [`BranchSelector`] which child to run whenever no child is running.
pub struct DynamicSelector<W>
where
    W: WorldMut + 'static,
{
    selector: Box<dyn BranchSelector<W>>,
    chosen: Option<usize>,
}

impl<W> DynamicSelector<W>
where
    W: WorldMut + 'static,
{
    pub fn new(selector: impl BranchSelector<W>) -> Self {
        Self {
            selector: Box::new(selector),
            chosen: None,
        }
    }

    pub fn chosen(&self) -> Option<usize> {
        self.chosen
    }
}

impl<W> Clone for DynamicSelector<W>
where
    W: WorldMut + 'static,
{
    fn clone(&self) -> Self {
        Self {
            selector: self.selector.clone_box(),
            chosen: self.chosen,
        }
    }
}

impl<W> Behavior<W> for DynamicSelector<W>
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Composite
    }

    fn type_name(&self) -> &'static str {
        "DynamicSelector"
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        let index = match self.chosen {
            Some(i) => i,
            None => {
                let agent = ctx.agent();
                let choice = self
                    .selector
                    .try_select_branch(agent, ctx.world(), ctx.blackboard());
                let Some(i) = choice else {
                    return BtStatus::Failure;
                };
                if i >= ctx.child_count() {
                    tracing::warn!(
                        node = ctx.guid().0,
                        index = i,
                        children = ctx.child_count(),
                        "branch selector returned an out-of-range child"
                    );
                    return BtStatus::Failure;
                }
                i
            }
        };
        run_sticky(&mut self.chosen, index, ctx)
    }

    fn reset(&mut self) {
        self.chosen = None;
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(self.clone())
    }
}

/// Process child `index`, remembering it while it runs.
fn run_sticky<W>(chosen: &mut Option<usize>, index: usize, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus
where
    W: WorldMut + 'static,
{
    let Some(child) = ctx.child(index) else {
        *chosen = None;
        return BtStatus::Failure;
    };
    let status = ctx.process(child);
    *chosen = if status == BtStatus::Running {
        Some(index)
    } else {
        None
    };
    status
}
