use std::collections::VecDeque;

use arbor_bt::{Behavior, BtStatus, NodeCtx, NodeId, NodeKind};
use arbor_core::{AgentId, WorldMut};

use crate::planner::{GoapAction, GoapPlanner, Plan, PlanError, PlannerConfig};
use crate::state::{Goal, PlanContext, WorldState};

/// A planner operator bound to the subtree that performs it.
///
/// Lives under a [`GoapPlannerNode`]; when its step comes up it simply
/// proxies its single child.
#[derive(Debug, Clone)]
pub struct GoapActionNode {
    action: GoapAction,
}

impl GoapActionNode {
    pub fn new(action: GoapAction) -> Self {
        Self { action }
    }

    pub fn action(&self) -> &GoapAction {
        &self.action
    }
}

impl<W> Behavior<W> for GoapActionNode
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Decorator
    }

    fn type_name(&self) -> &'static str {
        "GoapAction"
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        match ctx.child(0) {
            Some(child) => ctx.process(child),
            None => {
                tracing::warn!(
                    node = ctx.guid().0,
                    action = %self.action.name,
                    "goap action has nothing to run"
                );
                BtStatus::Failure
            }
        }
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(self.clone())
    }
}

/// Plans over its [`GoapActionNode`] children on entry, then runs the plan
/// one step per completed child.
///
/// The world state is a snapshot of the tree's blackboard. A failed step
/// drops the rest of the plan; the next entry plans again.
#[derive(Debug, Clone)]
pub struct GoapPlannerNode {
    goal: Goal,
    planner: GoapPlanner,
    queue: VecDeque<NodeId>,
    planned: Result<(), PlanError>,
    last_plan: Option<Plan>,
    plans: u64,
}

impl GoapPlannerNode {
    pub fn new(goal: Goal) -> Self {
        Self {
            goal,
            planner: GoapPlanner::new(),
            queue: VecDeque::new(),
            planned: Ok(()),
            last_plan: None,
            plans: 0,
        }
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.planner = self.planner.with_config(config);
        self
    }

    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    /// Most recent successful plan, kept across resets.
    pub fn last_plan(&self) -> Option<&Plan> {
        self.last_plan.as_ref()
    }

    pub fn last_error(&self) -> Option<&PlanError> {
        self.planned.as_ref().err()
    }

    /// Steps of the current plan not yet completed.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Planning attempts since creation.
    pub fn plans(&self) -> u64 {
        self.plans
    }
}

impl<W> Behavior<W> for GoapPlannerNode
where
    W: WorldMut + 'static,
{
    fn kind(&self) -> NodeKind {
        NodeKind::Composite
    }

    fn type_name(&self) -> &'static str {
        "GoapPlanner"
    }

    fn on_enter(&mut self, ctx: &mut NodeCtx<'_, '_, W>) {
        self.queue.clear();
        self.plans += 1;

        let start = WorldState::from_blackboard(ctx.blackboard());
        let mut ids = Vec::new();
        let mut actions = Vec::new();
        for child in ctx.children() {
            match ctx.behavior::<GoapActionNode>(child) {
                Some(node) => {
                    ids.push(child);
                    actions.push(node.action().clone());
                }
                None => tracing::warn!(
                    node = ctx.guid().0,
                    child = ?ctx.guid_of(child),
                    "goap planner ignores a non-action child"
                ),
            }
        }

        let plan_ctx = PlanContext::new(ctx.agent().stable_id(), ctx.blackboard());
        let result = self
            .planner
            .find_plan_for(&plan_ctx, &start, &self.goal, &actions);
        match result {
            Ok(plan) => {
                self.queue = plan.steps.iter().map(|s| ids[s.action]).collect();
                ctx.emit("goap.plan.found", plan.len() as u64, plan.expansions as u64);
                self.planned = Ok(());
                self.last_plan = Some(plan);
            }
            Err(err) => {
                let expansions = match err {
                    PlanError::NoPlan { expansions } => expansions,
                    PlanError::IterationCap { cap } => cap,
                };
                ctx.emit("goap.plan.none", 0, expansions as u64);
                tracing::debug!(node = ctx.guid().0, %err, "goap planning failed");
                self.planned = Err(err);
            }
        }
    }

    fn on_process(&mut self, ctx: &mut NodeCtx<'_, '_, W>) -> BtStatus {
        if self.planned.is_err() {
            return BtStatus::Failure;
        }
        let Some(&head) = self.queue.front() else {
            ctx.emit("goap.plan.done", 0, 0);
            return BtStatus::Success;
        };

        match ctx.process(head) {
            BtStatus::Running => BtStatus::Running,
            BtStatus::Failure => {
                let dropped = self.queue.len() as u64;
                self.queue.clear();
                ctx.emit("goap.plan.failed", head.index() as u64, dropped);
                BtStatus::Failure
            }
            BtStatus::Success => {
                self.queue.pop_front();
                // The same action may come up again later in the plan.
                ctx.reset(head);
                ctx.emit("goap.plan.step", head.index() as u64, self.queue.len() as u64);
                if self.queue.is_empty() {
                    ctx.emit("goap.plan.done", 0, 0);
                    BtStatus::Success
                } else {
                    BtStatus::Running
                }
            }
        }
    }

    fn reset(&mut self) {
        self.queue.clear();
        self.planned = Ok(());
    }

    fn clone_box(&self) -> Box<dyn Behavior<W>> {
        Box::new(Self {
            goal: self.goal.clone(),
            planner: self.planner.clone(),
            queue: VecDeque::new(),
            planned: Ok(()),
            last_plan: None,
            plans: 0,
        })
    }
}
