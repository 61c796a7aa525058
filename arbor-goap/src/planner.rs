use core::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use arbor_core::{Blackboard, Value};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::state::{Check, Effect, Goal, PlanContext, Predicate, WorldState};

/// One planner operator: preconditions, effects and a non-negative cost.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GoapAction {
    pub name: String,
    pub preconditions: Vec<Predicate>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub checks: Vec<Check>,
    pub effects: Vec<Effect>,
    cost: f32,
}

impl GoapAction {
    /// Negative (or NaN) costs clamp to 0.
    pub fn new(name: impl Into<String>, cost: f32) -> Self {
        Self {
            name: name.into(),
            preconditions: Vec::new(),
            checks: Vec::new(),
            effects: Vec::new(),
            cost: clamp_cost(cost),
        }
    }

    pub fn requires(mut self, predicate: Predicate) -> Self {
        self.preconditions.push(predicate);
        self
    }

    /// Gate the action on a host check evaluated during the search.
    pub fn requires_check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    pub fn sets(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.effects.push(Effect::set(key, value));
        self
    }

    pub fn cost(&self) -> f32 {
        clamp_cost(self.cost)
    }

    pub fn set_cost(&mut self, cost: f32) {
        self.cost = clamp_cost(cost);
    }

    pub fn is_applicable(&self, ctx: &PlanContext<'_>, state: &WorldState) -> bool {
        state.satisfies(&self.preconditions) && self.checks.iter().all(|c| c.holds(ctx, state))
    }

    pub fn apply(&self, state: &WorldState) -> WorldState {
        state.apply(&self.effects)
    }
}

fn clamp_cost(cost: f32) -> f32 {
    if cost > 0.0 {
        cost
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlannerConfig {
    /// Open-set pops before the search gives up.
    pub max_iterations: usize,
    /// Keep the best cost per visited state and drop worse revisits.
    pub dedupe_states: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            dedupe_states: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("no action sequence reaches the goal ({expansions} states expanded)")]
    NoPlan { expansions: usize },

    #[error("search exceeded {cap} iterations")]
    IterationCap { cap: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    /// Index into the action slice the plan was made from.
    pub action: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
    pub cost: f32,
    pub expansions: usize,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    /// Replay the plan's effects from `start`.
    pub fn simulate(&self, start: &WorldState, actions: &[GoapAction]) -> WorldState {
        self.steps.iter().fold(start.clone(), |state, step| {
            match actions.get(step.action) {
                Some(action) => action.apply(&state),
                None => state,
            }
        })
    }
}

/// Best-first (A*) search over world states.
///
/// `h` is the number of unmet goal predicates. Equal `f` pops in insertion
/// order, so results are deterministic for a given action order.
#[derive(Debug, Clone, Default)]
pub struct GoapPlanner {
    config: PlannerConfig,
}

impl GoapPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> PlannerConfig {
        self.config
    }

    /// Plan with no agent (id 0) and an empty blackboard behind any
    /// [`Check`]s.
    pub fn find_plan(
        &self,
        start: &WorldState,
        goal: &Goal,
        actions: &[GoapAction],
    ) -> Result<Plan, PlanError> {
        let detached = Blackboard::new();
        self.find_plan_for(&PlanContext::new(0, &detached), start, goal, actions)
    }

    pub fn find_plan_for(
        &self,
        ctx: &PlanContext<'_>,
        start: &WorldState,
        goal: &Goal,
        actions: &[GoapAction],
    ) -> Result<Plan, PlanError> {
        if goal.is_satisfied_by(start) {
            return Ok(Plan {
                steps: Vec::new(),
                cost: 0.0,
                expansions: 0,
            });
        }

        struct SearchNode {
            parent: Option<usize>,
            action: Option<usize>,
            state: WorldState,
            g: f32,
        }

        #[derive(Debug, Clone, Copy)]
        struct OpenNode {
            f: f32,
            tie: u64,
            node: usize,
        }

        impl PartialEq for OpenNode {
            fn eq(&self, other: &Self) -> bool {
                self.cmp(other) == Ordering::Equal
            }
        }

        impl Eq for OpenNode {}

        impl Ord for OpenNode {
            fn cmp(&self, other: &Self) -> Ordering {
                // Reversed: BinaryHeap pops the smallest f, then the oldest entry.
                other
                    .f
                    .total_cmp(&self.f)
                    .then_with(|| other.tie.cmp(&self.tie))
            }
        }

        impl PartialOrd for OpenNode {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        let h = |state: &WorldState| goal.unmet(state) as f32;

        let mut nodes = vec![SearchNode {
            parent: None,
            action: None,
            state: start.clone(),
            g: 0.0,
        }];
        let mut best_g: BTreeMap<WorldState, f32> = BTreeMap::new();
        if self.config.dedupe_states {
            best_g.insert(start.clone(), 0.0);
        }

        let mut open = BinaryHeap::new();
        let mut tie: u64 = 0;
        open.push(OpenNode {
            f: h(start),
            tie,
            node: 0,
        });
        tie += 1;

        let mut expansions: usize = 0;

        while let Some(entry) = open.pop() {
            expansions += 1;
            if expansions > self.config.max_iterations {
                tracing::debug!(cap = self.config.max_iterations, "goap search hit its cap");
                return Err(PlanError::IterationCap {
                    cap: self.config.max_iterations,
                });
            }

            let current = entry.node;
            let g = nodes[current].g;
            let state = nodes[current].state.clone();

            if goal.is_satisfied_by(&state) {
                let mut steps = Vec::new();
                let mut cursor = Some(current);
                while let Some(i) = cursor {
                    if let Some(action) = nodes[i].action {
                        steps.push(PlanStep {
                            action,
                            name: actions[action].name.clone(),
                        });
                    }
                    cursor = nodes[i].parent;
                }
                steps.reverse();
                tracing::debug!(steps = steps.len(), cost = g, expansions, "goap plan found");
                return Ok(Plan {
                    steps,
                    cost: g,
                    expansions,
                });
            }

            if self.config.dedupe_states {
                let best = best_g.get(&state).copied().unwrap_or(f32::INFINITY);
                if g > best {
                    continue; // stale heap entry
                }
            }

            for (index, action) in actions.iter().enumerate() {
                if !action.is_applicable(ctx, &state) {
                    continue;
                }
                let next = action.apply(&state);
                let next_g = g + action.cost();

                if self.config.dedupe_states {
                    let prev = best_g.get(&next).copied().unwrap_or(f32::INFINITY);
                    if next_g >= prev {
                        continue;
                    }
                    best_g.insert(next.clone(), next_g);
                }

                let f = next_g + h(&next);
                nodes.push(SearchNode {
                    parent: Some(current),
                    action: Some(index),
                    state: next,
                    g: next_g,
                });
                open.push(OpenNode {
                    f,
                    tie,
                    node: nodes.len() - 1,
                });
                tie += 1;
            }
        }

        tracing::debug!(expansions, "goap search exhausted");
        Err(PlanError::NoPlan { expansions })
    }
}
