use core::cmp::Ordering;
use core::fmt;
use std::collections::BTreeMap;
use std::rc::Rc;

use arbor_core::{Blackboard, Value};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Planner world state: key -> value.
///
/// Copy-on-write; cloning is a pointer copy, and a successor state only
/// copies the map when an effect actually changes it. Ordering and hashing
/// are canonical, so states can key the planner's closed set.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorldState(Rc<BTreeMap<String, Value>>);

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every key of a blackboard.
    pub fn from_blackboard(blackboard: &Blackboard) -> Self {
        let map = blackboard
            .keys()
            .map(|k| (k.name().to_string(), k.value().clone()))
            .collect();
        Self(Rc::new(map))
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        Rc::make_mut(&mut self.0).insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Successor state with `effects` overlaid.
    pub fn apply(&self, effects: &[Effect]) -> WorldState {
        let mut next = self.clone();
        for effect in effects {
            if next.get(&effect.key) != Some(&effect.value) {
                Rc::make_mut(&mut next.0).insert(effect.key.clone(), effect.value.clone());
            }
        }
        next
    }

    pub fn satisfies(&self, predicates: &[Predicate]) -> bool {
        predicates.iter().all(|p| p.is_satisfied_by(self))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Compare {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Compare {
    fn holds(self, ordering: Option<Ordering>) -> bool {
        match self {
            Compare::Eq => ordering == Some(Ordering::Equal),
            Compare::Ne => ordering != Some(Ordering::Equal),
            Compare::Lt => ordering == Some(Ordering::Less),
            Compare::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            Compare::Gt => ordering == Some(Ordering::Greater),
            Compare::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Compare::Eq => "==",
            Compare::Ne => "!=",
            Compare::Lt => "<",
            Compare::Le => "<=",
            Compare::Gt => ">",
            Compare::Ge => ">=",
        }
    }
}

/// `key <op> value` over a world state.
///
/// Values compare semantically (an `Int` key can be tested against a
/// `Float`). A missing key or incomparable types satisfy only `Ne`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Predicate {
    pub key: String,
    pub op: Compare,
    pub value: Value,
}

impl Predicate {
    pub fn new(key: impl Into<String>, op: Compare, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            op,
            value: value.into(),
        }
    }

    pub fn equals(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, Compare::Eq, value)
    }

    pub fn not_equals(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, Compare::Ne, value)
    }

    pub fn less(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, Compare::Lt, value)
    }

    pub fn at_most(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, Compare::Le, value)
    }

    pub fn greater(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, Compare::Gt, value)
    }

    pub fn at_least(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, Compare::Ge, value)
    }

    pub fn is_satisfied_by(&self, state: &WorldState) -> bool {
        let ordering = state.get(&self.key).and_then(|v| v.compare(&self.value));
        self.op.holds(ordering)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.key, self.op.symbol(), self.value)
    }
}

/// What a [`Check`] may consult besides the world state: the agent the plan
/// is for and its blackboard at planning time.
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    /// [`arbor_core::AgentId::stable_id`] of the planning agent.
    pub agent: u64,
    pub blackboard: &'a Blackboard,
}

impl<'a> PlanContext<'a> {
    pub fn new(agent: u64, blackboard: &'a Blackboard) -> Self {
        Self { agent, blackboard }
    }
}

type CheckFn = dyn Fn(&PlanContext<'_>, &WorldState) -> bool;

/// Host-evaluated precondition.
///
/// Use one when an action depends on something a [`Predicate`] cannot
/// name, such as the agent itself or a blackboard key the planner does not
/// track. Checks are not serialized.
#[derive(Clone)]
pub struct Check {
    name: String,
    f: Rc<CheckFn>,
}

impl Check {
    pub fn new(
        name: impl Into<String>,
        f: impl Fn(&PlanContext<'_>, &WorldState) -> bool + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            f: Rc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn holds(&self, ctx: &PlanContext<'_>, state: &WorldState) -> bool {
        (self.f)(ctx, state)
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Check").field(&self.name).finish()
    }
}

impl PartialEq for Check {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Rc::ptr_eq(&self.f, &other.f)
    }
}

/// Key/value assertion applied by an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Effect {
    pub key: String,
    pub value: Value,
}

impl Effect {
    pub fn set(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Conjunction of predicates the planner must reach.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Goal {
    pub predicates: Vec<Predicate>,
}

impl Goal {
    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self { predicates }
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn is_satisfied_by(&self, state: &WorldState) -> bool {
        state.satisfies(&self.predicates)
    }

    /// Predicates `state` does not meet; the search heuristic.
    pub fn unmet(&self, state: &WorldState) -> usize {
        self.predicates
            .iter()
            .filter(|p| !p.is_satisfied_by(state))
            .count()
    }
}
