use arbor_core::{rng, Blackboard, SplitMix64, TickContext, WorldMut};
use arbor_tools::TraceEvent;

use crate::bt::{BtStatus, NodeGuid, NodeId, Status};
use crate::graph::{Env, Graph};

/// What a [`Behavior`](crate::Behavior) sees while it runs: the host's tick,
/// agent, world and blackboard, plus access to the nodes it links to.
pub struct NodeCtx<'a, 'e, W>
where
    W: WorldMut + 'static,
{
    graph: &'a mut Graph<W>,
    env: &'a mut Env<'e, W>,
    node: NodeId,
}

impl<'a, 'e, W> NodeCtx<'a, 'e, W>
where
    W: WorldMut + 'static,
{
    pub(crate) fn new(graph: &'a mut Graph<W>, env: &'a mut Env<'e, W>, node: NodeId) -> Self {
        Self { graph, env, node }
    }

    pub fn tick(&self) -> &TickContext {
        self.env.tick
    }

    /// Host clock in seconds.
    pub fn now(&self) -> f64 {
        self.env.tick.time_seconds
    }

    pub fn agent(&self) -> W::Agent {
        self.env.agent
    }

    pub fn world(&self) -> &W {
        &*self.env.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut *self.env.world
    }

    pub fn blackboard(&self) -> &Blackboard {
        &*self.env.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut *self.env.blackboard
    }

    /// The node being processed.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn guid(&self) -> NodeGuid {
        self.guid_of(self.node).unwrap_or(NodeGuid(0))
    }

    pub fn guid_of(&self, id: NodeId) -> Option<NodeGuid> {
        self.graph.slot(id).map(|s| s.guid)
    }

    pub fn child(&self, index: usize) -> Option<NodeId> {
        self.graph.slot(self.node)?.children.get(index).copied()
    }

    pub fn child_count(&self) -> usize {
        self.graph
            .slot(self.node)
            .map(|s| s.children.len())
            .unwrap_or(0)
    }

    pub fn children(&self) -> Vec<NodeId> {
        self.graph
            .slot(self.node)
            .map(|s| s.children.clone())
            .unwrap_or_default()
    }

    pub fn status(&self, id: NodeId) -> Status {
        self.graph.slot(id).map(|s| s.status).unwrap_or_default()
    }

    pub fn priority(&self, id: NodeId) -> f32 {
        self.graph.slot(id).map(|s| s.priority).unwrap_or(0.0)
    }

    pub fn is_processing(&self, id: NodeId) -> bool {
        self.graph.slot(id).map(|s| s.processing).unwrap_or(false)
    }

    /// Downcast another node's behavior. `None` for the node being processed.
    pub fn behavior<T: 'static>(&self, id: NodeId) -> Option<&T> {
        self.graph
            .slot(id)?
            .behavior
            .as_deref()?
            .as_any()
            .downcast_ref::<T>()
    }

    pub fn process(&mut self, id: NodeId) -> BtStatus {
        self.graph.process(&mut *self.env, id)
    }

    pub fn reset(&mut self, id: NodeId) {
        self.graph.reset(&mut *self.env, id);
    }

    pub fn abort(&mut self, id: NodeId) {
        self.graph.abort(&mut *self.env, id);
    }

    pub fn interrupt(&mut self, id: NodeId) {
        self.graph.interrupt(&mut *self.env, id);
    }

    /// Deterministic RNG for this node at this tick.
    pub fn rng(&self) -> SplitMix64 {
        let stream = rng::mix64(self.guid().0 ^ self.env.tick.tick.rotate_left(32));
        self.env.tick.rng_for_agent(self.env.agent, stream)
    }

    pub fn emit(&mut self, tag: &'static str, a: u64, b: u64) {
        let event = TraceEvent::new(self.env.tick.tick, tag)
            .with_node(self.guid().0)
            .with_a(a)
            .with_b(b);
        self.env.trace.emit(event);
    }
}
