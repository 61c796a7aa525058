use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use arbor_core::{Blackboard, KeyOverride, TickContext, WorldMut};
use arbor_tools::{NullTraceSink, TraceEvent, TraceSink};

use crate::bt::{NodeGuid, NodeId, NodeKind, Status};
use crate::graph::{Env, Graph, InterruptEvent, ListenerId};

/// Identity of one tree instance. Every clone gets a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreeId(u64);

impl TreeId {
    pub(crate) const UNASSIGNED: TreeId = TreeId(0);

    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        TreeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Read-only snapshot of one node, for debugging and inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo<'t> {
    pub id: NodeId,
    pub guid: NodeGuid,
    pub name: &'t str,
    pub type_name: &'static str,
    pub kind: NodeKind,
    pub status: Status,
    pub processing: bool,
    pub priority: f32,
    pub tree: TreeId,
    pub children: Vec<NodeGuid>,
    pub decorators: Vec<NodeGuid>,
    pub services: Vec<NodeGuid>,
}

/// A runnable behavior tree for one agent.
///
/// The tree owns its node arena and its blackboard. The arena holds exactly
/// the nodes reachable from the root; builders and clones both go through
/// the same compaction pass to keep it that way.
pub struct BehaviorTree<W>
where
    W: WorldMut + 'static,
{
    id: TreeId,
    agent: W::Agent,
    graph: Graph<W>,
    root: NodeId,
    index: BTreeMap<NodeGuid, NodeId>,
    blackboard: Blackboard,
    trace: Box<dyn TraceSink>,
    last_status: Status,
    updates: u64,
}

impl<W> BehaviorTree<W>
where
    W: WorldMut + 'static,
{
    pub(crate) fn from_parts(
        agent: W::Agent,
        source: &Graph<W>,
        root: NodeId,
        blackboard: Blackboard,
    ) -> Self {
        let id = TreeId::next();
        let (graph, root) = source.compact(root, id);
        let index = graph
            .slots
            .iter()
            .enumerate()
            .map(|(i, s)| (s.guid, NodeId(i as u32)))
            .collect();
        Self {
            id,
            agent,
            graph,
            root,
            index,
            blackboard,
            trace: Box::new(NullTraceSink),
            last_status: Status::None,
            updates: 0,
        }
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn agent(&self) -> W::Agent {
        self.agent
    }

    pub fn root(&self) -> NodeGuid {
        self.graph.slots[self.root.index()].guid
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    /// Status the root reported on the last update.
    pub fn last_status(&self) -> Status {
        self.last_status
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn set_trace_sink(&mut self, sink: impl TraceSink + 'static) {
        self.trace = Box::new(sink);
    }

    pub fn with_trace_sink(mut self, sink: impl TraceSink + 'static) -> Self {
        self.set_trace_sink(sink);
        self
    }

    /// Tick the tree once.
    ///
    /// A tick that follows a finished run (or the very first tick) resets
    /// every node first, so each run starts from scratch.
    pub fn update(&mut self, tick: &TickContext, world: &mut W) -> Status {
        let mut env = Env {
            tick,
            agent: self.agent,
            world,
            blackboard: &mut self.blackboard,
            trace: &mut *self.trace,
        };

        if self.last_status != Status::Running {
            self.graph.reset(&mut env, self.root);
            env.trace
                .emit(TraceEvent::new(tick.tick, "bt.tree.reset").with_a(self.updates));
            tracing::debug!(tree = self.id.0, tick = tick.tick, "fresh run");
        }

        let status = Status::from(self.graph.process(&mut env, self.root));
        self.last_status = status;
        self.updates += 1;
        status
    }

    /// Abort the whole tree: running nodes get `on_exit` and their interrupt
    /// listeners fire. The next update starts a fresh run.
    pub fn abort(&mut self, tick: &TickContext, world: &mut W) {
        let mut env = Env {
            tick,
            agent: self.agent,
            world,
            blackboard: &mut self.blackboard,
            trace: &mut *self.trace,
        };
        self.graph.abort(&mut env, self.root);
        self.last_status = Status::Failure;
    }

    /// Fire the interrupt listeners of one node. Returns `false` for an
    /// unknown guid.
    pub fn interrupt(&mut self, guid: NodeGuid, tick: &TickContext, world: &mut W) -> bool {
        let Some(&id) = self.index.get(&guid) else {
            return false;
        };
        let mut env = Env {
            tick,
            agent: self.agent,
            world,
            blackboard: &mut self.blackboard,
            trace: &mut *self.trace,
        };
        self.graph.interrupt(&mut env, id);
        true
    }

    /// Attach an interrupt listener to a node. Listeners stay with this
    /// instance; clones start without any.
    pub fn subscribe_interrupt(
        &mut self,
        guid: NodeGuid,
        listener: impl FnMut(&InterruptEvent, &mut W, &mut Blackboard) + 'static,
    ) -> Option<ListenerId> {
        let id = *self.index.get(&guid)?;
        self.graph.subscribe(id, Box::new(listener))
    }

    pub fn unsubscribe_interrupt(&mut self, listener: ListenerId) -> bool {
        self.graph.unsubscribe(listener)
    }

    pub fn node_count(&self) -> usize {
        self.graph.slots.len()
    }

    pub fn find_node(&self, guid: NodeGuid) -> Option<NodeInfo<'_>> {
        let id = *self.index.get(&guid)?;
        self.info(id)
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeInfo<'_>> {
        let index = self.graph.slots.iter().position(|s| s.name == name)?;
        self.info(NodeId(index as u32))
    }

    /// Every node, depth-first from the root.
    pub fn nodes(&self) -> impl Iterator<Item = NodeInfo<'_>> + '_ {
        self.graph.ids().filter_map(|id| self.info(id))
    }

    /// Node type names in depth-first order; equal for isomorphic trees.
    pub fn shape(&self) -> Vec<&'static str> {
        self.graph.slots.iter().map(|s| s.type_name).collect()
    }

    /// Downcast a node's behavior, e.g. to read a cooldown's remaining time.
    pub fn behavior<T: 'static>(&self, guid: NodeGuid) -> Option<&T> {
        let id = *self.index.get(&guid)?;
        self.graph
            .slot(id)?
            .behavior
            .as_deref()?
            .as_any()
            .downcast_ref::<T>()
    }

    pub fn behavior_mut<T: 'static>(&mut self, guid: NodeGuid) -> Option<&mut T> {
        let id = *self.index.get(&guid)?;
        self.graph
            .slot_mut(id)?
            .behavior
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Deep copy for the same agent.
    pub fn clone_tree(&self) -> Self {
        self.instantiate(self.agent, &[])
    }

    /// Deep copy for another agent with that agent's blackboard overrides.
    ///
    /// The copy shares no node or blackboard state with `self`; node guids
    /// are preserved, the tree id is new and every status is `None`.
    pub fn instantiate(&self, agent: W::Agent, overrides: &[KeyOverride]) -> Self {
        let mut blackboard = self.blackboard.clone();
        blackboard.apply_overrides(overrides);
        Self::from_parts(agent, &self.graph, self.root, blackboard)
    }

    fn info(&self, id: NodeId) -> Option<NodeInfo<'_>> {
        let slot = self.graph.slot(id)?;
        let guids = |ids: &[NodeId]| -> Vec<NodeGuid> {
            ids.iter()
                .filter_map(|&i| self.graph.slot(i).map(|s| s.guid))
                .collect()
        };
        Some(NodeInfo {
            id,
            guid: slot.guid,
            name: slot.name.as_ref(),
            type_name: slot.type_name,
            kind: slot.kind,
            status: slot.status,
            processing: slot.processing,
            priority: slot.priority,
            tree: slot.tree,
            children: guids(&slot.children),
            decorators: guids(&slot.decorators),
            services: guids(&slot.services),
        })
    }
}
