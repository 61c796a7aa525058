use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use arbor_core::{Blackboard, TickContext, WorldMut};
use arbor_tools::{TraceEvent, TraceSink};

use crate::bt::{Behavior, BtStatus, NodeGuid, NodeId, NodeKind, Status};
use crate::ctx::NodeCtx;
use crate::tree::TreeId;

/// Delivered to interrupt listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptEvent {
    pub node: NodeGuid,
    pub tick: u64,
}

/// Handle for one interrupt listener, scoped to the tree that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId {
    tree: TreeId,
    seq: u64,
}

impl ListenerId {
    pub fn tree(self) -> TreeId {
        self.tree
    }
}

pub type InterruptFn<W> = Box<dyn FnMut(&InterruptEvent, &mut W, &mut Blackboard)>;

pub(crate) struct Listener<W>
where
    W: WorldMut + 'static,
{
    id: ListenerId,
    callback: InterruptFn<W>,
}

pub(crate) struct Slot<W>
where
    W: WorldMut + 'static,
{
    pub guid: NodeGuid,
    pub name: Cow<'static, str>,
    pub kind: NodeKind,
    pub type_name: &'static str,
    pub status: Status,
    pub processing: bool,
    pub priority: f32,
    pub children: Vec<NodeId>,
    pub decorators: Vec<NodeId>,
    pub services: Vec<NodeId>,
    pub tree: TreeId,
    listeners: Vec<Listener<W>>,
    /// `None` only while the node is on the processing stack.
    pub behavior: Option<Box<dyn Behavior<W>>>,
}

impl<W> Slot<W>
where
    W: WorldMut + 'static,
{
    pub fn new(guid: NodeGuid, name: Cow<'static, str>, behavior: Box<dyn Behavior<W>>) -> Self {
        Self {
            guid,
            name,
            kind: behavior.kind(),
            type_name: behavior.type_name(),
            status: Status::None,
            processing: false,
            priority: 0.0,
            children: Vec::new(),
            decorators: Vec::new(),
            services: Vec::new(),
            tree: TreeId::UNASSIGNED,
            listeners: Vec::new(),
            behavior: Some(behavior),
        }
    }

    /// Unlinked copy with fresh runtime state, stamped with `tree`.
    fn fresh_copy(&self, tree: TreeId) -> Self {
        let behavior = self.behavior.as_deref().map(|b| {
            let mut copy = b.clone_box();
            copy.reset();
            copy
        });
        Self {
            guid: self.guid,
            name: self.name.clone(),
            kind: self.kind,
            type_name: self.type_name,
            status: Status::None,
            processing: false,
            priority: self.priority,
            children: Vec::new(),
            decorators: Vec::new(),
            services: Vec::new(),
            tree,
            listeners: Vec::new(),
            behavior,
        }
    }

    /// Children, then decorators, then services.
    pub fn links(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children
            .iter()
            .chain(self.decorators.iter())
            .chain(self.services.iter())
            .copied()
    }
}

/// Host-side borrows shared by every node processed in one tick.
pub(crate) struct Env<'e, W>
where
    W: WorldMut + 'static,
{
    pub tick: &'e TickContext,
    pub agent: W::Agent,
    pub world: &'e mut W,
    pub blackboard: &'e mut Blackboard,
    pub trace: &'e mut dyn TraceSink,
}

impl<W> Env<'_, W>
where
    W: WorldMut + 'static,
{
    pub fn emit(&mut self, tag: &'static str, node: NodeGuid) {
        self.trace
            .emit(TraceEvent::new(self.tick.tick, tag).with_node(node.0));
    }
}

/// Node arena. Every node of a tree lives here; links are indices.
pub(crate) struct Graph<W>
where
    W: WorldMut + 'static,
{
    pub slots: Vec<Slot<W>>,
    next_listener: u64,
}

impl<W> Default for Graph<W>
where
    W: WorldMut + 'static,
{
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            next_listener: 0,
        }
    }
}

impl<W> Graph<W>
where
    W: WorldMut + 'static,
{
    pub fn push(&mut self, slot: Slot<W>) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(slot);
        id
    }

    pub fn slot(&self, id: NodeId) -> Option<&Slot<W>> {
        self.slots.get(id.index())
    }

    pub fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot<W>> {
        self.slots.get_mut(id.index())
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.slots.len() as u32).map(NodeId)
    }

    /// Run one node through its state machine.
    pub fn process(&mut self, env: &mut Env<'_, W>, id: NodeId) -> BtStatus {
        let Some(slot) = self.slot(id) else {
            tracing::warn!(node = id.index(), "process called on unknown node");
            return BtStatus::Failure;
        };
        let guid = slot.guid;
        let kind = slot.kind;
        let entering = !slot.processing;
        if slot.behavior.is_none() {
            tracing::warn!(node = guid.0, "node re-entered while already processing");
            return BtStatus::Failure;
        }
        let composite = kind == NodeKind::Composite;

        // A closed gate keeps the composite from ever entering.
        if composite && entering && !self.gates_pass(env, id) {
            self.stop_links(env, id);
            self.slots[id.index()].status = Status::Failure;
            tracing::trace!(node = guid.0, "gate blocked entry");
            return BtStatus::Failure;
        }

        let Some(mut behavior) = self.slots[id.index()].behavior.take() else {
            tracing::warn!(node = guid.0, "node re-entered while already processing");
            return BtStatus::Failure;
        };

        if entering {
            env.emit("bt.node.enter", guid);
            behavior.on_enter(&mut NodeCtx::new(self, env, id));
            self.slots[id.index()].processing = true;
        }

        let result = if composite && !entering && !self.gates_pass(env, id) {
            BtStatus::Failure
        } else {
            if composite {
                self.tick_services(env, id);
            }
            behavior.on_process(&mut NodeCtx::new(self, env, id))
        };

        if result.is_done() {
            self.stop_links(env, id);
            behavior.on_exit(&mut NodeCtx::new(self, env, id));
            self.slots[id.index()].processing = false;
            env.emit("bt.node.exit", guid);
            tracing::trace!(node = guid.0, status = ?result, "node finished");
        }

        let slot = &mut self.slots[id.index()];
        slot.status = result.into();
        slot.behavior = Some(behavior);
        result
    }

    /// Attached decorators act as gates; any `Failure` blocks the composite.
    fn gates_pass(&mut self, env: &mut Env<'_, W>, id: NodeId) -> bool {
        let gates = self.slots[id.index()].decorators.clone();
        gates
            .into_iter()
            .all(|gate| self.process(env, gate) != BtStatus::Failure)
    }

    fn tick_services(&mut self, env: &mut Env<'_, W>, id: NodeId) {
        let services = self.slots[id.index()].services.clone();
        for service in services {
            self.process(env, service);
        }
    }

    /// Nothing below a finished node may keep running: flow links that are
    /// still processing are aborted, services are stopped.
    fn stop_links(&mut self, env: &mut Env<'_, W>, id: NodeId) {
        let slot = &self.slots[id.index()];
        let flow: Vec<NodeId> = slot
            .children
            .iter()
            .chain(slot.decorators.iter())
            .copied()
            .collect();
        let services = slot.services.clone();
        for link in flow {
            if self.slots[link.index()].processing {
                self.abort(env, link);
            }
        }
        for service in services {
            self.reset(env, service);
        }
    }

    fn abort_running_links(&mut self, env: &mut Env<'_, W>, id: NodeId) {
        let links: Vec<NodeId> = self.slots[id.index()].links().collect();
        for link in links {
            if self.slots[link.index()].processing {
                self.abort(env, link);
            }
        }
    }

    /// Reset `id` and everything below it. A node in `None` gets no `on_exit`.
    pub fn reset(&mut self, env: &mut Env<'_, W>, id: NodeId) {
        let Some(slot) = self.slot(id) else {
            return;
        };
        let links: Vec<NodeId> = slot.links().collect();
        for link in links {
            self.reset(env, link);
        }
        self.finish(env, id, Status::None);
    }

    /// Force-terminate `id` with `Failure`, running descendants first.
    pub fn abort(&mut self, env: &mut Env<'_, W>, id: NodeId) {
        let Some(slot) = self.slot(id) else {
            return;
        };
        let was_processing = slot.processing;
        self.abort_running_links(env, id);
        self.finish(env, id, Status::Failure);
        if was_processing {
            env.emit("bt.node.abort", self.slots[id.index()].guid);
            self.interrupt(env, id);
        }
    }

    fn finish(&mut self, env: &mut Env<'_, W>, id: NodeId, status: Status) {
        let slot = &mut self.slots[id.index()];
        let was_processing = slot.processing;
        slot.processing = false;
        slot.status = status;
        // A node on the processing stack has lent out its behavior; its own
        // `process` call restores state when it unwinds.
        let Some(mut behavior) = slot.behavior.take() else {
            return;
        };
        if was_processing {
            behavior.on_exit(&mut NodeCtx::new(self, env, id));
        }
        behavior.reset();
        self.slots[id.index()].behavior = Some(behavior);
    }

    /// Fire every listener subscribed to `id`. Status is untouched.
    pub fn interrupt(&mut self, env: &mut Env<'_, W>, id: NodeId) {
        let Some(slot) = self.slots.get_mut(id.index()) else {
            return;
        };
        let event = InterruptEvent {
            node: slot.guid,
            tick: env.tick.tick,
        };
        for listener in slot.listeners.iter_mut() {
            (listener.callback)(&event, &mut *env.world, &mut *env.blackboard);
        }
        env.emit("bt.node.interrupt", event.node);
    }

    pub fn subscribe(&mut self, id: NodeId, callback: InterruptFn<W>) -> Option<ListenerId> {
        let slot = self.slots.get_mut(id.index())?;
        let listener = ListenerId {
            tree: slot.tree,
            seq: self.next_listener,
        };
        slot.listeners.push(Listener {
            id: listener,
            callback,
        });
        self.next_listener += 1;
        Some(listener)
    }

    pub fn unsubscribe(&mut self, listener: ListenerId) -> bool {
        for slot in self.slots.iter_mut().filter(|s| s.tree == listener.tree) {
            if let Some(pos) = slot.listeners.iter().position(|l| l.id == listener) {
                slot.listeners.remove(pos);
                return true;
            }
        }
        false
    }

    /// Every node reachable from `root`, each once, depth-first preorder.
    pub fn reachable(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut seen = BTreeSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(slot) = self.slot(id) else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            let links: Vec<NodeId> = slot.links().collect();
            stack.extend(links.into_iter().rev());
        }
        order
    }

    /// Two-pass copy of the subgraph under `root`: clone every reachable
    /// node into a fresh arena recording old id -> new id, then relink
    /// children, decorators and services through that map.
    pub fn compact(&self, root: NodeId, tree: TreeId) -> (Graph<W>, NodeId) {
        let order = self.reachable(root);

        let mut map: BTreeMap<NodeId, NodeId> = BTreeMap::new();
        let mut graph = Graph::default();
        for &old in &order {
            let new = graph.push(self.slots[old.index()].fresh_copy(tree));
            map.insert(old, new);
        }

        let remap = |ids: &[NodeId]| -> Vec<NodeId> {
            ids.iter().filter_map(|id| map.get(id).copied()).collect()
        };
        for &old in &order {
            let src = &self.slots[old.index()];
            let dst = &mut graph.slots[map[&old].index()];
            dst.children = remap(&src.children);
            dst.decorators = remap(&src.decorators);
            dst.services = remap(&src.services);
        }

        let root = map.get(&root).copied().unwrap_or(NodeId(0));
        (graph, root)
    }
}
