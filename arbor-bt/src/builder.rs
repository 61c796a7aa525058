use std::borrow::Cow;

use arbor_core::{Blackboard, WorldMut};
use thiserror::Error;

use crate::bt::{Behavior, NodeGuid, NodeId, NodeKind};
use crate::graph::{Graph, Slot};
use crate::nodes::Root;
use crate::tree::BehaviorTree;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {0:?} does not exist in this builder")]
    UnknownNode(NodeId),

    #[error("node {child:?} already has a parent ({parent:?})")]
    AlreadyParented { child: NodeId, parent: NodeId },

    #[error("node {0:?} is not a composite")]
    NotAComposite(NodeId),

    #[error("node {0:?} cannot hold a single child")]
    NotADecorator(NodeId),

    #[error("decorator {0:?} already has a child")]
    DecoratorOccupied(NodeId),

    #[error("node {child:?} ({kind:?}) cannot be linked there")]
    InvalidChild { child: NodeId, kind: NodeKind },

    #[error("linking {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("guid {0:?} is already used")]
    DuplicateGuid(NodeGuid),

    #[error("the root has no child")]
    MissingRootChild,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkRole {
    Child,
    Decorator,
    Service,
}

/// Authoring-side graph construction.
///
/// Nodes may be added before they are linked; `build` drops whatever is
/// not reachable from the root.
pub struct TreeBuilder<W>
where
    W: WorldMut + 'static,
{
    graph: Graph<W>,
    parents: Vec<Option<NodeId>>,
    root: NodeId,
    blackboard: Blackboard,
    next_guid: u64,
}

impl<W> Default for TreeBuilder<W>
where
    W: WorldMut + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<W> TreeBuilder<W>
where
    W: WorldMut + 'static,
{
    pub fn new() -> Self {
        let mut graph = Graph::default();
        let root = graph.push(Slot::new(
            NodeGuid(1),
            Cow::Borrowed("Root"),
            Box::new(Root),
        ));
        Self {
            graph,
            parents: vec![None],
            root,
            blackboard: Blackboard::new(),
            next_guid: 2,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn with_blackboard(mut self, blackboard: Blackboard) -> Self {
        self.blackboard = blackboard;
        self
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    pub fn add_node(&mut self, behavior: impl Behavior<W>) -> NodeId {
        let name = Cow::Borrowed(behavior.type_name());
        self.push(name, Box::new(behavior))
    }

    pub fn add_named(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        behavior: impl Behavior<W>,
    ) -> NodeId {
        self.push(name.into(), Box::new(behavior))
    }

    /// Add a node under an authored guid (e.g. from an editor asset).
    pub fn add_with_guid(
        &mut self,
        guid: NodeGuid,
        behavior: impl Behavior<W>,
    ) -> Result<NodeId, TreeError> {
        if self.graph.slots.iter().any(|s| s.guid == guid) {
            return Err(TreeError::DuplicateGuid(guid));
        }
        let name = Cow::Borrowed(behavior.type_name());
        let id = self.graph.push(Slot::new(guid, name, Box::new(behavior)));
        self.parents.push(None);
        self.next_guid = self.next_guid.max(guid.0 + 1);
        Ok(id)
    }

    fn push(&mut self, name: Cow<'static, str>, behavior: Box<dyn Behavior<W>>) -> NodeId {
        let mut guid = NodeGuid(self.next_guid);
        while self.graph.slots.iter().any(|s| s.guid == guid) {
            guid.0 += 1;
        }
        self.next_guid = guid.0 + 1;
        let id = self.graph.push(Slot::new(guid, name, behavior));
        self.parents.push(None);
        id
    }

    pub fn guid(&self, id: NodeId) -> Option<NodeGuid> {
        self.graph.slot(id).map(|s| s.guid)
    }

    pub fn set_priority(&mut self, id: NodeId, priority: f32) -> Result<(), TreeError> {
        let slot = self.graph.slot_mut(id).ok_or(TreeError::UnknownNode(id))?;
        slot.priority = priority;
        Ok(())
    }

    /// Append `child` to a composite's ordered children.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.link(parent, child, LinkRole::Child)
    }

    /// Give a decorator (or the root) its single child.
    pub fn set_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.link(parent, child, LinkRole::Child)
    }

    pub fn set_root(&mut self, child: NodeId) -> Result<(), TreeError> {
        self.link(self.root, child, LinkRole::Child)
    }

    /// Attach a decorator to a composite as a gate.
    pub fn attach_decorator(
        &mut self,
        composite: NodeId,
        decorator: NodeId,
    ) -> Result<(), TreeError> {
        self.link(composite, decorator, LinkRole::Decorator)
    }

    pub fn attach_service(&mut self, composite: NodeId, service: NodeId) -> Result<(), TreeError> {
        self.link(composite, service, LinkRole::Service)
    }

    fn link(&mut self, parent: NodeId, child: NodeId, role: LinkRole) -> Result<(), TreeError> {
        let parent_slot = self.graph.slot(parent).ok_or(TreeError::UnknownNode(parent))?;
        let child_slot = self.graph.slot(child).ok_or(TreeError::UnknownNode(child))?;
        let parent_kind = parent_slot.kind;
        let child_kind = child_slot.kind;

        let child_ok = match role {
            LinkRole::Child => !matches!(child_kind, NodeKind::Root | NodeKind::Service),
            LinkRole::Decorator => child_kind == NodeKind::Decorator,
            LinkRole::Service => child_kind == NodeKind::Service,
        };
        if !child_ok {
            return Err(TreeError::InvalidChild {
                child,
                kind: child_kind,
            });
        }

        match (role, parent_kind) {
            (LinkRole::Child, NodeKind::Composite) => {}
            (LinkRole::Child, NodeKind::Decorator | NodeKind::Root) => {
                if !parent_slot.children.is_empty() {
                    return Err(TreeError::DecoratorOccupied(parent));
                }
            }
            (LinkRole::Child, _) => return Err(TreeError::NotADecorator(parent)),
            (_, NodeKind::Composite) => {}
            _ => return Err(TreeError::NotAComposite(parent)),
        }

        if let Some(existing) = self.parents[child.index()] {
            return Err(TreeError::AlreadyParented {
                child,
                parent: existing,
            });
        }

        let mut cursor = Some(parent);
        while let Some(ancestor) = cursor {
            if ancestor == child {
                return Err(TreeError::Cycle { parent, child });
            }
            cursor = self.parents[ancestor.index()];
        }

        let slot = &mut self.graph.slots[parent.index()];
        match role {
            LinkRole::Child => slot.children.push(child),
            LinkRole::Decorator => slot.decorators.push(child),
            LinkRole::Service => slot.services.push(child),
        }
        self.parents[child.index()] = Some(parent);
        Ok(())
    }

    /// Finish authoring. Unlinked nodes are dropped.
    pub fn build(self, agent: W::Agent) -> Result<BehaviorTree<W>, TreeError> {
        if self.graph.slots[self.root.index()].children.is_empty() {
            return Err(TreeError::MissingRootChild);
        }
        Ok(BehaviorTree::from_parts(
            agent,
            &self.graph,
            self.root,
            self.blackboard,
        ))
    }
}
