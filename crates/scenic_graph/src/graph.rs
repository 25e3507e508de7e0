//! Scene graph
//!
//! Nodes live in an arena addressed by [`NodeId`]. A node moves through
//! `Constructed -> Attached -> Realized`, is updated every tick while
//! realized, and returns to `Detached` when removed from its parent.
//!
//! Attaching under a realized node realizes the whole attached subtree in the
//! same call, so a loader can build a subtree off to the side and make it live
//! in one step.

use crate::backend::{HeadlessBackend, RenderBackend, ResourceId};
use crate::component::{apply_message, Component, ComponentSlot, Mailbox, Message, NodeContext};
use crate::error::{GraphError, Result};
use crate::node::{NodeAllocator, NodeId};
use scenic_math::{Mat4, Transform, AABB};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

/// Where a node is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Created, never attached
    Constructed,
    /// Has a parent but is not part of the live tree
    Attached,
    /// Part of the live tree with backend resources allocated
    Realized,
    /// Removed from its parent, resources released
    Detached,
}

struct SceneNode {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    transform: Transform,
    has_transform: bool,
    visible: bool,
    components: Vec<ComponentSlot>,
    lifecycle: Lifecycle,
    mailbox: Mailbox,
    world: Mat4,
}

impl SceneNode {
    fn new(name: String) -> Self {
        Self {
            name,
            parent: None,
            children: Vec::new(),
            transform: Transform::IDENTITY,
            has_transform: false,
            visible: true,
            components: Vec::new(),
            lifecycle: Lifecycle::Constructed,
            mailbox: Mailbox::new(),
            world: Mat4::IDENTITY,
        }
    }

    /// Drain the mailbox, then run behaviors
    fn run_tick(&mut self, id: NodeId, dt: f32) {
        let messages = self.mailbox.drain();
        let SceneNode {
            components,
            transform,
            visible,
            ..
        } = self;

        for message in &messages {
            apply_message(message, transform, visible);
            let mut ctx = NodeContext {
                node: id,
                transform: &mut *transform,
                visible: &mut *visible,
            };
            for slot in components.iter_mut() {
                slot.deliver(message, &mut ctx);
            }
        }

        let mut ctx = NodeContext {
            node: id,
            transform,
            visible,
        };
        for slot in components.iter_mut() {
            slot.update(dt, &mut ctx);
        }
    }
}

/// Arena of scene nodes rooted at a single always-live root
pub struct SceneGraph {
    allocator: NodeAllocator,
    nodes: Vec<Option<SceneNode>>,
    root: NodeId,
    backend: Arc<dyn RenderBackend>,
    picks: HashMap<ResourceId, NodeId>,
    frame: u64,
}

impl SceneGraph {
    pub fn new(backend: Arc<dyn RenderBackend>) -> Self {
        let mut graph = Self {
            allocator: NodeAllocator::new(),
            nodes: Vec::new(),
            root: NodeId::null(),
            backend,
            picks: HashMap::new(),
            frame: 0,
        };
        let root = graph.create_node("root");
        if let Some(node) = graph.slot_mut(root) {
            node.lifecycle = Lifecycle::Realized;
        }
        graph.root = root;
        graph
    }

    /// Graph over an in-memory backend, returned alongside for inspection
    pub fn headless() -> (Self, Arc<HeadlessBackend>) {
        let backend = Arc::new(HeadlessBackend::new());
        (Self::new(backend.clone()), backend)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn backend(&self) -> &Arc<dyn RenderBackend> {
        &self.backend
    }

    /// Ticks run so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Number of live node ids, root included
    pub fn node_count(&self) -> usize {
        self.allocator.alive_count()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.allocator.is_alive(id)
    }

    fn slot(&self, id: NodeId) -> Option<&SceneNode> {
        if !self.allocator.is_alive(id) {
            return None;
        }
        self.nodes.get(id.index() as usize).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        if !self.allocator.is_alive(id) {
            return None;
        }
        self.nodes.get_mut(id.index() as usize).and_then(Option::as_mut)
    }

    fn node(&self, id: NodeId) -> Result<&SceneNode> {
        if id.is_null() {
            return Err(GraphError::NullNode);
        }
        self.slot(id).ok_or(GraphError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode> {
        if id.is_null() {
            return Err(GraphError::NullNode);
        }
        self.slot_mut(id).ok_or(GraphError::UnknownNode(id))
    }

    /// New detached node with a default transform
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeId {
        let id = self.allocator.allocate();
        let index = id.index() as usize;
        if index >= self.nodes.len() {
            self.nodes.resize_with(index + 1, || None);
        }
        self.nodes[index] = Some(SceneNode::new(name.into()));
        id
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.slot(id).map(|n| n.name.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map_or(&[], |n| n.children.as_slice())
    }

    pub fn lifecycle(&self, id: NodeId) -> Option<Lifecycle> {
        self.slot(id).map(|n| n.lifecycle)
    }

    pub fn is_realized(&self, id: NodeId) -> bool {
        self.lifecycle(id) == Some(Lifecycle::Realized)
    }

    pub fn components(&self, id: NodeId) -> &[ComponentSlot] {
        self.slot(id).map_or(&[], |n| n.components.as_slice())
    }

    /// Local transform
    pub fn transform(&self, id: NodeId) -> Option<Transform> {
        self.slot(id).map(|n| n.transform)
    }

    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> Result<()> {
        let node = self.node_mut(id)?;
        node.transform = transform;
        node.has_transform = true;
        Ok(())
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.slot(id).is_some_and(|n| n.visible)
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<()> {
        self.node_mut(id)?.visible = visible;
        Ok(())
    }

    /// Add a component. On a realized node the component is realized at once.
    pub fn add_component(&mut self, id: NodeId, component: Component) -> Result<()> {
        let backend = Arc::clone(&self.backend);
        let node = self.node_mut(id)?;

        if let Component::Transform(transform) = component {
            if node.has_transform {
                return Err(GraphError::DuplicateTransform(id));
            }
            node.transform = transform;
            node.has_transform = true;
            return Ok(());
        }

        let mut slot = ComponentSlot::new(component);
        if node.lifecycle == Lifecycle::Realized {
            let world = node.world;
            let visible = node.visible;
            if let Some(resource) = slot.realize(id, &node.name, backend.as_ref()) {
                slot.attach_to_parent_space(backend.as_ref(), &world, visible);
                self.picks.insert(resource, id);
            }
        }
        if let Some(node) = self.slot_mut(id) {
            node.components.push(slot);
        }
        Ok(())
    }

    /// True if `ancestor` is `id` or one of its parents
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Connected to the root through parent links
    pub fn is_live(&self, id: NodeId) -> bool {
        self.contains(id) && self.is_ancestor(self.root, id)
    }

    /// Insert `child` under `parent`.
    ///
    /// Attaching an already attached node is an error; detach it first.
    pub fn attach(&mut self, child: NodeId, parent: NodeId) -> Result<()> {
        self.node(parent)?;
        let child_node = self.node(child)?;
        if child == self.root {
            return Err(GraphError::RootNode("attached"));
        }
        if let Some(current) = child_node.parent {
            return Err(GraphError::AlreadyAttached { child, parent: current });
        }
        if self.is_ancestor(child, parent) {
            return Err(GraphError::Cycle { child, parent });
        }

        let parent_live = self.is_realized(parent);
        if let Some(p) = self.slot_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.slot_mut(child) {
            c.parent = Some(parent);
            c.lifecycle = Lifecycle::Attached;
        }
        log::trace!("attached {} under {}", child, parent);

        if parent_live {
            self.realize(child)?;
        }
        Ok(())
    }

    /// Remove `child` from its parent and release the subtree's resources
    pub fn detach(&mut self, child: NodeId) -> Result<()> {
        let parent = self.node(child)?.parent;
        if child == self.root {
            return Err(GraphError::RootNode("detached"));
        }
        let parent = parent.ok_or(GraphError::NotAttached(child))?;

        if let Some(p) = self.slot_mut(parent) {
            p.children.retain(|&c| c != child);
        }
        self.release_subtree(child);
        if let Some(c) = self.slot_mut(child) {
            c.parent = None;
            c.lifecycle = Lifecycle::Detached;
        }
        log::trace!("detached {} from {}", child, parent);
        Ok(())
    }

    /// Detach if needed, then free the node and all of its descendants
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        if self.node(id)?.parent.is_some() {
            self.detach(id)?;
        } else if id == self.root {
            return Err(GraphError::RootNode("removed"));
        }
        for (n, _) in self.descendants(id) {
            if let Some(slot) = self.nodes.get_mut(n.index() as usize) {
                *slot = None;
            }
            self.allocator.free(n);
        }
        Ok(())
    }

    /// Realize a live node and everything below it.
    ///
    /// Nodes already realized are left alone, so calling this twice is harmless.
    pub fn realize(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        if !self.is_live(id) {
            return Err(GraphError::NotLive(id));
        }

        let backend = Arc::clone(&self.backend);
        let (parent_world, parent_visible) = match self.parent(id) {
            Some(p) => (self.world_matrix(p).unwrap_or(Mat4::IDENTITY), self.is_effectively_visible(p)),
            None => (Mat4::IDENTITY, true),
        };

        let mut realized = 0usize;
        let mut stack = vec![(id, parent_world, parent_visible)];
        while let Some((n, parent_world, parent_visible)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(n.index() as usize).and_then(Option::as_mut) else {
                continue;
            };
            let world = parent_world * node.transform.to_matrix();
            let visible = parent_visible && node.visible;

            if node.lifecycle != Lifecycle::Realized {
                node.world = world;
                for slot in node.components.iter_mut() {
                    if let Some(resource) = slot.realize(n, &node.name, backend.as_ref()) {
                        slot.attach_to_parent_space(backend.as_ref(), &world, visible);
                        self.picks.insert(resource, n);
                    }
                }
                node.lifecycle = Lifecycle::Realized;
                realized += 1;
            }
            for &child in node.children.iter().rev() {
                stack.push((child, world, visible));
            }
        }
        log::debug!("realized {} node(s) under {}", realized, id);
        Ok(())
    }

    fn release_subtree(&mut self, id: NodeId) {
        let backend = Arc::clone(&self.backend);
        for (n, _) in self.descendants(id) {
            let Some(node) = self.nodes.get_mut(n.index() as usize).and_then(Option::as_mut) else {
                continue;
            };
            for slot in node.components.iter_mut() {
                if let Some(resource) = slot.release(n, backend.as_ref()) {
                    self.picks.remove(&resource);
                }
            }
            if node.lifecycle == Lifecycle::Realized {
                node.lifecycle = Lifecycle::Attached;
            }
        }
    }

    /// Queue a message for the node's next tick
    pub fn post(&mut self, id: NodeId, message: Message) -> Result<()> {
        self.node_mut(id)?.mailbox.post(message);
        Ok(())
    }

    pub fn pending_messages(&self, id: NodeId) -> usize {
        self.slot(id).map_or(0, |n| n.mailbox.len())
    }

    /// Run one update over the live tree.
    ///
    /// Parents go before children. For each node the mailbox is drained in
    /// arrival order before its behaviors run, then the world transform is
    /// pushed to every backend resource it owns.
    pub fn tick(&mut self, dt: f32) {
        let backend = Arc::clone(&self.backend);
        let mut stack = vec![(self.root, Mat4::IDENTITY, true)];

        while let Some((id, parent_world, parent_visible)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(id.index() as usize).and_then(Option::as_mut) else {
                continue;
            };
            if node.lifecycle != Lifecycle::Realized {
                continue;
            }
            node.run_tick(id, dt);

            let world = parent_world * node.transform.to_matrix();
            let visible = parent_visible && node.visible;
            node.world = world;
            for slot in &node.components {
                slot.attach_to_parent_space(backend.as_ref(), &world, visible);
            }
            for &child in node.children.iter().rev() {
                stack.push((child, world, visible));
            }
        }
        self.frame += 1;
    }

    /// World matrix computed from the current local transforms
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.slot(id)?;
        let mut world = node.transform.to_matrix();
        while let Some(parent) = node.parent.and_then(|p| self.slot(p)) {
            world = parent.transform.to_matrix() * world;
            node = parent;
        }
        Some(world)
    }

    fn is_effectively_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(n) = current {
            match self.slot(n) {
                Some(node) if !node.visible => return false,
                Some(node) => current = node.parent,
                None => return true,
            }
        }
        true
    }

    /// Node owning a backend resource, for hit testing
    pub fn pick(&self, resource: ResourceId) -> Option<NodeId> {
        self.picks.get(&resource).copied()
    }

    /// Preorder walk of a subtree with depth relative to `id`
    pub fn descendants(&self, id: NodeId) -> Vec<(NodeId, usize)> {
        let mut out = Vec::new();
        if self.slot(id).is_none() {
            return out;
        }
        let mut stack = vec![(id, 0usize)];
        while let Some((n, depth)) = stack.pop() {
            out.push((n, depth));
            for &child in self.children(n).iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }

    /// First node named `name` in preorder under `id`
    pub fn find_in(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(id)
            .into_iter()
            .map(|(n, _)| n)
            .find(|&n| self.name(n) == Some(name))
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.find_in(self.root, name)
    }

    /// World-space bounds of every mesh in a subtree
    pub fn world_bounds(&self, id: NodeId) -> AABB {
        self.descendants(id)
            .into_iter()
            .filter_map(|(n, _)| Some((n, self.world_matrix(n)?)))
            .fold(AABB::EMPTY, |acc, (n, world)| {
                self.components(n)
                    .iter()
                    .filter_map(|slot| match slot.component() {
                        Component::Mesh(mesh) => Some(mesh.mesh.bounds.transformed(&world)),
                        _ => None,
                    })
                    .fold(acc, |acc, b| acc.union(&b))
            })
    }

    /// Indented outline of a subtree, one node per line
    pub fn render_tree(&self, id: NodeId) -> String {
        let mut out = String::new();
        for (n, depth) in self.descendants(id) {
            let Some(node) = self.slot(n) else { continue };
            let kinds: Vec<&str> = node.components.iter().map(|s| s.component().kind_name()).collect();
            let p = node.transform.position;
            let _ = write!(out, "{:indent$}{}", "", node.name, indent = depth * 2);
            if !kinds.is_empty() {
                let _ = write!(out, " [{}]", kinds.join(", "));
            }
            let _ = write!(out, " @ ({:.3}, {:.3}, {:.3})", p.x, p.y, p.z);
            if !node.visible {
                let _ = write!(out, " hidden");
            }
            let _ = writeln!(out, " {:?}", node.lifecycle);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ResourceKind;
    use crate::visual::{CameraParams, LightParams};
    use scenic_math::Vec3;

    #[test]
    fn test_lifecycle() {
        let (mut graph, backend) = SceneGraph::headless();
        let node = graph.create_node("cam");
        graph.add_component(node, Component::Camera(CameraParams::default())).unwrap();
        assert_eq!(graph.lifecycle(node), Some(Lifecycle::Constructed));
        assert_eq!(backend.live_count(), 0);

        graph.attach(node, graph.root()).unwrap();
        assert_eq!(graph.lifecycle(node), Some(Lifecycle::Realized));
        assert_eq!(backend.count(ResourceKind::Camera), 1);

        graph.detach(node).unwrap();
        assert_eq!(graph.lifecycle(node), Some(Lifecycle::Detached));
        assert_eq!(backend.live_count(), 0);
        assert!(graph.children(graph.root()).is_empty());
    }

    #[test]
    fn test_realize_is_idempotent() {
        let (mut graph, backend) = SceneGraph::headless();
        let node = graph.create_node("light");
        graph.add_component(node, Component::Light(LightParams::default())).unwrap();
        graph.attach(node, graph.root()).unwrap();
        graph.realize(node).unwrap();
        graph.realize(graph.root()).unwrap();
        assert_eq!(backend.live_count(), 1);
    }

    #[test]
    fn test_double_attach_is_error() {
        let (mut graph, _) = SceneGraph::headless();
        let a = graph.create_node("a");
        let b = graph.create_node("b");
        graph.attach(a, graph.root()).unwrap();
        assert_eq!(
            graph.attach(a, b),
            Err(GraphError::AlreadyAttached { child: a, parent: graph.root() })
        );
    }

    #[test]
    fn test_cycle_rejected() {
        let (mut graph, _) = SceneGraph::headless();
        let a = graph.create_node("a");
        let b = graph.create_node("b");
        graph.attach(b, a).unwrap();
        assert_eq!(graph.attach(a, b), Err(GraphError::Cycle { child: a, parent: b }));
        assert_eq!(graph.attach(a, a), Err(GraphError::Cycle { child: a, parent: a }));
    }

    #[test]
    fn test_duplicate_transform() {
        let (mut graph, _) = SceneGraph::headless();
        let a = graph.create_node("a");
        graph.add_component(a, Component::Transform(Transform::IDENTITY)).unwrap();
        assert_eq!(
            graph.add_component(a, Component::Transform(Transform::IDENTITY)),
            Err(GraphError::DuplicateTransform(a))
        );
    }

    #[test]
    fn test_null_and_stale_ids() {
        let (mut graph, _) = SceneGraph::headless();
        assert_eq!(graph.attach(NodeId::null(), graph.root()), Err(GraphError::NullNode));
        let a = graph.create_node("a");
        graph.remove(a).unwrap();
        assert_eq!(graph.post(a, Message::SetVisible(false)), Err(GraphError::UnknownNode(a)));
    }

    #[test]
    fn test_realize_detached_subtree_is_error() {
        let (mut graph, _) = SceneGraph::headless();
        let a = graph.create_node("a");
        assert_eq!(graph.realize(a), Err(GraphError::NotLive(a)));
    }

    #[test]
    fn test_world_transform_propagates() {
        let (mut graph, backend) = SceneGraph::headless();
        let parent = graph.create_node("parent");
        let child = graph.create_node("child");
        graph
            .set_transform(parent, Transform::from_position(Vec3::new(10.0, 0.0, 0.0)))
            .unwrap();
        graph
            .set_transform(child, Transform::from_position(Vec3::new(5.0, 0.0, 0.0)))
            .unwrap();
        graph.add_component(child, Component::Light(LightParams::default())).unwrap();
        graph.attach(child, parent).unwrap();
        graph.attach(parent, graph.root()).unwrap();

        graph.tick(0.016);
        let light = graph.components(child)[0].resource().unwrap();
        let world = backend.get(light).unwrap().world;
        assert_eq!(world.translation(), Vec3::new(15.0, 0.0, 0.0));
        assert_eq!(graph.pick(light), Some(child));
    }

    #[test]
    fn test_remove_frees_subtree() {
        let (mut graph, _) = SceneGraph::headless();
        let a = graph.create_node("a");
        let b = graph.create_node("b");
        graph.attach(b, a).unwrap();
        graph.attach(a, graph.root()).unwrap();
        assert_eq!(graph.node_count(), 3);
        graph.remove(a).unwrap();
        assert_eq!(graph.node_count(), 1);
        assert!(!graph.contains(b));
    }
}
