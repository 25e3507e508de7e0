//! Components and the per-node mailbox
//!
//! A node owns a flat list of components. Each one answers the same small
//! capability surface: realize, update, attach to parent space, release.
//! Dispatch is by variant; user logic plugs in through [`Behavior`].

use crate::backend::{RenderBackend, ResourceId};
use crate::node::NodeId;
use crate::visual::{CameraParams, LightParams, MeshInstance};
use scenic_math::{Mat4, Quat, Transform, Vec3};
use std::collections::VecDeque;
use std::fmt;

/// Message delivered to a node on its next tick
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    SetVisible(bool),
    SetPosition(Vec3),
    Translate(Vec3),
    SetRotation(Quat),
    /// Applied after the current rotation
    Rotate(Quat),
    SetScale(Vec3),
    /// Ignored by the graph, seen only by behaviors
    Custom { topic: String, payload: String },
}

/// FIFO of pending messages for one node
#[derive(Debug, Default)]
pub struct Mailbox {
    queue: VecDeque<Message>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&mut self, message: Message) {
        self.queue.push_back(message);
    }

    /// Take every pending message in arrival order
    pub fn drain(&mut self) -> Vec<Message> {
        self.queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Node state a behavior may touch during its turn
pub struct NodeContext<'a> {
    pub node: NodeId,
    pub transform: &'a mut Transform,
    pub visible: &'a mut bool,
}

/// User logic attached to a node
pub trait Behavior: Send {
    fn name(&self) -> &str {
        "behavior"
    }

    fn on_realize(&mut self, _node: NodeId) {}

    /// Called for each drained message, before [`Behavior::update`]
    fn on_message(&mut self, _message: &Message, _ctx: &mut NodeContext<'_>) {}

    fn update(&mut self, _dt: f32, _ctx: &mut NodeContext<'_>) {}

    fn on_release(&mut self, _node: NodeId) {}
}

/// Everything that can be added to a node
pub enum Component {
    /// At most one per node
    Transform(Transform),
    Mesh(MeshInstance),
    Camera(CameraParams),
    Light(LightParams),
    Behavior(Box<dyn Behavior>),
}

impl Component {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Component::Transform(_) => "transform",
            Component::Mesh(_) => "mesh",
            Component::Camera(_) => "camera",
            Component::Light(_) => "light",
            Component::Behavior(_) => "behavior",
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Transform(t) => f.debug_tuple("Transform").field(t).finish(),
            Component::Mesh(m) => f
                .debug_struct("Mesh")
                .field("vertices", &m.mesh.vertex_count())
                .field("triangles", &m.mesh.triangle_count())
                .field("slots", &m.slots.len())
                .finish(),
            Component::Camera(c) => f.debug_tuple("Camera").field(c).finish(),
            Component::Light(l) => f.debug_tuple("Light").field(l).finish(),
            Component::Behavior(b) => f.debug_tuple("Behavior").field(&b.name()).finish(),
        }
    }
}

/// A component installed on a node, with its backend resource once realized
#[derive(Debug)]
pub struct ComponentSlot {
    component: Component,
    resource: Option<ResourceId>,
    realized: bool,
}

impl ComponentSlot {
    pub(crate) fn new(component: Component) -> Self {
        Self {
            component,
            resource: None,
            realized: false,
        }
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn resource(&self) -> Option<ResourceId> {
        self.resource
    }

    /// Allocate the backend resource. Does nothing if already realized.
    pub(crate) fn realize(&mut self, node: NodeId, name: &str, backend: &dyn RenderBackend) -> Option<ResourceId> {
        if self.realized {
            return None;
        }
        self.realized = true;
        self.resource = match &mut self.component {
            Component::Mesh(mesh) => Some(backend.create_mesh(name, mesh)),
            Component::Camera(camera) => Some(backend.create_camera(name, camera)),
            Component::Light(light) => Some(backend.create_light(name, light)),
            Component::Behavior(behavior) => {
                behavior.on_realize(node);
                None
            }
            Component::Transform(_) => None,
        };
        self.resource
    }

    /// Push the node's world state into the backend resource
    pub(crate) fn attach_to_parent_space(&self, backend: &dyn RenderBackend, world: &Mat4, visible: bool) {
        if let Some(resource) = self.resource {
            backend.set_transform(resource, world);
            backend.set_visible(resource, visible);
        }
    }

    pub(crate) fn deliver(&mut self, message: &Message, ctx: &mut NodeContext<'_>) {
        if let Component::Behavior(behavior) = &mut self.component {
            behavior.on_message(message, ctx);
        }
    }

    pub(crate) fn update(&mut self, dt: f32, ctx: &mut NodeContext<'_>) {
        if let Component::Behavior(behavior) = &mut self.component {
            behavior.update(dt, ctx);
        }
    }

    /// Give the resource back; returns it so the caller can drop pick entries
    pub(crate) fn release(&mut self, node: NodeId, backend: &dyn RenderBackend) -> Option<ResourceId> {
        if !self.realized {
            return None;
        }
        self.realized = false;
        if let Component::Behavior(behavior) = &mut self.component {
            behavior.on_release(node);
        }
        let resource = self.resource.take()?;
        backend.release(resource);
        Some(resource)
    }
}

/// Apply a built-in message to node state
pub(crate) fn apply_message(message: &Message, transform: &mut Transform, visible: &mut bool) {
    match message {
        Message::SetVisible(v) => *visible = *v,
        Message::SetPosition(p) => transform.position = *p,
        Message::Translate(d) => transform.position += *d,
        Message::SetRotation(q) => transform.rotation = *q,
        Message::Rotate(q) => transform.rotation = (*q * transform.rotation).normalize(),
        Message::SetScale(s) => transform.scale = *s,
        Message::Custom { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_is_fifo() {
        let mut mailbox = Mailbox::new();
        mailbox.post(Message::SetPosition(Vec3::X));
        mailbox.post(Message::SetPosition(Vec3::Y));
        assert_eq!(mailbox.len(), 2);

        let mut t = Transform::IDENTITY;
        let mut visible = true;
        for m in mailbox.drain() {
            apply_message(&m, &mut t, &mut visible);
        }
        assert_eq!(t.position, Vec3::Y);
        assert!(mailbox.is_empty());
    }

    #[test]
    fn test_translate_accumulates() {
        let mut t = Transform::IDENTITY;
        let mut visible = true;
        apply_message(&Message::Translate(Vec3::X), &mut t, &mut visible);
        apply_message(&Message::Translate(Vec3::X), &mut t, &mut visible);
        apply_message(&Message::SetVisible(false), &mut t, &mut visible);
        assert_eq!(t.position, Vec3::new(2.0, 0.0, 0.0));
        assert!(!visible);
    }
}
