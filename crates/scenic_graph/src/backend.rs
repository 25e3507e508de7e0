//! Render backend boundary
//!
//! The graph never draws. On realization it asks a [`RenderBackend`] for a
//! resource per renderable component, pushes world transforms into it every
//! tick, and releases it on detach. [`HeadlessBackend`] records all of that in
//! memory for tools and tests.

use crate::visual::{CameraParams, LightParams, MeshInstance};
use parking_lot::Mutex;
use scenic_math::Mat4;
use std::collections::HashMap;
use std::fmt;

/// Handle of a backend-side resource
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Mesh,
    Camera,
    Light,
}

/// Renderer seen from the scene graph
pub trait RenderBackend: Send + Sync {
    fn create_mesh(&self, name: &str, mesh: &MeshInstance) -> ResourceId;
    fn create_camera(&self, name: &str, camera: &CameraParams) -> ResourceId;
    fn create_light(&self, name: &str, light: &LightParams) -> ResourceId;
    fn set_transform(&self, resource: ResourceId, world: &Mat4);
    fn set_visible(&self, resource: ResourceId, visible: bool);
    fn release(&self, resource: ResourceId);
}

/// Snapshot of one resource held by [`HeadlessBackend`]
#[derive(Clone, Debug, PartialEq)]
pub struct HeadlessResource {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub name: String,
    pub world: Mat4,
    pub visible: bool,
    /// Number of transform pushes received
    pub updates: u32,
    /// Triangles, for meshes
    pub triangles: usize,
}

#[derive(Default)]
struct HeadlessState {
    next_id: u64,
    live: HashMap<ResourceId, HeadlessResource>,
    released: Vec<ResourceId>,
}

/// Backend that keeps resources in memory instead of drawing them
#[derive(Default)]
pub struct HeadlessBackend {
    state: Mutex<HeadlessState>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn create(&self, kind: ResourceKind, name: &str, triangles: usize) -> ResourceId {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = ResourceId(state.next_id);
        state.live.insert(
            id,
            HeadlessResource {
                id,
                kind,
                name: name.to_string(),
                world: Mat4::IDENTITY,
                visible: true,
                updates: 0,
                triangles,
            },
        );
        log::trace!("headless: created {:?} {} for '{}'", kind, id, name);
        id
    }

    pub fn get(&self, id: ResourceId) -> Option<HeadlessResource> {
        self.state.lock().live.get(&id).cloned()
    }

    /// Live resources ordered by creation
    pub fn resources(&self) -> Vec<HeadlessResource> {
        let mut all: Vec<_> = self.state.lock().live.values().cloned().collect();
        all.sort_by_key(|r| r.id);
        all
    }

    pub fn live_count(&self) -> usize {
        self.state.lock().live.len()
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.state.lock().live.values().filter(|r| r.kind == kind).count()
    }

    /// Ids released so far, in release order
    pub fn released(&self) -> Vec<ResourceId> {
        self.state.lock().released.clone()
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_mesh(&self, name: &str, mesh: &MeshInstance) -> ResourceId {
        self.create(ResourceKind::Mesh, name, mesh.mesh.triangle_count())
    }

    fn create_camera(&self, name: &str, _camera: &CameraParams) -> ResourceId {
        self.create(ResourceKind::Camera, name, 0)
    }

    fn create_light(&self, name: &str, _light: &LightParams) -> ResourceId {
        self.create(ResourceKind::Light, name, 0)
    }

    fn set_transform(&self, resource: ResourceId, world: &Mat4) {
        if let Some(r) = self.state.lock().live.get_mut(&resource) {
            r.world = *world;
            r.updates += 1;
        }
    }

    fn set_visible(&self, resource: ResourceId, visible: bool) {
        if let Some(r) = self.state.lock().live.get_mut(&resource) {
            r.visible = visible;
        }
    }

    fn release(&self, resource: ResourceId) {
        let mut state = self.state.lock();
        if state.live.remove(&resource).is_some() {
            state.released.push(resource);
        } else {
            log::warn!("headless: release of unknown resource {}", resource);
        }
    }
}
