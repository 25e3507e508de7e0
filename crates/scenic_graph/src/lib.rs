//! # scenic_graph - Scene Graph Runtime
//!
//! Entity/component tree that decoded scenes are instantiated into.
//!
//! - [`SceneGraph`] owns the nodes and their parent/child links
//! - [`Component`] variants carry transforms, meshes, cameras, lights and
//!   user [`Behavior`]s
//! - a [`RenderBackend`] receives resources on realization and world
//!   transforms on every [`SceneGraph::tick`]
//!
//! ## Example
//!
//! ```ignore
//! use scenic_graph::prelude::*;
//!
//! let (mut graph, backend) = SceneGraph::headless();
//! let sun = graph.create_node("Sun");
//! graph.add_component(sun, Component::Light(LightParams::default()))?;
//! graph.attach(sun, graph.root())?; // realized here
//! graph.post(sun, Message::SetVisible(false))?;
//! graph.tick(1.0 / 60.0);
//! ```

pub mod backend;
pub mod component;
pub mod error;
pub mod graph;
pub mod node;
pub mod visual;

pub use backend::{HeadlessBackend, HeadlessResource, RenderBackend, ResourceId, ResourceKind};
pub use component::{Behavior, Component, ComponentSlot, Mailbox, Message, NodeContext};
pub use error::{GraphError, Result};
pub use graph::{Lifecycle, SceneGraph};
pub use node::{NodeAllocator, NodeId};
pub use visual::*;

pub mod prelude {
    pub use crate::backend::{HeadlessBackend, RenderBackend, ResourceId};
    pub use crate::component::{Behavior, Component, Message, NodeContext};
    pub use crate::graph::{Lifecycle, SceneGraph};
    pub use crate::node::NodeId;
    pub use crate::visual::{CameraParams, LightParams, Material, MeshData, MeshInstance};
}
