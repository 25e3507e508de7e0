//! Loading a document into a live scene graph
//!
//! The whole subtree is built detached, then attached in one step. Only
//! after that does the completion callback run, with every node realized if
//! the parent was live. A parse failure creates no nodes at all.

use crate::decoder::{DecodedNode, DecodedScene, NodeContent, SceneDecoder};
use crate::error::{LoadError, Result};
use crate::options::DecodeOptions;
use crate::resolver::GeometryResolver;
use scenic_format::{parse_document, Document, ValidationReport};
use scenic_graph::{Component, GraphError, NodeId, SceneGraph};
use scenic_math::AABB;
use std::path::Path;

/// Handle to a scene instantiated into a graph
#[derive(Debug, Clone)]
pub struct LoadedScene {
    /// Group node holding every decoded node
    pub root: NodeId,
    /// Node of the document's default camera, if it exists
    pub camera: Option<NodeId>,
    pub background: Option<[f32; 3]>,
    pub background_alpha: f32,
    pub fog: Option<[f32; 3]>,
    /// Dangling references found while decoding
    pub issues: ValidationReport,
}

impl LoadedScene {
    /// World-space bounds of every mesh in the scene
    pub fn bounds(&self, graph: &SceneGraph) -> AABB {
        graph.world_bounds(self.root)
    }
}

#[derive(Default)]
pub struct SceneLoader {
    decoder: SceneDecoder,
}

impl SceneLoader {
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            decoder: SceneDecoder::new(options),
        }
    }

    pub fn with_resolver(mut self, resolver: impl GeometryResolver + 'static) -> Self {
        self.decoder = self.decoder.with_resolver(resolver);
        self
    }

    pub fn decoder(&self) -> &SceneDecoder {
        &self.decoder
    }

    /// Read, decode and attach the document at `path` under `parent`.
    ///
    /// `on_loaded` runs once, after the scene is attached. It does not run
    /// when the load fails.
    pub fn load<F>(&self, graph: &mut SceneGraph, parent: NodeId, path: impl AsRef<Path>, on_loaded: F) -> Result<LoadedScene>
    where
        F: FnOnce(&mut SceneGraph, &LoadedScene),
    {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let doc = parse_document(&bytes)?;
        log::info!("Loading {} ({} objects)", path.display(), doc.object_count());

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scene".to_string());
        let base = self.decoder.options().base_for(path);
        let decoded = self.decoder.decode(&doc, &base);
        attach(graph, parent, &name, &decoded, on_loaded)
    }

    /// Decode an already parsed document and attach it under `parent`
    pub fn load_document<F>(
        &self,
        graph: &mut SceneGraph,
        parent: NodeId,
        name: &str,
        doc: &Document,
        on_loaded: F,
    ) -> Result<LoadedScene>
    where
        F: FnOnce(&mut SceneGraph, &LoadedScene),
    {
        let base = self.decoder.options().base_path.clone().unwrap_or_default();
        let decoded = self.decoder.decode(doc, &base);
        attach(graph, parent, name, &decoded, on_loaded)
    }
}

fn attach<F>(graph: &mut SceneGraph, parent: NodeId, name: &str, decoded: &DecodedScene, on_loaded: F) -> Result<LoadedScene>
where
    F: FnOnce(&mut SceneGraph, &LoadedScene),
{
    let scene = instantiate(graph, name, decoded)?;
    if let Err(e) = graph.attach(scene.root, parent) {
        let _ = graph.remove(scene.root);
        return Err(e.into());
    }
    log::info!(
        "Scene '{}' attached: {} nodes",
        name,
        graph.descendants(scene.root).len()
    );
    on_loaded(graph, &scene);
    Ok(scene)
}

/// Build the decoded nodes as a detached subtree of the graph
pub fn instantiate(graph: &mut SceneGraph, name: &str, decoded: &DecodedScene) -> Result<LoadedScene> {
    let root = graph.create_node(name);
    if let Err(e) = spawn_children(graph, root, &decoded.nodes) {
        let _ = graph.remove(root);
        return Err(e.into());
    }

    let camera = decoded
        .default_camera
        .as_deref()
        .and_then(|camera| graph.find_in(root, camera));

    Ok(LoadedScene {
        root,
        camera,
        background: decoded.background,
        background_alpha: decoded.background_alpha,
        fog: decoded.fog,
        issues: decoded.issues.clone(),
    })
}

fn spawn(graph: &mut SceneGraph, node: &DecodedNode) -> std::result::Result<NodeId, GraphError> {
    let id = graph.create_node(node.name.as_str());
    graph.add_component(id, Component::Transform(node.transform))?;
    graph.set_visible(id, node.visible)?;

    let component = match &node.content {
        NodeContent::Group => None,
        NodeContent::Mesh(mesh) => Some(Component::Mesh(mesh.clone())),
        NodeContent::Camera(camera) => Some(Component::Camera(camera.clone())),
        NodeContent::Light(light) => Some(Component::Light(light.clone())),
    };
    if let Some(component) = component {
        graph.add_component(id, component)?;
    }

    spawn_children(graph, id, &node.children)?;
    Ok(id)
}

fn spawn_children(graph: &mut SceneGraph, parent: NodeId, nodes: &[DecodedNode]) -> std::result::Result<(), GraphError> {
    for node in nodes {
        let child = spawn(graph, node)?;
        graph.attach(child, parent)?;
    }
    Ok(())
}
