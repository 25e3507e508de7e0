//! Document to node tree
//!
//! Every reference is resolved here. Anything that does not resolve leaves
//! a hole (a node without a mesh, an empty material slot) and is reported in
//! [`DecodedScene::issues`]; decoding itself never fails.

use crate::mesh::build_mesh;
use crate::options::DecodeOptions;
use crate::resolver::{FileGeometryResolver, GeometryResolver};
use scenic_format::convert::rotation_quat;
use scenic_format::{
    CameraRecord, Document, GeometryRef, LightKind, LightRecord, MaterialKind, MaterialRecord, ObjectRecord,
    ProjectionKind, ValidationReport,
};
use scenic_graph::{
    CameraParams, LightParams, LightType, Material, MaterialSlot, MeshData, MeshInstance, Projection, Shading,
    TextureRef,
};
use scenic_math::{Transform, Vec3};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// What a decoded node carries besides its transform
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    Group,
    Mesh(MeshInstance),
    Camera(CameraParams),
    Light(LightParams),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedNode {
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    pub content: NodeContent,
    pub children: Vec<DecodedNode>,
}

impl DecodedNode {
    fn new(name: &str, transform: Transform, content: NodeContent) -> Self {
        Self {
            name: name.to_string(),
            transform,
            visible: true,
            content,
            children: Vec::new(),
        }
    }

    /// This node and all descendants, depth first
    pub fn walk(&self) -> Vec<&DecodedNode> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }
}

/// A fully resolved document, not yet part of any graph
#[derive(Debug, Clone, Default)]
pub struct DecodedScene {
    /// Objects first, then cameras, then lights
    pub nodes: Vec<DecodedNode>,
    /// Global material table, in document order
    pub materials: Vec<Arc<Material>>,
    pub default_camera: Option<String>,
    pub background: Option<[f32; 3]>,
    pub background_alpha: f32,
    pub fog: Option<[f32; 3]>,
    pub issues: ValidationReport,
}

impl DecodedScene {
    pub fn mesh_count(&self) -> usize {
        self.nodes
            .iter()
            .flat_map(DecodedNode::walk)
            .filter(|n| matches!(n.content, NodeContent::Mesh(_)))
            .count()
    }

    pub fn find(&self, name: &str) -> Option<&DecodedNode> {
        self.nodes.iter().flat_map(DecodedNode::walk).find(|n| n.name == name)
    }
}

pub struct SceneDecoder {
    options: DecodeOptions,
    resolver: Box<dyn GeometryResolver>,
}

impl SceneDecoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            resolver: Box::new(FileGeometryResolver),
        }
    }

    pub fn with_resolver(mut self, resolver: impl GeometryResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decode with relative URLs resolved against `base`
    pub fn decode(&self, doc: &Document, base: &Path) -> DecodedScene {
        let issues = doc.validate();
        issues.log();

        let materials: Vec<Arc<Material>> = doc
            .materials
            .iter()
            .map(|(name, record)| Arc::new(self.material(doc, name, record, base)))
            .collect();

        let mut state = DecodeState {
            decoder: self,
            doc,
            base,
            materials: &materials,
            meshes: HashMap::new(),
        };

        let mut nodes: Vec<DecodedNode> = doc
            .objects
            .iter()
            .map(|(name, object)| state.object(name, object))
            .collect();
        nodes.extend(doc.cameras.iter().map(|(name, camera)| camera_node(name, camera)));
        nodes.extend(doc.lights.iter().map(|(name, light)| light_node(name, light)));

        if doc.cameras.is_empty() {
            log::debug!("Document has no cameras; the host's default camera applies");
        }
        log::info!(
            "Decoded {} nodes, {} materials, {} meshes ({} issues)",
            nodes.iter().map(|n| n.walk().len()).sum::<usize>(),
            materials.len(),
            state.meshes.values().flatten().count(),
            issues.len()
        );

        DecodedScene {
            nodes,
            materials,
            default_camera: doc.defaults.camera.clone(),
            background: doc.defaults.bgcolor.as_ref().map(|c| c.to_rgb()),
            background_alpha: doc.defaults.bgalpha,
            fog: doc.defaults.fog.as_ref().map(|c| c.to_rgb()),
            issues,
        }
    }

    fn material(&self, doc: &Document, name: &str, record: &MaterialRecord, base: &Path) -> Material {
        let params = &record.parameters;
        let map = params.map.as_ref().and_then(|key| {
            let texture = doc.textures.get(key)?;
            let path = base.join(&texture.url);
            let dimensions = if self.options.probe_textures {
                match image::image_dimensions(&path) {
                    Ok(dimensions) => Some(dimensions),
                    Err(e) => {
                        log::warn!("Cannot probe texture {}: {}", path.display(), e);
                        None
                    }
                }
            } else {
                None
            };
            Some(TextureRef {
                name: key.clone(),
                path,
                dimensions,
            })
        });

        Material {
            name: name.to_string(),
            shading: match record.kind {
                MaterialKind::Lambert => Shading::Lambert,
                MaterialKind::Phong => Shading::Phong,
                MaterialKind::Basic | MaterialKind::Unknown => Shading::Basic,
            },
            color: params.color.as_ref().map_or([1.0; 3], |c| c.to_rgb()),
            opacity: params.opacity,
            map,
        }
    }
}

impl Default for SceneDecoder {
    fn default() -> Self {
        Self::new(DecodeOptions::default())
    }
}

struct DecodeState<'a> {
    decoder: &'a SceneDecoder,
    doc: &'a Document,
    base: &'a Path,
    materials: &'a [Arc<Material>],
    /// Built meshes by embed id or URL; `None` when the source was unusable
    meshes: HashMap<String, Option<Arc<MeshData>>>,
}

impl DecodeState<'_> {
    fn object(&mut self, name: &str, object: &ObjectRecord) -> DecodedNode {
        let transform = Transform::new(
            Vec3::from_array(object.position),
            rotation_quat(object.rotation),
            Vec3::from_array(object.scale),
        );

        let content = match object.geometry.as_deref().and_then(|g| self.geometry(g)) {
            Some(mesh) => NodeContent::Mesh(MeshInstance::new(mesh, self.slots(object))),
            None => NodeContent::Group,
        };

        let mut node = DecodedNode::new(name, transform, content);
        node.visible = object.visible;
        node.children = object
            .children
            .iter()
            .map(|(child_name, child)| self.object(child_name, child))
            .collect();
        node
    }

    fn slots(&self, object: &ObjectRecord) -> Vec<MaterialSlot> {
        object
            .materials
            .iter()
            .map(|name| {
                let global_index = self.doc.material_index(name);
                MaterialSlot {
                    name: name.clone(),
                    global_index,
                    material: global_index.map(|i| Arc::clone(&self.materials[i])),
                }
            })
            .collect()
    }

    fn geometry(&mut self, name: &str) -> Option<Arc<MeshData>> {
        let record = self.doc.geometries.get(name)?;
        match record.reference() {
            GeometryRef::Embedded(id) => {
                if let Some(cached) = self.meshes.get(id) {
                    return cached.clone();
                }
                let mesh = self.doc.embeds.get(id).map(|embed| Arc::new(build_mesh(id, embed)));
                self.meshes.insert(id.to_string(), mesh.clone());
                mesh
            }
            GeometryRef::External(url) => {
                if let Some(cached) = self.meshes.get(url) {
                    return cached.clone();
                }
                let mesh = match self.decoder.resolver.resolve(&record.kind, url, self.base) {
                    Ok(embed) => Some(Arc::new(build_mesh(url, &embed))),
                    Err(e) => {
                        log::warn!("Geometry '{}': {}", name, e);
                        None
                    }
                };
                self.meshes.insert(url.to_string(), mesh.clone());
                mesh
            }
            GeometryRef::Invalid => None,
        }
    }
}

fn camera_node(name: &str, record: &CameraRecord) -> DecodedNode {
    let params = CameraParams {
        projection: match record.kind {
            ProjectionKind::Perspective => Projection::Perspective,
            ProjectionKind::Ortho => Projection::Orthographic,
        },
        fov: record.fov,
        aspect: record.aspect,
        near: record.near,
        far: record.far,
        target: Vec3::from_array(record.target),
    };
    let transform = Transform::from_position(Vec3::from_array(record.position));
    DecodedNode::new(name, transform, NodeContent::Camera(params))
}

fn light_node(name: &str, record: &LightRecord) -> DecodedNode {
    let params = LightParams {
        kind: match record.kind {
            LightKind::Directional => LightType::Directional,
            LightKind::Point => LightType::Point,
            LightKind::Spot => LightType::Spot,
            LightKind::Area => LightType::Area,
        },
        color: record.color.to_rgb(),
        intensity: record.intensity,
        direction: record.direction.map(Vec3::from_array),
        range: record.radius,
        cone_angle: record.cut_off_angle,
        beam_width: record.beam_width,
    };
    let position = record.position.map_or(Vec3::ZERO, Vec3::from_array);
    DecodedNode::new(name, Transform::from_position(position), NodeContent::Light(params))
}
