//! Renderable payloads carried by components
//!
//! These are plain data. A [`crate::RenderBackend`] turns them into whatever
//! its renderer needs when a node is realized.

use bytemuck::{Pod, Zeroable};
use scenic_math::{Vec3, AABB};
use std::path::PathBuf;
use std::sync::Arc;

/// Interleaved vertex as uploaded to GPU buffers
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Triangles sharing one material
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshPrimitive {
    /// Index into the scene's global material table
    pub material: Option<usize>,
    /// Triangle list into [`MeshData::vertices`]
    pub indices: Vec<u32>,
}

impl MeshPrimitive {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Geometry shared by every node that instances it
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub primitives: Vec<MeshPrimitive>,
    /// Local-space bounds of `vertices`
    pub bounds: AABB,
    /// Whether the source carried texture coordinates
    pub has_uvs: bool,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, primitives: Vec<MeshPrimitive>, has_uvs: bool) -> Self {
        let bounds = AABB::from_points(vertices.iter().map(|v| Vec3::from_array(v.position)));
        Self {
            vertices,
            primitives,
            bounds,
            has_uvs,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.primitives.iter().map(MeshPrimitive::triangle_count).sum()
    }

    /// Raw vertex buffer contents
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Shading {
    #[default]
    Basic,
    Lambert,
    Phong,
}

/// Image referenced by a material
#[derive(Clone, Debug, PartialEq)]
pub struct TextureRef {
    pub name: String,
    /// Resolved location of the image file
    pub path: PathBuf,
    /// Pixel size, if the image was probed
    pub dimensions: Option<(u32, u32)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub shading: Shading,
    pub color: [f32; 3],
    pub opacity: f32,
    pub map: Option<TextureRef>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            shading: Shading::Basic,
            color: [1.0; 3],
            opacity: 1.0,
            map: None,
        }
    }
}

/// A named material slot of a mesh node; empty when the reference did not resolve
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialSlot {
    pub name: String,
    /// Position of `name` in the scene's global material table
    pub global_index: Option<usize>,
    pub material: Option<Arc<Material>>,
}

/// Mesh component payload
#[derive(Clone, Debug, PartialEq)]
pub struct MeshInstance {
    pub mesh: Arc<MeshData>,
    pub slots: Vec<MaterialSlot>,
}

impl MeshInstance {
    pub fn new(mesh: Arc<MeshData>, slots: Vec<MaterialSlot>) -> Self {
        Self { mesh, slots }
    }

    /// Material drawn for a primitive, matched through the global table index
    pub fn material_for(&self, primitive: &MeshPrimitive) -> Option<&Arc<Material>> {
        let index = primitive.material?;
        self.slots
            .iter()
            .find(|slot| slot.global_index == Some(index))
            .and_then(|slot| slot.material.as_ref())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    Perspective,
    Orthographic,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraParams {
    pub projection: Projection,
    /// Vertical field of view as recorded by the producer
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Look-at point in parent space
    pub target: Vec3,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            projection: Projection::Perspective,
            fov: 50.0,
            aspect: 4.0 / 3.0,
            near: 0.1,
            far: 1000.0,
            target: Vec3::ZERO,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LightType {
    #[default]
    Directional,
    Point,
    Spot,
    Area,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LightParams {
    pub kind: LightType,
    pub color: [f32; 3],
    pub intensity: f32,
    pub direction: Option<Vec3>,
    pub range: Option<f32>,
    pub cone_angle: Option<f32>,
    pub beam_width: Option<f32>,
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            kind: LightType::Directional,
            color: [1.0; 3],
            intensity: 1.0,
            direction: None,
            range: None,
            cone_angle: None,
            beam_width: None,
        }
    }
}
