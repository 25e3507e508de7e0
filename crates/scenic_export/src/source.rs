//! Source scene model
//!
//! What the encoder consumes: objects as an authoring tool sees them, in its
//! left-handed space with Euler angles in degrees. Shared resources are
//! `Arc`s; two objects share a material or mesh exactly when they hold the
//! same `Arc`.

use scenic_math::{degrees, Quat, Vec2, Vec3};
use std::path::PathBuf;
use std::sync::Arc;

/// Triangle mesh with one UV channel and one triangle list per submesh
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    /// Empty or one per position
    pub normals: Vec<Vec3>,
    /// Empty or one per position
    pub uvs: Vec<Vec2>,
    /// Triangle lists indexing `positions`
    pub submeshes: Vec<Vec<u32>>,
}

impl SourceMesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.len() / 3).sum()
    }
}

/// Image file on disk used by a material
#[derive(Clone, Debug, PartialEq)]
pub struct SourceTexture {
    pub name: String,
    /// Path of the image as stored by the authoring tool
    pub path: PathBuf,
}

impl SourceTexture {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// File name the copy receives in the output folder
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SourceMaterial {
    pub name: String,
    /// Linear RGBA, each channel in 0..=1
    pub color: [f32; 4],
    pub texture: Option<Arc<SourceTexture>>,
}

impl SourceMaterial {
    pub fn new(name: impl Into<String>, color: [f32; 4]) -> Self {
        Self {
            name: name.into(),
            color,
            texture: None,
        }
    }

    pub fn with_texture(mut self, texture: Arc<SourceTexture>) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn rgb(&self) -> [f32; 3] {
        [self.color[0], self.color[1], self.color[2]]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SourceProjection {
    #[default]
    Perspective,
    Orthographic,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SourceCamera {
    pub projection: SourceProjection,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for SourceCamera {
    fn default() -> Self {
        Self {
            projection: SourceProjection::Perspective,
            fov: 60.0,
            aspect: 16.0 / 9.0,
            near: 0.3,
            far: 1000.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SourceLightKind {
    #[default]
    Directional,
    Point,
    Spot,
    Area,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SourceLight {
    pub kind: SourceLightKind,
    pub color: [f32; 3],
    pub intensity: f32,
    /// Reach of point and spot lights
    pub range: Option<f32>,
    /// Full cone angle of spot lights, degrees
    pub spot_angle: Option<f32>,
}

impl Default for SourceLight {
    fn default() -> Self {
        Self {
            kind: SourceLightKind::Directional,
            color: [1.0; 3],
            intensity: 1.0,
            range: None,
            spot_angle: None,
        }
    }
}

/// World transform in authoring space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceTransform {
    pub position: Vec3,
    /// Euler angles in degrees, XYZ order
    pub euler_degrees: Vec3,
    pub scale: Vec3,
}

impl SourceTransform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        euler_degrees: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn new(position: Vec3, euler_degrees: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            euler_degrees,
            scale,
        }
    }

    /// From a rotation quaternion instead of Euler angles
    pub fn from_quat(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let e = rotation.to_euler();
        Self {
            position,
            euler_degrees: Vec3::new(degrees(e.x), degrees(e.y), degrees(e.z)),
            scale,
        }
    }

    /// Local forward axis (+Z) in authoring space
    pub fn forward(&self) -> Vec3 {
        let r = Quat::from_euler(
            scenic_math::radians(self.euler_degrees.x),
            scenic_math::radians(self.euler_degrees.y),
            scenic_math::radians(self.euler_degrees.z),
        );
        r * Vec3::Z
    }
}

impl Default for SourceTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One selected object
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceObject {
    pub name: String,
    pub mesh: Option<Arc<SourceMesh>>,
    /// One per submesh, aligned by index
    pub materials: Vec<Arc<SourceMaterial>>,
    pub camera: Option<SourceCamera>,
    pub light: Option<SourceLight>,
    pub transform: SourceTransform,
}

impl SourceObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_mesh(mut self, mesh: Arc<SourceMesh>, materials: Vec<Arc<SourceMaterial>>) -> Self {
        self.mesh = Some(mesh);
        self.materials = materials;
        self
    }

    pub fn with_camera(mut self, camera: SourceCamera) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn with_light(mut self, light: SourceLight) -> Self {
        self.light = Some(light);
        self
    }

    pub fn with_transform(mut self, transform: SourceTransform) -> Self {
        self.transform = transform;
        self
    }
}
