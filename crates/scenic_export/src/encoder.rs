//! Document assembly
//!
//! Walks the selection once, in order. Materials enter the global table the
//! first time any object uses them, which fixes the material index every
//! face record carries.

use crate::config::ExportConfig;
use crate::session::{EncodeSession, TextureCopy};
use crate::source::{SourceCamera, SourceLight, SourceLightKind, SourceMaterial, SourceMesh, SourceObject, SourceProjection};
use scenic_format::convert::{direction_to_document, position_to_document, rotation_to_document, scale_to_document};
use scenic_format::{
    encode_triangle, CameraRecord, Color, Document, EmbedRecord, EmbeddedMaterial, GeometryRecord, LightKind,
    LightRecord, MaterialKind, MaterialParameters, MaterialRecord, ObjectRecord, ProjectionKind, TextureRecord,
};
use scenic_math::{radians, Vec3};
use std::borrow::Cow;
use std::sync::Arc;

/// A finished document and the texture files it expects next to it
#[derive(Debug, Clone)]
pub struct Encoded {
    pub document: Document,
    pub texture_copies: Vec<TextureCopy>,
}

pub struct SceneEncoder {
    config: ExportConfig,
}

impl SceneEncoder {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Encode a selection with a fresh session
    pub fn encode(&self, objects: &[SourceObject]) -> Encoded {
        let mut session = EncodeSession::new();
        let document = self.encode_with(&mut session, objects);
        Encoded {
            document,
            texture_copies: session.into_texture_copies(),
        }
    }

    /// Encode a selection, recording shared resources in `session`
    pub fn encode_with(&self, session: &mut EncodeSession, objects: &[SourceObject]) -> Document {
        let mut doc = Document::new();
        doc.metadata.format_version = self.config.format_version;
        doc.metadata.generated_by = self.config.generated_by.clone();

        for object in objects {
            if let Some(mesh) = &object.mesh {
                self.encode_mesh_object(session, &mut doc, object, mesh);
            }
            if let Some(camera) = &object.camera {
                let key = session.unique_key("cameras", &object.name);
                doc.cameras.insert(key, camera_record(object, camera));
            }
            if let Some(light) = &object.light {
                let key = session.unique_key("lights", &object.name);
                doc.lights.insert(key, light_record(object, light));
            }
        }

        let scene = &self.config.scene;
        doc.defaults.bgcolor = Some(Color::Rgb(scene.background));
        doc.defaults.bgalpha = scene.background_alpha;
        doc.defaults.fog = scene.fog.map(Color::Rgb);
        doc.defaults.camera = doc
            .cameras
            .keys()
            .next()
            .cloned()
            .or_else(|| scene.camera.clone());

        log::info!(
            "Encoded {} objects, {} materials, {} embeds, {} textures",
            doc.objects.len(),
            doc.materials.len(),
            doc.embeds.len(),
            doc.textures.len()
        );
        doc
    }

    fn encode_mesh_object(
        &self,
        session: &mut EncodeSession,
        doc: &mut Document,
        object: &SourceObject,
        mesh: &Arc<SourceMesh>,
    ) {
        let key = session.unique_key("objects", &object.name);

        let mut names = Vec::with_capacity(object.materials.len());
        for material in &object.materials {
            let (slot, fresh) = session.material(material);
            if fresh {
                let record = material_record(session, doc, material);
                doc.materials.insert(slot.key.clone(), record);
            }
            if !names.contains(&slot.key) {
                names.push(slot.key);
            }
        }

        let existing = session.geometry(mesh, &object.materials).map(str::to_string);
        let geometry = match existing {
            Some(existing) => existing,
            None => {
                let geometry = session.unique_key("geometries", &format!("{}_geo", key));
                let embed = session.unique_key("embeds", &format!("{}_emb", key));
                let record = self.embed_record(session, mesh, &object.materials);
                log::debug!(
                    "Embedding '{}': {} vertices, {} triangles",
                    embed,
                    mesh.positions.len(),
                    mesh.triangle_count()
                );
                doc.geometries.insert(geometry.clone(), GeometryRecord::embedded(embed.clone()));
                doc.embeds.insert(embed, record);
                session.register_geometry(mesh, &object.materials, geometry.clone());
                geometry
            }
        };

        let t = &object.transform;
        doc.objects.insert(
            key,
            ObjectRecord {
                geometry: Some(geometry),
                materials: names,
                position: position_to_document(t.position),
                rotation: rotation_to_document(t.euler_degrees),
                scale: scale_to_document(t.scale),
                visible: true,
                ..ObjectRecord::default()
            },
        );
    }

    fn embed_record(
        &self,
        session: &mut EncodeSession,
        mesh: &SourceMesh,
        materials: &[Arc<SourceMaterial>],
    ) -> EmbedRecord {
        let mut record = EmbedRecord::default();

        for material in materials {
            if session.claim_embedded_material(material) {
                let rgb = material.rgb();
                record.materials.push(EmbeddedMaterial {
                    dbg_name: material.name.clone(),
                    color_ambient: rgb,
                    color_diffuse: rgb,
                    color_specular: rgb,
                    ..EmbeddedMaterial::default()
                });
            }
        }

        record.vertices = mesh
            .positions
            .iter()
            .flat_map(|&p| position_to_document(p))
            .collect();
        record.normals = vertex_normals(mesh)
            .iter()
            .flat_map(|&n| direction_to_document(n))
            .collect();
        record.uvs = vec![mesh
            .uvs
            .iter()
            .flat_map(|uv| self.config.uv_wrap.wrap([uv.x, uv.y]))
            .collect()];

        let with_uvs = mesh.has_uvs();
        for (submesh, triangles) in mesh.submeshes.iter().enumerate() {
            let material = materials.get(submesh).map(|m| session.material(m).0.index);
            if triangles.len() % 3 != 0 {
                log::warn!(
                    "Submesh {} of '{}' has {} indices; dropping the incomplete triangle",
                    submesh,
                    mesh.name,
                    triangles.len()
                );
            }
            for tri in triangles.chunks_exact(3) {
                encode_triangle(&mut record.faces, [tri[0], tri[1], tri[2]], material, with_uvs);
            }
        }

        record
    }
}

impl Default for SceneEncoder {
    fn default() -> Self {
        Self::new(ExportConfig::default())
    }
}

fn material_record(session: &mut EncodeSession, doc: &mut Document, material: &SourceMaterial) -> MaterialRecord {
    let map = material.texture.as_ref().map(|texture| {
        let (slot, fresh) = session.texture(texture);
        if fresh {
            doc.textures.insert(slot.key.clone(), TextureRecord { url: slot.url });
        }
        slot.key
    });

    MaterialRecord {
        kind: MaterialKind::Basic,
        parameters: MaterialParameters {
            color: Some(Color::packed_from_rgb(material.rgb())),
            map,
            opacity: material.color[3],
        },
    }
}

fn camera_record(object: &SourceObject, camera: &SourceCamera) -> CameraRecord {
    let t = &object.transform;
    CameraRecord {
        kind: match camera.projection {
            SourceProjection::Perspective => ProjectionKind::Perspective,
            SourceProjection::Orthographic => ProjectionKind::Ortho,
        },
        fov: camera.fov,
        aspect: camera.aspect,
        near: camera.near,
        far: camera.far,
        position: position_to_document(t.position),
        target: position_to_document(t.position + t.forward()),
    }
}

fn light_record(object: &SourceObject, light: &SourceLight) -> LightRecord {
    let t = &object.transform;
    let direction = Some(direction_to_document(t.forward()));
    let position = Some(position_to_document(t.position));

    let mut record = LightRecord {
        color: Color::Rgb(light.color),
        intensity: light.intensity,
        ..LightRecord::default()
    };
    match light.kind {
        SourceLightKind::Directional => {
            record.kind = LightKind::Directional;
            record.direction = direction;
        }
        SourceLightKind::Point => {
            record.kind = LightKind::Point;
            record.position = position;
            record.radius = light.range;
        }
        SourceLightKind::Spot => {
            record.kind = LightKind::Spot;
            record.position = position;
            record.direction = direction;
            record.radius = light.range;
            record.cut_off_angle = light.spot_angle.map(|a| radians(a * 0.5));
            record.beam_width = light.spot_angle.map(radians);
        }
        SourceLightKind::Area => {
            record.kind = LightKind::Area;
            record.position = position;
        }
    }
    record
}

/// Normals as given, or smooth normals when the mesh has none
fn vertex_normals(mesh: &SourceMesh) -> Cow<'_, [Vec3]> {
    if mesh.normals.len() == mesh.positions.len() {
        return Cow::Borrowed(&mesh.normals);
    }

    let mut normals = vec![Vec3::ZERO; mesh.positions.len()];
    for tri in mesh.submeshes.iter().flat_map(|s| s.chunks_exact(3)) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
        if a.max(b).max(c) >= mesh.positions.len() {
            continue;
        }
        let p = &mesh.positions;
        let face = (p[b] - p[a]).cross(p[c] - p[a]);
        for i in [a, b, c] {
            normals[i] += face;
        }
    }
    for n in &mut normals {
        *n = if n.length() > f32::EPSILON { n.normalize() } else { Vec3::Y };
    }
    Cow::Owned(normals)
}
