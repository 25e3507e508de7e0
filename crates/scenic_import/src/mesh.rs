//! Embed reconstruction
//!
//! Faces index vertices, UVs and normals separately. Each distinct
//! combination becomes one interleaved [`Vertex`]; triangles are grouped
//! into one primitive per global material index.

use indexmap::IndexMap;
use scenic_format::{EmbedRecord, FaceReader};
use scenic_graph::{MeshData, MeshPrimitive, Vertex};
use std::collections::HashMap;

/// Corner of a triangle: vertex, UV and normal indices
type CornerKey = (u32, Option<u32>, Option<u32>);

/// Build render geometry from an embed.
///
/// Triangles with an out-of-range index are dropped. A broken face stream
/// ends the mesh at the last complete face. Both are logged.
pub fn build_mesh(name: &str, embed: &EmbedRecord) -> MeshData {
    let mut builder = MeshBuilder::new(embed);
    for face in FaceReader::new(&embed.faces, embed.uv_layer_count()) {
        let face = match face {
            Ok(face) => face,
            Err(e) => {
                log::warn!("Embed '{}': {}; keeping faces read so far", name, e);
                break;
            }
        };

        let material = face.material.map(|m| m as usize);
        for tri in face.triangles() {
            let corners = tri.map(|k| {
                let uv = face
                    .vertex_uvs
                    .first()
                    .map(|uvs| uvs[k])
                    .or_else(|| face.face_uvs.first().copied());
                let normal = face.vertex_normals.map(|n| n[k]).or(face.face_normal);
                (face.vertices[k], uv, normal)
            });
            builder.triangle(corners, material);
        }
    }

    if builder.skipped > 0 {
        log::warn!(
            "Embed '{}': dropped {} triangles with out-of-range indices",
            name,
            builder.skipped
        );
    }
    builder.finish()
}

struct MeshBuilder<'a> {
    embed: &'a EmbedRecord,
    vertices: Vec<Vertex>,
    lookup: HashMap<CornerKey, u32>,
    primitives: IndexMap<Option<usize>, Vec<u32>>,
    skipped: usize,
    has_uvs: bool,
}

impl<'a> MeshBuilder<'a> {
    fn new(embed: &'a EmbedRecord) -> Self {
        Self {
            embed,
            vertices: Vec::new(),
            lookup: HashMap::new(),
            primitives: IndexMap::new(),
            skipped: 0,
            has_uvs: false,
        }
    }

    fn triangle(&mut self, corners: [CornerKey; 3], material: Option<usize>) {
        if !corners.iter().all(|c| self.in_range(c)) {
            self.skipped += 1;
            return;
        }
        let indices = corners.map(|c| self.vertex(c));
        self.primitives.entry(material).or_default().extend_from_slice(&indices);
    }

    fn in_range(&self, &(v, uv, n): &CornerKey) -> bool {
        (v as usize) < self.embed.vertex_count()
            && uv.map_or(true, |i| (i as usize) < self.embed.uv_count(0))
            && n.map_or(true, |i| (i as usize) < self.embed.normal_count())
    }

    fn vertex(&mut self, key: CornerKey) -> u32 {
        if let Some(&index) = self.lookup.get(&key) {
            return index;
        }
        let (v, uv, n) = key;
        let embed = self.embed;
        let factor = embed.position_factor();
        let triple = |data: &[f32], i: u32| {
            let i = i as usize * 3;
            [data[i], data[i + 1], data[i + 2]]
        };

        let position = triple(&embed.vertices, v).map(|c| c * factor);
        let normal = n.map_or([0.0, 1.0, 0.0], |n| triple(&embed.normals, n));
        let uv = match uv {
            Some(i) => {
                self.has_uvs = true;
                let i = i as usize * 2;
                [embed.uvs[0][i], embed.uvs[0][i + 1]]
            }
            None => [0.0, 0.0],
        };

        let index = self.vertices.len() as u32;
        self.vertices.push(Vertex { position, normal, uv });
        self.lookup.insert(key, index);
        index
    }

    fn finish(self) -> MeshData {
        let primitives = self
            .primitives
            .into_iter()
            .map(|(material, indices)| MeshPrimitive { material, indices })
            .collect();
        MeshData::new(self.vertices, primitives, self.has_uvs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenic_format::encode_triangle;

    fn quad_embed() -> EmbedRecord {
        let mut faces = Vec::new();
        encode_triangle(&mut faces, [0, 1, 2], Some(0), true);
        encode_triangle(&mut faces, [0, 2, 3], Some(1), true);
        EmbedRecord {
            vertices: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            normals: vec![0.0, 0.0, 1.0].repeat(4),
            uvs: vec![vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]],
            faces,
            ..EmbedRecord::default()
        }
    }

    #[test]
    fn test_winding_restored_and_vertices_shared() {
        let mesh = build_mesh("quad", &quad_embed());
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.primitives.len(), 2);
        assert_eq!(mesh.primitives[0].material, Some(0));
        assert_eq!(mesh.primitives[0].indices, vec![0, 1, 2]);
        assert_eq!(mesh.primitives[1].indices, vec![0, 2, 3]);
        assert_eq!(mesh.vertices[2].uv, [1.0, 1.0]);
        assert!(mesh.has_uvs);
    }

    #[test]
    fn test_quad_face_split() {
        let embed = EmbedRecord {
            vertices: quad_embed().vertices,
            faces: vec![1, 0, 1, 2, 3],
            ..EmbedRecord::default()
        };
        let mesh = build_mesh("quad", &embed);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.primitives[0].material, None);
        assert_eq!(mesh.vertices[0].normal, [0.0, 1.0, 0.0]);
        assert!(!mesh.has_uvs);
    }

    #[test]
    fn test_bad_indices_dropped() {
        let mut embed = quad_embed();
        embed.faces[1] = 9;
        let mesh = build_mesh("quad", &embed);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_truncated_stream_keeps_complete_faces() {
        let mut embed = quad_embed();
        embed.faces.pop();
        let mesh = build_mesh("quad", &embed);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_embed_scale() {
        let mut embed = quad_embed();
        embed.scale = 2.0;
        let mesh = build_mesh("quad", &embed);
        assert_eq!(mesh.bounds.max.x, 0.5);

        embed.scale = 0.0;
        let mesh = build_mesh("quad", &embed);
        assert_eq!(mesh.bounds.max.x, 1.0);
    }
}
