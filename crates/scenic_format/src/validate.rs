//! Reference validation
//!
//! A document can be well-formed JSON and still point at names that do not
//! exist. Those are soft failures: readers build what they can and report the
//! rest. [`Document::validate`] lists all of them up front.

use crate::document::{Document, EmbedRecord, GeometryRef};
use crate::face::{FaceError, FaceReader};
use std::fmt;
use thiserror::Error;

/// Which index group of a face is out of range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Vertex,
    Uv,
    Normal,
    Material,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Vertex => write!(f, "vertex"),
            IndexKind::Uv => write!(f, "uv"),
            IndexKind::Normal => write!(f, "normal"),
            IndexKind::Material => write!(f, "material"),
        }
    }
}

/// One dangling reference or broken face stream
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReferenceIssue {
    #[error("object '{object}' references missing geometry '{geometry}'")]
    MissingGeometry { object: String, geometry: String },

    #[error("geometry '{geometry}' has neither an embed id nor a url")]
    InvalidGeometry { geometry: String },

    #[error("geometry '{geometry}' references missing embed '{embed}'")]
    MissingEmbed { geometry: String, embed: String },

    #[error("object '{object}' references missing material '{material}'")]
    MissingMaterial { object: String, material: String },

    #[error("material '{material}' references missing texture '{texture}'")]
    MissingTexture { material: String, texture: String },

    #[error("default camera '{camera}' is not in the cameras table")]
    MissingDefaultCamera { camera: String },

    #[error("embed '{embed}' face {face}: {kind} index {index} out of range ({len} available)")]
    IndexOutOfRange {
        embed: String,
        face: usize,
        kind: IndexKind,
        index: u32,
        len: usize,
    },

    #[error("embed '{embed}' face stream is broken: {error}")]
    BrokenFaces { embed: String, error: FaceError },
}

/// Result of [`Document::validate`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub issues: Vec<ReferenceIssue>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceIssue> {
        self.issues.iter()
    }

    /// Log every issue at warn level
    pub fn log(&self) {
        for issue in &self.issues {
            log::warn!("{}", issue);
        }
    }
}

impl Document {
    /// Check every cross-reference and face stream.
    ///
    /// External geometry URLs are not followed.
    pub fn validate(&self) -> ValidationReport {
        let mut issues = Vec::new();

        self.visit_objects(|name, object, _| {
            if let Some(geometry) = &object.geometry {
                if !self.geometries.contains_key(geometry) {
                    issues.push(ReferenceIssue::MissingGeometry {
                        object: name.to_string(),
                        geometry: geometry.clone(),
                    });
                }
            }
            for material in &object.materials {
                if !self.materials.contains_key(material) {
                    issues.push(ReferenceIssue::MissingMaterial {
                        object: name.to_string(),
                        material: material.clone(),
                    });
                }
            }
        });

        for (name, geometry) in &self.geometries {
            match geometry.reference() {
                GeometryRef::Embedded(embed) if !self.embeds.contains_key(embed) => {
                    issues.push(ReferenceIssue::MissingEmbed {
                        geometry: name.clone(),
                        embed: embed.to_string(),
                    });
                }
                GeometryRef::Invalid => issues.push(ReferenceIssue::InvalidGeometry {
                    geometry: name.clone(),
                }),
                _ => {}
            }
        }

        for (name, material) in &self.materials {
            if let Some(texture) = &material.parameters.map {
                if !self.textures.contains_key(texture) {
                    issues.push(ReferenceIssue::MissingTexture {
                        material: name.clone(),
                        texture: texture.clone(),
                    });
                }
            }
        }

        if let Some(camera) = &self.defaults.camera {
            if !self.cameras.contains_key(camera) {
                issues.push(ReferenceIssue::MissingDefaultCamera { camera: camera.clone() });
            }
        }

        for (name, embed) in &self.embeds {
            check_faces(name, embed, self.materials.len(), &mut issues);
        }

        ValidationReport { issues }
    }
}

/// Report the first out-of-range index of each kind, plus any stream error
pub fn check_faces(name: &str, embed: &EmbedRecord, material_count: usize, issues: &mut Vec<ReferenceIssue>) {
    let mut reported = [false; 4];
    let mut report = |face: usize, kind: IndexKind, index: u32, len: usize, issues: &mut Vec<ReferenceIssue>| {
        let slot = kind as usize;
        if (index as usize) < len || reported[slot] {
            return;
        }
        reported[slot] = true;
        issues.push(ReferenceIssue::IndexOutOfRange {
            embed: name.to_string(),
            face,
            kind,
            index,
            len,
        });
    };

    let vertex_count = embed.vertex_count();
    let normal_count = embed.normal_count();

    for (face_index, face) in FaceReader::new(&embed.faces, embed.uv_layer_count()).enumerate() {
        let face = match face {
            Ok(face) => face,
            Err(error) => {
                issues.push(ReferenceIssue::BrokenFaces {
                    embed: name.to_string(),
                    error,
                });
                break;
            }
        };
        let n = face.corners();
        for &v in &face.vertices[..n] {
            report(face_index, IndexKind::Vertex, v, vertex_count, issues);
        }
        if let Some(m) = face.material {
            report(face_index, IndexKind::Material, m, material_count, issues);
        }
        for (layer, uvs) in face.vertex_uvs.iter().enumerate() {
            let uv_count = embed.uv_count(layer);
            for &uv in &uvs[..n] {
                report(face_index, IndexKind::Uv, uv, uv_count, issues);
            }
        }
        for (layer, &uv) in face.face_uvs.iter().enumerate() {
            report(face_index, IndexKind::Uv, uv, embed.uv_count(layer), issues);
        }
        if let Some(normals) = &face.vertex_normals {
            for &nrm in &normals[..n] {
                report(face_index, IndexKind::Normal, nrm, normal_count, issues);
            }
        }
        if let Some(nrm) = face.face_normal {
            report(face_index, IndexKind::Normal, nrm, normal_count, issues);
        }
    }
}
