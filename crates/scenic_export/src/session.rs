//! Per-export bookkeeping
//!
//! An [`EncodeSession`] lives for exactly one encode call. It remembers
//! which shared resources were already written, keyed by `Arc` identity, and
//! hands out unique mapping keys. Every `Arc` it has seen is retained so the
//! pointer keys stay valid for the session's lifetime.

use crate::source::{SourceMaterial, SourceMesh, SourceTexture};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

/// Key of a material in the `materials` table plus its position there
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialSlot {
    pub key: String,
    pub index: u32,
}

/// Key of a texture in the `textures` table plus the file name it is
/// copied to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSlot {
    pub key: String,
    pub url: String,
}

/// A texture file waiting to be copied next to the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureCopy {
    pub source: PathBuf,
    /// Base name inside the output folder
    pub file_name: String,
}

/// Identity of an embedded mesh: the mesh plus the materials bound to it.
/// The same mesh with different materials needs different face records.
type MeshKey = (*const SourceMesh, Vec<*const SourceMaterial>);

#[derive(Debug, Default)]
pub struct EncodeSession {
    material_list: Vec<Arc<SourceMaterial>>,
    material_map: HashMap<*const SourceMaterial, MaterialSlot>,
    embedded_materials: HashSet<*const SourceMaterial>,

    texture_list: Vec<Arc<SourceTexture>>,
    texture_map: HashMap<*const SourceTexture, TextureSlot>,

    mesh_list: Vec<Arc<SourceMesh>>,
    mesh_map: HashMap<MeshKey, String>,

    /// Keys already used per mapping, for suffixing duplicate names
    used_keys: HashMap<&'static str, HashSet<String>>,

    texture_copies: Vec<TextureCopy>,
}

impl EncodeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a material, registering it on first encounter.
    ///
    /// Returns the slot and whether this call registered it.
    pub fn material(&mut self, material: &Arc<SourceMaterial>) -> (MaterialSlot, bool) {
        let ptr = Arc::as_ptr(material);
        if let Some(slot) = self.material_map.get(&ptr) {
            return (slot.clone(), false);
        }
        let slot = MaterialSlot {
            key: self.unique_key("materials", &material.name),
            index: self.material_list.len() as u32,
        };
        self.material_list.push(Arc::clone(material));
        self.material_map.insert(ptr, slot.clone());
        (slot, true)
    }

    pub fn material_count(&self) -> usize {
        self.material_list.len()
    }

    /// True the first time a material's embedded entry is requested
    pub fn claim_embedded_material(&mut self, material: &Arc<SourceMaterial>) -> bool {
        self.embedded_materials.insert(Arc::as_ptr(material))
    }

    /// Texture slot, registering the texture and its copy on first encounter.
    ///
    /// Distinct textures sharing a base name are copied as `name_1.ext`,
    /// `name_2.ext`, ... so no copy overwrites another.
    pub fn texture(&mut self, texture: &Arc<SourceTexture>) -> (TextureSlot, bool) {
        let ptr = Arc::as_ptr(texture);
        if let Some(slot) = self.texture_map.get(&ptr) {
            return (slot.clone(), false);
        }
        let key = self.unique_key("textures", &texture.name);
        let url = self.unique_file_name(&texture.file_name());
        self.texture_copies.push(TextureCopy {
            source: texture.path.clone(),
            file_name: url.clone(),
        });
        let slot = TextureSlot { key, url };
        self.texture_list.push(Arc::clone(texture));
        self.texture_map.insert(ptr, slot.clone());
        (slot, true)
    }

    /// Geometry key already assigned to this mesh/material binding
    pub fn geometry(&self, mesh: &Arc<SourceMesh>, materials: &[Arc<SourceMaterial>]) -> Option<&str> {
        self.mesh_map.get(&mesh_key(mesh, materials)).map(String::as_str)
    }

    pub fn register_geometry(
        &mut self,
        mesh: &Arc<SourceMesh>,
        materials: &[Arc<SourceMaterial>],
        key: impl Into<String>,
    ) {
        self.mesh_list.push(Arc::clone(mesh));
        self.mesh_map.insert(mesh_key(mesh, materials), key.into());
    }

    /// Reserve a key in `mapping`, suffixing `_1`, `_2`, ... on collision
    pub fn unique_key(&mut self, mapping: &'static str, name: &str) -> String {
        let used = self.used_keys.entry(mapping).or_default();
        let base = if name.is_empty() { "unnamed" } else { name };
        let mut key = base.to_string();
        let mut n = 1;
        while used.contains(&key) {
            key = format!("{}_{}", base, n);
            n += 1;
        }
        used.insert(key.clone());
        key
    }

    /// Reserve a file name in the output folder, suffixing before the extension
    fn unique_file_name(&mut self, file_name: &str) -> String {
        let used = self.used_keys.entry("files").or_default();
        let (stem, extension) = match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (file_name, None),
        };
        let mut name = file_name.to_string();
        let mut n = 1;
        while used.contains(&name.to_lowercase()) {
            name = match extension {
                Some(ext) => format!("{}_{}.{}", stem, n, ext),
                None => format!("{}_{}", stem, n),
            };
            n += 1;
        }
        used.insert(name.to_lowercase());
        name
    }

    pub fn texture_copies(&self) -> &[TextureCopy] {
        &self.texture_copies
    }

    pub fn into_texture_copies(self) -> Vec<TextureCopy> {
        self.texture_copies
    }
}

fn mesh_key(mesh: &Arc<SourceMesh>, materials: &[Arc<SourceMaterial>]) -> MeshKey {
    (Arc::as_ptr(mesh), materials.iter().map(Arc::as_ptr).collect())
}
