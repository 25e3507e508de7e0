//! Wavefront OBJ source adapter
//!
//! Turns an OBJ file (plus any `mtllib` it names) into source objects so a
//! scene can be exported without an authoring tool. One object per `o`/`g`
//! group, one submesh per `usemtl` run. Polygons are fan-triangulated.
//!
//! OBJ is right-handed. Positions and normals are mirrored on Z into the
//! left-handed authoring space and the winding is swapped, so the exported
//! document reproduces the file's own coordinates.

use crate::error::{ExportError, Result};
use crate::source::{SourceMaterial, SourceMesh, SourceObject, SourceTexture};
use scenic_math::{Vec2, Vec3};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Read an OBJ file and the material libraries it references
pub fn load_obj(path: impl AsRef<Path>) -> Result<Vec<SourceObject>> {
    let path = path.as_ref();
    let text = read(path)?;
    let objects = ObjParser::new(path).parse(&text)?;
    log::info!("Loaded {} objects from {}", objects.len(), path.display());
    Ok(objects)
}

/// Parse OBJ text; `path` names the file for errors and locates `mtllib`s
pub fn parse_obj(text: &str, path: impl AsRef<Path>) -> Result<Vec<SourceObject>> {
    ObjParser::new(path.as_ref()).parse(text)
}

/// Parse MTL text into materials keyed by name
pub fn parse_mtl(text: &str, path: impl AsRef<Path>) -> Result<HashMap<String, Arc<SourceMaterial>>> {
    let mut textures = HashMap::new();
    parse_mtl_with(text, path.as_ref(), &mut textures)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ExportError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn source_error(path: &Path, line: usize, message: impl Into<String>) -> ExportError {
    ExportError::Source {
        path: path.to_path_buf(),
        line,
        message: message.into(),
    }
}

fn parse_floats<const N: usize>(parts: &[&str], path: &Path, line: usize) -> Result<[f32; N]> {
    let mut out = [0.0; N];
    for (i, slot) in out.iter_mut().enumerate() {
        let part = parts
            .get(i)
            .ok_or_else(|| source_error(path, line, format!("expected {} numbers", N)))?;
        *slot = part
            .parse()
            .map_err(|_| source_error(path, line, format!("invalid number '{}'", part)))?;
    }
    Ok(out)
}

fn parse_mtl_with(
    text: &str,
    path: &Path,
    textures: &mut HashMap<PathBuf, Arc<SourceTexture>>,
) -> Result<HashMap<String, Arc<SourceMaterial>>> {
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let mut materials = HashMap::new();
    let mut current: Option<SourceMaterial> = None;

    fn finish(material: Option<SourceMaterial>, materials: &mut HashMap<String, Arc<SourceMaterial>>) {
        if let Some(material) = material {
            materials.insert(material.name.clone(), Arc::new(material));
        }
    }

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&keyword, args)) = parts.split_first() else {
            continue;
        };

        if keyword == "newmtl" {
            finish(current.take(), &mut materials);
            current = Some(SourceMaterial::new(args.join(" "), [1.0; 4]));
            continue;
        }
        let Some(material) = current.as_mut() else {
            continue;
        };
        match keyword {
            "Kd" => {
                let [r, g, b] = parse_floats::<3>(args, path, line_no)?;
                material.color[..3].copy_from_slice(&[r, g, b]);
            }
            "d" => material.color[3] = parse_floats::<1>(args, path, line_no)?[0],
            "Tr" => material.color[3] = 1.0 - parse_floats::<1>(args, path, line_no)?[0],
            "map_Kd" => {
                // Options may precede the file name; the name is the last token
                let Some(file) = args.last() else {
                    return Err(source_error(path, line_no, "map_Kd without a file"));
                };
                let file = base.join(file);
                let texture = textures.entry(file.clone()).or_insert_with(|| {
                    let name = file
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    Arc::new(SourceTexture::new(name, file.clone()))
                });
                material.texture = Some(Arc::clone(texture));
            }
            _ => {}
        }
    }
    finish(current.take(), &mut materials);

    Ok(materials)
}

/// Corner of a face: position, UV and normal indices, zero-based
type Corner = (usize, Option<usize>, Option<usize>);

struct ObjectBuilder {
    name: String,
    mesh: SourceMesh,
    materials: Vec<Arc<SourceMaterial>>,
    submesh: Option<usize>,
    corners: HashMap<Corner, u32>,
    has_uvs: bool,
    has_normals: bool,
}

impl ObjectBuilder {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            mesh: SourceMesh::new(name),
            materials: Vec::new(),
            submesh: None,
            corners: HashMap::new(),
            has_uvs: false,
            has_normals: false,
        }
    }

    fn use_material(&mut self, material: Arc<SourceMaterial>) {
        let index = match self.materials.iter().position(|m| Arc::ptr_eq(m, &material)) {
            Some(index) => index,
            None => {
                self.materials.push(material);
                self.mesh.submeshes.push(Vec::new());
                self.materials.len() - 1
            }
        };
        self.submesh = Some(index);
    }

    fn is_empty(&self) -> bool {
        self.mesh.submeshes.iter().all(Vec::is_empty)
    }

    fn finish(mut self) -> Option<SourceObject> {
        if self.is_empty() {
            return None;
        }
        if !self.has_uvs {
            self.mesh.uvs.clear();
        }
        if !self.has_normals {
            self.mesh.normals.clear();
        }
        Some(SourceObject::new(self.name).with_mesh(Arc::new(self.mesh), self.materials))
    }
}

struct ObjParser<'a> {
    path: &'a Path,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    library: HashMap<String, Arc<SourceMaterial>>,
    textures: HashMap<PathBuf, Arc<SourceTexture>>,
    default_material: Option<Arc<SourceMaterial>>,
    current: Option<ObjectBuilder>,
    objects: Vec<SourceObject>,
}

impl<'a> ObjParser<'a> {
    fn new(path: &'a Path) -> Self {
        Self {
            path,
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            library: HashMap::new(),
            textures: HashMap::new(),
            default_material: None,
            current: None,
            objects: Vec::new(),
        }
    }

    fn object_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "object".to_string())
    }

    fn parse(mut self, text: &str) -> Result<Vec<SourceObject>> {
        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let parts: Vec<&str> = line.split_whitespace().collect();
            let Some((&keyword, args)) = parts.split_first() else {
                continue;
            };

            match keyword {
                "v" => {
                    let [x, y, z] = parse_floats::<3>(args, self.path, line_no)?;
                    self.positions.push(Vec3::new(x, y, -z));
                }
                "vn" => {
                    let [x, y, z] = parse_floats::<3>(args, self.path, line_no)?;
                    self.normals.push(Vec3::new(x, y, -z));
                }
                "vt" => {
                    let [u] = parse_floats::<1>(args, self.path, line_no)?;
                    let v = match args.get(1) {
                        Some(_) => parse_floats::<2>(args, self.path, line_no)?[1],
                        None => 0.0,
                    };
                    self.uvs.push(Vec2::new(u, v));
                }
                "o" | "g" => {
                    let name = if args.is_empty() {
                        self.object_name()
                    } else {
                        args.join(" ")
                    };
                    self.start_object(&name);
                }
                "mtllib" => {
                    for file in args {
                        self.load_library(file);
                    }
                }
                "usemtl" => {
                    let name = args.join(" ");
                    let material = match self.library.get(&name) {
                        Some(material) => Arc::clone(material),
                        None => {
                            log::debug!("Material '{}' not in any mtllib; using white", name);
                            let material = Arc::new(SourceMaterial::new(name.clone(), [1.0; 4]));
                            self.library.insert(name, Arc::clone(&material));
                            material
                        }
                    };
                    self.object().use_material(material);
                }
                "f" => self.face(args, line_no)?,
                _ => {}
            }
        }

        if let Some(object) = self.current.take().and_then(ObjectBuilder::finish) {
            self.objects.push(object);
        }
        Ok(self.objects)
    }

    fn start_object(&mut self, name: &str) {
        let previous = self.current.replace(ObjectBuilder::new(name));
        if let Some(object) = previous.and_then(ObjectBuilder::finish) {
            self.objects.push(object);
        }
    }

    /// Current object; faces before any `o`/`g` go to one named after the file
    fn object(&mut self) -> &mut ObjectBuilder {
        if self.current.is_none() {
            let name = self.object_name();
            self.current = Some(ObjectBuilder::new(&name));
        }
        self.current.get_or_insert_with(|| ObjectBuilder::new("object"))
    }

    fn load_library(&mut self, file: &str) {
        let path = self.path.parent().unwrap_or_else(|| Path::new("")).join(file);
        let loaded = read(&path).and_then(|text| parse_mtl_with(&text, &path, &mut self.textures));
        match loaded {
            Ok(materials) => {
                log::debug!("Loaded {} materials from {}", materials.len(), path.display());
                self.library.extend(materials);
            }
            Err(e) => log::warn!("Skipping material library: {}", e),
        }
    }

    fn resolve(&self, raw: &str, count: usize, line: usize) -> Result<usize> {
        let index: i64 = raw
            .parse()
            .map_err(|_| source_error(self.path, line, format!("invalid index '{}'", raw)))?;
        let resolved = if index < 0 { count as i64 + index } else { index - 1 };
        if resolved < 0 || resolved as usize >= count {
            return Err(source_error(
                self.path,
                line,
                format!("index {} out of range ({} available)", index, count),
            ));
        }
        Ok(resolved as usize)
    }

    fn corner(&self, token: &str, line: usize) -> Result<Corner> {
        let mut parts = token.split('/');
        let position = self.resolve(parts.next().unwrap_or_default(), self.positions.len(), line)?;
        let uv = match parts.next() {
            Some(raw) if !raw.is_empty() => Some(self.resolve(raw, self.uvs.len(), line)?),
            _ => None,
        };
        let normal = match parts.next() {
            Some(raw) if !raw.is_empty() => Some(self.resolve(raw, self.normals.len(), line)?),
            _ => None,
        };
        Ok((position, uv, normal))
    }

    fn face(&mut self, args: &[&str], line: usize) -> Result<()> {
        if args.len() < 3 {
            return Err(source_error(self.path, line, "face needs at least 3 corners"));
        }
        let corners = args
            .iter()
            .map(|token| self.corner(token, line))
            .collect::<Result<Vec<_>>>()?;

        if self.object().submesh.is_none() {
            let material = self
                .default_material
                .get_or_insert_with(|| Arc::new(SourceMaterial::new("default", [1.0; 4])))
                .clone();
            self.object().use_material(material);
        }

        let indices: Vec<u32> = corners.iter().map(|&c| self.vertex(c)).collect();
        let object = self.object();
        let Some(submesh) = object.submesh else {
            return Ok(());
        };
        let triangles = &mut object.mesh.submeshes[submesh];
        for i in 1..indices.len() - 1 {
            // Swapped winding; the encoder swaps it back
            triangles.extend_from_slice(&[indices[0], indices[i + 1], indices[i]]);
        }
        Ok(())
    }

    /// Index of the object-local vertex for an OBJ corner
    fn vertex(&mut self, corner: Corner) -> u32 {
        let (position, uv, normal) = corner;
        let position = self.positions[position];
        let uv = uv.map(|i| self.uvs[i]);
        let normal = normal.map(|i| self.normals[i]);

        let object = self.object();
        if let Some(&index) = object.corners.get(&corner) {
            return index;
        }
        let index = object.mesh.positions.len() as u32;
        object.mesh.positions.push(position);
        object.mesh.uvs.push(uv.unwrap_or(Vec2::ZERO));
        object.mesh.normals.push(normal.unwrap_or(Vec3::Y));
        object.has_uvs |= uv.is_some();
        object.has_normals |= normal.is_some();
        object.corners.insert(corner, index);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE_FACES: &str = "\
o Box
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl Red
f 1/1/1 2/2/1 3/3/1 4/4/1
usemtl Blue
f 1/1/1 3/3/1 4/4/1
usemtl Red
f -4/-4/-1 -3/-3/-1 -2/-2/-1
";

    #[test]
    fn test_groups_submeshes_by_material() {
        let objects = parse_obj(CUBE_FACES, "box.obj").unwrap();
        assert_eq!(objects.len(), 1);
        let object = &objects[0];
        assert_eq!(object.name, "Box");
        assert_eq!(object.materials.len(), 2);
        assert_eq!(object.materials[0].name, "Red");

        let mesh = object.mesh.as_ref().unwrap();
        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(mesh.submeshes[0].len(), 9);
        assert_eq!(mesh.submeshes[1].len(), 3);
        assert_eq!(mesh.submeshes[0][..3], [0, 2, 1]);
        assert_eq!(mesh.normals[0], Vec3::new(0.0, 0.0, -1.0));
        assert!(mesh.has_uvs());
    }

    #[test]
    fn test_objects_and_default_material() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\no Second\nf 1 2 3\n";
        let objects = parse_obj(text, "dir/tri.obj").unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].name, "tri");
        assert_eq!(objects[1].name, "Second");
        assert!(Arc::ptr_eq(&objects[0].materials[0], &objects[1].materials[0]));

        let mesh = objects[0].mesh.as_ref().unwrap();
        assert!(!mesh.has_uvs());
        assert!(mesh.normals.is_empty());
    }

    #[test]
    fn test_bad_index_reports_line() {
        let err = parse_obj("v 0 0 0\nf 1 2 3\n", "bad.obj").unwrap_err();
        assert!(matches!(err, ExportError::Source { line: 2, .. }));
    }

    #[test]
    fn test_mtl_colors_and_maps() {
        let mtl = "newmtl Wood\nKd 0.5 0.25 1\nd 0.5\nmap_Kd -s 1 1 1 tex/wood.png\nnewmtl Glass\nTr 0.75\n";
        let materials = parse_mtl(mtl, "assets/scene.mtl").unwrap();
        let wood = &materials["Wood"];
        assert_eq!(wood.color, [0.5, 0.25, 1.0, 0.5]);
        let texture = wood.texture.as_ref().unwrap();
        assert_eq!(texture.name, "wood");
        assert_eq!(texture.path, Path::new("assets/tex/wood.png"));
        assert_eq!(materials["Glass"].color[3], 0.25);
    }
}
