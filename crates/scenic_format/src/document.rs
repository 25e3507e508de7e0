//! Document schema
//!
//! One [`Document`] describes one exported scene. Every root mapping is
//! required; unknown keys anywhere are ignored so newer producers can add
//! fields without breaking older readers. Mappings are [`IndexMap`]s because
//! emission order carries meaning: face records cite materials by their
//! position in the `materials` table.

use crate::color::{self, Color};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Format version written by the encoder
pub const FORMAT_VERSION: f64 = 3.1;

/// Format version written into each embed's own metadata block
pub const EMBED_FORMAT_VERSION: f64 = 3.0;

/// Major version this crate reads
pub const SUPPORTED_MAJOR_VERSION: u32 = 3;

/// Document kind tag for whole scenes
pub const SCENE_KIND: &str = "scene";

/// Geometry type tag for inline meshes
pub const EMBEDDED_MESH: &str = "embedded_mesh";

/// Debug color the exporter writes into embedded material entries (`0x969696`)
pub const DEBUG_COLOR: u32 = 9_868_950;

/// Root of a serialized scene
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub metadata: Metadata,
    /// How relative URLs are resolved by the consumer; carried through untouched
    #[serde(rename = "urlBaseType", default, skip_serializing_if = "Option::is_none")]
    pub url_base_type: Option<String>,
    pub objects: IndexMap<String, ObjectRecord>,
    pub geometries: IndexMap<String, GeometryRecord>,
    pub materials: IndexMap<String, MaterialRecord>,
    pub embeds: IndexMap<String, EmbedRecord>,
    pub textures: IndexMap<String, TextureRecord>,
    pub cameras: IndexMap<String, CameraRecord>,
    pub lights: IndexMap<String, LightRecord>,
    pub defaults: Defaults,
}

impl Document {
    /// Empty scene document at the current format version
    pub fn new() -> Self {
        Self {
            metadata: Metadata::default(),
            url_base_type: None,
            objects: IndexMap::new(),
            geometries: IndexMap::new(),
            materials: IndexMap::new(),
            embeds: IndexMap::new(),
            textures: IndexMap::new(),
            cameras: IndexMap::new(),
            lights: IndexMap::new(),
            defaults: Defaults::default(),
        }
    }

    /// Position of a material in the global `materials` table
    pub fn material_index(&self, name: &str) -> Option<usize> {
        self.materials.get_index_of(name)
    }

    /// Depth-first walk over every object record, nested children included.
    ///
    /// The callback receives the record's key and its nesting depth.
    pub fn visit_objects<F>(&self, mut f: F)
    where
        F: FnMut(&str, &ObjectRecord, usize),
    {
        fn walk<F>(objects: &IndexMap<String, ObjectRecord>, depth: usize, f: &mut F)
        where
            F: FnMut(&str, &ObjectRecord, usize),
        {
            for (name, object) in objects {
                f(name, object, depth);
                walk(&object.children, depth + 1, f);
            }
        }
        walk(&self.objects, 0, &mut f);
    }

    /// Number of object records including nested children
    pub fn object_count(&self) -> usize {
        let mut count = 0;
        self.visit_objects(|_, _, _| count += 1);
        count
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Document header
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub format_version: f64,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

fn default_kind() -> String {
    SCENE_KIND.to_string()
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            kind: default_kind(),
            generated_by: None,
            source_file: None,
        }
    }
}

/// One placed object
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Key into `geometries`; absent for pure grouping nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<String>,
    /// Keys into `materials`, one per submesh, duplicates removed
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub position: [f32; 3],
    /// Radians, Z negated
    #[serde(default, deserialize_with = "euler_triple")]
    pub rotation: [f32; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub children: IndexMap<String, ObjectRecord>,
}

impl Default for ObjectRecord {
    fn default() -> Self {
        Self {
            geometry: None,
            materials: Vec::new(),
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: unit_scale(),
            visible: true,
            children: IndexMap::new(),
        }
    }
}

/// Reads the first three components of a rotation array.
///
/// Some exporters wrote four (axis and angle); only x, y and z are used.
fn euler_triple<'de, D>(deserializer: D) -> Result<[f32; 3], D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values = Vec::<f32>::deserialize(deserializer)?;
    if values.len() > 3 {
        log::debug!("Rotation has {} components; ignoring {:?}", values.len(), &values[3..]);
    }
    let mut rotation = [0.0; 3];
    for (slot, value) in rotation.iter_mut().zip(values) {
        *slot = value;
    }
    Ok(rotation)
}

fn unit_scale() -> [f32; 3] {
    [1.0; 3]
}

fn default_true() -> bool {
    true
}

fn default_one() -> f32 {
    1.0
}

/// Entry of the `geometries` table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometryRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Where a geometry record points
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryRef<'a> {
    /// Key into `embeds`
    Embedded(&'a str),
    /// Relative URL of a separate mesh file
    External(&'a str),
    /// Neither an embed id nor a URL
    Invalid,
}

impl GeometryRecord {
    pub fn embedded(id: impl Into<String>) -> Self {
        Self {
            kind: EMBEDDED_MESH.to_string(),
            id: Some(id.into()),
            url: None,
        }
    }

    pub fn external(kind: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            url: Some(url.into()),
        }
    }

    pub fn reference(&self) -> GeometryRef<'_> {
        if self.kind == EMBEDDED_MESH {
            return match &self.id {
                Some(id) => GeometryRef::Embedded(id),
                None => GeometryRef::Invalid,
            };
        }
        match (&self.url, &self.id) {
            (Some(url), _) => GeometryRef::External(url),
            // Some producers omit the tag but still point at an embed
            (None, Some(id)) => GeometryRef::Embedded(id),
            (None, None) => GeometryRef::Invalid,
        }
    }
}

/// Inline mesh payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedRecord {
    #[serde(default)]
    pub metadata: EmbedMetadata,
    #[serde(default = "default_one")]
    pub scale: f32,
    /// Legacy per-embed material entries; readers ignore them
    #[serde(default)]
    pub materials: Vec<EmbeddedMaterial>,
    /// Flattened position triples
    #[serde(default)]
    pub vertices: Vec<f32>,
    /// Flattened normal triples
    #[serde(default)]
    pub normals: Vec<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<u32>,
    /// One flattened pair list per UV layer
    #[serde(default)]
    pub uvs: Vec<Vec<f32>>,
    /// Face stream, see [`crate::face`]
    #[serde(default)]
    pub faces: Vec<i64>,
    #[serde(default)]
    pub morph_targets: Vec<serde_json::Value>,
    #[serde(default)]
    pub edges: Vec<serde_json::Value>,
}

impl Default for EmbedRecord {
    fn default() -> Self {
        Self {
            metadata: EmbedMetadata::default(),
            scale: 1.0,
            materials: Vec::new(),
            vertices: Vec::new(),
            normals: Vec::new(),
            colors: Vec::new(),
            uvs: Vec::new(),
            faces: Vec::new(),
            morph_targets: Vec::new(),
            edges: Vec::new(),
        }
    }
}

impl EmbedRecord {
    /// Factor applied to stored positions on read.
    ///
    /// Positions are stored multiplied by `scale`, so readers divide. A zero
    /// or non-finite scale reads as 1.
    pub fn position_factor(&self) -> f32 {
        if self.scale.is_finite() && self.scale != 0.0 {
            1.0 / self.scale
        } else {
            1.0
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn normal_count(&self) -> usize {
        self.normals.len() / 3
    }

    /// Number of UV layers the face stream is encoded against.
    ///
    /// An embed always declares at least one layer, even when it is empty.
    pub fn uv_layer_count(&self) -> usize {
        self.uvs.len().max(1)
    }

    /// Number of UV pairs in a layer
    pub fn uv_count(&self, layer: usize) -> usize {
        self.uvs.get(layer).map_or(0, |l| l.len() / 2)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedMetadata {
    pub format_version: f64,
}

impl Default for EmbedMetadata {
    fn default() -> Self {
        Self {
            format_version: EMBED_FORMAT_VERSION,
        }
    }
}

/// Debug material entry carried inside an embed
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddedMaterial {
    #[serde(rename = "DbgColor")]
    pub dbg_color: u32,
    #[serde(rename = "DbgIndex")]
    pub dbg_index: i64,
    #[serde(rename = "DbgName")]
    pub dbg_name: String,
    pub color_ambient: [f32; 3],
    pub color_diffuse: [f32; 3],
    pub color_specular: [f32; 3],
    pub specular_coef: f32,
    pub vertex_colors: bool,
    pub opacity: f32,
}

impl Default for EmbeddedMaterial {
    fn default() -> Self {
        Self {
            dbg_color: DEBUG_COLOR,
            dbg_index: -1,
            dbg_name: String::new(),
            color_ambient: [1.0; 3],
            color_diffuse: [1.0; 3],
            color_specular: [1.0; 3],
            specular_coef: 0.1,
            vertex_colors: false,
            opacity: 1.0,
        }
    }
}

/// Shading model of a material
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    #[default]
    #[serde(rename = "MeshBasicMaterial")]
    Basic,
    #[serde(rename = "MeshLambertMaterial")]
    Lambert,
    #[serde(rename = "MeshPhongMaterial")]
    Phong,
    /// Any tag this crate does not know; rendered as basic
    #[serde(other)]
    Unknown,
}

/// Entry of the `materials` table
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    #[serde(rename = "type", default)]
    pub kind: MaterialKind,
    #[serde(default)]
    pub parameters: MaterialParameters,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    /// Key into `textures`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,
    #[serde(default = "default_one")]
    pub opacity: f32,
}

impl Default for MaterialParameters {
    fn default() -> Self {
        Self {
            color: None,
            map: None,
            opacity: 1.0,
        }
    }
}

/// Entry of the `textures` table
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextureRecord {
    /// Relative to the document's folder
    pub url: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionKind {
    #[default]
    Perspective,
    Ortho,
}

/// Entry of the `cameras` table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    #[serde(rename = "type", default)]
    pub kind: ProjectionKind,
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_aspect")]
    pub aspect: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub target: [f32; 3],
}

fn default_fov() -> f32 {
    50.0
}

fn default_aspect() -> f32 {
    4.0 / 3.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    1000.0
}

impl Default for CameraRecord {
    fn default() -> Self {
        Self {
            kind: ProjectionKind::Perspective,
            fov: default_fov(),
            aspect: default_aspect(),
            near: default_near(),
            far: default_far(),
            position: [0.0; 3],
            target: [0.0; 3],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightKind {
    #[default]
    Directional,
    Point,
    Spot,
    Area,
}

/// Entry of the `lights` table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightRecord {
    #[serde(rename = "type", default)]
    pub kind: LightKind,
    #[serde(default)]
    pub color: Color,
    #[serde(default = "default_one")]
    pub intensity: f32,
    /// Directional and spot lights
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<[f32; 3]>,
    /// Point, spot and area lights
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f32; 3]>,
    /// Range of point and spot lights
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    /// Spot cone half angle, radians
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cut_off_angle: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beam_width: Option<f32>,
}

impl Default for LightRecord {
    fn default() -> Self {
        Self {
            kind: LightKind::Directional,
            color: Color::Rgb([1.0; 3]),
            intensity: 1.0,
            direction: None,
            position: None,
            radius: None,
            cut_off_angle: None,
            beam_width: None,
        }
    }
}

/// Scene-wide fallbacks
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default, deserialize_with = "color::deserialize_lenient", skip_serializing_if = "Option::is_none")]
    pub bgcolor: Option<Color>,
    #[serde(default = "default_one")]
    pub bgalpha: f32,
    /// Key into `cameras`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    #[serde(default, deserialize_with = "color::deserialize_lenient", skip_serializing_if = "Option::is_none")]
    pub fog: Option<Color>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            bgcolor: Some(Color::Rgb([0.0; 3])),
            bgalpha: 1.0,
            camera: None,
            fog: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "metadata": { "formatVersion": 3.1, "type": "scene" },
        "objects": {}, "geometries": {}, "materials": {}, "embeds": {},
        "textures": {}, "cameras": {}, "lights": {}, "defaults": {}
    }"#;

    #[test]
    fn test_minimal_document() {
        let doc: Document = serde_json::from_str(MINIMAL).unwrap();
        assert_eq!(doc.metadata.format_version, 3.1);
        assert_eq!(doc.metadata.kind, "scene");
        assert_eq!(doc.defaults.bgalpha, 1.0);
        assert!(doc.objects.is_empty());
    }

    #[test]
    fn test_missing_root_key_is_rejected() {
        let text = r#"{
            "metadata": { "formatVersion": 3.1 },
            "objects": {}, "geometries": {}, "materials": {}, "embeds": {},
            "textures": {}, "cameras": {}, "lights": {}
        }"#;
        assert!(serde_json::from_str::<Document>(text).is_err());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let text = r#"{
            "metadata": { "formatVersion": 3.1, "type": "scene", "exporter": "x" },
            "animations": [1, 2, 3],
            "objects": { "A": { "geometry": "g", "quaternion": [0, 0, 0, 1] } },
            "geometries": {}, "materials": {}, "embeds": {},
            "textures": {}, "cameras": {}, "lights": {}, "defaults": {}
        }"#;
        let doc: Document = serde_json::from_str(text).unwrap();
        let a = &doc.objects["A"];
        assert_eq!(a.scale, [1.0; 3]);
        assert!(a.visible);
    }

    #[test]
    fn test_rotation_extra_components_ignored() {
        let a: ObjectRecord = serde_json::from_str(r#"{ "rotation": [-1, 0, 0, -1.54] }"#).unwrap();
        assert_eq!(a.rotation, [-1.0, 0.0, 0.0]);

        let b: ObjectRecord = serde_json::from_str(r#"{ "rotation": [0.5] }"#).unwrap();
        assert_eq!(b.rotation, [0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_geometry_reference() {
        assert_eq!(
            GeometryRecord::embedded("Box_emb").reference(),
            GeometryRef::Embedded("Box_emb")
        );
        assert_eq!(
            GeometryRecord::external("ascii", "box.js").reference(),
            GeometryRef::External("box.js")
        );
        let broken = GeometryRecord {
            kind: EMBEDDED_MESH.into(),
            id: None,
            url: None,
        };
        assert_eq!(broken.reference(), GeometryRef::Invalid);
    }

    #[test]
    fn test_unknown_material_kind() {
        let m: MaterialRecord =
            serde_json::from_str(r#"{ "type": "MeshToonMaterial", "parameters": { "color": 255 } }"#).unwrap();
        assert_eq!(m.kind, MaterialKind::Unknown);
        assert_eq!(m.parameters.opacity, 1.0);
    }

    #[test]
    fn test_legacy_bgcolor_array() {
        let d: Defaults = serde_json::from_str(r#"{ "bgcolor": ["0,0,0"], "fog": "1,0,0" }"#).unwrap();
        assert_eq!(d.bgcolor, Some(Color::Joined("0,0,0".into())));
        assert_eq!(d.fog.map(|c| c.to_rgb()), Some([1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_light_extras() {
        let l: LightRecord = serde_json::from_str(
            r#"{ "type": "spot", "color": [1,1,1], "cutOffAngle": 0.785, "beamWidth": 0.75, "radius": 200 }"#,
        )
        .unwrap();
        assert_eq!(l.kind, LightKind::Spot);
        assert_eq!(l.cut_off_angle, Some(0.785));
        assert_eq!(l.radius, Some(200.0));
        assert_eq!(l.intensity, 1.0);
    }

    #[test]
    fn test_material_index_follows_table_order() {
        let mut doc = Document::new();
        doc.materials.insert("B".into(), MaterialRecord::default());
        doc.materials.insert("A".into(), MaterialRecord::default());
        assert_eq!(doc.material_index("B"), Some(0));
        assert_eq!(doc.material_index("A"), Some(1));
        assert_eq!(doc.material_index("C"), None);
    }

    #[test]
    fn test_nested_object_count() {
        let mut parent = ObjectRecord::default();
        parent.children.insert("child".into(), ObjectRecord::default());
        let mut doc = Document::new();
        doc.objects.insert("parent".into(), parent);
        doc.objects.insert("other".into(), ObjectRecord::default());
        assert_eq!(doc.object_count(), 3);
    }
}
