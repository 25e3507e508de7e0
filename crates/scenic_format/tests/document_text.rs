use scenic_format::prelude::*;
use scenic_format::{parse_document_str, Color, FaceRecord};

/// Exporter output before quote normalization
const SINGLE_QUOTED: &str = "{
    'metadata': { 'formatVersion': 3.1, 'type': 'scene' },
    'urlBaseType': 'relativeToScene',
    'objects': {
        'Box': {
            'geometry': 'Box_geo',
            'materials': ['Mat'],
            'position': [1, 2, -3],
            'rotation': [0, 0, 0],
            'scale': [1, 1, 1],
            'visible': true
        }
    },
    'geometries': { 'Box_geo': { 'type': 'embedded_mesh', 'id': 'Box_emb' } },
    'materials': {
        'Mat': { 'type': 'MeshBasicMaterial', 'parameters': { 'color': 16711680, 'map': 'wood', 'opacity': 1 } }
    },
    'textures': { 'wood': { 'url': 'wood.png' } },
    'embeds': {
        'Box_emb': {
            'metadata': { 'formatVersion': 3 },
            'scale': 1.0,
            'materials': [{
                'DbgColor': 9868950, 'DbgIndex': -1, 'DbgName': 'Mat',
                'colorAmbient': [1, 0, 0], 'colorDiffuse': [1, 0, 0], 'colorSpecular': [1, 0, 0],
                'specularCoef': 0.1, 'vertexColors': false, 'opacity': 1
            }],
            'vertices': [0,0,0, 1,0,0, 0,1,0],
            'normals': [0,0,1, 0,0,1, 0,0,1],
            'uvs': [[0,0, 1,0, 0,1]],
            'faces': [42, 0,2,1, 0, 0,2,1, 0,2,1],
            'morphTargets': [],
            'edges': []
        }
    },
    'cameras': {
        'Main': { 'type': 'perspective', 'fov': 60, 'aspect': 1.5, 'near': 0.3, 'far': 1000,
                  'position': [0, 1, 10], 'target': [0, 0, 0] }
    },
    'lights': {
        'Sun': { 'type': 'directional', 'color': [1, 1, 0.5], 'intensity': 0.8, 'direction': [0, -1, 0] }
    },
    'defaults': { 'bgcolor': ['0,0,0'], 'bgalpha': 1, 'camera': 'Main', 'fog': '0.5,0.5,0.5' }
}";

/// Layout written by other exporters: packed float-bit colors, sparse cameras,
/// no normals, quads and separate UV indices
const FOREIGN: &str = r#"{
"metadata": { "formatVersion": 3, "type": "scene", "sourceFile": "box.max", "generatedBy": "max exporter" },
"urlBaseType": "",
"lights": {
    "Omni001": { "type": "point", "intensity": 1, "color": 1065353216, "position": [0, 0, 0], "radius": 200 }
},
"cameras": {
    "Camera001": { "type": "perspective", "position": [0, 0, 0], "fov": 0.602, "target": [0, 0, 0] }
},
"materials": {
    "01 - Default": { "type": "MeshLambertMaterial",
        "parameters": { "color": 1058444951, "shading": "flat", "specularCoef": 0.145, "opacity": 1 } }
},
"objects": {
    "Box001": { "position": [-14.9, -11.5, 0.0], "rotation": [0, 0, 0], "scale": [1, 1, 1],
                "materials": ["01 - Default"], "geometry": "Box001_geo", "visible": true }
},
"textures": {},
"geometries": { "Box001_geo": { "type": "embedded_mesh", "id": "Box001_emb" } },
"embeds": {
    "Box001_emb": {
        "metadata": { "formatVersion": 3 },
        "scale": 1.0,
        "materials": [],
        "vertices": [0,0,0, 1,0,0, 1,1,0, 0,1,0],
        "uvs": [[0,0, 1,0, 1,1, 0,1]],
        "faces": [11, 0,1,2,3, 0, 3,2,1,0]
    }
},
"defaults": {}
}"#;

#[test]
fn parses_single_quoted_export() {
    let doc = parse_document_str(SINGLE_QUOTED).unwrap();

    assert_eq!(doc.url_base_type.as_deref(), Some("relativeToScene"));
    assert_eq!(doc.objects["Box"].position, [1.0, 2.0, -3.0]);
    assert_eq!(doc.materials["Mat"].kind, MaterialKind::Basic);
    assert_eq!(doc.materials["Mat"].parameters.color, Some(Color::Packed(16711680)));
    assert_eq!(doc.embeds["Box_emb"].materials[0].dbg_name, "Mat");
    assert_eq!(doc.lights["Sun"].kind, LightKind::Directional);
    assert_eq!(doc.defaults.camera.as_deref(), Some("Main"));
    assert_eq!(doc.defaults.bgcolor.as_ref().map(Color::to_rgb), Some([0.0, 0.0, 0.0]));
    assert!(doc.validate().is_clean());
}

#[test]
fn parses_foreign_layout() {
    let doc = parse_document_str(FOREIGN).unwrap();

    assert_eq!(doc.metadata.source_file.as_deref(), Some("box.max"));
    assert_eq!(doc.materials["01 - Default"].kind, MaterialKind::Lambert);
    let camera = &doc.cameras["Camera001"];
    assert_eq!(camera.kind, ProjectionKind::Perspective);
    assert!(camera.near > 0.0 && camera.far > camera.near);
    assert_eq!(doc.lights["Omni001"].radius, Some(200.0));

    let embed = &doc.embeds["Box001_emb"];
    assert!(embed.normals.is_empty());
    let faces: Vec<FaceRecord> = FaceReader::new(&embed.faces, embed.uv_layer_count())
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(faces.len(), 1);
    assert!(faces[0].flags.contains(FaceFlags::QUAD));
    assert_eq!(faces[0].vertex_uvs, vec![[3, 2, 1, 0]]);
    assert_eq!(faces[0].vertex_triangles().count(), 2);
    assert!(doc.validate().is_clean());
}

#[test]
fn malformed_text_is_an_error() {
    assert!(parse_document_str("{ 'metadata': ").is_err());
    assert!(parse_document_str("not a document").is_err());
}

#[test]
fn written_text_reads_back_identically() {
    let doc = parse_document_str(SINGLE_QUOTED).unwrap();
    let text = scenic_format::write_document(&doc, "\t").unwrap();
    assert!(!text.contains('\''));
    let back = parse_document_str(&text).unwrap();
    assert_eq!(back, doc);
    // Table order is part of the format
    assert_eq!(back.materials.get_index_of("Mat"), Some(0));
}
