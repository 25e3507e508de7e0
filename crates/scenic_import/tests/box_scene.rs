use scenic_format::convert::position_from_document;
use scenic_graph::prelude::*;
use scenic_graph::ResourceKind;
use scenic_import::{DecodeOptions, LoadError, SceneLoader};
use scenic_math::Vec3;
use std::cell::Cell;

const CUBE_TRIANGLES: [[u32; 3]; 12] = [
    [0, 1, 2], [0, 2, 3],
    [4, 6, 5], [4, 7, 6],
    [0, 4, 5], [0, 5, 1],
    [1, 5, 6], [1, 6, 2],
    [2, 6, 7], [2, 7, 3],
    [3, 7, 4], [3, 4, 0],
];

fn box_document() -> String {
    let vertices = "0,0,0, 1,0,0, 1,1,0, 0,1,0, 0,0,1, 1,0,1, 1,1,1, 0,1,1";
    let uvs = "0,0, 1,0, 1,1, 0,1, 0,0, 1,0, 1,1, 0,1";
    let faces: Vec<String> = CUBE_TRIANGLES
        .iter()
        .map(|[a, b, c]| {
            let corners = format!("{a},{c},{b}");
            format!("42, {corners}, 0, {corners}, {corners}")
        })
        .collect();

    format!(
        r#"{{
            "metadata": {{ "formatVersion": 3.1, "type": "scene" }},
            "urlBaseType": "relativeToScene",
            "objects": {{
                "Box": {{
                    "geometry": "Box_geo",
                    "materials": ["Mat"],
                    "position": [1, 2, -3],
                    "rotation": [0, 0, 0],
                    "scale": [1, 1, 1],
                    "visible": true
                }}
            }},
            "geometries": {{ "Box_geo": {{ "type": "embedded_mesh", "id": "Box_emb" }} }},
            "materials": {{
                "Mat": {{ "type": "MeshBasicMaterial", "parameters": {{ "color": 16711680, "opacity": 1 }} }}
            }},
            "embeds": {{
                "Box_emb": {{
                    "metadata": {{ "formatVersion": 3 }},
                    "scale": 1.0,
                    "materials": [],
                    "vertices": [{vertices}],
                    "normals": [{vertices}],
                    "uvs": [[{uvs}]],
                    "faces": [{faces}],
                    "morphTargets": [],
                    "edges": []
                }}
            }},
            "textures": {{}},
            "cameras": {{}},
            "lights": {{}},
            "defaults": {{ "bgcolor": [0, 0, 0], "bgalpha": 1 }},
            "extension": {{ "ignored": true }}
        }}"#,
        faces = faces.join(",\n")
    )
}

#[test]
fn box_scene_loads_one_red_mesh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.js");
    std::fs::write(&path, box_document()).unwrap();

    let (mut graph, backend) = SceneGraph::headless();
    let root = graph.root();
    let completions = Cell::new(0);
    let scene = SceneLoader::new(DecodeOptions::default())
        .load(&mut graph, root, &path, |graph, scene| {
            completions.set(completions.get() + 1);
            assert!(graph.is_realized(scene.root));
        })
        .unwrap();

    assert_eq!(completions.get(), 1);
    assert!(scene.issues.is_clean());
    assert!(scene.camera.is_none());

    let node = graph.find_in(scene.root, "Box").unwrap();
    assert!(graph.is_realized(node));
    let Component::Mesh(instance) = graph.components(node)[0].component() else {
        panic!("Box should carry a mesh");
    };
    assert_eq!(instance.mesh.vertex_count(), 8);
    assert_eq!(instance.mesh.triangle_count(), 12);
    assert!(instance.mesh.has_uvs);

    let primitive = &instance.mesh.primitives[0];
    let material = instance.material_for(primitive).unwrap();
    assert_eq!(material.color, [1.0, 0.0, 0.0]);

    // Source winding comes back out
    assert_eq!(primitive.indices[..6], [0, 1, 2, 0, 2, 3]);

    let position = graph.transform(node).unwrap().position;
    assert_eq!(position, Vec3::new(1.0, 2.0, -3.0));
    assert_eq!(position_from_document(position.to_array()), Vec3::new(1.0, 2.0, 3.0));

    assert_eq!(backend.count(ResourceKind::Mesh), 1);
    let resource = graph.components(node)[0].resource().unwrap();
    assert_eq!(graph.pick(resource), Some(node));

    let bounds = scene.bounds(&graph);
    assert_eq!(bounds.min, Vec3::new(1.0, 2.0, -3.0));
    assert_eq!(bounds.max, Vec3::new(2.0, 3.0, -2.0));
}

#[test]
fn malformed_document_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.js");
    let text = box_document();
    std::fs::write(&path, &text[..text.len() / 2]).unwrap();

    let (mut graph, backend) = SceneGraph::headless();
    let root = graph.root();
    let nodes_before = graph.node_count();
    let mut called = false;
    let result = SceneLoader::default().load(&mut graph, root, &path, |_, _| called = true);

    assert!(matches!(result, Err(LoadError::Format(_))));
    assert!(!called);
    assert_eq!(graph.node_count(), nodes_before);
    assert_eq!(backend.live_count(), 0);
}

#[test]
fn missing_file_is_a_read_error() {
    let (mut graph, _) = SceneGraph::headless();
    let root = graph.root();
    let result = SceneLoader::default().load(&mut graph, root, "/nonexistent/scene.js", |_, _| {});
    assert!(matches!(result, Err(LoadError::Read { .. })));
}

#[test]
fn missing_material_keeps_node() {
    let text = box_document().replace(r#""materials": ["Mat"]"#, r#""materials": ["Mat", "Ghost"]"#);
    let doc = scenic_format::parse_document_str(&text).unwrap();

    let (mut graph, _) = SceneGraph::headless();
    let root = graph.root();
    let scene = SceneLoader::default()
        .load_document(&mut graph, root, "inline", &doc, |_, _| {})
        .unwrap();

    assert_eq!(scene.issues.len(), 1);
    let node = graph.find("Box").unwrap();
    let Component::Mesh(instance) = graph.components(node)[0].component() else {
        panic!("Box should carry a mesh");
    };
    assert_eq!(instance.slots.len(), 2);
    assert!(instance.slots[1].material.is_none());
}

#[test]
fn detached_parent_defers_realization() {
    let doc = scenic_format::parse_document_str(&box_document()).unwrap();
    let (mut graph, backend) = SceneGraph::headless();
    let holder = graph.create_node("holder");

    let scene = SceneLoader::default()
        .load_document(&mut graph, holder, "inline", &doc, |_, _| {})
        .unwrap();
    assert!(!graph.is_realized(scene.root));
    assert_eq!(backend.live_count(), 0);

    graph.attach(holder, graph.root()).unwrap();
    assert_eq!(backend.count(ResourceKind::Mesh), 1);
}
