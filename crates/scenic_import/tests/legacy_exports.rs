use scenic_format::parse_document;
use scenic_import::{DecodedScene, NodeContent, SceneDecoder};
use std::path::Path;

fn decode(file: &str) -> DecodedScene {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data");
    let bytes = std::fs::read(dir.join(file)).unwrap();
    let doc = parse_document(&bytes).unwrap();
    SceneDecoder::default().decode(&doc, &dir)
}

fn triangle_count(scene: &DecodedScene) -> usize {
    scene
        .nodes
        .iter()
        .map(|node| match &node.content {
            NodeContent::Mesh(instance) => instance.mesh.triangle_count(),
            _ => 0,
        })
        .sum()
}

#[test]
fn submesh_export_loads() {
    let scene = decode("submesh.js");
    assert_eq!(scene.nodes.len(), 1);
    assert_eq!(scene.mesh_count(), 1);
    assert_eq!(triangle_count(&scene), 4);
}

#[test]
fn box_lights_cams_export_loads() {
    let scene = decode("box_lights_cams.js");
    assert_eq!(scene.nodes.len(), 6);
    assert_eq!(triangle_count(&scene), 12);
}

#[test]
fn four_component_rotations_load() {
    let scene = decode("box_pyramids_lights_cams.js");
    assert_eq!(scene.nodes.len(), 9);
    assert_eq!(scene.mesh_count(), 4);
    assert_eq!(triangle_count(&scene), 36);
    assert!(scene.find("Pyramid002").is_some());
}
