use parking_lot::Mutex;
use scenic_graph::prelude::*;
use scenic_graph::{MaterialSlot, MeshPrimitive, ResourceKind, Vertex};
use scenic_math::{Transform, Vec3};
use std::sync::Arc;

/// Records what it sees, in order
struct Recorder {
    log: Arc<Mutex<Vec<String>>>,
}

impl Behavior for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn on_realize(&mut self, _node: NodeId) {
        self.log.lock().push("realize".into());
    }

    fn on_message(&mut self, message: &Message, ctx: &mut NodeContext<'_>) {
        if let Message::Custom { topic, .. } = message {
            self.log.lock().push(format!("msg:{}", topic));
        } else {
            self.log.lock().push(format!("builtin x={}", ctx.transform.position.x));
        }
    }

    fn update(&mut self, _dt: f32, ctx: &mut NodeContext<'_>) {
        self.log.lock().push(format!("update x={}", ctx.transform.position.x));
        ctx.transform.position.y += 1.0;
    }

    fn on_release(&mut self, _node: NodeId) {
        self.log.lock().push("release".into());
    }
}

fn custom(topic: &str) -> Message {
    Message::Custom {
        topic: topic.into(),
        payload: String::new(),
    }
}

#[test]
fn mailbox_drains_in_order_before_update() {
    let (mut graph, _) = SceneGraph::headless();
    let log = Arc::new(Mutex::new(Vec::new()));
    let node = graph.create_node("actor");
    graph
        .add_component(node, Component::Behavior(Box::new(Recorder { log: log.clone() })))
        .unwrap();
    graph.attach(node, graph.root()).unwrap();

    graph.post(node, custom("a")).unwrap();
    graph.post(node, Message::SetPosition(Vec3::new(3.0, 0.0, 0.0))).unwrap();
    graph.post(node, custom("b")).unwrap();
    assert_eq!(graph.pending_messages(node), 3);

    graph.tick(0.1);

    assert_eq!(
        *log.lock(),
        vec!["realize", "msg:a", "builtin x=3", "msg:b", "update x=3"]
    );
    assert_eq!(graph.pending_messages(node), 0);
    assert_eq!(graph.transform(node).unwrap().position, Vec3::new(3.0, 1.0, 0.0));

    graph.detach(node).unwrap();
    assert_eq!(log.lock().last().map(String::as_str), Some("release"));
}

#[test]
fn hidden_parent_hides_children() {
    let (mut graph, backend) = SceneGraph::headless();
    let group = graph.create_node("group");
    let cam = graph.create_node("cam");
    graph.add_component(cam, Component::Camera(CameraParams::default())).unwrap();
    graph.attach(cam, group).unwrap();
    graph.attach(group, graph.root()).unwrap();

    graph.post(group, Message::SetVisible(false)).unwrap();
    graph.tick(0.0);

    let resource = graph.components(cam)[0].resource().unwrap();
    assert!(!backend.get(resource).unwrap().visible);
    assert!(graph.is_visible(cam));
}

#[test]
fn component_added_to_live_node_is_realized() {
    let (mut graph, backend) = SceneGraph::headless();
    let node = graph.create_node("late");
    graph.attach(node, graph.root()).unwrap();
    graph.add_component(node, Component::Light(LightParams::default())).unwrap();
    assert_eq!(backend.count(ResourceKind::Light), 1);
}

#[test]
fn world_bounds_cover_meshes() {
    let (mut graph, _) = SceneGraph::headless();
    let vertices = vec![
        Vertex { position: [0.0, 0.0, 0.0], ..Vertex::default() },
        Vertex { position: [1.0, 1.0, 1.0], ..Vertex::default() },
        Vertex { position: [1.0, 0.0, 0.0], ..Vertex::default() },
    ];
    let mesh = Arc::new(MeshData::new(
        vertices,
        vec![MeshPrimitive { material: None, indices: vec![0, 1, 2] }],
        false,
    ));
    let slot = MaterialSlot { name: "none".into(), global_index: None, material: None };

    let node = graph.create_node("box");
    graph
        .set_transform(node, Transform::from_position(Vec3::new(0.0, 0.0, -5.0)))
        .unwrap();
    graph
        .add_component(node, Component::Mesh(MeshInstance::new(mesh, vec![slot])))
        .unwrap();
    graph.attach(node, graph.root()).unwrap();

    let bounds = graph.world_bounds(graph.root());
    assert_eq!(bounds.min, Vec3::new(0.0, 0.0, -5.0));
    assert_eq!(bounds.max, Vec3::new(1.0, 1.0, -4.0));
    assert!(graph.render_tree(graph.root()).contains("box [mesh]"));
}
