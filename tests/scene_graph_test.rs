use std::sync::Arc;

use cgmath::Vector3;
use scroll_stage::data_structures::{
    instance::Instance,
    scene_graph::{SceneGraph, SceneGraphError},
};

use crate::common::test_utils::{assert_close, triangle_mesh, triangle_model};

mod common;

#[test]
fn should_only_visit_nodes_reachable_from_root() {
    let mut graph = SceneGraph::new();
    let attached = graph.create_mesh_node("attached", vec![Arc::new(triangle_mesh("a"))]);
    let detached = graph.create_mesh_node("detached", vec![Arc::new(triangle_mesh("d"))]);
    graph.add_child(graph.root(), attached).unwrap();

    let mut visited = Vec::new();
    graph.visit_attached(&mut |id, _, _| visited.push(id));

    assert!(visited.contains(&attached));
    assert!(!visited.contains(&detached));
    assert!(graph.is_attached(attached));
    assert!(!graph.is_attached(detached));
}

#[test]
fn should_reparent_instead_of_duplicating() {
    let mut graph = SceneGraph::new();
    let a = graph.create_node("a");
    let b = graph.create_node("b");
    let child = graph.create_node("child");
    graph.add_child(a, child).unwrap();
    graph.add_child(b, child).unwrap();

    assert!(graph.children(a).is_empty());
    assert_eq!(graph.children(b), &[child]);
    assert_eq!(graph.parent(child), Some(b));

    graph.add_child(b, child).unwrap();
    assert_eq!(graph.children(b), &[child]);
}

#[test]
fn should_reject_cycles() {
    let mut graph = SceneGraph::new();
    let a = graph.create_node("a");
    let b = graph.create_node("b");
    graph.add_child(a, b).unwrap();

    assert_eq!(
        graph.add_child(b, a),
        Err(SceneGraphError::Cycle { parent: b, child: a })
    );
    assert_eq!(
        graph.add_child(a, a),
        Err(SceneGraphError::Cycle { parent: a, child: a })
    );
    assert!(graph.add_child(a, graph.root()).is_err());
}

#[test]
fn should_compose_world_transforms() {
    let mut graph = SceneGraph::new();
    let parent = graph.create_node("parent");
    let child = graph.create_node("child");
    graph.node_mut(parent).unwrap().local = Instance::from(Vector3::new(1.0, 0.0, 0.0));
    graph.node_mut(child).unwrap().local = Instance::from(Vector3::new(0.0, 2.0, 0.0));
    graph.add_child(graph.root(), parent).unwrap();
    graph.add_child(parent, child).unwrap();

    let world = graph.world_transform(child).unwrap();
    assert_close(world.position, [1.0, 2.0, 0.0]);

    let mut seen = None;
    graph.visit_attached(&mut |id, _, world| {
        if id == child {
            seen = Some(world.position);
        }
    });
    assert_close(seen.unwrap(), [1.0, 2.0, 0.0]);
}

#[test]
fn should_graft_model_hierarchy() {
    let mut graph = SceneGraph::new();
    let container = graph.create_node("duck");
    let model = triangle_model("duck");

    let grafted = graph.graft(container, &model).unwrap();

    assert_eq!(grafted.len(), 1);
    let top = grafted[0];
    assert_eq!(graph.parent(top), Some(container));
    assert_eq!(graph.children(top).len(), 1);
    let mesh_node = graph.children(top)[0];
    let node = graph.node(mesh_node).unwrap();
    assert!(node.is_drawable());
    assert_close(node.local.position, [0.0, 0.5, 0.0]);
    assert_eq!(model.drawable_count(), 1);
}

#[test]
fn should_reject_graft_under_unknown_parent() {
    let mut graph = SceneGraph::new();
    let mut bigger = SceneGraph::new();
    let far = (0..5).map(|i| bigger.create_node(&i.to_string())).last().unwrap();

    assert!(matches!(
        graph.graft(far, &triangle_model("x")),
        Err(SceneGraphError::UnknownNode(_))
    ));
    assert_eq!(graph.len(), 1);
}
