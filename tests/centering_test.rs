use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector3};

use haloview::data_structures::{
    bounds::{recenter_offset, subtree_bounds},
    model::{Material, Primitive},
    scene_graph::{MeshData, SceneNode},
    transform::Transform,
};

const EPS: f32 = 1e-4;

fn mesh_node(name: &str, positions: &[[f32; 3]]) -> SceneNode {
    SceneNode::mesh(
        name,
        MeshData::new(
            vec![Primitive::from_positions(name, positions)],
            vec![Material::solid(name, [1.0, 1.0, 1.0, 1.0])],
        ),
    )
}

/// A deliberately lopsided asset: geometry spread over several children,
/// each with its own local transform, nothing centered on the origin.
fn lopsided_asset() -> SceneNode {
    let mut root = SceneNode::group("asset");
    root.transform.position = Vector3::new(2.0, -1.0, 0.5);

    let mut torso = mesh_node("torso", &[[-1.0, 0.0, -1.0], [1.0, 4.0, 1.0]]);
    torso.transform.position = Vector3::new(0.0, 1.0, 0.0);
    let mut head = mesh_node("head", &[[-0.5, -0.5, -0.5], [0.5, 0.5, 0.5]]);
    head.transform.position = Vector3::new(0.0, 6.0, 0.0);
    head.transform.scale = Vector3::new(2.0, 2.0, 2.0);
    torso.add_child(head);
    root.add_child(torso);

    let mut base = mesh_node("base", &[[-3.0, 0.0, -3.0], [3.0, 0.2, 3.0]]);
    base.transform.position = Vector3::new(0.5, 0.0, 0.0);
    root.add_child(base);

    root
}

#[test]
fn applying_the_offset_centers_the_subtree() {
    let mut asset = lopsided_asset();
    let offset = recenter_offset(&asset);
    asset.transform.position += offset;

    let recomputed = subtree_bounds(&asset, &Transform::default());
    let center = recomputed.center();
    assert!(
        center.to_vec().magnitude() < EPS,
        "center after recentering was {center:?}"
    );
}

#[test]
fn known_bounding_box_yields_the_negated_center() {
    // Box [-2,-1,-3]..[4,3,1] has center (1,1,1)
    let asset = mesh_node("box", &[[-2.0, -1.0, -3.0], [4.0, 3.0, 1.0]]);
    let offset = recenter_offset(&asset);
    assert!((offset - Vector3::new(-1.0, -1.0, -1.0)).magnitude() < EPS);
}

#[test]
fn centering_is_stable_under_repetition() {
    let mut asset = lopsided_asset();
    let offset = recenter_offset(&asset);
    asset.transform.position += offset;

    // A second pass finds nothing left to correct
    let second = recenter_offset(&asset);
    assert!(second.magnitude() < EPS, "second offset was {second:?}");
}

#[test]
fn empty_subtree_returns_a_finite_offset() {
    let mut group = SceneNode::group("empty");
    group.transform.position = Vector3::new(5.0, 6.0, 7.0);
    group.add_child(SceneNode::group("also_empty"));

    let offset = recenter_offset(&group);
    assert!(offset.x.is_finite() && offset.y.is_finite() && offset.z.is_finite());
    assert!(!offset.x.is_nan() && !offset.y.is_nan() && !offset.z.is_nan());
    // Degenerate case: the offset negates the existing position
    assert!((offset - Vector3::new(-5.0, -6.0, -7.0)).magnitude() < EPS);
}

#[test]
fn bounds_ignore_nodes_without_geometry() {
    let mut root = SceneNode::group("root");
    root.add_child(mesh_node("geometry", &[[-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]]));
    let mut marker = SceneNode::camera("camera");
    marker.transform.position = Vector3::new(100.0, 100.0, 100.0);
    root.add_child(marker);

    let bounds = subtree_bounds(&root, &Transform::default());
    assert!((bounds.min - Point3::new(-1.0, -1.0, -1.0)).magnitude() < EPS);
    assert!((bounds.max - Point3::new(1.0, 1.0, 1.0)).magnitude() < EPS);
}
