use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector3};
use instant::Duration;

use haloview::{
    data_structures::{
        model::{Material, Primitive},
        scene_graph::{MeshData, NodeKind, SceneNode},
    },
    stage::{Stage, StageOptions},
    tween::Easing,
};

const EPS: f32 = 1e-4;

fn options() -> StageOptions {
    StageOptions {
        model_path: "model.glb".to_string(),
        pivot_scale: 2.0,
        pivot_offset: Vector3::new(1.0, 0.0, -1.0),
        glow_world_size: 9.6,
        entrance_secs: 1.0,
        easing: Easing::Linear,
        auto_rotate: true,
        auto_rotate_speed: 5.0,
    }
}

fn asset() -> SceneNode {
    // Bounding box [-2,-1,-3]..[4,3,1], center (1,1,1)
    SceneNode::mesh(
        "asset",
        MeshData::new(
            vec![Primitive::from_positions(
                "asset",
                &[[-2.0, -1.0, -3.0], [4.0, 3.0, 1.0]],
            )],
            vec![Material::solid("asset", [1.0, 1.0, 1.0, 1.0])],
        ),
    )
}

fn count(stage: &Stage, predicate: fn(&NodeKind) -> bool) -> usize {
    stage.root().count_kind(&predicate)
}

#[test]
fn a_fresh_stage_holds_camera_lights_and_glow() {
    let stage = Stage::new(options());
    assert_eq!(count(&stage, |kind| matches!(kind, NodeKind::Camera)), 1);
    assert_eq!(count(&stage, |kind| matches!(kind, NodeKind::Light(_))), 2);
    assert_eq!(count(&stage, |kind| matches!(kind, NodeKind::Sprite(_))), 1);
    assert!(!stage.has_pivot());
}

#[test]
fn zero_glow_size_disables_the_sprite() {
    let stage = Stage::new(StageOptions {
        glow_world_size: 0.0,
        ..options()
    });
    assert_eq!(count(&stage, |kind| matches!(kind, NodeKind::Sprite(_))), 0);
}

#[test]
fn the_glow_sits_at_the_pivot_position() {
    let stage = Stage::new(options());
    let glow = stage.root().find("glow").expect("glow sprite");
    assert!((glow.transform.position - Vector3::new(1.0, 0.0, -1.0)).magnitude() < EPS);
    assert!(
        (glow.transform.position - stage.orbit_target().to_vec()).magnitude() < EPS,
        "glow and orbit target must agree on where the asset visually is"
    );
}

#[test]
fn attaching_wraps_the_centered_asset_in_a_pivot() {
    let mut stage = Stage::new(options());
    stage.attach_model(asset());

    assert!(stage.has_pivot());
    let pivot = stage.root().find("pivot").unwrap();
    assert_eq!(pivot.children.len(), 1);
    // The centering offset landed on the asset, not on the pivot
    let wrapped = &pivot.children[0];
    assert!(
        (wrapped.transform.position - Vector3::new(-1.0, -1.0, -1.0)).magnitude() < EPS,
        "asset offset was {:?}",
        wrapped.transform.position
    );
    assert!((pivot.transform.position - Vector3::new(1.0, 0.0, -1.0)).magnitude() < EPS);
}

#[test]
fn the_orbit_target_tracks_the_pivot() {
    let mut stage = Stage::new(options());
    stage.attach_model(asset());
    assert!((stage.orbit_target() - Point3::new(1.0, 0.0, -1.0)).magnitude() < EPS);
}

#[test]
fn the_entrance_animation_grows_the_pivot_from_zero() {
    let mut stage = Stage::new(options());
    stage.attach_model(asset());

    let scale_at = |stage: &Stage| stage.root().find("pivot").unwrap().transform.scale;
    assert!(scale_at(&stage).magnitude() < EPS, "entrance starts at zero");

    stage.update(Duration::from_millis(500));
    let halfway = scale_at(&stage);
    assert!((halfway.x - 1.0).abs() < EPS, "linear halfway to 2.0, got {halfway:?}");

    stage.update(Duration::from_millis(500));
    let done = scale_at(&stage);
    assert!((done.x - 2.0).abs() < EPS);

    // Further updates leave the target scale alone
    stage.update(Duration::from_secs(5));
    assert!((scale_at(&stage).x - 2.0).abs() < EPS);
}

#[test]
fn zero_entrance_attaches_at_full_scale() {
    let mut stage = Stage::new(StageOptions {
        entrance_secs: 0.0,
        ..options()
    });
    stage.attach_model(asset());
    let pivot = stage.root().find("pivot").unwrap();
    assert!((pivot.transform.scale.x - 2.0).abs() < EPS);
}

#[test]
fn a_load_failure_leaves_camera_and_lights_only() {
    let mut stage = Stage::new(StageOptions {
        glow_world_size: 0.0,
        ..options()
    });
    stage.on_load_failure(&anyhow::anyhow!("asset not found"));

    assert_eq!(stage.load_failures(), 1);
    assert!(!stage.has_pivot());
    assert_eq!(count(&stage, |kind| matches!(kind, NodeKind::Camera)), 1);
    assert_eq!(count(&stage, |kind| matches!(kind, NodeKind::Light(_))), 2);
    assert_eq!(count(&stage, |kind| matches!(kind, NodeKind::Mesh(_))), 0);
}

#[test]
fn double_teardown_is_a_no_op() {
    let mut stage = Stage::new(options());
    stage.attach_model(asset());

    stage.dispose();
    assert!(stage.is_disposed());
    assert_eq!(stage.resident_gpu_resources(), 0);

    // A second teardown must neither fail nor resurrect anything
    stage.dispose();
    assert_eq!(stage.resident_gpu_resources(), 0);
}

#[test]
fn teardown_cancels_the_load_token() {
    let mut stage = Stage::new(options());
    let token = stage.load_token();
    assert!(!token.is_cancelled());
    stage.dispose();
    assert!(token.is_cancelled());
}

#[test]
fn a_late_arriving_asset_is_silently_dropped() {
    let mut stage = Stage::new(options());
    stage.dispose();

    stage.attach_model(asset());
    assert!(!stage.has_pivot());
    assert_eq!(stage.resident_gpu_resources(), 0);
}

#[test]
fn light_uniform_reflects_the_key_light() {
    let stage = Stage::new(options());
    let uniform = stage.light_uniform();
    assert_eq!(uniform.position(), [10.0, 10.0, 10.0]);
}
