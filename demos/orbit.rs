use haloview::{StageOptions, tween::Easing};

fn main() -> anyhow::Result<()> {
    haloview::run(StageOptions {
        model_path: "earth.glb".to_string(),
        pivot_scale: 1.0,
        glow_world_size: 9.6,
        entrance_secs: 1.0,
        easing: Easing::QuadraticOut,
        auto_rotate: true,
        auto_rotate_speed: 5.0,
        ..Default::default()
    })
}
