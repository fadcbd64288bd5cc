//! Stage assembly and lifecycle.
//!
//! A [`Stage`] owns the scene graph for one viewer instance: camera and
//! light nodes from construction, an optional glow sprite, and eventually
//! the loaded asset wrapped in a pivot. All state lives in this object;
//! nothing survives outside the construct/dispose lifecycle.
//!
//! Asset loading is asynchronous and may outlive the stage. A [`LoadToken`]
//! is cancelled at teardown, and a completion that arrives afterwards is
//! silently dropped rather than attached to a disposed graph.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use instant::Duration;

use crate::{
    data_structures::{
        bounds::recenter_offset,
        scene_graph::{LightData, LightKind, NodeKind, SceneNode, SpriteData},
        texture::GradientTexture,
        transform::Transform,
    },
    pipelines::light::LightUniform,
    tween::{Easing, Tween},
};

/// Recognized stage options.
#[derive(Clone, Debug)]
pub struct StageOptions {
    /// Path of the binary model asset, resolved under `assets/`.
    pub model_path: String,
    /// Uniform scale applied to the pivot once the asset is attached.
    pub pivot_scale: f32,
    /// World-space position of the pivot (and of the orbit target).
    pub pivot_offset: cgmath::Vector3<f32>,
    /// Diameter of the glow sprite in world units. Zero disables the glow.
    pub glow_world_size: f32,
    /// Entrance animation length in seconds. Zero attaches at full scale.
    pub entrance_secs: f32,
    pub easing: Easing,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            model_path: "earth.glb".to_string(),
            pivot_scale: 1.0,
            pivot_offset: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // Roughly 1.6x the diameter of a radius-3 model
            glow_world_size: 9.6,
            entrance_secs: 1.0,
            easing: Easing::default(),
            auto_rotate: true,
            auto_rotate_speed: 5.0,
        }
    }
}

/// Shared cancellation flag between a stage and its in-flight load.
#[derive(Clone, Debug, Default)]
pub struct LoadToken(Arc<AtomicBool>);

impl LoadToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The scene state for one viewer instance.
#[derive(Debug)]
pub struct Stage {
    root: SceneNode,
    options: StageOptions,
    entrance: Option<Tween>,
    load_token: LoadToken,
    load_failures: usize,
    disposed: bool,
}

impl Stage {
    /// Assemble camera, lights, and (when enabled) the glow sprite.
    ///
    /// The asset arrives later through [`attach_model`](Self::attach_model);
    /// until then the stage renders as camera plus lights, which is also
    /// the terminal state when loading fails.
    pub fn new(options: StageOptions) -> Self {
        let mut root = SceneNode::group("scene");

        let mut camera = SceneNode::camera("camera");
        camera.transform.position = cgmath::Vector3::new(0.0, 0.0, 20.0);
        root.add_child(camera);

        let mut key_light = SceneNode::light(
            "key_light",
            LightData {
                color: [1.0, 1.0, 1.0],
                intensity: 1.2,
                kind: LightKind::Point { range: 800.0 },
            },
        );
        key_light.transform.position = cgmath::Vector3::new(10.0, 10.0, 10.0);
        root.add_child(key_light);

        root.add_child(SceneNode::light(
            "fill_light",
            LightData {
                color: [0.66, 0.66, 0.66],
                intensity: 0.5,
                kind: LightKind::Hemisphere {
                    ground: [0.26, 0.26, 0.26],
                },
            },
        ));

        if options.glow_world_size > 0.0 {
            let mut glow = SceneNode::sprite(
                "glow",
                SpriteData::new(
                    GradientTexture::new(GradientTexture::DEFAULT_SIZE),
                    options.glow_world_size,
                ),
            );
            glow.transform.position = options.pivot_offset;
            root.add_child(glow);
        }

        Self {
            root,
            options,
            entrance: None,
            load_token: LoadToken::default(),
            load_failures: 0,
            disposed: false,
        }
    }

    pub fn options(&self) -> &StageOptions {
        &self.options
    }

    /// The token an asset load must check before delivering its result.
    pub fn load_token(&self) -> LoadToken {
        self.load_token.clone()
    }

    pub fn root(&self) -> &SceneNode {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut SceneNode {
        &mut self.root
    }

    /// Center a loaded asset, wrap it in a pivot, and attach it.
    ///
    /// The whole operation is one synchronous step: a render pass either
    /// sees no asset or the fully configured pivot, never a half-attached
    /// state. Results arriving after teardown are discarded.
    pub fn attach_model(&mut self, mut asset: SceneNode) {
        if self.disposed || self.load_token.is_cancelled() {
            log::info!("model arrived after stage teardown; discarding");
            return;
        }

        let offset = recenter_offset(&asset);
        asset.transform.position += offset;

        let mut pivot = SceneNode::pivot(asset);
        pivot.transform.position = self.options.pivot_offset;

        if self.options.entrance_secs > 0.0 {
            pivot.transform.scale = cgmath::Vector3::new(0.0, 0.0, 0.0);
            self.entrance = Some(Tween::new(
                0.0,
                self.options.pivot_scale,
                Duration::from_secs_f32(self.options.entrance_secs),
                self.options.easing,
            ));
        } else {
            pivot.transform =
                &pivot.transform * &Transform::from_uniform_scale(self.options.pivot_scale);
        }

        self.root.add_child(pivot);
    }

    /// Record a failed asset load. The stage keeps rendering without it.
    pub fn on_load_failure(&mut self, error: &anyhow::Error) {
        log::error!(
            "failed to load model {:?}: {:#}",
            self.options.model_path,
            error
        );
        self.load_failures += 1;
    }

    pub fn load_failures(&self) -> usize {
        self.load_failures
    }

    pub fn has_pivot(&self) -> bool {
        self.root.find("pivot").is_some()
    }

    /// Where the orbit controller should look: the pivot's position, which
    /// is the single source of truth for where the asset visually is.
    pub fn orbit_target(&self) -> cgmath::Point3<f32> {
        let position = self
            .root
            .find("pivot")
            .map_or(self.options.pivot_offset, |pivot| {
                pivot.transform.position
            });
        cgmath::Point3::new(position.x, position.y, position.z)
    }

    /// Advance the entrance animation.
    pub fn update(&mut self, dt: Duration) {
        if let Some(tween) = &mut self.entrance {
            let scale = tween.advance(dt);
            let finished = tween.finished();
            if let Some(pivot) = self.root.find_mut("pivot") {
                pivot.transform.scale = cgmath::Vector3::new(scale, scale, scale);
            }
            if finished {
                self.entrance = None;
            }
        }
    }

    /// Fold the scene's light nodes into the shader uniform.
    pub fn light_uniform(&self) -> LightUniform {
        let mut uniform = LightUniform::default();
        collect_lights(&self.root, &mut uniform);
        uniform
    }

    /// Cancel the in-flight load and release all GPU resources.
    ///
    /// Idempotent: nodes already disposed, and nodes that never held
    /// resources, are no-ops.
    pub fn dispose(&mut self) {
        self.load_token.cancel();
        self.root.dispose();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn resident_gpu_resources(&self) -> usize {
        self.root.resident_gpu_resources()
    }
}

fn collect_lights(node: &SceneNode, uniform: &mut LightUniform) {
    if let NodeKind::Light(light) = node.kind() {
        match light.kind {
            LightKind::Point { range } => {
                uniform.set_point(node.transform.position.into(), light.color, light.intensity, range);
            }
            LightKind::Hemisphere { ground } => {
                uniform.set_hemisphere(light.color, ground, light.intensity);
            }
        }
    }
    for child in &node.children {
        collect_lights(child, uniform);
    }
}
