//! Render pipeline definitions.
//!
//! - `mesh` is the opaque, depth-tested pipeline for model geometry
//! - `sprite` is the additive, non-depth-writing pipeline for glow billboards
//! - `light` holds the light uniform and its binding resources

pub mod light;
pub mod mesh;
pub mod sprite;

/// The pipelines a context builds once and reuses every frame.
#[derive(Debug)]
pub struct Pipelines {
    pub mesh: wgpu::RenderPipeline,
    pub sprite: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        Self {
            mesh: mesh::mk_mesh_pipeline(
                device,
                config,
                camera_bind_group_layout,
                light_bind_group_layout,
            ),
            sprite: sprite::mk_sprite_pipeline(device, config, camera_bind_group_layout),
        }
    }
}
