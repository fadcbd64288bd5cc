//! Render composition.
//!
//! Each frame the stage's graph is flattened into mesh and sprite draw
//! batches, then drawn in two pipeline passes: opaque meshes first, glow
//! sprites last so their additive blend reads what is already in the frame.
//!
//! # Key types
//!
//! - [`MeshDraw<'a>`] references one mesh node's GPU buffers
//! - [`SpriteDraw<'a>`] references one sprite node's quad and texture

use std::iter;

use crate::{
    context::Context,
    data_structures::model::{GpuMaterial, GpuPrimitive},
    stage::Stage,
};

/// Draw data for one mesh node: its transform buffer plus geometry and
/// materials.
pub struct MeshDraw<'a> {
    pub transform: &'a wgpu::Buffer,
    pub primitives: &'a [GpuPrimitive],
    pub materials: &'a [GpuMaterial],
}

/// Draw data for one glow sprite.
pub struct SpriteDraw<'a> {
    pub transform: &'a wgpu::Buffer,
    pub vertex: &'a wgpu::Buffer,
    pub index: &'a wgpu::Buffer,
    pub bind_group: &'a wgpu::BindGroup,
}

/// Render one frame of the stage.
pub fn render_stage(ctx: &Context, stage: &Stage) -> Result<(), wgpu::SurfaceError> {
    let output = ctx.surface.get_current_texture()?;
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder: wgpu::CommandEncoder =
        ctx.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
    {
        let mut render_pass: wgpu::RenderPass<'_> =
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

        let mut meshes: Vec<MeshDraw> = Vec::new();
        let mut sprites: Vec<SpriteDraw> = Vec::new();
        stage.root().collect_draws(&mut meshes, &mut sprites);

        render_pass.set_pipeline(&ctx.pipelines.mesh);
        for mesh in &meshes {
            render_pass.set_vertex_buffer(1, mesh.transform.slice(..));
            for primitive in mesh.primitives {
                let material = match mesh.materials.get(primitive.material) {
                    Some(material) => material,
                    None => {
                        log::warn!(
                            "primitive references material {} but only {} are loaded",
                            primitive.material,
                            mesh.materials.len()
                        );
                        continue;
                    }
                };
                render_pass.set_bind_group(0, &material.bind_group, &[]);
                render_pass.set_bind_group(1, &ctx.camera.bind_group, &[]);
                render_pass.set_bind_group(2, &ctx.light.bind_group, &[]);
                render_pass.set_vertex_buffer(0, primitive.vertex_buffer.slice(..));
                render_pass
                    .set_index_buffer(primitive.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..primitive.num_elements, 0, 0..1);
            }
        }

        render_pass.set_pipeline(&ctx.pipelines.sprite);
        for sprite in &sprites {
            render_pass.set_bind_group(0, sprite.bind_group, &[]);
            render_pass.set_bind_group(1, &ctx.camera.bind_group, &[]);
            render_pass.set_vertex_buffer(0, sprite.vertex.slice(..));
            render_pass.set_vertex_buffer(1, sprite.transform.slice(..));
            render_pass.set_index_buffer(sprite.index.slice(..), wgpu::IndexFormat::Uint16);
            render_pass.draw_indexed(0..6, 0, 0..1);
        }
    }

    ctx.queue.submit(iter::once(encoder.finish()));
    output.present();
    Ok(())
}
