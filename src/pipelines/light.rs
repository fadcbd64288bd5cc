//! Light uniform data and GPU binding resources.
//!
//! The scene's light nodes are folded into a single [`LightUniform`] each
//! time the graph's lights change; the mesh shader reads the point light and
//! the hemisphere fill from one buffer.

use wgpu::util::DeviceExt;

/// Packed light data for the mesh shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    position: [f32; 3],
    // Uniforms require 16 byte (4 float) spacing, hence the padding fields
    range: f32,
    color: [f32; 3],
    _padding: u32,
    sky: [f32; 3],
    _padding2: u32,
    ground: [f32; 3],
    _padding3: u32,
}

impl LightUniform {
    pub fn set_point(&mut self, position: [f32; 3], color: [f32; 3], intensity: f32, range: f32) {
        self.position = position;
        self.color = color.map(|c| c * intensity);
        self.range = range;
    }

    pub fn set_hemisphere(&mut self, sky: [f32; 3], ground: [f32; 3], intensity: f32) {
        self.sky = sky.map(|c| c * intensity);
        self.ground = ground.map(|c| c * intensity);
    }

    pub fn position(&self) -> [f32; 3] {
        self.position
    }
}

impl Default for LightUniform {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            range: 1.0,
            color: [0.0, 0.0, 0.0],
            _padding: 0,
            sky: [0.0, 0.0, 0.0],
            _padding2: 0,
            ground: [0.0, 0.0, 0.0],
            _padding3: 0,
        }
    }
}

/// The light uniform plus its GPU buffer and bind group.
#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, uniform: LightUniform) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: None,
        });
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Replace the uniform and push it to the GPU.
    pub fn write(&mut self, queue: &wgpu::Queue, uniform: LightUniform) {
        self.uniform = uniform;
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: None,
    })
}
