//! Mesh geometry and material definitions.
//!
//! Geometry is kept on the CPU after loading so the bounds pass can walk raw
//! vertex positions; GPU buffers are a separate, explicitly managed
//! attachment created by the upload pass and released by scene teardown.

use wgpu::util::DeviceExt;

use crate::data_structures::texture::Texture;

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// A single mesh vertex: position, texture coordinates, and normal.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// One corner of the unit glow quad.
///
/// The vertex shader expands the corner along the camera's right/up axes,
/// which is what keeps the sprite facing the viewer.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteVertex {
    pub corner: [f32; 2],
    pub tex_coords: [f32; 2],
}

impl SpriteVertex {
    /// Unit quad corners, centered on the sprite position.
    pub const QUAD: [SpriteVertex; 4] = [
        SpriteVertex {
            corner: [-0.5, -0.5],
            tex_coords: [0.0, 1.0],
        },
        SpriteVertex {
            corner: [0.5, -0.5],
            tex_coords: [1.0, 1.0],
        },
        SpriteVertex {
            corner: [0.5, 0.5],
            tex_coords: [1.0, 0.0],
        },
        SpriteVertex {
            corner: [-0.5, 0.5],
            tex_coords: [0.0, 0.0],
        },
    ];

    pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];
}

impl Vertex for SpriteVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<SpriteVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// CPU-side indexed triangle list with a material slot.
#[derive(Clone, Debug)]
pub struct Primitive {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub material: usize,
}

impl Primitive {
    /// Build a primitive from bare positions, for geometry that needs no
    /// shading detail (tests, markers). Normals point up, coordinates zero.
    pub fn from_positions(name: &str, positions: &[[f32; 3]]) -> Self {
        let vertices = positions
            .iter()
            .map(|&position| ModelVertex {
                position,
                tex_coords: [0.0, 0.0],
                normal: [0.0, 1.0, 0.0],
            })
            .collect::<Vec<_>>();
        let indices = (0..vertices.len() as u32).collect();
        Self {
            name: name.to_string(),
            vertices,
            indices,
            material: 0,
        }
    }

    pub(crate) fn upload(&self, device: &wgpu::Device) -> GpuPrimitive {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", self.name)),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", self.name)),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        GpuPrimitive {
            vertex_buffer,
            index_buffer,
            num_elements: self.indices.len() as u32,
            material: self.material,
        }
    }
}

/// Material descriptor. The diffuse image stays on the CPU until upload.
#[derive(Clone, Debug)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub diffuse: Option<image::RgbaImage>,
}

impl Material {
    pub fn solid(name: &str, base_color: [f32; 4]) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            diffuse: None,
        }
    }

    pub(crate) fn upload(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
    ) -> anyhow::Result<GpuMaterial> {
        let texture = match &self.diffuse {
            Some(img) => Texture::from_image(
                device,
                queue,
                &image::DynamicImage::ImageRgba8(img.clone()),
                Some(&self.name),
            )?,
            None => {
                let rgba = self.base_color.map(|c| (c.clamp(0.0, 1.0) * 255.0) as u8);
                Texture::create_solid(rgba, device, queue, &self.name)
            }
        };
        let sampler = texture
            .sampler
            .clone()
            .unwrap_or_else(|| super::texture::create_default_sampler(device));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: Some(&self.name),
        });
        Ok(GpuMaterial {
            texture,
            bind_group,
        })
    }
}

/// GPU-resident geometry for one primitive.
#[derive(Debug)]
pub struct GpuPrimitive {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material: usize,
}

impl GpuPrimitive {
    pub(crate) fn destroy(&self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

/// GPU-resident material: the uploaded texture and its bind group.
#[derive(Debug)]
pub struct GpuMaterial {
    pub texture: Texture,
    pub bind_group: wgpu::BindGroup,
}

impl GpuMaterial {
    pub(crate) fn destroy(&self) {
        self.texture.destroy();
    }
}
