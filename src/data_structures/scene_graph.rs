//! Scene graph and hierarchical scene organization.
//!
//! A scene is a tree of [`SceneNode`]s. Every node carries a local
//! [`Transform`] and a tagged [`NodeKind`] naming exactly the resources it
//! can own, so teardown dispatch is an exhaustive `match` instead of a
//! runtime type probe. GPU buffers are attached by [`SceneNode::upload`] and
//! released exactly once by [`SceneNode::dispose`]; removing a node from the
//! graph never releases anything by itself.

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        model::{GpuMaterial, GpuPrimitive, Material, Primitive, SpriteVertex},
        texture::{GradientTexture, Texture},
        transform::Transform,
    },
    render::{MeshDraw, SpriteDraw},
};

/// What a node is, and which resources it may carry.
#[derive(Debug)]
pub enum NodeKind {
    /// Empty grouping node. Pivots are groups with exactly one child.
    Group,
    /// Renderable geometry with one or more materials.
    Mesh(MeshData),
    /// Camera-facing textured quad with additive blending.
    Sprite(SpriteData),
    /// A light source. Carries no GPU resources of its own.
    Light(LightData),
    /// Marks where the viewer camera sits in the graph. Resource-free.
    Camera,
}

/// Geometry plus materials for a mesh node.
///
/// A node may reference several primitives and several materials; teardown
/// walks both lists uniformly, so single- and multi-material nodes behave
/// the same.
#[derive(Debug)]
pub struct MeshData {
    pub primitives: Vec<Primitive>,
    pub materials: Vec<Material>,
    pub(crate) gpu: Option<GpuMesh>,
}

impl MeshData {
    pub fn new(primitives: Vec<Primitive>, materials: Vec<Material>) -> Self {
        Self {
            primitives,
            materials,
            gpu: None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct GpuMesh {
    pub transform_buffer: wgpu::Buffer,
    pub primitives: Vec<GpuPrimitive>,
    pub materials: Vec<GpuMaterial>,
}

/// A glow sprite: gradient texture, world-space size, additive blending.
#[derive(Debug)]
pub struct SpriteData {
    pub texture: GradientTexture,
    pub world_size: f32,
    pub(crate) gpu: Option<GpuSprite>,
}

impl SpriteData {
    pub fn new(texture: GradientTexture, world_size: f32) -> Self {
        Self {
            texture,
            world_size,
            gpu: None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct GpuSprite {
    pub transform_buffer: wgpu::Buffer,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub texture: Texture,
    pub bind_group: wgpu::BindGroup,
}

/// Light parameters for [`NodeKind::Light`] nodes.
#[derive(Clone, Debug)]
pub struct LightData {
    pub color: [f32; 3],
    pub intensity: f32,
    pub kind: LightKind,
}

#[derive(Clone, Debug)]
pub enum LightKind {
    /// Omnidirectional light with a falloff range.
    Point { range: f32 },
    /// Sky/ground ambient fill. `ground` is the color lit from below.
    Hemisphere { ground: [f32; 3] },
}

/// A node in the scene graph.
#[derive(Debug)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub children: Vec<SceneNode>,
    kind: NodeKind,
}

impl SceneNode {
    pub fn new(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            transform: Transform::default(),
            children: Vec::new(),
            kind,
        }
    }

    pub fn group(name: &str) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: &str, mesh: MeshData) -> Self {
        Self::new(name, NodeKind::Mesh(mesh))
    }

    pub fn sprite(name: &str, sprite: SpriteData) -> Self {
        Self::new(name, NodeKind::Sprite(sprite))
    }

    pub fn light(name: &str, light: LightData) -> Self {
        Self::new(name, NodeKind::Light(light))
    }

    pub fn camera(name: &str) -> Self {
        Self::new(name, NodeKind::Camera)
    }

    /// Wrap an asset in a fresh pivot node.
    ///
    /// The pivot starts with an identity transform and hosts the asset as
    /// its sole child. All scale/offset/orientation intended for the asset
    /// goes to the pivot afterwards, never to the asset node, so the
    /// asset's authored origin stays out of the interaction path.
    pub fn pivot(centered_asset: SceneNode) -> Self {
        let mut pivot = Self::group("pivot");
        pivot.children.push(centered_asset);
        pivot
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// Depth-first search by node name.
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(name))
    }

    /// Create GPU buffers for every resource-bearing node that has none yet.
    ///
    /// Safe to call every frame; nodes that are already uploaded are
    /// skipped, so a freshly attached asset becomes renderable on the next
    /// pass without re-uploading the rest of the graph.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &wgpu::BindGroupLayout,
        sprite_layout: &wgpu::BindGroupLayout,
    ) -> anyhow::Result<()> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) if mesh.gpu.is_none() => {
                let primitives = mesh
                    .primitives
                    .iter()
                    .map(|primitive| primitive.upload(device))
                    .collect();
                let materials = mesh
                    .materials
                    .iter()
                    .map(|material| material.upload(device, queue, material_layout))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                mesh.gpu = Some(GpuMesh {
                    transform_buffer: mk_transform_buffer(device, &self.name),
                    primitives,
                    materials,
                });
            }
            NodeKind::Sprite(sprite) if sprite.gpu.is_none() => {
                let texture =
                    Texture::from_gradient(device, queue, &sprite.texture, &self.name);
                let sampler = texture
                    .sampler
                    .clone()
                    .unwrap_or_else(|| super::texture::create_default_sampler(device));
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: sprite_layout,
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
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Sprite Quad Vertex Buffer"),
                    contents: bytemuck::cast_slice(&SpriteVertex::QUAD),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Sprite Quad Index Buffer"),
                    contents: bytemuck::cast_slice(&SpriteVertex::QUAD_INDICES),
                    usage: wgpu::BufferUsages::INDEX,
                });
                sprite.gpu = Some(GpuSprite {
                    transform_buffer: mk_transform_buffer(device, &self.name),
                    vertex_buffer,
                    index_buffer,
                    texture,
                    bind_group,
                });
            }
            NodeKind::Mesh(_)
            | NodeKind::Sprite(_)
            | NodeKind::Group
            | NodeKind::Light(_)
            | NodeKind::Camera => (),
        }
        for child in &mut self.children {
            child.upload(device, queue, material_layout, sprite_layout)?;
        }
        Ok(())
    }

    /// Push this subtree's world transforms into the per-node GPU buffers.
    ///
    /// Called once per frame before rendering. The sprite's world size is
    /// folded into its transform here so the shader only ever sees one
    /// matrix.
    pub fn write_world_transforms(&self, queue: &wgpu::Queue, parent: &Transform) {
        let world = parent * &self.transform;
        match &self.kind {
            NodeKind::Mesh(mesh) => {
                if let Some(gpu) = &mesh.gpu {
                    queue.write_buffer(
                        &gpu.transform_buffer,
                        0,
                        bytemuck::cast_slice(&[world.to_raw()]),
                    );
                }
            }
            NodeKind::Sprite(sprite) => {
                if let Some(gpu) = &sprite.gpu {
                    let sized = &world * &Transform::from_uniform_scale(sprite.world_size);
                    queue.write_buffer(
                        &gpu.transform_buffer,
                        0,
                        bytemuck::cast_slice(&[sized.to_raw()]),
                    );
                }
            }
            NodeKind::Group | NodeKind::Light(_) | NodeKind::Camera => (),
        }
        for child in &self.children {
            child.write_world_transforms(queue, &world);
        }
    }

    /// Collect draw data for every uploaded mesh and sprite in the subtree.
    pub fn collect_draws<'a>(
        &'a self,
        meshes: &mut Vec<MeshDraw<'a>>,
        sprites: &mut Vec<SpriteDraw<'a>>,
    ) {
        match &self.kind {
            NodeKind::Mesh(mesh) => {
                if let Some(gpu) = &mesh.gpu {
                    meshes.push(MeshDraw {
                        transform: &gpu.transform_buffer,
                        primitives: &gpu.primitives,
                        materials: &gpu.materials,
                    });
                }
            }
            NodeKind::Sprite(sprite) => {
                if let Some(gpu) = &sprite.gpu {
                    sprites.push(SpriteDraw {
                        transform: &gpu.transform_buffer,
                        vertex: &gpu.vertex_buffer,
                        index: &gpu.index_buffer,
                        bind_group: &gpu.bind_group,
                    });
                }
            }
            NodeKind::Group | NodeKind::Light(_) | NodeKind::Camera => (),
        }
        for child in &self.children {
            child.collect_draws(meshes, sprites);
        }
    }

    /// Release every GPU resource in the subtree, exactly once.
    ///
    /// Nodes without resources, and nodes already disposed, are a no-op, so
    /// calling this twice is safe. The match is exhaustive over
    /// [`NodeKind`]: a new resource-bearing variant will not compile until
    /// it is handled here.
    pub fn dispose(&mut self) {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => {
                if let Some(gpu) = mesh.gpu.take() {
                    gpu.transform_buffer.destroy();
                    for primitive in &gpu.primitives {
                        primitive.destroy();
                    }
                    for material in &gpu.materials {
                        material.destroy();
                    }
                }
            }
            NodeKind::Sprite(sprite) => {
                if let Some(gpu) = sprite.gpu.take() {
                    gpu.transform_buffer.destroy();
                    gpu.vertex_buffer.destroy();
                    gpu.index_buffer.destroy();
                    gpu.texture.destroy();
                }
            }
            NodeKind::Group | NodeKind::Light(_) | NodeKind::Camera => (),
        }
        for child in &mut self.children {
            child.dispose();
        }
    }

    /// Number of nodes in the subtree currently holding GPU resources.
    pub fn resident_gpu_resources(&self) -> usize {
        let own = match &self.kind {
            NodeKind::Mesh(mesh) => usize::from(mesh.gpu.is_some()),
            NodeKind::Sprite(sprite) => usize::from(sprite.gpu.is_some()),
            NodeKind::Group | NodeKind::Light(_) | NodeKind::Camera => 0,
        };
        own + self
            .children
            .iter()
            .map(SceneNode::resident_gpu_resources)
            .sum::<usize>()
    }

    /// Count nodes in the subtree matching a predicate on their kind.
    pub fn count_kind(&self, predicate: &dyn Fn(&NodeKind) -> bool) -> usize {
        usize::from(predicate(&self.kind))
            + self
                .children
                .iter()
                .map(|child| child.count_kind(predicate))
                .sum::<usize>()
    }
}

fn mk_transform_buffer(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Transform Buffer", label)),
        contents: bytemuck::cast_slice(&[Transform::default().to_raw()]),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pivot_hosts_exactly_one_child() {
        let asset = SceneNode::group("asset");
        let pivot = SceneNode::pivot(asset);
        assert_eq!(pivot.children.len(), 1);
        assert_eq!(pivot.transform, Transform::default());
    }

    #[test]
    fn pivot_transform_is_independent_of_the_asset() {
        let mut asset = SceneNode::group("asset");
        asset.transform.position = cgmath::Vector3::new(4.0, 5.0, 6.0);
        let authored = asset.transform.clone();

        let mut pivot = SceneNode::pivot(asset);
        pivot.transform.position = cgmath::Vector3::new(-1.0, 0.0, 0.0);
        pivot.transform.scale = cgmath::Vector3::new(2.0, 2.0, 2.0);

        assert_eq!(pivot.children[0].transform, authored);
    }

    #[test]
    fn dispose_without_resources_is_a_no_op() {
        let mut root = SceneNode::group("scene");
        root.add_child(SceneNode::camera("camera"));
        root.add_child(SceneNode::light(
            "light",
            LightData {
                color: [1.0, 1.0, 1.0],
                intensity: 1.0,
                kind: LightKind::Point { range: 100.0 },
            },
        ));
        root.dispose();
        root.dispose();
        assert_eq!(root.resident_gpu_resources(), 0);
    }

    #[test]
    fn find_walks_the_whole_tree() {
        let mut root = SceneNode::group("scene");
        let mut pivot = SceneNode::pivot(SceneNode::group("asset"));
        pivot.name = "pivot".to_string();
        root.add_child(pivot);
        assert!(root.find("asset").is_some());
        assert!(root.find("missing").is_none());
    }
}
