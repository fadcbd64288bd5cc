use std::io::{BufReader, Cursor};

use cgmath::Zero;

use crate::{
    data_structures::{
        model::{Material, ModelVertex, Primitive},
        scene_graph::{MeshData, SceneNode},
        transform::Transform,
    },
    resources::texture::{decode_image, load_binary},
};

/**
 * This module contains all logic for loading models and textures from
 * external files. Everything lands on the CPU; GPU upload is owned by the
 * scene graph's upload pass.
 */
pub mod texture;

/// Load a glTF (.glb/.gltf) asset into a scene subtree.
///
/// Node hierarchy and per-node decomposed transforms are preserved.
/// May fail independently of scene setup; the caller decides what a missing
/// asset means for the scene.
pub async fn load_model_gltf(file_name: &str) -> anyhow::Result<SceneNode> {
    let gltf_bytes = load_binary(file_name).await?;
    let gltf_cursor = Cursor::new(gltf_bytes);
    let gltf_reader = BufReader::new(gltf_cursor);
    let gltf = gltf::Gltf::from_reader(gltf_reader)?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                if let Some(blob) = gltf.blob.as_deref() {
                    buffer_data.push(blob.to_vec());
                };
            }
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(uri).await?;
                buffer_data.push(bin);
            }
        }
    }

    // Load materials
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let name = material.name().unwrap_or("unnamed_material").to_string();
        let pbr = material.pbr_metallic_roughness();
        let base_color = pbr.base_color_factor();
        let diffuse = match pbr.base_color_texture() {
            Some(info) => match info.texture().source().source() {
                gltf::image::Source::View { view, mime_type } => Some(decode_image(
                    &buffer_data[view.buffer().index()]
                        [view.offset()..view.offset() + view.length()],
                    mime_type.split('/').next_back(),
                )?),
                gltf::image::Source::Uri { uri, mime_type } => {
                    let bytes = load_binary(uri).await?;
                    Some(decode_image(
                        &bytes,
                        mime_type.and_then(|mt| mt.split('/').next_back()),
                    )?)
                }
            },
            None => None,
        };
        materials.push(Material {
            name,
            base_color,
            diffuse,
        });
    }
    if materials.is_empty() {
        // Meshes always index into the material list, so keep one default
        materials.push(Material::solid("default_material", [1.0, 1.0, 1.0, 1.0]));
    }

    let mut roots = Vec::new();
    for scene in gltf.scenes() {
        for node in scene.nodes() {
            roots.push(to_scene_node(node, &buffer_data, &materials));
        }
    }

    let root_node = if roots.len() == 1 {
        roots.into_iter().next().unwrap()
    } else {
        let mut root_node = SceneNode::group(file_name);
        for node in roots {
            root_node.add_child(node);
        }
        root_node
    };

    Ok(root_node)
}

fn to_scene_node(
    node: gltf::scene::Node,
    buf: &[Vec<u8>],
    materials: &[Material],
) -> SceneNode {
    let name = node.name().unwrap_or("unnamed_node").to_string();
    let mut scene_node = match node.mesh() {
        Some(mesh) => {
            let mut primitives = Vec::new();
            for primitive in mesh.primitives() {
                let reader = primitive.reader(|buffer| Some(&buf[buffer.index()]));

                let mut vertices = Vec::new();
                if let Some(vertex_attribute) = reader.read_positions() {
                    vertex_attribute.for_each(|position| {
                        vertices.push(ModelVertex {
                            position,
                            tex_coords: Default::default(),
                            normal: Default::default(),
                        })
                    });
                }
                if let Some(normal_attribute) = reader.read_normals() {
                    for (i, normal) in normal_attribute.enumerate() {
                        if let Some(vertex) = vertices.get_mut(i) {
                            vertex.normal = normal;
                        }
                    }
                }
                if let Some(tex_coord_attribute) = reader.read_tex_coords(0).map(|v| v.into_f32())
                {
                    for (i, tex_coord) in tex_coord_attribute.enumerate() {
                        if let Some(vertex) = vertices.get_mut(i) {
                            vertex.tex_coords = tex_coord;
                        }
                    }
                }

                let mut indices = Vec::new();
                if let Some(indices_raw) = reader.read_indices() {
                    indices.append(&mut indices_raw.into_u32().collect::<Vec<u32>>());
                }

                primitives.push(Primitive {
                    name: mesh.name().unwrap_or("unnamed_mesh").to_string(),
                    vertices,
                    indices,
                    material: primitive.material().index().unwrap_or(0),
                });
            }
            SceneNode::mesh(&name, MeshData::new(primitives, materials.to_vec()))
        }
        None => SceneNode::group(&name),
    };

    let (position, rotation, scale) = node.transform().decomposed();
    scene_node.transform = Transform {
        position: position.into(),
        rotation: rotation.into(),
        scale: scale.into(),
    };
    if scene_node.transform.scale.is_zero() {
        log::warn!("node {:?} has a zero scale and will not be visible", name);
    }

    for child in node.children() {
        scene_node.add_child(to_scene_node(child, buf, materials));
    }

    scene_node
}
