//! GPU-resident meshes of the loaded asset.
//!
//! [`Model::upload`] flattens a [`SceneAsset`] into vertex/index buffers. Node
//! transforms below the root are baked into the vertices so that a single model
//! matrix (the root transform written by the placement pipeline) positions the
//! whole asset. Base colour maps become [`Material`]s, one per decoded image.

use std::{collections::HashMap, sync::Arc};

use cgmath::{InnerSpace, Transform as _};
use wgpu::util::DeviceExt;

use crate::data_structures::{
    scene_graph::{SceneAsset, SceneNode},
    texture::Texture,
    transform::normal_matrix,
};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub colour: [f32; 4],
    pub tex_coords: [f32; 2],
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
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 10]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    /// Index into [`Model::materials`].
    pub material: usize,
}

#[derive(Debug)]
pub struct Material {
    pub name: String,
    pub base_colour: Texture,
    pub bind_group: wgpu::BindGroup,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        base_colour: Texture,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let bind_group = base_colour.bind_group(device, layout);
        Self {
            name: name.to_string(),
            base_colour,
            bind_group,
        }
    }
}

#[derive(Debug, Default)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    /// Slot 0 is the untextured white material.
    pub materials: Vec<Material>,
}

impl Model {
    /// Uploads every non-empty mesh of `asset`, relative to the asset root.
    ///
    /// Meshes sharing a decoded image share one GPU texture.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        asset: &SceneAsset,
        texture_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let mut meshes = Vec::new();
        let mut materials = vec![Material::new(
            device,
            "untextured",
            Texture::create_white(device, queue),
            texture_layout,
        )];
        let mut material_by_image: HashMap<*const image::RgbaImage, usize> = HashMap::new();
        let root = &asset.root;
        // The root transform is applied per frame through the model uniform,
        // so only the children's transforms get baked.
        let mut bake = |node: &SceneNode, relative: &cgmath::Matrix4<f32>| {
            let normal_transform = normal_matrix(relative).unwrap_or(*relative);
            for (idx, mesh) in node.meshes.iter().enumerate() {
                if mesh.is_empty() {
                    continue;
                }
                let material = match &mesh.base_colour_texture {
                    Some(img) => *material_by_image.entry(Arc::as_ptr(img)).or_insert_with(|| {
                        let label = format!("{} base colour", node.name);
                        let texture = Texture::from_image(device, queue, img, Some(label.as_str()));
                        materials.push(Material::new(device, &label, texture, texture_layout));
                        materials.len() - 1
                    }),
                    None => 0,
                };
                let vertices = mesh
                    .positions
                    .iter()
                    .enumerate()
                    .map(|(i, position)| {
                        let position =
                            relative.transform_point(cgmath::Point3::from(*position));
                        let normal: cgmath::Vector3<f32> =
                            mesh.normals.get(i).copied().unwrap_or([0.0, 0.0, 1.0]).into();
                        let normal = normal_transform.transform_vector(normal);
                        let normal = if normal.magnitude2() > 0.0 {
                            normal.normalize()
                        } else {
                            normal
                        };
                        ModelVertex {
                            position: position.into(),
                            normal: normal.into(),
                            colour: mesh.base_colour,
                            tex_coords: mesh.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
                        }
                    })
                    .collect::<Vec<_>>();

                let name = format!("{}#{}", node.name, idx);
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Vertex Buffer", name)),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Index Buffer", name)),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });

                meshes.push(Mesh {
                    name,
                    vertex_buffer,
                    index_buffer,
                    num_elements: mesh.indices.len() as u32,
                    material,
                });
            }
        };

        let identity = cgmath::Matrix4::from_scale(1.0);
        bake(root, &identity);
        for child in &root.children {
            child.traverse(identity, &mut bake);
        }

        log::info!(
            "Uploaded {} meshes and {} textures of the asset to the GPU",
            meshes.len(),
            materials.len() - 1
        );
        Self { meshes, materials }
    }
}

pub trait DrawModel<'a> {
    fn draw_mesh(
        &mut self,
        mesh: &'a Mesh,
        material: &'a Material,
        camera_bind_group: &'a wgpu::BindGroup,
        transform_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );

    fn draw_model(
        &mut self,
        model: &'a Model,
        camera_bind_group: &'a wgpu::BindGroup,
        transform_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a, 'b> DrawModel<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(
        &mut self,
        mesh: &'b Mesh,
        material: &'b Material,
        camera_bind_group: &'b wgpu::BindGroup,
        transform_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, camera_bind_group, &[]);
        self.set_bind_group(1, transform_bind_group, &[]);
        self.set_bind_group(2, light_bind_group, &[]);
        self.set_bind_group(3, &material.bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, 0..1);
    }

    fn draw_model(
        &mut self,
        model: &'b Model,
        camera_bind_group: &'b wgpu::BindGroup,
        transform_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
    ) {
        for mesh in &model.meshes {
            let Some(material) = model.materials.get(mesh.material) else {
                continue;
            };
            self.draw_mesh(
                mesh,
                material,
                camera_bind_group,
                transform_bind_group,
                light_bind_group,
            );
        }
    }
}
