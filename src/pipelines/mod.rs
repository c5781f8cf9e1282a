//! Render pipelines and the uniform plumbing they share.
//!
//! - `basic` builds the shaded, depth-tested pipeline the product model is drawn with
//! - `light` holds the fixed light rig uploaded as a uniform
//! - `transform` holds the per-frame model matrix uniform

use wgpu::util::DeviceExt;

pub mod basic;
pub mod light;
pub mod transform;

/// A uniform buffer together with its bind group and layout.
#[derive(Debug)]
pub struct UniformResources {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl UniformResources {
    pub fn new<T: bytemuck::Pod>(device: &wgpu::Device, label: &str, contents: &T) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Buffer", label)),
            contents: bytemuck::cast_slice(&[*contents]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
            label: Some(&format!("{} bind_group_layout", label)),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(&format!("{} bind_group", label)),
        });

        Self {
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write<T: bytemuck::Pod>(&self, queue: &wgpu::Queue, contents: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[*contents]));
    }
}
