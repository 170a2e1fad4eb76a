// renderer/material.rs
use wgpu::util::DeviceExt;

use crate::asset::BaseColor;
use crate::renderer::texture::{factor_to_srgb8, Texture};
use crate::renderer::uniforms::MaterialUniform;

/// Base color texture plus factor, bound at group 3 of the lit pipeline.
pub struct Material {
    _texture: Texture,
    _uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl Material {
    pub fn layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("MaterialBindLayout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        })
    }

    /// Textured parts keep their factor in the uniform; untextured parts bake
    /// the factor into a 1x1 texture and use a white factor so the color is
    /// applied once.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        base_color: &BaseColor,
        label: &str,
    ) -> Self {
        let (texture, factor) = match &base_color.image {
            Some(image) => (
                Texture::from_image(device, queue, image, Some(label)),
                base_color.factor,
            ),
            None if base_color.factor == [1.0; 4] => (Texture::white(device, queue), [1.0; 4]),
            None => (
                Texture::from_color(device, queue, factor_to_srgb8(base_color.factor), Some(label)),
                [1.0; 4],
            ),
        };

        let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}MaterialUniform")),
            contents: bytemuck::bytes_of(&MaterialUniform {
                base_color_factor: factor,
            }),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}MaterialBindGroup")),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform.as_entire_binding(),
                },
            ],
        });

        Self {
            _texture: texture,
            _uniform: uniform,
            bind_group,
        }
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
