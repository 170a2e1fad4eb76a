// renderer/shadows.rs
//
// Directional shadow map: one depth texture rendered from the sun each frame
// and sampled with a comparison sampler by the lit pass.
use crate::asset::Assets;
use crate::renderer::buffers::{ObjectsBuffer, UniformBuffer};
use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::renderer::uniforms::DepthUniform;
use crate::renderer::Vertex;
use crate::scene::FrameSnapshot;
use crate::settings::ShadowMapSize;

pub const SHADOW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Depth-only render target, sampled after it is written.
pub struct DepthTarget {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl DepthTarget {
    pub fn create_depth_only(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ShadowMap"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SHADOW_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("ShadowSampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        Self {
            _texture: texture,
            view,
            sampler,
            width,
            height,
        }
    }
}

/// Clamps the configured size to what the device can allocate.
pub fn fit_shadow_size(requested: ShadowMapSize, max_dimension: u32) -> (u32, u32) {
    let width = requested.width.clamp(1, max_dimension.max(1));
    let height = requested.height.clamp(1, max_dimension.max(1));
    if (width, height) != (requested.width, requested.height) {
        log::warn!(
            "Shadow map {}x{} exceeds device limit {}, using {}x{}",
            requested.width,
            requested.height,
            max_dimension,
            width,
            height
        );
    }
    (width, height)
}

pub(crate) struct ShadowPass {
    target: DepthTarget,
    uniform: UniformBuffer<DepthUniform>,
    pipeline: wgpu::RenderPipeline,
    pub(crate) sampling_layout: wgpu::BindGroupLayout,
    pub(crate) sampling_group: wgpu::BindGroup,
}

impl ShadowPass {
    pub(crate) fn new(
        device: &wgpu::Device,
        size: ShadowMapSize,
        objects: &ObjectsBuffer,
        shader: &wgpu::ShaderModule,
    ) -> Self {
        let (width, height) = fit_shadow_size(size, device.limits().max_texture_dimension_2d);
        let target = DepthTarget::create_depth_only(device, width, height);
        log::info!("Shadow map {}x{}", width, height);

        let uniform = UniformBuffer::new(
            device,
            "DepthUniform",
            wgpu::ShaderStages::VERTEX,
            &DepthUniform {
                light_space: glam::Mat4::IDENTITY.to_cols_array_2d(),
            },
        );

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ShadowPipelineLayout"),
            bind_group_layouts: &[&uniform.bind_layout, &objects.bind_layout],
            push_constant_ranges: &[],
        });

        let pipeline = PipelineBuilder::new(device, &layout, shader)
            .with_label("ShadowPipeline")
            .depth_only()
            .with_vertex_buffer(Vertex::layout())
            .with_depth_bias(
                SHADOW_FORMAT,
                true,
                wgpu::CompareFunction::LessEqual,
                wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            )
            .build();

        let sampling_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ShadowSamplingLayout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let sampling_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ShadowSamplingGroup"),
            layout: &sampling_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&target.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&target.sampler),
                },
            ],
        });

        Self {
            target,
            uniform,
            pipeline,
            sampling_layout,
            sampling_group,
        }
    }

    /// Renders every object depth-only from the light. Object `i` of the
    /// snapshot reads slot `i` of the objects buffer.
    pub(crate) fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        frame: &FrameSnapshot,
        objects: &ObjectsBuffer,
        assets: &Assets,
    ) {
        self.uniform.write(queue, &DepthUniform::from_snapshot(frame));

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ShadowPass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.target.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_viewport(
            0.0,
            0.0,
            self.target.width as f32,
            self.target.height as f32,
            0.0,
            1.0,
        );
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform.bind_group, &[]);
        pass.set_bind_group(1, &objects.bind_group, &[]);

        for (index, object) in frame.objects.iter().enumerate() {
            if let Some(model) = assets.models.get(object.model) {
                model.draw_depth(&mut pass, index as u32);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadow_size_within_limits_is_kept() {
        let size = ShadowMapSize {
            width: 8192,
            height: 4096,
        };
        assert_eq!(fit_shadow_size(size, 8192), (8192, 4096));
    }

    #[test]
    fn shadow_size_is_clamped_per_axis() {
        let size = ShadowMapSize {
            width: 8192,
            height: 4096,
        };
        assert_eq!(fit_shadow_size(size, 4096), (4096, 4096));
        assert_eq!(fit_shadow_size(size, 2048), (2048, 2048));
    }

    #[test]
    fn zero_shadow_size_becomes_one_texel() {
        let size = ShadowMapSize {
            width: 0,
            height: 16,
        };
        assert_eq!(fit_shadow_size(size, 8192), (1, 16));
    }
}
