// renderer/pipeline.rs
use bytemuck::Zeroable;

use crate::renderer::buffers::{ObjectsBuffer, UniformBuffer};
use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::renderer::uniforms::SceneUniform;
use crate::renderer::{Depth, Vertex};
use crate::scene::PolygonMode;

/// Polygon mode the device can actually rasterize. Line and point modes need
/// their adapter features; without them the fill pipeline is used.
pub fn supported_mode(requested: PolygonMode, features: wgpu::Features) -> PolygonMode {
    let needed = match requested {
        PolygonMode::Fill => return PolygonMode::Fill,
        PolygonMode::Line => wgpu::Features::POLYGON_MODE_LINE,
        PolygonMode::Point => wgpu::Features::POLYGON_MODE_POINT,
    };
    if features.contains(needed) {
        requested
    } else {
        PolygonMode::Fill
    }
}

/// The lit pipeline, once per available polygon mode.
/// Groups: 0 scene uniform, 1 objects, 2 shadow map, 3 material.
pub(crate) struct ScenePipelines {
    fill: wgpu::RenderPipeline,
    line: Option<wgpu::RenderPipeline>,
    point: Option<wgpu::RenderPipeline>,
    pub(crate) uniform: UniformBuffer<SceneUniform>,
    features: wgpu::Features,
    warned: Option<PolygonMode>,
}

impl ScenePipelines {
    pub(crate) fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        shader: &wgpu::ShaderModule,
        objects: &ObjectsBuffer,
        shadow_layout: &wgpu::BindGroupLayout,
        material_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let uniform = UniformBuffer::new(
            device,
            "SceneUniform",
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            &SceneUniform::zeroed(),
        );

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ScenePipelineLayout"),
            bind_group_layouts: &[
                &uniform.bind_layout,
                &objects.bind_layout,
                shadow_layout,
                material_layout,
            ],
            push_constant_ranges: &[],
        });

        let features = device.features();
        let build = |label: &'static str, mode: wgpu::PolygonMode| {
            PipelineBuilder::new(device, &layout, shader)
                .with_label(label)
                .with_vertex_buffer(Vertex::layout())
                .with_color_target(color_format, Some(wgpu::BlendState::REPLACE))
                .with_depth_stencil(Depth::FORMAT, true, wgpu::CompareFunction::Less)
                .with_polygon_mode(mode)
                .build()
        };

        let fill = build("SceneFillPipeline", wgpu::PolygonMode::Fill);
        let line = features
            .contains(wgpu::Features::POLYGON_MODE_LINE)
            .then(|| build("SceneLinePipeline", wgpu::PolygonMode::Line));
        let point = features
            .contains(wgpu::Features::POLYGON_MODE_POINT)
            .then(|| build("ScenePointPipeline", wgpu::PolygonMode::Point));

        Self {
            fill,
            line,
            point,
            uniform,
            features,
            warned: None,
        }
    }

    /// Pipeline for `mode`, falling back to fill. Logs once per change of
    /// unsupported request.
    pub(crate) fn select(&mut self, mode: PolygonMode) -> &wgpu::RenderPipeline {
        let resolved = supported_mode(mode, self.features);
        if resolved != mode && self.warned != Some(mode) {
            log::warn!("{:?} polygon mode is not supported by this adapter, drawing filled", mode);
            self.warned = Some(mode);
        }

        match resolved {
            PolygonMode::Line => self.line.as_ref().unwrap_or(&self.fill),
            PolygonMode::Point => self.point.as_ref().unwrap_or(&self.fill),
            PolygonMode::Fill => &self.fill,
        }
    }
}
