// renderer/renderer.rs
use std::sync::Arc;

use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::asset::{Assets, Mesh, Model, ModelData, ModelPart};
use crate::environment::Environment;
use crate::renderer::buffers::ObjectsBuffer;
use crate::renderer::context::{InitError, RenderContext};
use crate::renderer::diagnostics::ErrorScope;
use crate::renderer::pipeline::ScenePipelines;
use crate::renderer::shader::{ShaderKind, ShaderSource};
use crate::renderer::shadows::ShadowPass;
use crate::renderer::skybox::{CubeImages, Skybox};
use crate::renderer::uniforms::SceneUniform;
use crate::renderer::Material;
use crate::scene::{DayNight, FrameSnapshot};
use crate::settings::Settings;

const MATERIAL_GROUP: u32 = 3;

/// Owns the device and every GPU resource. One `render` call draws the
/// shadow pass and then the main pass from the same snapshot.
pub struct Renderer {
    context: RenderContext,
    objects: ObjectsBuffer,
    shadows: ShadowPass,
    scene: ScenePipelines,
    skybox: Skybox,
    material_layout: wgpu::BindGroupLayout,
    environment: Environment,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, settings: &Settings) -> Result<Self, InitError> {
        let depth_source = ShaderSource::load(&settings.shader_dir, ShaderKind::DepthMap)?;
        let basic_source = ShaderSource::load(&settings.shader_dir, ShaderKind::Basic)?;
        let skybox_source = ShaderSource::load(&settings.shader_dir, ShaderKind::Skybox)?;

        let context = RenderContext::new(window, settings).await?;
        let device = &context.device;
        let scope = ErrorScope::push(device, "renderer startup");

        let objects = ObjectsBuffer::new(device, 8);
        let shadows = ShadowPass::new(
            device,
            settings.shadow_map,
            &objects,
            &depth_source.create_module(device),
        );
        let material_layout = Material::layout(device);
        let scene = ScenePipelines::new(
            device,
            context.config.format,
            &basic_source.create_module(device),
            &objects,
            &shadows.sampling_layout,
            &material_layout,
        );
        let skybox = Skybox::new(
            device,
            context.config.format,
            &skybox_source.create_module(device),
        );

        scope.finish(device);

        Ok(Self {
            context,
            objects,
            shadows,
            scene,
            skybox,
            material_layout,
            environment: Environment::default(),
        })
    }

    pub fn aspect(&self) -> f32 {
        self.context.aspect()
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        let scope = ErrorScope::push(&self.context.device, "resize");
        self.context.resize(new_size);
        scope.finish(&self.context.device);
    }

    /// Reconfigures the surface at its current size after it was lost.
    pub fn reconfigure(&mut self) {
        let scope = ErrorScope::push(&self.context.device, "surface reconfigure");
        self.context.reconfigure();
        scope.finish(&self.context.device);
    }

    /// Uploads decoded model data.
    pub fn create_model(&self, data: &ModelData) -> Model {
        let device = &self.context.device;
        let scope = ErrorScope::push(device, "model upload");

        let parts = data
            .parts
            .iter()
            .enumerate()
            .map(|(index, part)| {
                let label = format!("{}#{}", data.name, index);
                ModelPart {
                    mesh: Mesh::from_vertices(device, &label, &part.vertices, &part.indices),
                    material: Material::new(
                        device,
                        &self.context.queue,
                        &self.material_layout,
                        &part.base_color,
                        &label,
                    ),
                }
            })
            .collect();

        scope.finish(device);
        log::debug!("Uploaded model {} ({} vertices)", data.name, data.vertex_count());

        Model {
            name: data.name.clone(),
            parts,
        }
    }

    pub fn set_skybox(&mut self, time: DayNight, images: &CubeImages) {
        let scope = ErrorScope::push(&self.context.device, "skybox upload");
        self.skybox
            .set_faces(&self.context.device, &self.context.queue, time, images);
        scope.finish(&self.context.device);
    }

    pub fn render(&mut self, frame: &FrameSnapshot, assets: &Assets) -> Result<(), wgpu::SurfaceError> {
        let scope = ErrorScope::push(&self.context.device, "frame");
        let result = self.draw_frame(frame, assets);
        scope.finish(&self.context.device);
        result
    }

    fn draw_frame(&mut self, frame: &FrameSnapshot, assets: &Assets) -> Result<(), wgpu::SurfaceError> {
        let output = self.context.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let device = &self.context.device;
        let queue = &self.context.queue;

        self.objects.write(device, queue, &frame.objects);
        self.scene.uniform.write(
            queue,
            &SceneUniform::from_snapshot(frame, self.environment.fog_color()),
        );
        self.skybox
            .prepare(queue, frame, self.environment.fog_color());

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("FrameEncoder"),
        });

        self.shadows
            .render(&mut encoder, queue, frame, &self.objects, assets);

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.environment.clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.context.depth.view,
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
                self.context.config.width as f32,
                self.context.config.height as f32,
                0.0,
                1.0,
            );
            pass.set_pipeline(self.scene.select(frame.polygon_mode));
            pass.set_bind_group(0, &self.scene.uniform.bind_group, &[]);
            pass.set_bind_group(1, &self.objects.bind_group, &[]);
            pass.set_bind_group(2, &self.shadows.sampling_group, &[]);

            for (index, object) in frame.objects.iter().enumerate() {
                match assets.models.get(object.model) {
                    Some(model) => {
                        log::trace!("Drawing {} as instance {}", model.name, index);
                        model.draw(&mut pass, MATERIAL_GROUP, index as u32);
                    }
                    None => log::trace!("No model for {:?}, skipped", object.model),
                }
            }

            self.skybox.draw(&mut pass, frame.day_night);
        }

        queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }
}
