// renderer/skybox.rs
//
// Cube-mapped background drawn after the scene at maximum depth. Geometry
// comes from the vertex index, so no vertex buffer is bound.
use std::path::{Path, PathBuf};

use bytemuck::Zeroable;
use glam::Vec3;
use image::RgbaImage;

use crate::asset::{load_rgba, LoadError};
use crate::renderer::buffers::UniformBuffer;
use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::renderer::texture::write_rgba_layer;
use crate::renderer::uniforms::SkyboxUniform;
use crate::renderer::Depth;
use crate::scene::{DayNight, FrameSnapshot};

const CUBE_VERTEX_COUNT: u32 = 36;

/// Six decoded faces in layer order +X, -X, +Y, -Y, +Z, -Z.
#[derive(Debug)]
pub struct CubeImages {
    size: u32,
    faces: Vec<RgbaImage>,
}

impl CubeImages {
    pub fn load(paths: &[PathBuf; 6]) -> Result<Self, LoadError> {
        let faces = paths
            .iter()
            .map(|path| load_rgba(path))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_images(paths, faces)
    }

    /// Every face must be square and share the first face's size.
    pub fn from_images(paths: &[PathBuf; 6], faces: Vec<RgbaImage>) -> Result<Self, LoadError> {
        let size = faces.first().map(|face| face.width()).unwrap_or(0);
        for (path, face) in paths.iter().zip(&faces) {
            if face.width() != face.height() || face.width() != size || size == 0 {
                return Err(LoadError::InvalidImage {
                    path: path.clone(),
                    reason: format!(
                        "cube face is {}x{}, expected {}x{}",
                        face.width(),
                        face.height(),
                        size,
                        size
                    ),
                });
            }
        }
        if faces.len() != paths.len() {
            return Err(LoadError::InvalidImage {
                path: paths.first().cloned().unwrap_or_default(),
                reason: format!("expected 6 cube faces, got {}", faces.len()),
            });
        }
        Ok(Self { size, faces })
    }

    pub fn size(&self) -> u32 {
        self.size
    }
}

pub struct CubeTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

impl CubeTexture {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        images: &CubeImages,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: images.size,
                height: images.size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, face) in images.faces.iter().enumerate() {
            write_rgba_layer(
                queue,
                &texture,
                layer as u32,
                face.as_raw(),
                images.size,
                images.size,
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        Self {
            _texture: texture,
            bind_group,
        }
    }
}

pub(crate) struct Skybox {
    pipeline: wgpu::RenderPipeline,
    uniform: UniformBuffer<SkyboxUniform>,
    cube_layout: wgpu::BindGroupLayout,
    day: Option<CubeTexture>,
    night: Option<CubeTexture>,
}

impl Skybox {
    pub(crate) fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        shader: &wgpu::ShaderModule,
    ) -> Self {
        let uniform = UniformBuffer::new(
            device,
            "SkyboxUniform",
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            &SkyboxUniform::zeroed(),
        );

        let cube_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("SkyboxCubeLayout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
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
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("SkyboxPipelineLayout"),
            bind_group_layouts: &[&uniform.bind_layout, &cube_layout],
            push_constant_ranges: &[],
        });

        let pipeline = PipelineBuilder::new(device, &layout, shader)
            .with_label("SkyboxPipeline")
            .with_color_target(color_format, Some(wgpu::BlendState::REPLACE))
            .with_depth_stencil(Depth::FORMAT, false, wgpu::CompareFunction::LessEqual)
            .with_no_culling()
            .build();

        Self {
            pipeline,
            uniform,
            cube_layout,
            day: None,
            night: None,
        }
    }

    pub(crate) fn set_faces(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        time: DayNight,
        images: &CubeImages,
    ) {
        let label = match time {
            DayNight::Day => "DaySkybox",
            DayNight::Night => "NightSkybox",
        };
        let cube = CubeTexture::new(device, queue, &self.cube_layout, images, label);
        log::info!("Loaded {} ({}px faces)", label, images.size());
        match time {
            DayNight::Day => self.day = Some(cube),
            DayNight::Night => self.night = Some(cube),
        }
    }

    pub(crate) fn prepare(&self, queue: &wgpu::Queue, frame: &FrameSnapshot, fog_color: Vec3) {
        self.uniform
            .write(queue, &SkyboxUniform::from_snapshot(frame, fog_color));
    }

    /// Draws the cube for the current time of day; nothing if it was never
    /// loaded.
    pub(crate) fn draw(&self, pass: &mut wgpu::RenderPass<'_>, time: DayNight) {
        let cube = match time {
            DayNight::Day => self.day.as_ref(),
            DayNight::Night => self.night.as_ref(),
        };
        let Some(cube) = cube else {
            return;
        };

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform.bind_group, &[]);
        pass.set_bind_group(1, &cube.bind_group, &[]);
        pass.draw(0..CUBE_VERTEX_COUNT, 0..1);
    }
}

/// Face paths for a directory holding `right`, `left`, `top`, `bottom`,
/// `back` and `front` images with the given extension.
pub fn face_paths(dir: &Path, extension: &str) -> [PathBuf; 6] {
    ["right", "left", "top", "bottom", "back", "front"]
        .map(|face| dir.join(format!("{face}.{extension}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> [PathBuf; 6] {
        face_paths(Path::new("sky"), "png")
    }

    #[test]
    fn face_paths_follow_cube_layer_order() {
        let names: Vec<String> = paths()
            .iter()
            .map(|p| p.file_stem().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["right", "left", "top", "bottom", "back", "front"]);
    }

    #[test]
    fn equal_square_faces_are_accepted() {
        let faces = (0..6).map(|_| RgbaImage::new(4, 4)).collect();
        let cube = CubeImages::from_images(&paths(), faces).unwrap();
        assert_eq!(cube.size(), 4);
    }

    #[test]
    fn mismatched_face_is_rejected_with_its_path() {
        let mut faces: Vec<RgbaImage> = (0..6).map(|_| RgbaImage::new(4, 4)).collect();
        faces[3] = RgbaImage::new(8, 8);
        let err = CubeImages::from_images(&paths(), faces).unwrap_err();
        assert!(matches!(err, LoadError::InvalidImage { ref path, .. } if path.ends_with("bottom.png")));
    }

    #[test]
    fn non_square_face_is_rejected() {
        let faces = (0..6).map(|_| RgbaImage::new(4, 2)).collect();
        assert!(CubeImages::from_images(&paths(), faces).is_err());
    }

    #[test]
    fn missing_faces_are_rejected() {
        let faces = (0..5).map(|_| RgbaImage::new(4, 4)).collect();
        assert!(CubeImages::from_images(&paths(), faces).is_err());
    }
}
