use std::fmt;
use std::sync::Arc;

use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::asset::LoadError;
use crate::renderer::diagnostics::{log_uncaptured_errors, ErrorScope};
use crate::renderer::Depth;
use crate::settings::Settings;

/// Startup failures. Any of these ends the process before the first frame.
#[derive(Debug)]
pub enum InitError {
    EventLoop(winit::error::EventLoopError),
    Window(winit::error::OsError),
    Surface(wgpu::CreateSurfaceError),
    Adapter(wgpu::RequestAdapterError),
    Device(wgpu::RequestDeviceError),
    Load(LoadError),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::EventLoop(err) => write!(f, "Event loop failed: {}", err),
            InitError::Window(err) => write!(f, "Failed to create window: {}", err),
            InitError::Surface(err) => write!(f, "Failed to create surface: {}", err),
            InitError::Adapter(err) => write!(f, "No suitable GPU adapter: {}", err),
            InitError::Device(err) => write!(f, "Failed to create device: {}", err),
            InitError::Load(err) => write!(f, "Failed to load resources: {}", err),
        }
    }
}

impl std::error::Error for InitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InitError::EventLoop(err) => Some(err),
            InitError::Window(err) => Some(err),
            InitError::Surface(err) => Some(err),
            InitError::Adapter(err) => Some(err),
            InitError::Device(err) => Some(err),
            InitError::Load(err) => Some(err),
        }
    }
}

impl From<LoadError> for InitError {
    fn from(err: LoadError) -> Self {
        InitError::Load(err)
    }
}

pub(crate) struct RenderContext {
    pub(crate) surface: wgpu::Surface<'static>,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    pub(crate) config: wgpu::SurfaceConfiguration,
    pub(crate) size: PhysicalSize<u32>,
    pub(crate) depth: Depth,
}

impl RenderContext {
    pub(crate) async fn new(window: Arc<Window>, settings: &Settings) -> Result<Self, InitError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(InitError::Surface)?;

        log::info!("Surface created successfully!");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(InitError::Adapter)?;

        log::info!("Using adapter: {:?}", adapter.get_info());
        log::info!("Using backend: {:?}", adapter.get_info().backend);

        let adapter_features = adapter.features();
        let mut required_features = wgpu::Features::empty();
        for feature in [
            wgpu::Features::POLYGON_MODE_LINE,
            wgpu::Features::POLYGON_MODE_POINT,
        ] {
            if adapter_features.contains(feature) {
                required_features |= feature;
            } else {
                log::warn!("{:?} not supported, polygon mode falls back to fill", feature);
            }
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features,
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(InitError::Device)?;
        log_uncaptured_errors(&device);

        let surface_caps = surface.get_capabilities(&adapter);

        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: settings.present_mode(&surface_caps.present_modes),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        let scope = ErrorScope::push(&device, "surface setup");
        surface.configure(&device, &config);
        log::info!("Surface format {:?}, present mode {:?}", config.format, config.present_mode);

        let depth = Depth::new(&device, size);
        scope.finish(&device);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            depth,
        })
    }

    pub(crate) fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }

    /// Zero-sized requests (minimized window) are ignored.
    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.reconfigure();
    }

    pub(crate) fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
        self.depth = Depth::new(&self.device, self.size);
    }
}
