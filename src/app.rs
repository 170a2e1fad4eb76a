// app.rs
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::*,
    event_loop::ActiveEventLoop,
    keyboard::PhysicalKey,
    window::{CursorGrabMode, Window, WindowId},
};

use crate::asset::Assets;
use crate::input::{Controller, InputState};
use crate::renderer::{InitError, Renderer};
use crate::scene::{load_scene, FrameState};
use crate::settings::Settings;

/// Everything that exists once the window is up.
struct Running {
    window: Arc<Window>,
    renderer: Renderer,
    assets: Assets,
    state: FrameState,
}

pub struct App {
    settings: Settings,
    controller: Controller,
    input: InputState,
    running: Option<Running>,
    error: Option<InitError>,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self {
            controller: Controller::new(settings.controls.clone()),
            settings,
            input: InputState::new(),
            running: None,
            error: None,
        }
    }

    /// The startup failure that ended the event loop, if any.
    pub fn take_error(&mut self) -> Option<InitError> {
        self.error.take()
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> Result<Running, InitError> {
        let attributes = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.settings.resolution.width,
                self.settings.resolution.height,
            ));
        let window = Arc::new(event_loop.create_window(attributes).map_err(InitError::Window)?);
        grab_cursor(&window);

        let mut renderer = pollster::block_on(Renderer::new(window.clone(), &self.settings))?;
        let (assets, objects) = load_scene(&mut renderer, &self.settings)?;
        log::info!("Scene ready: {} objects, {} models", objects.len(), assets.models.len());

        let mut state = FrameState::from_settings(&self.settings, renderer.aspect());
        state.objects = objects;

        Ok(Running {
            window,
            renderer,
            assets,
            state,
        })
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        self.controller.apply(&mut self.input, &mut running.state);
        let snapshot = running.state.snapshot();

        match running.renderer.render(&snapshot, &running.assets) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                running.renderer.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Surface out of memory, exiting");
                event_loop.exit();
                return;
            }
            Err(err) => log::warn!("Frame skipped: {:?}", err),
        }

        running.state.advance();

        if running.state.should_close() {
            event_loop.exit();
        } else {
            running.window.request_redraw();
        }
    }
}

/// Confines and hides the cursor for mouse-look. Platforms differ in which
/// grab mode they support, so both are tried.
fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Confined)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked));
    if let Err(err) = grabbed {
        log::warn!("Cursor grab unavailable: {}", err);
    }
    window.set_cursor_visible(false);
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() || self.error.is_some() {
            return;
        }

        match self.start(event_loop) {
            Ok(running) => {
                running.window.request_redraw();
                self.running = Some(running);
            }
            Err(err) => {
                log::error!("{}", err);
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        if id != running.window.id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                log::info!("Window resized to {}x{}", size.width, size.height);
                running.renderer.resize(size);
                running.state.set_aspect(running.renderer.aspect());
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = running.window.inner_size();
                running.renderer.resize(size);
                running.state.set_aspect(running.renderer.aspect());
            }
            WindowEvent::Focused(false) => {
                self.input.clear();
                self.controller.reset_latches();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                self.input.handle_key(code, state == ElementState::Pressed);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.input.handle_mouse_motion(dx, dy);
        }
    }
}
