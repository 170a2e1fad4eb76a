pub mod app;
pub mod asset;
pub mod environment;
pub mod input;
pub mod io;
pub mod renderer;
pub mod scene;
pub mod settings;

use app::App;
use renderer::InitError;
use settings::Settings;
use winit::event_loop::EventLoop;

/// `info` by default; `RUST_LOG` overrides. Call once, before settings are
/// loaded so their warnings are visible.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}

/// Opens the window and runs the scene until it is closed. Startup failures
/// are returned after the event loop has stopped.
pub fn run(settings: Settings) -> Result<(), InitError> {
    log::info!("Starting day/night scene");

    let event_loop = EventLoop::new().map_err(InitError::EventLoop)?;
    let mut app = App::new(settings);

    let result = event_loop.run_app(&mut app);

    if let Some(err) = app.take_error() {
        return Err(err);
    }
    if let Err(ref err) = result {
        log::error!("Application error: {}", err);
    }

    log::info!("Application shutdown complete");

    result.map_err(InitError::EventLoop)
}
