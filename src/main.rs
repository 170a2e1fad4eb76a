use std::process::ExitCode;

use daynight_scene::settings::Settings;

fn main() -> ExitCode {
    daynight_scene::init_logging();

    match daynight_scene::run(Settings::load()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Application error: {err}");
            ExitCode::FAILURE
        }
    }
}
