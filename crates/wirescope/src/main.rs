//! `wirescope [FILE...]`: open the viewer, optionally loading the given
//! files as one asset. More files can be dropped onto the window.

use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        log::info!("no file given; drop a .glb or .gltf onto the window");
    }

    match wirescope::window::run(paths) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
