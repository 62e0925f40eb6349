//! Framework demo: an empty fixed-rate loop clearing the window

use demo_app::framework::{self, FrameworkApp};
use frame_engine::config::{AppConfig, Config};
use frame_engine::foundation::logging;
use frame_engine::Engine;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    log::info!("Starting Framework demo");

    let config = match frame_engine::config::resolve_path(framework::CONFIG_PATH) {
        Some(path) => AppConfig::load_or(&path.to_string_lossy(), framework::default_config())?,
        None => framework::default_config(),
    };

    let mut app = FrameworkApp::new();
    let mut engine = Engine::new(config);

    let result = engine.initialize_windowed(&mut app).and_then(|()| engine.run(&mut app));
    engine.shutdown(&mut app);

    match result {
        Ok(()) => {
            log::info!("Framework demo completed successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Framework demo failed: {}", e);
            Err(e.into())
        }
    }
}
