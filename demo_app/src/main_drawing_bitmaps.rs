//! Drawing Bitmaps demo: press 1, 2 or 3 to switch how the inventory is drawn

use demo_app::drawing_bitmaps::{self, DrawingBitmapsApp};
use frame_engine::config::{AppConfig, Config};
use frame_engine::foundation::logging;
use frame_engine::Engine;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    log::info!("Starting Drawing Bitmaps demo");

    let config = match frame_engine::config::resolve_path(drawing_bitmaps::CONFIG_PATH) {
        Some(path) => AppConfig::load_or(&path.to_string_lossy(), drawing_bitmaps::default_config())?,
        None => drawing_bitmaps::default_config(),
    };

    let mut app = DrawingBitmapsApp::new();
    let mut engine = Engine::new(config);

    let result = engine.initialize_windowed(&mut app).and_then(|()| engine.run(&mut app));
    engine.shutdown(&mut app);

    match result {
        Ok(()) => {
            log::info!("Drawing Bitmaps demo completed successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Drawing Bitmaps demo failed: {}", e);
            Err(e.into())
        }
    }
}
