//! Minimal application skeleton

use frame_engine::prelude::*;

/// Configuration file read by the `framework` binary
pub const CONFIG_PATH: &str = "config/framework.toml";

/// Built-in settings for the framework demo
pub fn default_config() -> AppConfig {
    AppConfig {
        title: "Framework!".to_string(),
        display_width: 800,
        display_height: 600,
        screen_width: 800,
        screen_height: 600,
        logic_rate: 60.0,
        asset_path: None,
    }
}

/// Clears the screen every frame and quits on Escape
#[derive(Debug, Default)]
pub struct FrameworkApp {
    logic_steps: u64,
}

impl FrameworkApp {
    /// Create the app with no resources
    pub fn new() -> Self {
        Self::default()
    }

    /// Logic steps run so far
    pub fn logic_steps(&self) -> u64 {
        self.logic_steps
    }
}

impl Application for FrameworkApp {
    fn initialize(&mut self, config: &AppConfig) -> Result<(), AppError> {
        log::info!("Framework ready at {} Hz", config.logic_rate);
        Ok(())
    }

    fn handle_event(&mut self, event: &Event) -> LoopControl {
        match event {
            Event::KeyDown(Key::Escape) => LoopControl::Quit,
            _ => LoopControl::Continue,
        }
    }

    fn logic(&mut self, _input: &InputState) -> LoopControl {
        self.logic_steps += 1;
        LoopControl::Continue
    }

    fn draw(&mut self, canvas: &mut Canvas<'_>, _frame: &FrameInfo) {
        canvas.clear_to_color(Color::EIGENGRAU);
    }

    fn shutdown(&mut self) {
        log::debug!("Framework shut down after {} logic steps", self.logic_steps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_engine::platform::HeadlessDisplay;

    fn run_headless(display: HeadlessDisplay, app: &mut FrameworkApp) -> Engine {
        let mut config = default_config();
        config.display_width = 16;
        config.display_height = 12;
        let mut engine = Engine::new(config);
        engine
            .initialize(app, move |_| Ok(Box::new(display) as Box<dyn Display>))
            .unwrap();
        engine.run(app).unwrap();
        engine
    }

    #[test]
    fn test_default_config() {
        let config = default_config();
        assert_eq!(config.title, "Framework!");
        assert_eq!((config.display_width, config.display_height), (800, 600));
        assert_eq!(config.logic_rate, 60.0);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = format!("{}/{}", env!("CARGO_MANIFEST_DIR"), CONFIG_PATH);
        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config, default_config());
    }

    #[test]
    fn test_escape_quits() {
        let display = HeadlessDisplay::new("Framework!", 16, 12)
            .with_idle_pumps(3)
            .with_batch(vec![Event::KeyDown(Key::Escape)]);
        let probe = display.probe();
        let mut app = FrameworkApp::new();

        let mut engine = run_headless(display, &mut app);
        assert!(!engine.is_running());
        assert_eq!(probe.presented_frames(), 4);

        engine.shutdown(&mut app);
        engine.shutdown(&mut app);
        assert!(probe.is_released());
    }

    #[test]
    fn test_other_keys_do_not_quit() {
        let mut app = FrameworkApp::new();
        assert_eq!(app.handle_event(&Event::KeyDown(Key::Q)), LoopControl::Continue);
        assert_eq!(app.handle_event(&Event::KeyUp(Key::Escape)), LoopControl::Continue);
        assert_eq!(app.handle_event(&Event::KeyDown(Key::Escape)), LoopControl::Quit);
    }

    #[test]
    fn test_clears_to_eigengrau() {
        let display = HeadlessDisplay::new("Framework!", 16, 12)
            .with_capture()
            .with_frame_limit(1);
        let probe = display.probe();
        let mut app = FrameworkApp::new();

        let mut engine = run_headless(display, &mut app);
        let frame = probe.last_frame().unwrap();
        let eigengrau = Color::EIGENGRAU.to_premultiplied_argb();
        assert!(frame.pixels().iter().all(|&p| p == eigengrau));

        engine.shutdown(&mut app);
    }
}
