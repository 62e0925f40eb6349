//! Bitmap drawing demo
//!
//! Loads an inventory bitmap and shows it one of three ways, switched with
//! the `1`, `2` and `3` keys:
//!
//! 1. drawn straight onto the backbuffer
//! 2. drawn into a fixed-size offscreen buffer that is then stretched over
//!    the backbuffer
//! 3. drawn onto the backbuffer through a scale transform that maps the
//!    offscreen size onto the backbuffer size
//!
//! Modes 2 and 3 look the same; they are two ways of scaling a fixed logical
//! screen to a resizable window.

use frame_engine::prelude::*;
use frame_engine::render::Region;

/// Configuration file read by the `drawing_bitmaps` binary
pub const CONFIG_PATH: &str = "config/drawing_bitmaps.toml";

/// Bitmap shown by the demo
pub const INVENTORY_ASSET: &str = "assets/inventory.png";

/// Built-in settings for the drawing demo
pub fn default_config() -> AppConfig {
    AppConfig {
        title: "Drawing Bitmaps!".to_string(),
        display_width: 500,
        display_height: 500,
        screen_width: 500,
        screen_height: 500,
        logic_rate: 60.0,
        asset_path: Some(INVENTORY_ASSET.to_string()),
    }
}

/// How the inventory reaches the backbuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawingMode {
    /// Draw directly at the origin
    #[default]
    Default,
    /// Draw offscreen, then stretch the offscreen buffer over the target
    DoubleBuffer,
    /// Draw through a scale transform
    Transform,
}

impl DrawingMode {
    /// Every mode, in key order
    pub const ALL: [Self; 3] = [Self::Default, Self::DoubleBuffer, Self::Transform];

    /// Name shown in the HUD
    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::DoubleBuffer => "Double Buffer",
            Self::Transform => "Transform",
        }
    }

    /// Mode selected by `key`, if any
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::Num1 => Some(Self::Default),
            Key::Num2 => Some(Self::DoubleBuffer),
            Key::Num3 => Some(Self::Transform),
            _ => None,
        }
    }
}

/// The drawing demo
///
/// Resources are `None` until [`Application::initialize`] creates them and
/// after [`Application::shutdown`] drops them.
#[derive(Debug, Default)]
pub struct DrawingBitmapsApp {
    mode: DrawingMode,
    inventory: Option<Bitmap>,
    double_buffer: Option<Bitmap>,
    font: Option<BuiltinFont>,
}

impl DrawingBitmapsApp {
    /// Create the app with no resources
    pub fn new() -> Self {
        Self::default()
    }

    /// Current drawing mode
    pub fn mode(&self) -> DrawingMode {
        self.mode
    }

    /// Whether any resource is still held
    pub fn holds_resources(&self) -> bool {
        self.inventory.is_some() || self.double_buffer.is_some() || self.font.is_some()
    }

    fn draw_inventory(inventory: &Bitmap, canvas: &mut Canvas<'_>) {
        canvas.clear_to_color(Color::EIGENGRAU);
        canvas.draw_bitmap(inventory, 0.0, 0.0);
    }

    fn draw_double_buffered(inventory: &Bitmap, buffer: &mut Bitmap, canvas: &mut Canvas<'_>) {
        Self::draw_inventory(inventory, &mut Canvas::new(buffer));

        let target = Region::new(0.0, 0.0, canvas.width() as f32, canvas.height() as f32);
        canvas.draw_scaled_bitmap(buffer, Region::of(buffer), target);
    }

    fn draw_transformed(inventory: &Bitmap, buffer: &Bitmap, canvas: &mut Canvas<'_>) {
        let x_scale = canvas.width() as f32 / buffer.width() as f32;
        let y_scale = canvas.height() as f32 / buffer.height() as f32;

        let backup = canvas.transform();
        canvas.use_transform(Transform2D::scaling(x_scale, y_scale).then(&backup));

        Self::draw_inventory(inventory, canvas);

        canvas.use_transform(backup);
    }
}

impl Application for DrawingBitmapsApp {
    fn initialize(&mut self, config: &AppConfig) -> Result<(), AppError> {
        self.double_buffer = Some(Bitmap::new(config.screen_width, config.screen_height));

        let asset = config
            .asset_path
            .as_deref()
            .ok_or_else(|| AppError::Config("no asset_path configured".to_string()))?;
        let path = config
            .resolve_asset_path()
            .ok_or_else(|| AssetError::NotFound(asset.to_string()))?;
        self.inventory = Some(Bitmap::load(path)?);

        self.font = Some(BuiltinFont::new());

        log::info!("Press 1, 2 or 3 to switch drawing modes");
        Ok(())
    }

    fn logic(&mut self, input: &InputState) -> LoopControl {
        if input.keyboard.is_down(Key::Escape) {
            return LoopControl::Quit;
        }

        // Later keys win when several are held
        for key in [Key::Num1, Key::Num2, Key::Num3] {
            if input.keyboard.is_down(key) {
                if let Some(mode) = DrawingMode::from_key(key) {
                    if mode != self.mode {
                        log::debug!("Drawing mode: {}", mode.name());
                    }
                    self.mode = mode;
                }
            }
        }

        LoopControl::Continue
    }

    fn draw(&mut self, canvas: &mut Canvas<'_>, frame: &FrameInfo) {
        canvas.clear_to_color(Color::EIGENGRAU);

        let (Some(inventory), Some(buffer)) = (self.inventory.as_ref(), self.double_buffer.as_mut()) else {
            return;
        };

        match self.mode {
            DrawingMode::Default => Self::draw_inventory(inventory, canvas),
            DrawingMode::DoubleBuffer => Self::draw_double_buffered(inventory, buffer, canvas),
            DrawingMode::Transform => Self::draw_transformed(inventory, buffer, canvas),
        }

        if let Some(font) = self.font.as_ref() {
            let height = frame.display_height as f32;
            canvas.draw_text(
                font,
                Color::WHITE,
                0.0,
                height - 22.0,
                Align::Left,
                &format!("Mode: {}", self.mode.name()),
            );
            canvas.draw_text(
                font,
                Color::WHITE,
                0.0,
                height - 12.0,
                Align::Left,
                &format!("FPS {}", frame.fps as i32),
            );
        }
    }

    fn shutdown(&mut self) {
        if self.font.take().is_some() {
            log::debug!("Font destroyed");
        }
        if self.inventory.take().is_some() {
            log::debug!("Inventory bitmap destroyed");
        }
        if self.double_buffer.take().is_some() {
            log::debug!("Double buffer destroyed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_engine::platform::{HeadlessDisplay, HeadlessProbe};

    const RED: u32 = 0xFFFF_0000;

    fn write_inventory(name: &str) -> String {
        let path = std::env::temp_dir().join(format!("drawing_bitmaps_{}_{}.png", std::process::id(), name));
        image::RgbaImage::from_pixel(8, 8, image::Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();
        path.to_string_lossy().into_owned()
    }

    fn test_config(asset: String) -> AppConfig {
        AppConfig {
            display_width: 64,
            display_height: 64,
            screen_width: 32,
            screen_height: 32,
            asset_path: Some(asset),
            ..default_config()
        }
    }

    fn start(name: &str, batches: Vec<Vec<Event>>) -> (Engine, DrawingBitmapsApp, HeadlessProbe) {
        let mut display = HeadlessDisplay::new("Drawing Bitmaps!", 64, 64).with_capture();
        for batch in batches {
            display = display.with_batch(batch);
        }
        let probe = display.probe();

        let mut app = DrawingBitmapsApp::new();
        let mut engine = Engine::new(test_config(write_inventory(name)));
        engine
            .initialize(&mut app, move |_| Ok(Box::new(display) as Box<dyn Display>))
            .unwrap();
        (engine, app, probe)
    }

    #[test]
    fn test_mode_names_and_keys() {
        let names: Vec<_> = DrawingMode::ALL.iter().map(|m| m.name()).collect();
        assert_eq!(names, ["Default", "Double Buffer", "Transform"]);
        assert_eq!(DrawingMode::from_key(Key::Num2), Some(DrawingMode::DoubleBuffer));
        assert_eq!(DrawingMode::from_key(Key::Num4), None);
        assert_eq!(DrawingMode::default(), DrawingMode::Default);
    }

    #[test]
    fn test_default_config() {
        let config = default_config();
        assert_eq!(config.title, "Drawing Bitmaps!");
        assert_eq!((config.display_width, config.display_height), (500, 500));
        assert_eq!((config.screen_width, config.screen_height), (500, 500));
        assert_eq!(config.asset_path.as_deref(), Some(INVENTORY_ASSET));
    }

    #[test]
    fn test_shipped_files_load() {
        let dir = env!("CARGO_MANIFEST_DIR");
        let config = AppConfig::load_from_file(&format!("{dir}/{CONFIG_PATH}")).unwrap();
        assert_eq!(config, default_config());

        let inventory = Bitmap::load(format!("{dir}/{INVENTORY_ASSET}")).unwrap();
        assert!(!inventory.is_empty());
    }

    #[test]
    fn test_missing_asset_fails_and_shutdown_is_safe() {
        let display = HeadlessDisplay::new("Drawing Bitmaps!", 64, 64);
        let probe = display.probe();
        let mut app = DrawingBitmapsApp::new();
        let mut engine = Engine::new(test_config("assets/does_not_exist.png".to_string()));

        let result = engine.initialize(&mut app, move |_| Ok(Box::new(display) as Box<dyn Display>));
        assert!(matches!(
            result,
            Err(EngineError::Application(AppError::Asset(AssetError::NotFound(_))))
        ));
        assert!(app.double_buffer.is_some());
        assert!(app.font.is_none());

        engine.shutdown(&mut app);
        assert!(!app.holds_resources());
        assert!(probe.is_released());
        engine.shutdown(&mut app);
    }

    #[test]
    fn test_default_mode_draws_at_origin() {
        let (mut engine, mut app, probe) = start("default", vec![]);
        engine.step(&mut app).unwrap();

        let frame = probe.last_frame().unwrap();
        assert_eq!(frame.pixel(0, 0), Some(RED));
        assert_eq!(frame.pixel(7, 7), Some(RED));
        assert_eq!(frame.pixel(8, 8), Some(Color::EIGENGRAU.to_premultiplied_argb()));

        engine.shutdown(&mut app);
        assert!(!app.holds_resources());
    }

    #[test]
    fn test_double_buffer_mode_scales_to_target() {
        let (mut engine, mut app, probe) =
            start("double_buffer", vec![vec![Event::KeyDown(Key::Num2), Event::Timer { count: 1 }]]);
        engine.step(&mut app).unwrap();
        assert_eq!(app.mode(), DrawingMode::DoubleBuffer);

        let frame = probe.last_frame().unwrap();
        assert_eq!(frame.pixel(0, 0), Some(RED));
        assert_eq!(frame.pixel(15, 15), Some(RED));
        assert_eq!(frame.pixel(17, 17), Some(Color::EIGENGRAU.to_premultiplied_argb()));

        engine.shutdown(&mut app);
    }

    #[test]
    fn test_transform_mode_matches_double_buffer() {
        let (mut engine, mut app, probe) = start(
            "transform",
            vec![
                vec![Event::KeyDown(Key::Num2), Event::Timer { count: 1 }],
                vec![Event::KeyUp(Key::Num2), Event::KeyDown(Key::Num3), Event::Timer { count: 2 }],
            ],
        );
        engine.step(&mut app).unwrap();
        let double_buffered = probe.last_frame().unwrap();

        engine.step(&mut app).unwrap();
        assert_eq!(app.mode(), DrawingMode::Transform);
        let transformed = probe.last_frame().unwrap();

        assert_eq!(transformed.pixel(15, 15), Some(RED));
        assert_eq!(transformed.pixel(17, 17), Some(Color::EIGENGRAU.to_premultiplied_argb()));
        // The HUD text differs, the scaled picture above it does not
        for y in 0..32 {
            for x in 0..64 {
                assert_eq!(transformed.pixel(x, y), double_buffered.pixel(x, y), "pixel ({x}, {y})");
            }
        }

        engine.shutdown(&mut app);
    }

    #[test]
    fn test_highest_held_mode_key_wins() {
        let (mut engine, mut app, _probe) = start(
            "held_keys",
            vec![vec![Event::KeyDown(Key::Num1), Event::KeyDown(Key::Num3), Event::Timer { count: 1 }]],
        );
        engine.step(&mut app).unwrap();
        assert_eq!(app.mode(), DrawingMode::Transform);

        let mut input = InputState::new();
        input.apply(&Event::KeyDown(Key::Num2));
        input.apply(&Event::KeyDown(Key::Num1));
        assert_eq!(app.logic(&input), LoopControl::Continue);
        assert_eq!(app.mode(), DrawingMode::DoubleBuffer);

        engine.shutdown(&mut app);
    }

    #[test]
    fn test_hud_drawn_near_bottom() {
        let (mut engine, mut app, probe) = start("hud", vec![]);
        engine.step(&mut app).unwrap();

        let frame = probe.last_frame().unwrap();
        let white = Color::WHITE.to_premultiplied_argb();
        let hud_rows = |rows: std::ops::Range<u32>| {
            rows.flat_map(|y| (0..64).map(move |x| (x, y)))
                .filter(|&(x, y)| frame.pixel(x, y) == Some(white))
                .count()
        };
        // "Mode: ..." at h - 22, "FPS n" at h - 12
        assert!(hud_rows(42..50) > 0);
        assert!(hud_rows(52..60) > 0);
        assert_eq!(hud_rows(20..40), 0);

        engine.shutdown(&mut app);
    }

    #[test]
    fn test_escape_quits() {
        let (mut engine, mut app, _probe) =
            start("escape", vec![vec![Event::KeyDown(Key::Escape), Event::Timer { count: 1 }]]);
        engine.run(&mut app).unwrap();
        assert!(!engine.is_running());
        engine.shutdown(&mut app);
    }
}
