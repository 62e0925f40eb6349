//! Core engine implementation
//!
//! The engine is the application loop: it owns the display, the logic timer,
//! the event queue and the backbuffer, and drives an [`Application`] through
//! input → logic → draw → present until something asks it to stop.

use thiserror::Error;

use crate::application::{AppError, Application, FrameInfo, LoopControl};
use crate::config::{AppConfig, ConfigError};
use crate::events::{Event, EventQueue};
use crate::foundation::time::{FpsCounter, LogicTimer};
use crate::input::InputState;
use crate::platform::{Display, DisplayError, GlfwDisplay};
use crate::render::{Bitmap, Canvas};

/// Main engine struct
///
/// Every handle is `None` until acquired and `None` again after
/// [`Engine::shutdown`], so shutdown can run after a partial initialization
/// and any number of times.
pub struct Engine {
    config: AppConfig,
    display: Option<Box<dyn Display>>,
    backbuffer: Option<Bitmap>,
    logic_timer: Option<LogicTimer>,
    event_queue: Option<EventQueue>,
    input: InputState,
    fps: FpsCounter,
    frame_index: u64,
    running: bool,
    update_logic: bool,
}

impl Engine {
    /// Create an engine with nothing acquired yet
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            display: None,
            backbuffer: None,
            logic_timer: None,
            event_queue: None,
            input: InputState::new(),
            fps: FpsCounter::new(),
            frame_index: 0,
            running: true,
            update_logic: false,
        }
    }

    /// Acquire the display, backbuffer, timer and queue, then let the
    /// application acquire its own resources
    ///
    /// Stops at the first failure; whatever was created stays in place for
    /// [`Engine::shutdown`] to release.
    pub fn initialize<A, F>(&mut self, app: &mut A, create_display: F) -> Result<(), EngineError>
    where
        A: Application + ?Sized,
        F: FnOnce(&AppConfig) -> Result<Box<dyn Display>, DisplayError>,
    {
        log::info!("Initializing \"{}\"...", self.config.title);
        self.config.validate()?;

        let display = create_display(&self.config)?;
        let (width, height) = display.size();
        log::info!("Display \"{}\" created ({}x{})", display.title(), width, height);
        self.display = Some(display);

        self.backbuffer = Some(Bitmap::new(width, height));

        let timer = LogicTimer::new(self.config.logic_rate).ok_or_else(|| {
            EngineError::InitializationFailed(format!("logic timer at {} Hz", self.config.logic_rate))
        })?;
        log::debug!("Logic timer period {:?}", timer.period());
        self.logic_timer = Some(timer);

        self.event_queue = Some(EventQueue::new());

        app.initialize(&self.config)?;

        self.running = true;
        log::info!("Initialization complete");
        Ok(())
    }

    /// [`Engine::initialize`] with a GLFW window sized from the configuration
    pub fn initialize_windowed<A>(&mut self, app: &mut A) -> Result<(), EngineError>
    where
        A: Application + ?Sized,
    {
        self.initialize(app, |config| {
            let display = GlfwDisplay::new(&config.title, config.display_width, config.display_height)?;
            Ok(Box::new(display) as Box<dyn Display>)
        })
    }

    /// Run the loop until the display closes or the application quits
    pub fn run<A>(&mut self, app: &mut A) -> Result<(), EngineError>
    where
        A: Application + ?Sized,
    {
        if !self.is_initialized() {
            return Err(EngineError::NotInitialized);
        }

        if let Some(timer) = self.logic_timer.as_mut() {
            timer.start();
        }

        log::info!("Starting main loop...");

        let mut result = Ok(());
        while self.running {
            if let Err(e) = self.step(app) {
                log::error!("Main loop aborted: {}", e);
                result = Err(e);
                break;
            }
        }

        if let Some(timer) = self.logic_timer.as_mut() {
            timer.stop();
        }

        log::info!("Main loop finished after {} frames", self.frame_index);
        result
    }

    /// One loop iteration: drain events, run logic if due, render one frame
    pub fn step<A>(&mut self, app: &mut A) -> Result<(), EngineError>
    where
        A: Application + ?Sized,
    {
        self.process_events(app)?;

        if self.update_logic {
            self.update_logic = false;
            if app.logic(&self.input) == LoopControl::Quit {
                log::info!("Application requested quit");
                self.running = false;
            }
        }

        self.render(app)?;

        self.fps.frame();
        self.frame_index += 1;
        Ok(())
    }

    fn process_events<A>(&mut self, app: &mut A) -> Result<(), EngineError>
    where
        A: Application + ?Sized,
    {
        let (Some(display), Some(queue)) = (self.display.as_mut(), self.event_queue.as_mut()) else {
            return Err(EngineError::NotInitialized);
        };

        display.pump_events(queue);
        if let Some(timer) = self.logic_timer.as_mut() {
            timer.pump(queue);
        }

        while let Some(event) = queue.next_event() {
            if app.handle_event(&event) == LoopControl::Quit {
                log::info!("Application requested quit on {:?}", event);
                self.running = false;
            }

            match event {
                Event::Timer { .. } => self.update_logic = true,
                Event::DisplayResize { width, height } => {
                    display.acknowledge_resize();
                    let (w, h) = display.size();
                    log::debug!("Display resized to {}x{} (reported {}x{})", w, h, width, height);
                    if let Some(backbuffer) = self.backbuffer.as_mut() {
                        backbuffer.resize(w, h);
                    }
                }
                Event::DisplayClose => {
                    log::info!("Display close requested");
                    self.running = false;
                }
                _ => {
                    self.input.apply(&event);
                }
            }
        }

        Ok(())
    }

    fn render<A>(&mut self, app: &mut A) -> Result<(), EngineError>
    where
        A: Application + ?Sized,
    {
        let (Some(display), Some(backbuffer)) = (self.display.as_mut(), self.backbuffer.as_mut()) else {
            return Err(EngineError::NotInitialized);
        };

        let (display_width, display_height) = display.size();
        let info = FrameInfo {
            display_width,
            display_height,
            fps: self.fps.average_fps(),
            frame_index: self.frame_index,
        };

        app.draw(&mut Canvas::new(backbuffer), &info);
        display.present(backbuffer)?;
        Ok(())
    }

    /// Release the application's resources, then the engine's, in reverse
    /// acquisition order
    pub fn shutdown<A>(&mut self, app: &mut A)
    where
        A: Application + ?Sized,
    {
        app.shutdown();
        self.release();
    }

    fn release(&mut self) {
        if self.event_queue.take().is_some() {
            log::debug!("Event queue destroyed");
        }
        if let Some(mut timer) = self.logic_timer.take() {
            timer.stop();
            log::debug!("Logic timer destroyed after {} ticks", timer.count());
        }
        if self.backbuffer.take().is_some() {
            log::debug!("Backbuffer destroyed");
        }
        if let Some(display) = self.display.take() {
            log::info!("Closing display \"{}\"", display.title());
        }

        self.running = false;
        self.update_logic = false;
        self.input.reset();
    }

    /// Whether every engine handle is acquired
    pub fn is_initialized(&self) -> bool {
        self.display.is_some()
            && self.backbuffer.is_some()
            && self.logic_timer.is_some()
            && self.event_queue.is_some()
    }

    /// Whether any engine handle is still held
    pub fn holds_resources(&self) -> bool {
        self.display.is_some()
            || self.backbuffer.is_some()
            || self.logic_timer.is_some()
            || self.event_queue.is_some()
    }

    /// Whether the loop will keep running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether a timer tick is waiting for a logic step
    pub fn is_logic_due(&self) -> bool {
        self.update_logic
    }

    /// Ask the loop to stop after the current iteration
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Current input state
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Averaged frames per second
    pub fn fps(&self) -> f64 {
        self.fps.average_fps()
    }

    /// Frames rendered so far
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Engine configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Backbuffer the application draws into
    pub fn backbuffer(&self) -> Option<&Bitmap> {
        self.backbuffer.as_ref()
    }

    /// Size of the display, if one is open
    pub fn display_size(&self) -> Option<(u32, u32)> {
        self.display.as_ref().map(|d| d.size())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.release();
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Display creation or presentation failed
    #[error("Display error: {0}")]
    Display(#[from] DisplayError),

    /// The application failed
    #[error("Application error: {0}")]
    Application(#[from] AppError),

    /// An engine resource could not be created
    #[error("Engine initialization failed: {0}")]
    InitializationFailed(String),

    /// The loop was driven before a successful initialization
    #[error("Engine is not initialized")]
    NotInitialized,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::color::Color;
    use crate::input::Key;
    use crate::platform::HeadlessDisplay;

    #[derive(Default)]
    struct TestApp {
        fail_initialize: bool,
        quit_on_escape_event: bool,
        initialized: bool,
        logic_calls: usize,
        draw_calls: usize,
        shutdown_calls: usize,
        last_frame: Option<FrameInfo>,
    }

    impl Application for TestApp {
        fn initialize(&mut self, _config: &AppConfig) -> Result<(), AppError> {
            if self.fail_initialize {
                return Err(AppError::Resource("test failure".to_string()));
            }
            self.initialized = true;
            Ok(())
        }

        fn handle_event(&mut self, event: &Event) -> LoopControl {
            if self.quit_on_escape_event && *event == Event::KeyDown(Key::Escape) {
                LoopControl::Quit
            } else {
                LoopControl::Continue
            }
        }

        fn logic(&mut self, input: &InputState) -> LoopControl {
            self.logic_calls += 1;
            if input.keyboard.is_down(Key::Escape) {
                LoopControl::Quit
            } else {
                LoopControl::Continue
            }
        }

        fn draw(&mut self, canvas: &mut Canvas<'_>, frame: &FrameInfo) {
            self.draw_calls += 1;
            self.last_frame = Some(*frame);
            canvas.clear_to_color(Color::EIGENGRAU);
        }

        fn shutdown(&mut self) {
            self.shutdown_calls += 1;
            self.initialized = false;
        }
    }

    fn test_config() -> AppConfig {
        AppConfig {
            title: "test".to_string(),
            display_width: 8,
            display_height: 6,
            ..AppConfig::default()
        }
    }

    fn headless(display: HeadlessDisplay) -> impl FnOnce(&AppConfig) -> Result<Box<dyn Display>, DisplayError> {
        move |_| Ok(Box::new(display) as Box<dyn Display>)
    }

    #[test]
    fn test_display_failure_aborts_and_shutdown_is_idempotent() {
        let mut engine = Engine::new(test_config());
        let mut app = TestApp::default();

        let result = engine.initialize(&mut app, |_| {
            Err(DisplayError::CreationFailed("no display in tests".to_string()))
        });
        assert!(matches!(result, Err(EngineError::Display(_))));
        assert!(!engine.holds_resources());
        assert!(!app.initialized);

        engine.shutdown(&mut app);
        engine.shutdown(&mut app);
        assert!(!engine.holds_resources());
        assert!(!engine.is_running());
        assert_eq!(app.shutdown_calls, 2);
    }

    #[test]
    fn test_app_failure_releases_display() {
        let display = HeadlessDisplay::new("test", 8, 6);
        let probe = display.probe();
        let mut engine = Engine::new(test_config());
        let mut app = TestApp {
            fail_initialize: true,
            ..TestApp::default()
        };

        let result = engine.initialize(&mut app, headless(display));
        assert!(matches!(result, Err(EngineError::Application(_))));
        assert!(engine.is_initialized());
        assert!(!probe.is_released());

        engine.shutdown(&mut app);
        assert!(probe.is_released());
        assert!(!engine.holds_resources());
        engine.shutdown(&mut app);
    }

    #[test]
    fn test_invalid_config_rejected_before_display() {
        let mut engine = Engine::new(AppConfig {
            logic_rate: -1.0,
            ..test_config()
        });
        let mut app = TestApp::default();
        let mut display_created = false;

        let result = engine.initialize(&mut app, |_| {
            display_created = true;
            Err(DisplayError::CreationFailed("unreachable".to_string()))
        });
        assert!(matches!(result, Err(EngineError::Config(_))));
        assert!(!display_created);
    }

    #[test]
    fn test_run_requires_initialization() {
        let mut engine = Engine::new(test_config());
        let mut app = TestApp::default();
        assert!(matches!(engine.run(&mut app), Err(EngineError::NotInitialized)));
        assert!(matches!(engine.step(&mut app), Err(EngineError::NotInitialized)));
    }

    #[test]
    fn test_logic_runs_once_per_due_step() {
        let display = HeadlessDisplay::new("test", 8, 6)
            .with_batch(vec![Event::Timer { count: 1 }, Event::Timer { count: 2 }]);
        let probe = display.probe();
        let mut engine = Engine::new(test_config());
        let mut app = TestApp::default();
        engine.initialize(&mut app, headless(display)).unwrap();

        engine.step(&mut app).unwrap();
        assert_eq!(app.logic_calls, 1);
        assert!(!engine.is_logic_due());
        assert_eq!(app.draw_calls, 1);

        // No tick, no logic, but still a frame
        engine.step(&mut app).unwrap();
        assert_eq!(app.logic_calls, 1);
        assert_eq!(app.draw_calls, 2);
        assert_eq!(probe.presented_frames(), 2);
        assert_eq!(engine.frame_index(), 2);
        assert_eq!(app.last_frame.map(|f| f.frame_index), Some(1));

        engine.shutdown(&mut app);
    }

    #[test]
    fn test_escape_in_logic_stops_loop() {
        let display = HeadlessDisplay::new("test", 8, 6)
            .with_batch(vec![Event::KeyDown(Key::Escape)])
            .with_batch(vec![Event::Timer { count: 1 }]);
        let mut engine = Engine::new(test_config());
        let mut app = TestApp::default();
        engine.initialize(&mut app, headless(display)).unwrap();

        engine.step(&mut app).unwrap();
        assert!(engine.is_running());
        assert!(engine.input().keyboard.is_down(Key::Escape));

        engine.step(&mut app).unwrap();
        assert!(!engine.is_running());
        assert_eq!(app.logic_calls, 1);

        engine.shutdown(&mut app);
    }

    #[test]
    fn test_handle_event_can_quit() {
        let display = HeadlessDisplay::new("test", 8, 6).with_batch(vec![Event::KeyDown(Key::Escape)]);
        let mut engine = Engine::new(test_config());
        let mut app = TestApp {
            quit_on_escape_event: true,
            ..TestApp::default()
        };
        engine.initialize(&mut app, headless(display)).unwrap();

        engine.step(&mut app).unwrap();
        assert!(!engine.is_running());
        assert_eq!(app.logic_calls, 0);
        // The frame is still rendered
        assert_eq!(app.draw_calls, 1);
    }

    #[test]
    fn test_display_close_ends_run() {
        let display = HeadlessDisplay::new("test", 8, 6)
            .with_idle_pumps(2)
            .with_batch(vec![Event::DisplayClose]);
        let probe = display.probe();
        let mut engine = Engine::new(test_config());
        let mut app = TestApp::default();
        engine.initialize(&mut app, headless(display)).unwrap();

        engine.run(&mut app).unwrap();
        assert_eq!(probe.presented_frames(), 3);

        engine.shutdown(&mut app);
        assert!(probe.is_released());
    }

    #[test]
    fn test_frame_limit_run() {
        let display = HeadlessDisplay::new("test", 8, 6).with_frame_limit(5);
        let probe = display.probe();
        let mut engine = Engine::new(test_config());
        let mut app = TestApp::default();
        engine.initialize(&mut app, headless(display)).unwrap();

        engine.run(&mut app).unwrap();
        assert_eq!(probe.presented_frames(), 6);
        assert_eq!(app.draw_calls, 6);
    }

    #[test]
    fn test_resize_resizes_backbuffer() {
        let display = HeadlessDisplay::new("test", 8, 6)
            .with_batch(vec![Event::DisplayResize { width: 20, height: 10 }])
            .with_capture();
        let probe = display.probe();
        let mut engine = Engine::new(test_config());
        let mut app = TestApp::default();
        engine.initialize(&mut app, headless(display)).unwrap();
        assert_eq!(engine.backbuffer().map(Bitmap::size), Some((8, 6)));

        engine.step(&mut app).unwrap();
        assert_eq!(probe.resizes_acknowledged(), 1);
        assert_eq!(engine.display_size(), Some((20, 10)));
        assert_eq!(engine.backbuffer().map(Bitmap::size), Some((20, 10)));

        let frame = probe.last_frame().unwrap();
        assert_eq!(frame.size(), (20, 10));
        assert_eq!(frame.pixel(19, 9), Some(Color::EIGENGRAU.to_premultiplied_argb()));
        assert_eq!(app.last_frame.map(|f| (f.display_width, f.display_height)), Some((20, 10)));
    }

    #[test]
    fn test_drop_releases_display() {
        let display = HeadlessDisplay::new("test", 8, 6);
        let probe = display.probe();
        let mut app = TestApp::default();
        {
            let mut engine = Engine::new(test_config());
            engine.initialize(&mut app, headless(display)).unwrap();
        }
        assert!(probe.is_released());
    }
}
