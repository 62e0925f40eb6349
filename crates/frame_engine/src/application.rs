//! Application trait and lifecycle management

use thiserror::Error;

use crate::config::AppConfig;
use crate::events::Event;
use crate::input::InputState;
use crate::render::{AssetError, Canvas};

/// Whether the loop keeps going after a callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopControl {
    /// Keep running
    #[default]
    Continue,
    /// Leave the loop after the current iteration
    Quit,
}

/// Per-frame information handed to [`Application::draw`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    /// Display width in pixels
    pub display_width: u32,
    /// Display height in pixels
    pub display_height: u32,
    /// Averaged frames per second
    pub fps: f64,
    /// Frames rendered before this one
    pub frame_index: u64,
}

/// Application lifecycle trait
///
/// Implement this trait to drive an application with the [`Engine`](crate::Engine).
/// Resources created in `initialize` belong to the application and must be
/// released in `shutdown`, which may run after a failed `initialize` and may
/// run more than once.
pub trait Application {
    /// Acquire application resources
    ///
    /// Called once after the engine created the display, timer and queue.
    /// Any error aborts startup.
    fn initialize(&mut self, config: &AppConfig) -> Result<(), AppError>;

    /// Observe a raw event before the engine applies it
    ///
    /// Called for every event drained from the queue.
    fn handle_event(&mut self, _event: &Event) -> LoopControl {
        LoopControl::Continue
    }

    /// Run one fixed-rate logic step
    ///
    /// Called at most once per loop iteration, only when a timer tick arrived.
    fn logic(&mut self, input: &InputState) -> LoopControl;

    /// Render one frame into the backbuffer
    ///
    /// Called once per loop iteration whether or not logic ran.
    fn draw(&mut self, canvas: &mut Canvas<'_>, frame: &FrameInfo);

    /// Release application resources
    fn shutdown(&mut self);
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Asset loading error
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Resource creation error
    #[error("Resource error: {0}")]
    Resource(String),
}
