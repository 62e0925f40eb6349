//! Display backends
//!
//! The application loop talks to a [`Display`]: something that produces
//! window events and shows finished frames.
//!
//! - [`GlfwDisplay`]: a real GLFW window presented through Vulkan
//! - [`HeadlessDisplay`]: scripted events and captured frames for tests

pub mod glfw_display;
pub mod headless;

pub use glfw_display::GlfwDisplay;
pub use headless::{HeadlessDisplay, HeadlessProbe};

use thiserror::Error;

use crate::events::EventQueue;
use crate::render::vulkan::VulkanError;
use crate::render::Bitmap;

/// Display errors
#[derive(Error, Debug)]
pub enum DisplayError {
    /// The windowing system could not be initialized
    #[error("Windowing system initialization failed: {0}")]
    InitializationFailed(String),

    /// The window could not be created
    #[error("Window creation failed: {0}")]
    CreationFailed(String),

    /// Presentation backend failure
    #[error("Presentation failed: {0}")]
    Present(#[from] VulkanError),
}

/// A window the loop renders into
///
/// Implementations are driven from the loop thread only.
pub trait Display {
    /// Current client area size in pixels
    fn size(&self) -> (u32, u32);

    /// Window title
    fn title(&self) -> &str;

    /// Move pending window, keyboard and mouse events into `queue`
    ///
    /// Never blocks.
    fn pump_events(&mut self, queue: &mut EventQueue);

    /// Accept the size reported by the last resize event
    fn acknowledge_resize(&mut self);

    /// Show a finished frame
    fn present(&mut self, frame: &Bitmap) -> Result<(), DisplayError>;
}
