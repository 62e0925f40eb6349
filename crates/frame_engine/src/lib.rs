//! # Frame Engine
//!
//! A small application-loop engine: one window, a fixed-rate logic timer, an
//! event queue and a software 2D renderer whose frames are presented through
//! Vulkan.
//!
//! ## Features
//!
//! - **Fixed-rate logic**: timer ticks mark logic as due, rendering runs every iteration
//! - **Software drawing**: bitmaps, scaled blits, affine transforms, built-in font
//! - **Vulkan presentation**: CPU frames copied straight into the swapchain
//! - **Headless backend**: deterministic loop tests without a window
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use frame_engine::prelude::*;
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, _config: &AppConfig) -> Result<(), AppError> {
//!         Ok(())
//!     }
//!
//!     fn logic(&mut self, input: &InputState) -> LoopControl {
//!         if input.keyboard.is_down(Key::Escape) {
//!             LoopControl::Quit
//!         } else {
//!             LoopControl::Continue
//!         }
//!     }
//!
//!     fn draw(&mut self, canvas: &mut Canvas<'_>, _frame: &FrameInfo) {
//!         canvas.clear_to_color(Color::EIGENGRAU);
//!     }
//!
//!     fn shutdown(&mut self) {}
//! }
//!
//! fn main() {
//!     frame_engine::foundation::logging::init();
//!     let mut app = MyApp;
//!     let mut engine = Engine::new(AppConfig::default());
//!     if engine.initialize_windowed(&mut app).is_ok() {
//!         let _ = engine.run(&mut app);
//!     }
//!     engine.shutdown(&mut app);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod events;
pub mod foundation;
pub mod input;
pub mod platform;
pub mod render;

mod application;
mod engine;

pub use application::{AppError, Application, FrameInfo, LoopControl};
pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{AppConfig, Config, ConfigError},
        events::{Event, EventQueue},
        foundation::{
            color::Color,
            math::Transform2D,
            time::{FpsCounter, LogicTimer},
        },
        input::{InputState, Key, KeyboardState, MouseButton, MouseState},
        platform::{Display, DisplayError},
        render::{Align, AssetError, Bitmap, BuiltinFont, Canvas},
        AppError, Application, Engine, EngineError, FrameInfo, LoopControl,
    };
}
