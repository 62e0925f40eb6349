//! Software rendering and presentation
//!
//! Frames are drawn on the CPU into [`Bitmap`]s through a [`Canvas`]; the
//! finished backbuffer is handed to a display, which presents it through the
//! Vulkan presenter in [`vulkan`].

pub mod bitmap;
pub mod canvas;
pub mod font;
pub mod vulkan;

pub use bitmap::Bitmap;
pub use canvas::{Canvas, Region};
pub use font::{Align, BuiltinFont};

use thiserror::Error;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// The file could not be read or decoded
    #[error("Failed to load asset: {0}")]
    LoadFailed(String),

    /// No asset exists at the requested location
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Pixel data did not match the declared dimensions
    #[error("Invalid asset data: {0}")]
    InvalidData(String),
}
