//! Demo applications for the frame engine
//!
//! - [`framework::FrameworkApp`]: the bare loop, a window cleared to eigengrau
//! - [`drawing_bitmaps::DrawingBitmapsApp`]: a bitmap drawn directly, through
//!   an offscreen buffer, or through a scale transform

pub mod drawing_bitmaps;
pub mod framework;

pub use drawing_bitmaps::{DrawingBitmapsApp, DrawingMode};
pub use framework::FrameworkApp;
