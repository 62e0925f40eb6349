//! Foundation types shared by every subsystem

pub mod color;
pub mod logging;
pub mod math;
pub mod time;
