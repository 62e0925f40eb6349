//! Vulkan presentation backend
//!
//! Frames are rendered on the CPU, so the GPU side is only a copy: each
//! backbuffer is written into a host-visible staging buffer and copied into
//! the acquired swapchain image before presenting.

pub mod presenter;
pub mod swapchain;

pub use presenter::VulkanPresenter;
pub use swapchain::Swapchain;

use ash::vk;
use thiserror::Error;

/// Vulkan backend errors
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// The Vulkan loader could not be found or initialized
    #[error("Failed to load Vulkan: {0}")]
    Loading(String),

    /// Window surface creation failed
    #[error("Failed to create window surface: {0:?}")]
    Surface(vk::Result),

    /// No physical device can present to the surface
    #[error("No Vulkan device can present to this window")]
    NoSuitableDevice,

    /// No memory type matches the requested properties
    #[error("No suitable memory type for {0}")]
    NoSuitableMemoryType(&'static str),

    /// The surface lacks a capability the presenter needs
    #[error("Unsupported surface: {0}")]
    UnsupportedSurface(String),
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

impl From<vk::Result> for VulkanError {
    fn from(result: vk::Result) -> Self {
        Self::Api(result)
    }
}
