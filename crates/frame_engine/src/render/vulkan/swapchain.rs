//! Swapchain used as a copy destination
//!
//! Images are written with `vkCmdCopyBufferToImage`, so the swapchain is
//! created with `TRANSFER_DST` usage and no image views.

use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::{vk, Device, Instance};

use super::{VulkanError, VulkanResult};

/// Byte order of the swapchain images relative to the backbuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelOrder {
    /// `B8G8R8A8`: matches `0xAARRGGBB` stored little-endian
    Bgra,
    /// `R8G8B8A8`: red and blue must be swapped on upload
    Rgba,
}

/// Vulkan swapchain wrapper
///
/// Destroys the swapchain on drop. Images belong to the swapchain and are
/// released with it.
pub struct Swapchain {
    loader: SwapchainLoader,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    format: vk::SurfaceFormatKHR,
    pixel_order: PixelOrder,
    extent: vk::Extent2D,
}

impl Swapchain {
    /// Create a swapchain for `surface`, retiring `old` if it is not null
    pub fn new(
        instance: &Instance,
        device: &Device,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &Surface,
        window_extent: vk::Extent2D,
        old: vk::SwapchainKHR,
    ) -> VulkanResult<Self> {
        let loader = SwapchainLoader::new(instance, device);

        let surface_caps = unsafe {
            surface_loader.get_physical_device_surface_capabilities(physical_device, surface)?
        };

        if !surface_caps
            .supported_usage_flags
            .contains(vk::ImageUsageFlags::TRANSFER_DST)
        {
            return Err(VulkanError::UnsupportedSurface(
                "swapchain images cannot be transfer destinations".to_string(),
            ));
        }

        let surface_formats = unsafe {
            surface_loader.get_physical_device_surface_formats(physical_device, surface)?
        };
        let (format, pixel_order) = choose_format(&surface_formats).ok_or_else(|| {
            VulkanError::UnsupportedSurface("no 8-bit BGRA or RGBA surface format".to_string())
        })?;

        let present_modes = unsafe {
            surface_loader.get_physical_device_surface_present_modes(physical_device, surface)?
        };

        // FIFO is always available and keeps the busy loop at display rate
        let present_mode = if present_modes.contains(&vk::PresentModeKHR::FIFO) {
            vk::PresentModeKHR::FIFO
        } else {
            present_modes
                .first()
                .copied()
                .unwrap_or(vk::PresentModeKHR::FIFO)
        };

        let extent = if surface_caps.current_extent.width == u32::MAX {
            vk::Extent2D {
                width: window_extent.width.clamp(
                    surface_caps.min_image_extent.width,
                    surface_caps.max_image_extent.width,
                ),
                height: window_extent.height.clamp(
                    surface_caps.min_image_extent.height,
                    surface_caps.max_image_extent.height,
                ),
            }
        } else {
            surface_caps.current_extent
        };

        let image_count = if surface_caps.max_image_count > 0 {
            (surface_caps.min_image_count + 1).min(surface_caps.max_image_count)
        } else {
            surface_caps.min_image_count + 1
        };

        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(format.format)
            .image_color_space(format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::TRANSFER_DST)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(surface_caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old);

        let swapchain = unsafe { loader.create_swapchain(&create_info, None)? };

        let images = match unsafe { loader.get_swapchain_images(swapchain) } {
            Ok(images) => images,
            Err(e) => {
                unsafe { loader.destroy_swapchain(swapchain, None) };
                return Err(VulkanError::Api(e));
            }
        };

        log::info!(
            "Created swapchain {}x{} ({:?}, {:?}, {} images)",
            extent.width,
            extent.height,
            format.format,
            present_mode,
            images.len()
        );

        Ok(Self {
            loader,
            swapchain,
            images,
            format,
            pixel_order,
            extent,
        })
    }

    /// Raw handle
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Extension loader used for acquire and present
    pub fn loader(&self) -> &SwapchainLoader {
        &self.loader
    }

    /// Swapchain images
    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }

    /// Chosen surface format
    pub fn format(&self) -> vk::SurfaceFormatKHR {
        self.format
    }

    /// Byte order expected by the images
    pub fn pixel_order(&self) -> PixelOrder {
        self.pixel_order
    }

    /// Image extent
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_swapchain(self.swapchain, None);
        }
        log::debug!("Swapchain destroyed");
    }
}

/// Prefer a UNORM format so backbuffer bytes reach the screen unchanged
fn choose_format(formats: &[vk::SurfaceFormatKHR]) -> Option<(vk::SurfaceFormatKHR, PixelOrder)> {
    let preferences = [
        (vk::Format::B8G8R8A8_UNORM, PixelOrder::Bgra),
        (vk::Format::R8G8B8A8_UNORM, PixelOrder::Rgba),
        (vk::Format::B8G8R8A8_SRGB, PixelOrder::Bgra),
        (vk::Format::R8G8B8A8_SRGB, PixelOrder::Rgba),
    ];

    preferences.iter().find_map(|&(wanted, order)| {
        formats
            .iter()
            .find(|sf| sf.format == wanted)
            .map(|&sf| (sf, order))
    })
}
