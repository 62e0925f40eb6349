//! Copies CPU backbuffers into the swapchain
//!
//! One frame in flight: the fence guards the staging buffer and the single
//! command buffer, so a new frame waits for the previous copy to finish.

use std::ffi::{c_void, CStr, CString};

use ash::extensions::khr::{Surface, Swapchain as SwapchainLoader};
use ash::{vk, Device, Entry, Instance};

use super::swapchain::{PixelOrder, Swapchain};
use super::{VulkanError, VulkanResult};
use crate::render::bitmap::Bitmap;

const APP_NAME: &CStr = match CStr::from_bytes_with_nul(b"frame_engine\0") {
    Ok(name) => name,
    Err(_) => panic!("application name must be nul terminated"),
};

const COLOR_RANGE: vk::ImageSubresourceRange = vk::ImageSubresourceRange {
    aspect_mask: vk::ImageAspectFlags::COLOR,
    base_mip_level: 0,
    level_count: 1,
    base_array_layer: 0,
    layer_count: 1,
};

/// Host-visible buffer the backbuffer is written into
struct StagingBuffer {
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    mapped: *mut c_void,
    size: vk::DeviceSize,
}

/// Presents software-rendered frames through a Vulkan swapchain
pub struct VulkanPresenter {
    _entry: Entry,
    instance: Instance,
    surface_loader: Surface,
    surface: vk::SurfaceKHR,
    physical_device: vk::PhysicalDevice,
    device: Device,
    queue: vk::Queue,
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    image_available: vk::Semaphore,
    transfer_finished: vk::Semaphore,
    in_flight: vk::Fence,
    swapchain: Option<Swapchain>,
    staging: Option<StagingBuffer>,
    requested_extent: vk::Extent2D,
    stale: bool,
}

impl VulkanPresenter {
    /// Create the presenter
    ///
    /// `required_extensions` are the instance extensions the windowing system
    /// needs; `create_surface` turns the new instance into a window surface.
    pub fn new<F>(required_extensions: &[String], create_surface: F, extent: vk::Extent2D) -> VulkanResult<Self>
    where
        F: FnOnce(&Instance) -> Result<vk::SurfaceKHR, vk::Result>,
    {
        let entry = unsafe { Entry::load() }.map_err(|e| VulkanError::Loading(e.to_string()))?;

        let extension_names: Vec<CString> = required_extensions
            .iter()
            .map(|ext| CString::new(ext.as_str()))
            .collect::<Result<_, _>>()
            .map_err(|e| VulkanError::Loading(format!("Invalid extension name: {e}")))?;
        let extension_ptrs: Vec<*const std::os::raw::c_char> =
            extension_names.iter().map(|ext| ext.as_ptr()).collect();

        let app_info = vk::ApplicationInfo::builder()
            .application_name(APP_NAME)
            .application_version(0)
            .engine_name(APP_NAME)
            .engine_version(0)
            .api_version(vk::API_VERSION_1_0);

        let instance_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extension_ptrs);

        let instance = unsafe { entry.create_instance(&instance_info, None)? };
        let surface_loader = Surface::new(&entry, &instance);

        let surface = match create_surface(&instance) {
            Ok(surface) => surface,
            Err(e) => {
                unsafe { instance.destroy_instance(None) };
                return Err(VulkanError::Surface(e));
            }
        };

        match Self::create_device(&instance, &surface_loader, surface) {
            Ok((physical_device, device, queue, queue_family_index)) => {
                let mut presenter = Self {
                    _entry: entry,
                    instance,
                    surface_loader,
                    surface,
                    physical_device,
                    device,
                    queue,
                    command_pool: vk::CommandPool::null(),
                    command_buffer: vk::CommandBuffer::null(),
                    image_available: vk::Semaphore::null(),
                    transfer_finished: vk::Semaphore::null(),
                    in_flight: vk::Fence::null(),
                    swapchain: None,
                    staging: None,
                    requested_extent: extent,
                    stale: true,
                };
                // From here on Drop cleans up whatever was created
                presenter.create_frame_resources(queue_family_index)?;
                log::info!("Vulkan presenter ready");
                Ok(presenter)
            }
            Err(e) => {
                unsafe {
                    surface_loader.destroy_surface(surface, None);
                    instance.destroy_instance(None);
                }
                Err(e)
            }
        }
    }

    fn create_device(
        instance: &Instance,
        surface_loader: &Surface,
        surface: vk::SurfaceKHR,
    ) -> VulkanResult<(vk::PhysicalDevice, Device, vk::Queue, u32)> {
        let physical_devices = unsafe { instance.enumerate_physical_devices()? };

        let (physical_device, queue_family_index) = physical_devices
            .iter()
            .find_map(|&pd| {
                let families = unsafe { instance.get_physical_device_queue_family_properties(pd) };
                families.iter().enumerate().find_map(|(index, family)| {
                    let index = index as u32;
                    let graphics = family.queue_flags.contains(vk::QueueFlags::GRAPHICS);
                    let present = unsafe {
                        surface_loader
                            .get_physical_device_surface_support(pd, index, surface)
                            .unwrap_or(false)
                    };
                    (graphics && present).then_some((pd, index))
                })
            })
            .ok_or(VulkanError::NoSuitableDevice)?;

        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        let name = unsafe { CStr::from_ptr(properties.device_name.as_ptr()) };
        log::info!("Using Vulkan device {:?} (queue family {})", name, queue_family_index);

        let priorities = [1.0_f32];
        let queue_info = vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(queue_family_index)
            .queue_priorities(&priorities)
            .build();
        let queue_infos = [queue_info];
        let device_extensions = [SwapchainLoader::name().as_ptr()];

        let device_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&device_extensions);

        let device = unsafe { instance.create_device(physical_device, &device_info, None)? };
        let queue = unsafe { device.get_device_queue(queue_family_index, 0) };

        Ok((physical_device, device, queue, queue_family_index))
    }

    fn create_frame_resources(&mut self, queue_family_index: u32) -> VulkanResult<()> {
        let pool_info = vk::CommandPoolCreateInfo::builder()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(queue_family_index);
        self.command_pool = unsafe { self.device.create_command_pool(&pool_info, None)? };

        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(self.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        let buffers = unsafe { self.device.allocate_command_buffers(&alloc_info)? };
        self.command_buffer = buffers
            .first()
            .copied()
            .ok_or(VulkanError::Api(vk::Result::ERROR_UNKNOWN))?;

        let semaphore_info = vk::SemaphoreCreateInfo::default();
        self.image_available = unsafe { self.device.create_semaphore(&semaphore_info, None)? };
        self.transfer_finished = unsafe { self.device.create_semaphore(&semaphore_info, None)? };

        let fence_info = vk::FenceCreateInfo::builder().flags(vk::FenceCreateFlags::SIGNALED);
        self.in_flight = unsafe { self.device.create_fence(&fence_info, None)? };

        Ok(())
    }

    /// Note a new window size; the swapchain is rebuilt on the next present
    pub fn resize(&mut self, width: u32, height: u32) {
        self.requested_extent = vk::Extent2D { width, height };
        self.stale = true;
    }

    /// Copy `frame` to the screen
    ///
    /// Zero-sized frames (minimized windows) are skipped. An out-of-date
    /// swapchain drops the frame and is rebuilt on the next call.
    pub fn present(&mut self, frame: &Bitmap) -> VulkanResult<()> {
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(());
        }

        let frame_extent = vk::Extent2D {
            width: frame.width(),
            height: frame.height(),
        };
        if frame_extent != self.requested_extent {
            self.resize(frame_extent.width, frame_extent.height);
        }

        unsafe {
            self.device.wait_for_fences(&[self.in_flight], true, u64::MAX)?;
        }

        if self.image_available == vk::Semaphore::null() {
            self.image_available = unsafe {
                self.device
                    .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)?
            };
        }

        if self.stale || self.swapchain.is_none() {
            self.recreate_swapchain()?;
        }

        let Some(swapchain) = self.swapchain.as_ref() else {
            return Ok(());
        };

        let acquired = unsafe {
            swapchain.loader().acquire_next_image(
                swapchain.handle(),
                u64::MAX,
                self.image_available,
                vk::Fence::null(),
            )
        };
        let image_index = match acquired {
            Ok((index, suboptimal)) => {
                self.stale |= suboptimal;
                index
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                self.stale = true;
                return Ok(());
            }
            Err(e) => return Err(VulkanError::Api(e)),
        };

        let image = swapchain.images()[image_index as usize];
        let swapchain_extent = swapchain.extent();
        let pixel_order = swapchain.pixel_order();
        let swapchain_handle = swapchain.handle();

        let prepared = self
            .upload(frame, pixel_order)
            .and_then(|()| self.record_copy(image, frame_extent, swapchain_extent));
        if let Err(e) = prepared {
            // Nothing will wait on the acquire signal now
            if let Err(replace_error) = self.replace_image_available() {
                log::error!("Failed to replace image-available semaphore: {:?}", replace_error);
            }
            return Err(e);
        }

        unsafe {
            self.device.reset_fences(&[self.in_flight])?;
        }

        let wait_semaphores = [self.image_available];
        let wait_stages = [vk::PipelineStageFlags::TRANSFER];
        let command_buffers = [self.command_buffer];
        let signal_semaphores = [self.transfer_finished];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores)
            .build();

        unsafe {
            self.device
                .queue_submit(self.queue, &[submit_info], self.in_flight)?;
        }

        let swapchains = [swapchain_handle];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&signal_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let presented = match self.swapchain.as_ref() {
            Some(swapchain) => unsafe { swapchain.loader().queue_present(self.queue, &present_info) },
            None => return Ok(()),
        };
        match presented {
            Ok(suboptimal) => self.stale |= suboptimal,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => self.stale = true,
            Err(e) => return Err(VulkanError::Api(e)),
        }

        Ok(())
    }

    /// Swap the image-available semaphore for a fresh, unsignaled one
    ///
    /// Needed when an image was acquired but its copy was never submitted.
    /// On failure the handle is left null and recreated by the next present.
    fn replace_image_available(&mut self) -> VulkanResult<()> {
        unsafe {
            self.device.device_wait_idle()?;
            self.device.destroy_semaphore(self.image_available, None);
        }
        self.image_available = vk::Semaphore::null();

        self.image_available = unsafe {
            self.device
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)?
        };
        log::debug!("Replaced image-available semaphore after an aborted frame");
        Ok(())
    }

    fn recreate_swapchain(&mut self) -> VulkanResult<()> {
        unsafe {
            self.device.device_wait_idle()?;
        }

        let old = self
            .swapchain
            .as_ref()
            .map_or(vk::SwapchainKHR::null(), Swapchain::handle);

        let swapchain = Swapchain::new(
            &self.instance,
            &self.device,
            self.physical_device,
            self.surface,
            &self.surface_loader,
            self.requested_extent,
            old,
        )?;

        // Retired swapchain is destroyed when replaced
        self.swapchain = Some(swapchain);
        self.stale = false;
        Ok(())
    }

    fn upload(&mut self, frame: &Bitmap, order: PixelOrder) -> VulkanResult<()> {
        let size = (frame.pixels().len() * std::mem::size_of::<u32>()) as vk::DeviceSize;
        if self.staging.as_ref().map_or(true, |s| s.size < size) {
            self.destroy_staging();
            self.staging = Some(self.create_staging(size)?);
        }

        let Some(staging) = self.staging.as_ref() else {
            return Ok(());
        };

        let count = frame.pixels().len();
        // SAFETY: the mapping covers at least `size` bytes and the fence wait
        // in `present` guarantees the GPU is no longer reading it
        let dst = unsafe { std::slice::from_raw_parts_mut(staging.mapped.cast::<u32>(), count) };
        match order {
            PixelOrder::Bgra => dst.copy_from_slice(frame.pixels()),
            PixelOrder::Rgba => {
                for (out, &px) in dst.iter_mut().zip(frame.pixels()) {
                    *out = (px & 0xFF00_FF00) | ((px >> 16) & 0xFF) | ((px & 0xFF) << 16);
                }
            }
        }
        Ok(())
    }

    fn create_staging(&self, size: vk::DeviceSize) -> VulkanResult<StagingBuffer> {
        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(vk::BufferUsageFlags::TRANSFER_SRC)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let buffer = unsafe { self.device.create_buffer(&buffer_info, None)? };

        let requirements = unsafe { self.device.get_buffer_memory_requirements(buffer) };
        let Some(memory_type) = self.find_memory_type(
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        ) else {
            unsafe { self.device.destroy_buffer(buffer, None) };
            return Err(VulkanError::NoSuitableMemoryType("staging buffer"));
        };

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type);

        let memory = match unsafe { self.device.allocate_memory(&alloc_info, None) } {
            Ok(memory) => memory,
            Err(e) => {
                unsafe { self.device.destroy_buffer(buffer, None) };
                return Err(VulkanError::Api(e));
            }
        };

        let mapped = unsafe {
            self.device
                .bind_buffer_memory(buffer, memory, 0)
                .and_then(|()| self.device.map_memory(memory, 0, vk::WHOLE_SIZE, vk::MemoryMapFlags::empty()))
        };
        match mapped {
            Ok(mapped) => {
                log::debug!("Staging buffer of {} bytes", size);
                Ok(StagingBuffer {
                    buffer,
                    memory,
                    mapped,
                    size,
                })
            }
            Err(e) => {
                unsafe {
                    self.device.destroy_buffer(buffer, None);
                    self.device.free_memory(memory, None);
                }
                Err(VulkanError::Api(e))
            }
        }
    }

    fn destroy_staging(&mut self) {
        if let Some(staging) = self.staging.take() {
            unsafe {
                self.device.unmap_memory(staging.memory);
                self.device.destroy_buffer(staging.buffer, None);
                self.device.free_memory(staging.memory, None);
            }
        }
    }

    fn find_memory_type(&self, type_filter: u32, properties: vk::MemoryPropertyFlags) -> Option<u32> {
        let mem_properties = unsafe {
            self.instance
                .get_physical_device_memory_properties(self.physical_device)
        };

        (0..mem_properties.memory_type_count).find(|&i| {
            (type_filter & (1 << i)) != 0
                && mem_properties.memory_types[i as usize]
                    .property_flags
                    .contains(properties)
        })
    }

    fn record_copy(&self, image: vk::Image, frame: vk::Extent2D, target: vk::Extent2D) -> VulkanResult<()> {
        let Some(staging) = self.staging.as_ref() else {
            return Ok(());
        };
        let cb = self.command_buffer;

        let to_transfer = vk::ImageMemoryBarrier::builder()
            .src_access_mask(vk::AccessFlags::empty())
            .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE)
            .old_layout(vk::ImageLayout::UNDEFINED)
            .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(COLOR_RANGE)
            .build();

        let to_present = vk::ImageMemoryBarrier::builder()
            .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
            .dst_access_mask(vk::AccessFlags::empty())
            .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .new_layout(vk::ImageLayout::PRESENT_SRC_KHR)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(COLOR_RANGE)
            .build();

        let copy_extent = vk::Extent3D {
            width: frame.width.min(target.width),
            height: frame.height.min(target.height),
            depth: 1,
        };
        let region = vk::BufferImageCopy {
            buffer_offset: 0,
            buffer_row_length: frame.width,
            buffer_image_height: frame.height,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            },
            image_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
            image_extent: copy_extent,
        };

        let begin_info =
            vk::CommandBufferBeginInfo::builder().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        unsafe {
            self.device
                .reset_command_buffer(cb, vk::CommandBufferResetFlags::empty())?;
            self.device.begin_command_buffer(cb, &begin_info)?;

            self.device.cmd_pipeline_barrier(
                cb,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_transfer],
            );

            // Uncovered parts of a larger swapchain image would show garbage
            if frame != target {
                let black = vk::ClearColorValue {
                    float32: [0.0, 0.0, 0.0, 1.0],
                };
                self.device.cmd_clear_color_image(
                    cb,
                    image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &black,
                    &[COLOR_RANGE],
                );
            }

            self.device.cmd_copy_buffer_to_image(
                cb,
                staging.buffer,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );

            self.device.cmd_pipeline_barrier(
                cb,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::BOTTOM_OF_PIPE,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_present],
            );

            self.device.end_command_buffer(cb)?;
        }

        Ok(())
    }
}

impl Drop for VulkanPresenter {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.device.device_wait_idle() {
                log::warn!("device_wait_idle failed during shutdown: {:?}", e);
            }
        }

        self.destroy_staging();
        self.swapchain = None;

        unsafe {
            if self.in_flight != vk::Fence::null() {
                self.device.destroy_fence(self.in_flight, None);
            }
            if self.transfer_finished != vk::Semaphore::null() {
                self.device.destroy_semaphore(self.transfer_finished, None);
            }
            if self.image_available != vk::Semaphore::null() {
                self.device.destroy_semaphore(self.image_available, None);
            }
            if self.command_pool != vk::CommandPool::null() {
                self.device.destroy_command_pool(self.command_pool, None);
            }
            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);
            self.instance.destroy_instance(None);
        }

        log::debug!("Vulkan presenter destroyed");
    }
}
