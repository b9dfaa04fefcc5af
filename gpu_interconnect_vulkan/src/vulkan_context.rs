/// GpuContext - Vulkan objects shared by every native object of the backend
///
/// Contains everything needed for GPU operations:
/// - Instance and logical device
/// - Allocator for attachment memory
/// - Graphics queue for command submission

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Shared GPU context for all Vulkan objects.
///
/// Every render pass, framebuffer, fence, command list and attachment view
/// holds an `Arc<GpuContext>`. Objects kept alive by fence cycles can
/// outlive the `VulkanGraphicsDevice` that created them, so the device and
/// instance are destroyed only when the last reference drops.
pub struct GpuContext {
    /// Vulkan loader, kept loaded until the instance is destroyed
    _entry: ash::Entry,

    /// Vulkan instance
    pub(crate) instance: ash::Instance,

    /// Physical device the logical device was created on
    #[allow(dead_code)]
    pub(crate) physical_device: vk::PhysicalDevice,

    /// Vulkan logical device
    pub(crate) device: ash::Device,

    /// Graphics queue (externally synchronized, hence the mutex)
    graphics_queue: Mutex<vk::Queue>,

    /// Graphics queue family index
    pub(crate) graphics_queue_family: u32,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop so it is dropped BEFORE the device is destroyed
    allocator: ManuallyDrop<Mutex<Allocator>>,

    /// Debug utils loader and messenger (validation layers)
    #[cfg(feature = "vulkan-validation")]
    pub(crate) debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
}

impl GpuContext {
    /// Create a new GPU context
    ///
    /// Takes ownership of `instance` and `device`; both are destroyed when the
    /// context is dropped.
    pub(crate) fn new(
        entry: ash::Entry,
        instance: ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
        allocator: Allocator,
        #[cfg(feature = "vulkan-validation")]
        debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    ) -> Self {
        Self {
            _entry: entry,
            instance,
            physical_device,
            device,
            graphics_queue: Mutex::new(graphics_queue),
            graphics_queue_family,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            #[cfg(feature = "vulkan-validation")]
            debug_messenger,
        }
    }

    /// Lock the graphics queue for submission
    pub(crate) fn graphics_queue(&self) -> MutexGuard<'_, vk::Queue> {
        self.graphics_queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the allocator
    pub(crate) fn allocator(&self) -> MutexGuard<'_, Allocator> {
        self.allocator.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            // Wait for device to finish
            self.device.device_wait_idle().ok();

            // 1. Drop allocator: free VkDeviceMemory pages BEFORE destroying device
            ManuallyDrop::drop(&mut self.allocator);

            // 2. Destroy device
            self.device.destroy_device(None);

            // 3. Destroy debug messenger BEFORE instance
            #[cfg(feature = "vulkan-validation")]
            if let Some((debug_utils, messenger)) = self.debug_messenger.take() {
                crate::debug::cleanup_debug_config();
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            // 4. Destroy instance
            self.instance.destroy_instance(None);
        }
    }
}
