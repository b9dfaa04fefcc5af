/// Framebuffer - Vulkan implementation of the Framebuffer trait
///
/// Wraps a VkFramebuffer binding the attachment views of one recorded
/// render pass. Kept alive by the fence cycle of the submission using it.

use gpu_interconnect::interconnect::render::Framebuffer as InterconnectFramebuffer;
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan framebuffer implementation
///
/// Wraps a VkFramebuffer. Destroyed when dropped.
pub struct VulkanFramebuffer {
    /// Vulkan framebuffer handle
    pub(crate) framebuffer: vk::Framebuffer,
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Number of layers
    layers: u32,
    /// Shared GPU context (for cleanup)
    context: Arc<GpuContext>,
}

impl VulkanFramebuffer {
    pub(crate) fn new(
        framebuffer: vk::Framebuffer,
        width: u32,
        height: u32,
        layers: u32,
        context: Arc<GpuContext>,
    ) -> Self {
        Self { framebuffer, width, height, layers, context }
    }
}

impl InterconnectFramebuffer for VulkanFramebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn layers(&self) -> u32 {
        self.layers
    }
}

impl Drop for VulkanFramebuffer {
    fn drop(&mut self) {
        unsafe {
            self.context.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}
