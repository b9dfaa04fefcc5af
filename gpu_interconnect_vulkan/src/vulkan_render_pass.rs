/// RenderPass - Vulkan implementation of the RenderPass trait

use gpu_interconnect::interconnect::render::RenderPass as InterconnectRenderPass;
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan render pass implementation
///
/// Wraps a multi-subpass vk::RenderPass. Destroyed when dropped.
pub struct VulkanRenderPass {
    /// Vulkan render pass handle
    pub(crate) render_pass: vk::RenderPass,
    /// Number of subpasses
    subpass_count: u32,
    /// Shared GPU context (for cleanup)
    context: Arc<GpuContext>,
}

impl VulkanRenderPass {
    pub(crate) fn new(render_pass: vk::RenderPass, subpass_count: u32, context: Arc<GpuContext>) -> Self {
        Self { render_pass, subpass_count, context }
    }
}

impl InterconnectRenderPass for VulkanRenderPass {
    fn subpass_count(&self) -> u32 {
        self.subpass_count
    }
}

impl Drop for VulkanRenderPass {
    fn drop(&mut self) {
        unsafe {
            self.context.device.destroy_render_pass(self.render_pass, None);
        }
    }
}
