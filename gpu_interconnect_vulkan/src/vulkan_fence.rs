/// Fence - Vulkan implementation of the Fence trait

use gpu_interconnect::interconnect::{Fence, Result, Error};
use gpu_interconnect::gpu_err;
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan fence implementation
///
/// Created unsignalled, signalled by the queue submission it is passed to.
/// Destroyed when dropped.
pub struct VulkanFence {
    /// Vulkan fence handle
    pub(crate) fence: vk::Fence,
    /// Shared GPU context (for cleanup)
    context: Arc<GpuContext>,
}

impl VulkanFence {
    pub(crate) fn new(context: Arc<GpuContext>) -> Result<Self> {
        unsafe {
            let fence = context.device
                .create_fence(&vk::FenceCreateInfo::default(), None)
                .map_err(|e| gpu_err!("interconnect::vulkan", "Failed to create fence: {:?}", e))?;
            Ok(Self { fence, context })
        }
    }
}

impl Fence for VulkanFence {
    fn is_signalled(&self) -> Result<bool> {
        unsafe {
            self.context.device
                .get_fence_status(self.fence)
                .map_err(|e| gpu_err!("interconnect::vulkan", "Failed to query fence status: {:?}", e))
        }
    }

    fn wait(&self, timeout_ns: u64) -> Result<()> {
        unsafe {
            match self.context.device.wait_for_fences(&[self.fence], true, timeout_ns) {
                Ok(()) => Ok(()),
                Err(vk::Result::TIMEOUT) => Err(Error::BackendError(
                    format!("Fence not signalled after {} ns", timeout_ns))),
                Err(e) => Err(gpu_err!("interconnect::vulkan", "Failed to wait for fence: {:?}", e)),
            }
        }
    }
}

impl Drop for VulkanFence {
    fn drop(&mut self) {
        unsafe {
            self.context.device.destroy_fence(self.fence, None);
        }
    }
}
