/// GraphicsDevice trait - native object creation and submission

use std::sync::Arc;
use crate::config::Config;
use crate::error::Result;
use crate::fence_cycle::{Fence, FenceCycle};
use crate::graphics_device::{
    CommandList, RenderPass, RenderPassDesc, Framebuffer, FramebufferDesc,
};

/// Graphics device
///
/// Factory for native objects and the submission entry point.
/// Implemented by backend-specific devices (e.g. `VulkanGraphicsDevice`).
/// Passed by reference to every command node as the device context.
pub trait GraphicsDevice: Send + Sync {
    /// Create a command list ready to `begin()`
    fn create_command_list(&self) -> Result<Box<dyn CommandList>>;

    /// Create a render pass from index-based descriptions
    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>>;

    /// Create a framebuffer compatible with `desc.render_pass`
    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>>;

    /// Create an unsignalled fence
    fn create_fence(&self) -> Result<Box<dyn Fence>>;

    /// Submit a recorded command list, signalling the fence of `cycle` on completion
    fn submit(&self, commands: &dyn CommandList, cycle: &FenceCycle) -> Result<()>;

    /// Wait for all GPU operations to complete
    fn wait_idle(&self) -> Result<()>;

    /// Configuration the device was created with
    fn config(&self) -> &Config;
}
