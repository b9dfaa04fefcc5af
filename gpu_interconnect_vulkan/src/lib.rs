/*!
# GPU Interconnect - Vulkan Backend

Vulkan implementation of the `gpu_interconnect` device traits.

This crate provides a headless `VulkanGraphicsDevice` that creates native
render passes, framebuffers, fences and command lists using the Ash library
for Vulkan bindings and gpu-allocator for attachment memory.

Validation layer support is compiled in only with the `vulkan-validation`
feature.
*/

// Vulkan implementation modules
mod vulkan;
mod vulkan_context;
mod vulkan_command_list;
mod vulkan_render_pass;
mod vulkan_frame_buffer;
mod vulkan_fence;
mod vulkan_texture;
#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan::VulkanGraphicsDevice;
pub use vulkan_context::GpuContext;
pub use vulkan_command_list::VulkanCommandList;
pub use vulkan_render_pass::VulkanRenderPass;
pub use vulkan_frame_buffer::VulkanFramebuffer;
pub use vulkan_fence::VulkanFence;
pub use vulkan_texture::VulkanTextureView;

// Re-export debug utilities
#[cfg(feature = "vulkan-validation")]
pub use debug::{ValidationStats, get_validation_stats, print_validation_stats_report};
