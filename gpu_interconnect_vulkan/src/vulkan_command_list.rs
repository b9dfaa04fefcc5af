/// CommandList - Vulkan implementation of the CommandList trait

use gpu_interconnect::interconnect::{Result, Error};
use gpu_interconnect::interconnect::render::{
    CommandList as InterconnectCommandList,
    RenderPass as InterconnectRenderPass,
    Framebuffer as InterconnectFramebuffer,
    Viewport, Rect2D, ClearValue, ClearAttachment,
};
use gpu_interconnect::gpu_error;
use ash::vk;
use std::sync::Arc;

use crate::vulkan::{aspect_to_vk, clear_value_to_vk, rect_to_vk};
use crate::vulkan_context::GpuContext;
use crate::vulkan_frame_buffer::VulkanFramebuffer;
use crate::vulkan_render_pass::VulkanRenderPass;

/// Vulkan command list implementation
///
/// Owns its command pool and a single primary command buffer. Submitted
/// command lists are kept alive by their fence cycle until the GPU is done.
pub struct VulkanCommandList {
    /// Shared GPU context
    context: Arc<GpuContext>,
    /// Command pool for allocating the command buffer
    command_pool: vk::CommandPool,
    /// Command buffer for recording
    command_buffer: vk::CommandBuffer,
    /// Whether the command list is currently recording
    is_recording: bool,
    /// Whether we're inside a render pass
    in_render_pass: bool,
}

impl VulkanCommandList {
    /// Create a new command list on the graphics queue family
    pub(crate) fn new(context: Arc<GpuContext>) -> Result<Self> {
        unsafe {
            // Create command pool
            let command_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(context.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = context.device.create_command_pool(&command_pool_create_info, None)
                .map_err(|e| {
                    gpu_error!("interconnect::vulkan", "Failed to create command pool: {:?}", e);
                    Error::BackendError(format!("Failed to create command pool: {:?}", e))
                })?;

            // Allocate command buffer
            let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = match context.device.allocate_command_buffers(&command_buffer_allocate_info) {
                Ok(buffers) => buffers[0],
                Err(e) => {
                    context.device.destroy_command_pool(command_pool, None);
                    gpu_error!("interconnect::vulkan", "Failed to allocate command buffer: {:?}", e);
                    return Err(Error::BackendError(format!("Failed to allocate command buffers: {:?}", e)));
                }
            };

            Ok(Self {
                context,
                command_pool,
                command_buffer,
                is_recording: false,
                in_render_pass: false,
            })
        }
    }

    /// Get the underlying Vulkan command buffer
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    fn ensure_recording(&self) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("Command list not recording".to_string()));
        }
        Ok(())
    }

    fn ensure_in_render_pass(&self) -> Result<()> {
        self.ensure_recording()?;
        if !self.in_render_pass {
            return Err(Error::BackendError("Not inside a render pass".to_string()));
        }
        Ok(())
    }
}

impl InterconnectCommandList for VulkanCommandList {
    fn begin(&mut self) -> Result<()> {
        if self.is_recording {
            return Err(Error::BackendError("Command list already recording".to_string()));
        }

        unsafe {
            // Reset command buffer
            self.context.device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| Error::BackendError(format!("Failed to reset command buffer: {:?}", e)))?;

            // Begin command buffer
            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            self.context.device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| Error::BackendError(format!("Failed to begin command buffer: {:?}", e)))?;

            self.is_recording = true;
            self.in_render_pass = false;

            Ok(())
        }
    }

    fn end(&mut self) -> Result<()> {
        self.ensure_recording()?;

        if self.in_render_pass {
            return Err(Error::BackendError("Render pass not ended before ending command list".to_string()));
        }

        unsafe {
            self.context.device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| Error::BackendError(format!("Failed to end command buffer: {:?}", e)))?;

            self.is_recording = false;

            Ok(())
        }
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn InterconnectRenderPass>,
        framebuffer: &Arc<dyn InterconnectFramebuffer>,
        render_area: Rect2D,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.ensure_recording()?;

        if self.in_render_pass {
            return Err(Error::BackendError("Already inside a render pass".to_string()));
        }

        unsafe {
            // Downcast to Vulkan types
            let vk_render_pass = render_pass.as_ref()
                as *const dyn InterconnectRenderPass
                as *const VulkanRenderPass;
            let vk_render_pass = &*vk_render_pass;

            let vk_framebuffer = framebuffer.as_ref()
                as *const dyn InterconnectFramebuffer
                as *const VulkanFramebuffer;
            let vk_framebuffer = &*vk_framebuffer;

            let vk_clear_values: Vec<vk::ClearValue> = clear_values
                .iter()
                .map(clear_value_to_vk)
                .collect();

            let render_pass_info = vk::RenderPassBeginInfo::default()
                .render_pass(vk_render_pass.render_pass)
                .framebuffer(vk_framebuffer.framebuffer)
                .render_area(rect_to_vk(render_area))
                .clear_values(&vk_clear_values);

            self.context.device.cmd_begin_render_pass(
                self.command_buffer,
                &render_pass_info,
                vk::SubpassContents::INLINE,
            );

            self.in_render_pass = true;

            Ok(())
        }
    }

    fn next_subpass(&mut self) -> Result<()> {
        self.ensure_in_render_pass()?;

        unsafe {
            self.context.device.cmd_next_subpass(self.command_buffer, vk::SubpassContents::INLINE);
        }
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.ensure_in_render_pass()?;

        unsafe {
            self.context.device.cmd_end_render_pass(self.command_buffer);
        }
        self.in_render_pass = false;
        Ok(())
    }

    fn clear_attachments(&mut self, attachments: &[ClearAttachment], rect: Rect2D) -> Result<()> {
        self.ensure_in_render_pass()?;

        let vk_attachments: Vec<vk::ClearAttachment> = attachments
            .iter()
            .map(|attachment| vk::ClearAttachment {
                aspect_mask: aspect_to_vk(attachment.aspect),
                color_attachment: attachment.color_attachment,
                clear_value: clear_value_to_vk(&attachment.value),
            })
            .collect();

        let clear_rect = vk::ClearRect {
            rect: rect_to_vk(rect),
            base_array_layer: 0,
            layer_count: 1,
        };

        unsafe {
            self.context.device.cmd_clear_attachments(
                self.command_buffer,
                &vk_attachments,
                std::slice::from_ref(&clear_rect),
            );
        }
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.ensure_recording()?;

        unsafe {
            let vk_viewport = vk::Viewport::default()
                .x(viewport.x)
                .y(viewport.y)
                .width(viewport.width)
                .height(viewport.height)
                .min_depth(viewport.min_depth)
                .max_depth(viewport.max_depth);

            self.context.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
        }
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.ensure_recording()?;

        unsafe {
            self.context.device.cmd_set_scissor(self.command_buffer, 0, &[rect_to_vk(scissor)]);
        }
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.ensure_in_render_pass()?;

        unsafe {
            self.context.device.cmd_draw(self.command_buffer, vertex_count, 1, first_vertex, 0);
        }
        Ok(())
    }
}

impl Drop for VulkanCommandList {
    fn drop(&mut self) {
        unsafe {
            // Command buffer is freed with its pool
            self.context.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
