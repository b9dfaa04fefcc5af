/// CommandList trait - native command buffer recording primitives

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{RenderPass, Framebuffer, ImageAspect};

/// Command list for recording native commands
///
/// Commands are recorded by replaying a `CommandGraph` and later submitted
/// to the GPU via `GraphicsDevice::submit()`.
pub trait CommandList: Send + Sync {
    /// Begin recording commands
    fn begin(&mut self) -> Result<()>;

    /// End recording commands
    fn end(&mut self) -> Result<()>;

    /// Begin a render pass
    ///
    /// # Arguments
    ///
    /// * `render_pass` - The render pass to begin
    /// * `framebuffer` - Framebuffer binding the attachments of `render_pass`
    /// * `render_area` - Area of the attachments affected by the render pass
    /// * `clear_values` - Clear values, indexed by attachment index
    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn RenderPass>,
        framebuffer: &Arc<dyn Framebuffer>,
        render_area: Rect2D,
        clear_values: &[ClearValue],
    ) -> Result<()>;

    /// Advance the active render pass to its next subpass
    fn next_subpass(&mut self) -> Result<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> Result<()>;

    /// Clear regions of attachments of the current subpass
    ///
    /// Used as the fallback when a clear could not be folded into an
    /// attachment load operation.
    fn clear_attachments(&mut self, attachments: &[ClearAttachment], rect: Rect2D) -> Result<()>;

    /// Set the viewport
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Set the scissor rectangle
    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()>;

    /// Draw vertices
    ///
    /// # Arguments
    ///
    /// * `vertex_count` - Number of vertices to draw
    /// * `first_vertex` - Index of first vertex
    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()>;
}

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// 2D rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// Clear value for an attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Color clear value (RGBA)
    Color([f32; 4]),
    /// Depth/stencil clear value
    DepthStencil { depth: f32, stencil: u32 },
}

impl Default for ClearValue {
    fn default() -> Self {
        ClearValue::Color([0.0; 4])
    }
}

/// One attachment cleared by `CommandList::clear_attachments`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearAttachment {
    /// Aspects to clear
    pub aspect: ImageAspect,
    /// Index into the current subpass's color attachments (ignored for depth/stencil)
    pub color_attachment: u32,
    /// Value to clear to
    pub value: ClearValue,
}
