/// Framebuffer trait - binds attachment image views to a render pass
///
/// Created by the render pass builder for every recorded render pass and
/// kept alive by the fence cycle of the submission that uses it.

use std::sync::Arc;
use crate::graphics_device::{RenderPass, TextureView};

/// Framebuffer binding concrete image views to the attachment slots of a render pass
///
/// Created via `GraphicsDevice::create_framebuffer()`.
pub trait Framebuffer: Send + Sync {
    /// Get the width in pixels
    fn width(&self) -> u32;

    /// Get the height in pixels
    fn height(&self) -> u32;

    /// Get the number of layers
    fn layers(&self) -> u32;
}

/// Descriptor for creating a framebuffer
pub struct FramebufferDesc<'a> {
    /// The render pass this framebuffer is compatible with
    pub render_pass: &'a Arc<dyn RenderPass>,
    /// Attachments, in render pass attachment order
    pub attachments: &'a [Arc<dyn TextureView>],
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Number of layers
    pub layers: u32,
}
