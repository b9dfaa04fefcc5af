/// Texture view trait and the format metadata the render pass builder needs

use bitflags::bitflags;
use crate::graphics_device::ImageLayout;

/// Attachment formats understood by the interconnect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    // Color formats
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,
    R5G6B5_UNORM,
    A2B10G10R10_UNORM,
    R16G16B16A16_SFLOAT,
    R32G32B32A32_SFLOAT,

    // Depth / stencil formats
    D16_UNORM,
    D32_FLOAT,
    S8_UINT,
    D24_UNORM_S8_UINT,
    D32_FLOAT_S8_UINT,
}

bitflags! {
    /// Image aspects covered by a format or a clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageAspect: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

impl TextureFormat {
    /// Aspects carried by this format
    pub fn aspect(self) -> ImageAspect {
        match self {
            TextureFormat::D16_UNORM | TextureFormat::D32_FLOAT => ImageAspect::DEPTH,
            TextureFormat::S8_UINT => ImageAspect::STENCIL,
            TextureFormat::D24_UNORM_S8_UINT | TextureFormat::D32_FLOAT_S8_UINT => {
                ImageAspect::DEPTH | ImageAspect::STENCIL
            }
            _ => ImageAspect::COLOR,
        }
    }

    /// True for depth and/or stencil formats
    pub fn is_depth_stencil(self) -> bool {
        self.aspect().intersects(ImageAspect::DEPTH | ImageAspect::STENCIL)
    }

    /// True if the format has a stencil component
    pub fn has_stencil(self) -> bool {
        self.aspect().contains(ImageAspect::STENCIL)
    }
}

/// Multisample count of an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleCount {
    /// 1 sample (no multisampling)
    S1,
    /// 2 samples
    S2,
    /// 4 samples
    S4,
    /// 8 samples
    S8,
}

/// An image view that can be bound as a render pass attachment
///
/// Supplied by the emulator's texture manager. Two views with the same
/// `handle()` are the same attachment as far as a render pass is concerned.
pub trait TextureView: Send + Sync {
    /// Raw native handle of the view (e.g. `VkImageView` as u64)
    fn handle(&self) -> u64;

    /// Pixel format of the view
    fn format(&self) -> TextureFormat;

    /// Sample count of the underlying image
    fn samples(&self) -> SampleCount;

    /// Layout the underlying image is currently in
    fn layout(&self) -> ImageLayout;

    /// Width in pixels
    fn width(&self) -> u32;

    /// Height in pixels
    fn height(&self) -> u32;
}
