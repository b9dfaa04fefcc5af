/// TextureView - Vulkan implementation of the TextureView trait

use gpu_interconnect::interconnect::render::{
    TextureView as InterconnectTextureView, TextureFormat, SampleCount, ImageLayout,
};
use ash::vk;
use ash::vk::Handle;
use gpu_allocator::vulkan::Allocation;
use std::sync::{Arc, Mutex, PoisonError};

use crate::vulkan_context::GpuContext;

/// Vulkan attachment image and its view
///
/// The image is owned by the view; both are destroyed (and the memory freed)
/// when dropped.
pub struct VulkanTextureView {
    /// Vulkan image
    pub(crate) image: vk::Image,
    /// Vulkan image view
    pub(crate) view: vk::ImageView,
    /// GPU memory allocation
    pub(crate) allocation: Option<Allocation>,
    /// Pixel format
    format: TextureFormat,
    /// Sample count
    samples: SampleCount,
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Layout the image is currently in, as last reported by `set_layout`
    layout: Mutex<ImageLayout>,
    /// Shared GPU context (for cleanup)
    context: Arc<GpuContext>,
}

impl VulkanTextureView {
    pub(crate) fn new(
        image: vk::Image,
        view: vk::ImageView,
        allocation: Allocation,
        format: TextureFormat,
        samples: SampleCount,
        width: u32,
        height: u32,
        context: Arc<GpuContext>,
    ) -> Self {
        Self {
            image,
            view,
            allocation: Some(allocation),
            format,
            samples,
            width,
            height,
            layout: Mutex::new(ImageLayout::Undefined),
            context,
        }
    }

    /// Record the layout the image was transitioned to
    ///
    /// Render passes use it as the initial (and final) attachment layout.
    pub fn set_layout(&self, layout: ImageLayout) {
        *self.layout.lock().unwrap_or_else(PoisonError::into_inner) = layout;
    }
}

impl InterconnectTextureView for VulkanTextureView {
    fn handle(&self) -> u64 {
        self.view.as_raw()
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn samples(&self) -> SampleCount {
        self.samples
    }

    fn layout(&self) -> ImageLayout {
        *self.layout.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

impl Drop for VulkanTextureView {
    fn drop(&mut self) {
        unsafe {
            // Destroy image view
            self.context.device.destroy_image_view(self.view, None);

            // Free GPU memory
            if let Some(allocation) = self.allocation.take() {
                self.context.allocator().free(allocation).ok();
            }

            // Destroy image
            self.context.device.destroy_image(self.image, None);
        }
    }
}
