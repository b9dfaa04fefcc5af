/// VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait

use gpu_interconnect::interconnect::{
    GraphicsDevice, Fence as InterconnectFence, FenceCycle, Config, Result, Error,
};
use gpu_interconnect::interconnect::render::{
    CommandList as InterconnectCommandList,
    RenderPass as InterconnectRenderPass,
    Framebuffer as InterconnectFramebuffer,
    FramebufferDesc, RenderPassDesc, AttachmentReference,
    TextureFormat, SampleCount, ImageAspect, LoadOp, StoreOp, ImageLayout,
    PipelineStages, AccessFlags, DependencyFlags, ClearValue, Rect2D,
    SUBPASS_EXTERNAL,
};
use gpu_interconnect::{gpu_debug, gpu_info, gpu_error, gpu_err, gpu_bail};
#[cfg(not(feature = "vulkan-validation"))]
use gpu_interconnect::gpu_warn;
use ash::vk;
use ash::vk::Handle;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use std::ffi::CString;
use std::sync::Arc;

use crate::vulkan_command_list::VulkanCommandList;
use crate::vulkan_context::GpuContext;
use crate::vulkan_fence::VulkanFence;
use crate::vulkan_frame_buffer::VulkanFramebuffer;
use crate::vulkan_render_pass::VulkanRenderPass;
use crate::vulkan_texture::VulkanTextureView;

/// Vulkan device implementation
///
/// Headless: no surface or swapchain is created. Native objects created by
/// the device share its `GpuContext` and may outlive the device itself.
pub struct VulkanGraphicsDevice {
    /// Shared GPU context for all native objects
    context: Arc<GpuContext>,
    /// Configuration the device was created with
    config: Config,
}

impl VulkanGraphicsDevice {
    /// Create a headless device on the first GPU exposing a graphics queue
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        unsafe {
            // Create Vulkan Entry
            let entry = ash::Entry::load()
                .map_err(|e| {
                    gpu_error!("interconnect::vulkan", "Failed to load Vulkan library: {:?}", e);
                    Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
                })?;

            let app_name = CString::new(config.app_name.as_str())
                .map_err(|e| Error::InitializationFailed(format!("Invalid application name: {}", e)))?;
            let (major, minor, patch) = config.app_version;

            // Application Info
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"GPU Interconnect")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            #[allow(unused_mut)]
            let mut extension_names: Vec<*const std::os::raw::c_char> = Vec::new();
            #[allow(unused_mut)]
            let mut layer_names: Vec<*const std::os::raw::c_char> = Vec::new();

            #[cfg(feature = "vulkan-validation")]
            if config.enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
                layer_names.push(c"VK_LAYER_KHRONOS_validation".as_ptr());
            }

            #[cfg(not(feature = "vulkan-validation"))]
            if config.enable_validation {
                gpu_warn!("interconnect::vulkan",
                    "Validation requested but the vulkan-validation feature is disabled");
            }

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| {
                    gpu_error!("interconnect::vulkan", "Failed to create Vulkan instance: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
                })?;

            // Setup debug messenger if validation is enabled
            #[cfg(feature = "vulkan-validation")]
            let debug_messenger = if config.enable_validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);

                crate::debug::init_debug_config(config.debug_severity);

                let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(crate::debug::severity_flags(config.debug_severity))
                    .message_type(
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
                    )
                    .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

                match debug_utils.create_debug_utils_messenger(&debug_info, None) {
                    Ok(messenger) => Some((debug_utils, messenger)),
                    Err(e) => {
                        instance.destroy_instance(None);
                        gpu_error!("interconnect::vulkan", "Failed to create debug messenger: {:?}", e);
                        return Err(Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e)));
                    }
                }
            } else {
                None
            };

            // Pick the first physical device with a graphics queue family
            let selected = match Self::select_physical_device(&instance) {
                Ok(selected) => selected,
                Err(e) => {
                    #[cfg(feature = "vulkan-validation")]
                    if let Some((debug_utils, messenger)) = &debug_messenger {
                        debug_utils.destroy_debug_utils_messenger(*messenger, None);
                    }
                    instance.destroy_instance(None);
                    return Err(e);
                }
            };
            let (physical_device, graphics_family_index) = selected;

            let properties = instance.get_physical_device_properties(physical_device);
            let device_name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "Unknown".to_string());
            gpu_info!("interconnect::vulkan", "Using GPU '{}' (graphics queue family {})",
                device_name, graphics_family_index);

            // Create Logical Device
            let queue_priorities = [1.0];
            let queue_create_infos = [
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(graphics_family_index)
                    .queue_priorities(&queue_priorities),
            ];

            let device_features = vk::PhysicalDeviceFeatures::default();
            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_features(&device_features);

            let device = match instance.create_device(physical_device, &device_create_info, None) {
                Ok(device) => device,
                Err(e) => {
                    #[cfg(feature = "vulkan-validation")]
                    if let Some((debug_utils, messenger)) = &debug_messenger {
                        debug_utils.destroy_debug_utils_messenger(*messenger, None);
                    }
                    instance.destroy_instance(None);
                    gpu_error!("interconnect::vulkan", "Failed to create logical device: {:?}", e);
                    return Err(Error::InitializationFailed(format!("Failed to create device: {:?}", e)));
                }
            };

            let graphics_queue = device.get_device_queue(graphics_family_index, 0);

            // Create GPU allocator
            let allocator = match Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            }) {
                Ok(allocator) => allocator,
                Err(e) => {
                    device.destroy_device(None);
                    #[cfg(feature = "vulkan-validation")]
                    if let Some((debug_utils, messenger)) = &debug_messenger {
                        debug_utils.destroy_debug_utils_messenger(*messenger, None);
                    }
                    instance.destroy_instance(None);
                    gpu_error!("interconnect::vulkan", "Failed to create GPU allocator: {:?}", e);
                    return Err(Error::InitializationFailed(format!("Failed to create allocator: {:?}", e)));
                }
            };

            // GpuContext owns device, instance, and debug messenger destruction
            #[cfg(feature = "vulkan-validation")]
            let context = GpuContext::new(
                entry,
                instance,
                physical_device,
                device,
                graphics_queue,
                graphics_family_index,
                allocator,
                debug_messenger,
            );
            #[cfg(not(feature = "vulkan-validation"))]
            let context = GpuContext::new(
                entry,
                instance,
                physical_device,
                device,
                graphics_queue,
                graphics_family_index,
                allocator,
            );
            let context = Arc::new(context);

            Ok(Self { context, config })
        }
    }

    /// Find the first physical device exposing a graphics queue family
    unsafe fn select_physical_device(instance: &ash::Instance) -> Result<(vk::PhysicalDevice, u32)> {
        let physical_devices = instance
            .enumerate_physical_devices()
            .map_err(|e| {
                gpu_error!("interconnect::vulkan", "Failed to enumerate physical devices: {:?}", e);
                Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
            })?;

        physical_devices
            .into_iter()
            .find_map(|physical_device| {
                instance
                    .get_physical_device_queue_family_properties(physical_device)
                    .iter()
                    .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                    .map(|index| (physical_device, index as u32))
            })
            .ok_or_else(|| {
                gpu_error!("interconnect::vulkan", "No Vulkan-capable GPU with a graphics queue found");
                Error::InitializationFailed("No Vulkan-capable GPU with a graphics queue found".to_string())
            })
    }

    /// Shared GPU context
    pub fn context(&self) -> &Arc<GpuContext> {
        &self.context
    }

    /// Create a 2D image usable as a render pass attachment, with its view
    ///
    /// The view reports `ImageLayout::Undefined` until `set_layout` is called.
    pub fn create_attachment_view(
        &self,
        width: u32,
        height: u32,
        format: TextureFormat,
        samples: SampleCount,
    ) -> Result<Arc<VulkanTextureView>> {
        if width == 0 || height == 0 {
            gpu_bail!("interconnect::vulkan",
                "create_attachment_view: invalid size {}x{}", width, height);
        }

        let device = &self.context.device;
        let vk_format = format_to_vk(format);

        let usage_flags = if format.is_depth_stencil() {
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
                | vk::ImageUsageFlags::INPUT_ATTACHMENT
                | vk::ImageUsageFlags::TRANSFER_DST
        } else {
            vk::ImageUsageFlags::COLOR_ATTACHMENT
                | vk::ImageUsageFlags::INPUT_ATTACHMENT
                | vk::ImageUsageFlags::TRANSFER_SRC
                | vk::ImageUsageFlags::TRANSFER_DST
        };

        unsafe {
            // Create image
            let image_create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(vk_format)
                .extent(vk::Extent3D { width, height, depth: 1 })
                .mip_levels(1)
                .array_layers(1)
                .samples(sample_count_to_vk(samples))
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(usage_flags)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = device.create_image(&image_create_info, None)
                .map_err(|e| gpu_err!("interconnect::vulkan", "Failed to create attachment image: {:?}", e))?;

            // Allocate memory
            let requirements = device.get_image_memory_requirements(image);

            let allocation = self.context.allocator().allocate(&gpu_allocator::vulkan::AllocationCreateDesc {
                name: "attachment",
                requirements,
                location: gpu_allocator::MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: gpu_allocator::vulkan::AllocationScheme::GpuAllocatorManaged,
            });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(_) => {
                    device.destroy_image(image, None);
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    gpu_error!("interconnect::vulkan",
                        "Out of GPU memory for attachment (size: {}x{}, {:.2} MB)", width, height, size_mb);
                    return Err(Error::OutOfMemory);
                }
            };

            if let Err(e) = device.bind_image_memory(image, allocation.memory(), allocation.offset()) {
                self.context.allocator().free(allocation).ok();
                device.destroy_image(image, None);
                gpu_bail!("interconnect::vulkan", "Failed to bind attachment image memory: {:?}", e);
            }

            // Create image view
            let view_create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(vk_format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: aspect_to_vk(format.aspect()),
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            let view = match device.create_image_view(&view_create_info, None) {
                Ok(view) => view,
                Err(e) => {
                    self.context.allocator().free(allocation).ok();
                    device.destroy_image(image, None);
                    gpu_bail!("interconnect::vulkan", "Failed to create attachment image view: {:?}", e);
                }
            };

            gpu_debug!("interconnect::vulkan", "Created {:?} attachment {}x{}", format, width, height);

            Ok(Arc::new(VulkanTextureView::new(
                image,
                view,
                allocation,
                format,
                samples,
                width,
                height,
                Arc::clone(&self.context),
            )))
        }
    }
}

// ============================================================================
// Conversions to Vulkan types
// ============================================================================

/// Convert TextureFormat to Vulkan format
pub(crate) fn format_to_vk(format: TextureFormat) -> vk::Format {
    match format {
        TextureFormat::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        TextureFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        TextureFormat::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        TextureFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        TextureFormat::R5G6B5_UNORM => vk::Format::R5G6B5_UNORM_PACK16,
        TextureFormat::A2B10G10R10_UNORM => vk::Format::A2B10G10R10_UNORM_PACK32,
        TextureFormat::R16G16B16A16_SFLOAT => vk::Format::R16G16B16A16_SFLOAT,
        TextureFormat::R32G32B32A32_SFLOAT => vk::Format::R32G32B32A32_SFLOAT,
        TextureFormat::D16_UNORM => vk::Format::D16_UNORM,
        TextureFormat::D32_FLOAT => vk::Format::D32_SFLOAT,
        TextureFormat::S8_UINT => vk::Format::S8_UINT,
        TextureFormat::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
        TextureFormat::D32_FLOAT_S8_UINT => vk::Format::D32_SFLOAT_S8_UINT,
    }
}

pub(crate) fn sample_count_to_vk(count: SampleCount) -> vk::SampleCountFlags {
    match count {
        SampleCount::S1 => vk::SampleCountFlags::TYPE_1,
        SampleCount::S2 => vk::SampleCountFlags::TYPE_2,
        SampleCount::S4 => vk::SampleCountFlags::TYPE_4,
        SampleCount::S8 => vk::SampleCountFlags::TYPE_8,
    }
}

pub(crate) fn load_op_to_vk(load_op: LoadOp) -> vk::AttachmentLoadOp {
    match load_op {
        LoadOp::Load => vk::AttachmentLoadOp::LOAD,
        LoadOp::Clear => vk::AttachmentLoadOp::CLEAR,
        LoadOp::DontCare => vk::AttachmentLoadOp::DONT_CARE,
    }
}

pub(crate) fn store_op_to_vk(store_op: StoreOp) -> vk::AttachmentStoreOp {
    match store_op {
        StoreOp::Store => vk::AttachmentStoreOp::STORE,
        StoreOp::DontCare => vk::AttachmentStoreOp::DONT_CARE,
    }
}

pub(crate) fn image_layout_to_vk(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::Undefined => vk::ImageLayout::UNDEFINED,
        ImageLayout::General => vk::ImageLayout::GENERAL,
        ImageLayout::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        ImageLayout::DepthStencilAttachment => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        ImageLayout::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        ImageLayout::TransferSrc => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        ImageLayout::TransferDst => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        ImageLayout::PresentSrc => vk::ImageLayout::PRESENT_SRC_KHR,
    }
}

pub(crate) fn aspect_to_vk(aspect: ImageAspect) -> vk::ImageAspectFlags {
    let mut flags = vk::ImageAspectFlags::empty();
    if aspect.contains(ImageAspect::COLOR) {
        flags |= vk::ImageAspectFlags::COLOR;
    }
    if aspect.contains(ImageAspect::DEPTH) {
        flags |= vk::ImageAspectFlags::DEPTH;
    }
    if aspect.contains(ImageAspect::STENCIL) {
        flags |= vk::ImageAspectFlags::STENCIL;
    }
    flags
}

pub(crate) fn pipeline_stages_to_vk(stages: PipelineStages) -> vk::PipelineStageFlags {
    const MAPPING: [(PipelineStages, vk::PipelineStageFlags); 8] = [
        (PipelineStages::TOP_OF_PIPE, vk::PipelineStageFlags::TOP_OF_PIPE),
        (PipelineStages::FRAGMENT_SHADER, vk::PipelineStageFlags::FRAGMENT_SHADER),
        (PipelineStages::EARLY_FRAGMENT_TESTS, vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS),
        (PipelineStages::LATE_FRAGMENT_TESTS, vk::PipelineStageFlags::LATE_FRAGMENT_TESTS),
        (PipelineStages::COLOR_ATTACHMENT_OUTPUT, vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT),
        (PipelineStages::TRANSFER, vk::PipelineStageFlags::TRANSFER),
        (PipelineStages::BOTTOM_OF_PIPE, vk::PipelineStageFlags::BOTTOM_OF_PIPE),
        (PipelineStages::ALL_COMMANDS, vk::PipelineStageFlags::ALL_COMMANDS),
    ];

    MAPPING
        .iter()
        .filter(|(stage, _)| stages.contains(*stage))
        .fold(vk::PipelineStageFlags::empty(), |flags, (_, vk_stage)| flags | *vk_stage)
}

pub(crate) fn access_flags_to_vk(access: AccessFlags) -> vk::AccessFlags {
    const MAPPING: [(AccessFlags, vk::AccessFlags); 7] = [
        (AccessFlags::INPUT_ATTACHMENT_READ, vk::AccessFlags::INPUT_ATTACHMENT_READ),
        (AccessFlags::COLOR_ATTACHMENT_READ, vk::AccessFlags::COLOR_ATTACHMENT_READ),
        (AccessFlags::COLOR_ATTACHMENT_WRITE, vk::AccessFlags::COLOR_ATTACHMENT_WRITE),
        (AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ, vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ),
        (AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE, vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE),
        (AccessFlags::MEMORY_READ, vk::AccessFlags::MEMORY_READ),
        (AccessFlags::MEMORY_WRITE, vk::AccessFlags::MEMORY_WRITE),
    ];

    MAPPING
        .iter()
        .filter(|(flag, _)| access.contains(*flag))
        .fold(vk::AccessFlags::empty(), |flags, (_, vk_flag)| flags | *vk_flag)
}

pub(crate) fn dependency_flags_to_vk(flags: DependencyFlags) -> vk::DependencyFlags {
    if flags.contains(DependencyFlags::BY_REGION) {
        vk::DependencyFlags::BY_REGION
    } else {
        vk::DependencyFlags::empty()
    }
}

pub(crate) fn subpass_index_to_vk(subpass: u32) -> u32 {
    if subpass == SUBPASS_EXTERNAL {
        vk::SUBPASS_EXTERNAL
    } else {
        subpass
    }
}

pub(crate) fn attachment_reference_to_vk(reference: &AttachmentReference) -> vk::AttachmentReference {
    vk::AttachmentReference::default()
        .attachment(reference.attachment)
        .layout(image_layout_to_vk(reference.layout))
}

pub(crate) fn clear_value_to_vk(value: &ClearValue) -> vk::ClearValue {
    match *value {
        ClearValue::Color(color) => vk::ClearValue {
            color: vk::ClearColorValue { float32: color },
        },
        ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue { depth, stencil },
        },
    }
}

pub(crate) fn rect_to_vk(rect: Rect2D) -> vk::Rect2D {
    vk::Rect2D {
        offset: vk::Offset2D { x: rect.x, y: rect.y },
        extent: vk::Extent2D { width: rect.width, height: rect.height },
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn create_command_list(&self) -> Result<Box<dyn InterconnectCommandList>> {
        let cmd_list = VulkanCommandList::new(Arc::clone(&self.context))?;
        Ok(Box::new(cmd_list))
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn InterconnectRenderPass>> {
        if desc.subpasses.is_empty() {
            gpu_bail!("interconnect::vulkan", "create_render_pass: at least one subpass is required");
        }

        // Convert attachment descriptions
        let attachments: Vec<vk::AttachmentDescription> = desc.attachments
            .iter()
            .map(|attachment| {
                vk::AttachmentDescription::default()
                    .format(format_to_vk(attachment.format))
                    .samples(sample_count_to_vk(attachment.samples))
                    .load_op(load_op_to_vk(attachment.load_op))
                    .store_op(store_op_to_vk(attachment.store_op))
                    .stencil_load_op(load_op_to_vk(attachment.stencil_load_op))
                    .stencil_store_op(store_op_to_vk(attachment.stencil_store_op))
                    .initial_layout(image_layout_to_vk(attachment.initial_layout))
                    .final_layout(image_layout_to_vk(attachment.final_layout))
            })
            .collect();

        // Reference arrays must outlive the subpass descriptions pointing into them
        let input_refs: Vec<Vec<vk::AttachmentReference>> = desc.subpasses
            .iter()
            .map(|subpass| subpass.input_attachments.iter().map(attachment_reference_to_vk).collect())
            .collect();
        let color_refs: Vec<Vec<vk::AttachmentReference>> = desc.subpasses
            .iter()
            .map(|subpass| subpass.color_attachments.iter().map(attachment_reference_to_vk).collect())
            .collect();
        let depth_refs: Vec<Option<vk::AttachmentReference>> = desc.subpasses
            .iter()
            .map(|subpass| subpass.depth_stencil_attachment.as_ref().map(attachment_reference_to_vk))
            .collect();

        let subpasses: Vec<vk::SubpassDescription> = desc.subpasses
            .iter()
            .enumerate()
            .map(|(i, subpass)| {
                let mut description = vk::SubpassDescription::default()
                    .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                    .input_attachments(&input_refs[i])
                    .color_attachments(&color_refs[i])
                    .preserve_attachments(&subpass.preserve_attachments);
                if let Some(depth_ref) = &depth_refs[i] {
                    description = description.depth_stencil_attachment(depth_ref);
                }
                description
            })
            .collect();

        let dependencies: Vec<vk::SubpassDependency> = desc.dependencies
            .iter()
            .map(|dependency| {
                vk::SubpassDependency::default()
                    .src_subpass(subpass_index_to_vk(dependency.src_subpass))
                    .dst_subpass(subpass_index_to_vk(dependency.dst_subpass))
                    .src_stage_mask(pipeline_stages_to_vk(dependency.src_stage_mask))
                    .dst_stage_mask(pipeline_stages_to_vk(dependency.dst_stage_mask))
                    .src_access_mask(access_flags_to_vk(dependency.src_access_mask))
                    .dst_access_mask(access_flags_to_vk(dependency.dst_access_mask))
                    .dependency_flags(dependency_flags_to_vk(dependency.dependency_flags))
            })
            .collect();

        let render_pass_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let render_pass = unsafe {
            self.context.device.create_render_pass(&render_pass_info, None)
                .map_err(|e| gpu_err!("interconnect::vulkan", "Failed to create render pass: {:?}", e))?
        };

        gpu_debug!("interconnect::vulkan", "Created render pass ({} attachments, {} subpasses, {} dependencies)",
            attachments.len(), subpasses.len(), dependencies.len());

        Ok(Arc::new(VulkanRenderPass::new(
            render_pass,
            subpasses.len() as u32,
            Arc::clone(&self.context),
        )))
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn InterconnectFramebuffer>> {
        if desc.width == 0 || desc.height == 0 || desc.layers == 0 {
            gpu_bail!("interconnect::vulkan", "create_framebuffer: invalid extent {}x{}x{}",
                desc.width, desc.height, desc.layers);
        }

        unsafe {
            // Downcast render pass to Vulkan type
            let vk_render_pass = desc.render_pass.as_ref()
                as *const dyn InterconnectRenderPass
                as *const VulkanRenderPass;
            let vk_render_pass = &*vk_render_pass;

            // Collect image views from attachments
            let attachments: Vec<vk::ImageView> = desc.attachments
                .iter()
                .map(|view| vk::ImageView::from_raw(view.handle()))
                .collect();

            let framebuffer_info = vk::FramebufferCreateInfo::default()
                .render_pass(vk_render_pass.render_pass)
                .attachments(&attachments)
                .width(desc.width)
                .height(desc.height)
                .layers(desc.layers);

            let framebuffer = self.context.device.create_framebuffer(&framebuffer_info, None)
                .map_err(|e| gpu_err!("interconnect::vulkan", "Failed to create framebuffer: {:?}", e))?;

            Ok(Arc::new(VulkanFramebuffer::new(
                framebuffer,
                desc.width,
                desc.height,
                desc.layers,
                Arc::clone(&self.context),
            )))
        }
    }

    fn create_fence(&self) -> Result<Box<dyn InterconnectFence>> {
        Ok(Box::new(VulkanFence::new(Arc::clone(&self.context))?))
    }

    fn submit(&self, commands: &dyn InterconnectCommandList, cycle: &FenceCycle) -> Result<()> {
        unsafe {
            let vk_cmd = commands as *const dyn InterconnectCommandList as *const VulkanCommandList;
            let vk_fence = cycle.fence() as *const dyn InterconnectFence as *const VulkanFence;

            let command_buffers = [(*vk_cmd).command_buffer()];
            let submit_info = vk::SubmitInfo::default()
                .command_buffers(&command_buffers);

            let queue = self.context.graphics_queue();
            self.context.device
                .queue_submit(*queue, &[submit_info], (*vk_fence).fence)
                .map_err(|e| gpu_err!("interconnect::vulkan", "submit: failed to submit queue: {:?}", e))
        }
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.context.device
                .device_wait_idle()
                .map_err(|e| gpu_err!("interconnect::vulkan", "Failed to wait idle: {:?}", e))
        }
    }

    fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
