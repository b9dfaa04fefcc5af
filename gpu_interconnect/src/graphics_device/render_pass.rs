/// RenderPass trait and the descriptors used to create multi-subpass render passes
///
/// Every reference in these descriptors is an index: attachment references
/// index `RenderPassDesc::attachments`, dependencies index `subpasses`.
/// Backends turn them into contiguous native arrays only while creating
/// the native object.

use bitflags::bitflags;
use crate::graphics_device::{TextureFormat, SampleCount, ImageAspect};

/// Subpass index standing for work outside the render pass
pub const SUBPASS_EXTERNAL: u32 = u32::MAX;

/// Native render pass object
///
/// Destroyed when the last reference is dropped.
pub trait RenderPass: Send + Sync {
    /// Number of subpasses the render pass was created with
    fn subpass_count(&self) -> u32;
}

/// Load operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadOp {
    /// Load existing content
    Load,
    /// Clear the content
    Clear,
    /// Don't care about existing content
    DontCare,
}

/// Store operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// Store the rendered content
    Store,
    /// Don't care about storing the content
    DontCare,
}

/// Image layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageLayout {
    /// Undefined layout (contents may be discarded)
    Undefined,
    /// Usable for any access
    General,
    /// Layout for color attachment
    ColorAttachment,
    /// Layout for depth/stencil attachment
    DepthStencilAttachment,
    /// Layout for shader read-only access
    ShaderReadOnly,
    /// Layout for transfer source
    TransferSrc,
    /// Layout for transfer destination
    TransferDst,
    /// Layout for presenting to swapchain
    PresentSrc,
}

/// Descriptor for a single attachment in a render pass
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentDesc {
    /// Pixel format
    pub format: TextureFormat,
    /// Number of samples
    pub samples: SampleCount,
    /// Load operation for color / depth
    pub load_op: LoadOp,
    /// Store operation for color / depth
    pub store_op: StoreOp,
    /// Load operation for stencil
    pub stencil_load_op: LoadOp,
    /// Store operation for stencil
    pub stencil_store_op: StoreOp,
    /// Layout the image is in when the render pass begins
    pub initial_layout: ImageLayout,
    /// Layout the image is transitioned to when the render pass ends
    pub final_layout: ImageLayout,
    /// Aspects of the attachment format
    pub aspect: ImageAspect,
}

/// Reference from a subpass to an attachment of the render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentReference {
    /// Index into `RenderPassDesc::attachments`
    pub attachment: u32,
    /// Layout the attachment is in during the subpass
    pub layout: ImageLayout,
}

/// Description of one subpass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubpassDesc {
    /// Attachments read as input attachments
    pub input_attachments: Vec<AttachmentReference>,
    /// Attachments written as color attachments
    pub color_attachments: Vec<AttachmentReference>,
    /// Optional depth/stencil attachment
    pub depth_stencil_attachment: Option<AttachmentReference>,
    /// Attachments not touched by this subpass whose contents must survive it
    pub preserve_attachments: Vec<u32>,
}

impl SubpassDesc {
    /// Number of slots of this subpass referencing `attachment`
    pub fn reference_count(&self, attachment: u32) -> usize {
        self.input_attachments.iter().filter(|r| r.attachment == attachment).count()
            + self.color_attachments.iter().filter(|r| r.attachment == attachment).count()
            + self.depth_stencil_attachment
                .map_or(0, |r| usize::from(r.attachment == attachment))
    }
}

bitflags! {
    /// Pipeline stages taking part in a subpass dependency
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PipelineStages: u32 {
        const TOP_OF_PIPE = 1 << 0;
        const FRAGMENT_SHADER = 1 << 1;
        const EARLY_FRAGMENT_TESTS = 1 << 2;
        const LATE_FRAGMENT_TESTS = 1 << 3;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 4;
        const TRANSFER = 1 << 5;
        const BOTTOM_OF_PIPE = 1 << 6;
        const ALL_COMMANDS = 1 << 7;
    }
}

bitflags! {
    /// Memory accesses taking part in a subpass dependency
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const INPUT_ATTACHMENT_READ = 1 << 0;
        const COLOR_ATTACHMENT_READ = 1 << 1;
        const COLOR_ATTACHMENT_WRITE = 1 << 2;
        const DEPTH_STENCIL_ATTACHMENT_READ = 1 << 3;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 1 << 4;
        const MEMORY_READ = 1 << 5;
        const MEMORY_WRITE = 1 << 6;
    }
}

bitflags! {
    /// Subpass dependency flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DependencyFlags: u32 {
        const BY_REGION = 1 << 0;
    }
}

/// Ordering/synchronization edge between two subpasses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubpassDependency {
    /// Source subpass (or `SUBPASS_EXTERNAL`)
    pub src_subpass: u32,
    /// Destination subpass (or `SUBPASS_EXTERNAL`)
    pub dst_subpass: u32,
    pub src_stage_mask: PipelineStages,
    pub dst_stage_mask: PipelineStages,
    pub src_access_mask: AccessFlags,
    pub dst_access_mask: AccessFlags,
    pub dependency_flags: DependencyFlags,
}

/// Descriptor for creating a render pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderPassDesc {
    /// Attachment descriptions, indexed by `AttachmentReference::attachment`
    pub attachments: Vec<AttachmentDesc>,
    /// Subpasses in execution order
    pub subpasses: Vec<SubpassDesc>,
    /// Dependencies between subpasses
    pub dependencies: Vec<SubpassDependency>,
}
