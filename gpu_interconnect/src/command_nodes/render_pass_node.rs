/// Render pass builder - accumulates attachments and subpasses, creates the
/// native render pass and framebuffer when the graph is replayed

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::fence_cycle::{FenceCycle, FenceCycleDependency};
use crate::graphics_device::{
    GraphicsDevice, CommandList, RenderPass, Framebuffer, FramebufferDesc, TextureView,
    AttachmentDesc, AttachmentReference, SubpassDesc, SubpassDependency, RenderPassDesc,
    LoadOp, StoreOp, ImageLayout, ImageAspect, PipelineStages, AccessFlags, DependencyFlags,
    Rect2D, ClearValue, SUBPASS_EXTERNAL,
};
use crate::{gpu_debug, gpu_trace};

/// Native objects created by a `RenderPassNode`, kept alive until the GPU
/// has finished with them
///
/// Attached to the `FenceCycle` of the submission that begins the render
/// pass; the objects are destroyed when the last reference drops.
pub struct RenderPassStorage {
    render_pass: Arc<dyn RenderPass>,
    framebuffer: Arc<dyn Framebuffer>,
    attachments: Vec<Arc<dyn TextureView>>,
}

impl RenderPassStorage {
    pub fn render_pass(&self) -> &Arc<dyn RenderPass> {
        &self.render_pass
    }

    pub fn framebuffer(&self) -> &Arc<dyn Framebuffer> {
        &self.framebuffer
    }

    /// Views bound to the framebuffer, in attachment order
    pub fn attachments(&self) -> &[Arc<dyn TextureView>] {
        &self.attachments
    }
}

impl FenceCycleDependency for RenderPassStorage {}

impl Drop for RenderPassStorage {
    fn drop(&mut self) {
        gpu_trace!("interconnect::RenderPassStorage",
            "Releasing render pass with {} attachments", self.attachments.len());
    }
}

/// How one subpass uses an attachment, as seen by later subpasses
#[derive(Debug, Clone, Copy)]
struct AttachmentUse {
    subpass: u32,
    stages: PipelineStages,
    /// Accesses a later subpass has to wait on (empty for pure reads)
    write_access: AccessFlags,
    /// Accesses made by this use when it is the destination of an edge
    access: AccessFlags,
    writes: bool,
}

impl AttachmentUse {
    fn input(subpass: u32) -> Self {
        Self {
            subpass,
            stages: PipelineStages::FRAGMENT_SHADER,
            write_access: AccessFlags::empty(),
            access: AccessFlags::INPUT_ATTACHMENT_READ,
            writes: false,
        }
    }

    fn color(subpass: u32) -> Self {
        Self {
            subpass,
            stages: PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            write_access: AccessFlags::COLOR_ATTACHMENT_WRITE,
            access: AccessFlags::COLOR_ATTACHMENT_READ | AccessFlags::COLOR_ATTACHMENT_WRITE,
            writes: true,
        }
    }

    fn depth_stencil(subpass: u32) -> Self {
        Self {
            subpass,
            stages: PipelineStages::EARLY_FRAGMENT_TESTS | PipelineStages::LATE_FRAGMENT_TESTS,
            write_access: AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            access: AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
                | AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            writes: true,
        }
    }

    /// Combine two uses of the same attachment within one subpass
    fn merge(self, other: Self) -> Self {
        Self {
            subpass: self.subpass,
            stages: self.stages | other.stages,
            write_access: self.write_access | other.write_access,
            access: self.access | other.access,
            writes: self.writes || other.writes,
        }
    }
}

/// Accesses to one attachment that later subpasses must be ordered after
#[derive(Debug, Clone, Default)]
struct AttachmentHistory {
    last_write: Option<AttachmentUse>,
    /// Reads since `last_write`, in subpass order
    reads_since_write: Vec<AttachmentUse>,
}

impl AttachmentHistory {
    fn is_referenced(&self) -> bool {
        self.last_write.is_some() || !self.reads_since_write.is_empty()
    }

    /// Earlier uses `current` has to wait on
    ///
    /// A read waits on the last write. A write waits on the last write and
    /// on every read made since.
    fn hazards(&self, current: &AttachmentUse) -> Vec<AttachmentUse> {
        let mut hazards: Vec<AttachmentUse> = self.last_write.iter().copied().collect();
        if current.writes {
            hazards.extend(self.reads_since_write.iter().copied());
        }
        hazards
    }

    fn record(&mut self, current: AttachmentUse) {
        if current.writes {
            self.last_write = Some(current);
            self.reads_since_write.clear();
        } else {
            self.reads_since_write.push(current);
        }
    }
}

/// Incrementally built multi-subpass render pass
///
/// Attachments are deduplicated by native view handle and keep their index
/// for the lifetime of the builder. Every subpass reference, dependency and
/// preserve entry is an index into the attachment registry or the subpass
/// list.
pub struct RenderPassNode {
    render_area: Rect2D,
    attachments: Vec<Arc<dyn TextureView>>,
    attachment_lookup: FxHashMap<u64, u32>,
    attachment_descriptions: Vec<AttachmentDesc>,
    /// Access history of each attachment, parallel to `attachments`
    histories: Vec<AttachmentHistory>,
    subpasses: Vec<SubpassDesc>,
    dependencies: Vec<SubpassDependency>,
    clear_values: Vec<ClearValue>,
    storage: Option<Arc<RenderPassStorage>>,
}

impl RenderPassNode {
    /// Create an empty builder covering `render_area`
    pub fn new(render_area: Rect2D) -> Self {
        Self {
            render_area,
            attachments: Vec::new(),
            attachment_lookup: FxHashMap::default(),
            attachment_descriptions: Vec::new(),
            histories: Vec::new(),
            subpasses: Vec::new(),
            dependencies: Vec::new(),
            clear_values: Vec::new(),
            storage: None,
        }
    }

    // ===== Accessors =====

    pub fn render_area(&self) -> Rect2D {
        self.render_area
    }

    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }

    pub fn attachment_description(&self, index: u32) -> Option<&AttachmentDesc> {
        self.attachment_descriptions.get(index as usize)
    }

    pub fn subpass_count(&self) -> usize {
        self.subpasses.len()
    }

    pub fn subpasses(&self) -> &[SubpassDesc] {
        &self.subpasses
    }

    /// Dependencies between subpasses of this render pass
    ///
    /// The external dependencies added at creation time are not included.
    pub fn dependencies(&self) -> &[SubpassDependency] {
        &self.dependencies
    }

    /// Clear values indexed by attachment index
    pub fn clear_values(&self) -> &[ClearValue] {
        &self.clear_values
    }

    /// Native objects, once the node was executed
    pub fn storage(&self) -> Option<&Arc<RenderPassStorage>> {
        self.storage.as_ref()
    }

    // ===== Building =====

    /// Register `view` as an attachment and return its index
    ///
    /// A view whose handle is already registered returns the existing index.
    pub fn add_attachment(&mut self, view: &Arc<dyn TextureView>) -> Result<u32> {
        self.ensure_not_executed()?;
        let handle = view.handle();
        if let Some(&index) = self.attachment_lookup.get(&handle) {
            return Ok(index);
        }

        let index = self.attachments.len() as u32;
        let format = view.format();
        let (stencil_load_op, stencil_store_op) = if format.has_stencil() {
            (LoadOp::Load, StoreOp::Store)
        } else {
            (LoadOp::DontCare, StoreOp::DontCare)
        };
        let initial_layout = view.layout();
        let final_layout = match initial_layout {
            ImageLayout::Undefined => ImageLayout::General,
            layout => layout,
        };

        self.attachment_descriptions.push(AttachmentDesc {
            format,
            samples: view.samples(),
            load_op: LoadOp::Load,
            store_op: StoreOp::Store,
            stencil_load_op,
            stencil_store_op,
            initial_layout,
            final_layout,
            aspect: format.aspect(),
        });
        self.attachments.push(view.clone());
        self.attachment_lookup.insert(handle, index);
        self.histories.push(AttachmentHistory::default());
        Ok(index)
    }

    /// Append a subpass reading `inputs`, writing `colors` and optionally
    /// using `depth_stencil`, and return its index
    ///
    /// Dependencies on earlier subpasses and the preserve list are derived
    /// from how the attachments were used before.
    pub fn add_subpass(
        &mut self,
        inputs: &[Arc<dyn TextureView>],
        colors: &[Arc<dyn TextureView>],
        depth_stencil: Option<&Arc<dyn TextureView>>,
    ) -> Result<u32> {
        self.ensure_not_executed()?;

        let subpass = self.subpasses.len() as u32;
        let mut uses: Vec<(u32, AttachmentUse)> = Vec::new();
        let mut record_use = |index: u32, attachment_use: AttachmentUse| {
            match uses.iter_mut().find(|(existing, _)| *existing == index) {
                Some((_, existing)) => *existing = existing.merge(attachment_use),
                None => uses.push((index, attachment_use)),
            }
        };

        let mut desc = SubpassDesc::default();
        for view in inputs {
            let index = self.add_attachment(view)?;
            desc.input_attachments.push(general_reference(index));
            record_use(index, AttachmentUse::input(subpass));
        }
        for view in colors {
            let index = self.add_attachment(view)?;
            desc.color_attachments.push(general_reference(index));
            record_use(index, AttachmentUse::color(subpass));
        }
        if let Some(view) = depth_stencil {
            let index = self.add_attachment(view)?;
            desc.depth_stencil_attachment = Some(general_reference(index));
            record_use(index, AttachmentUse::depth_stencil(subpass));
        }
        uses.sort_by_key(|(index, _)| *index);

        for &(index, current) in &uses {
            for previous in self.histories[index as usize].hazards(&current) {
                self.add_dependency(previous, current);
            }
        }

        desc.preserve_attachments = (0..self.attachments.len() as u32)
            .filter(|index| {
                self.histories[*index as usize].is_referenced()
                    && !uses.iter().any(|(used, _)| used == index)
            })
            .collect();

        for (index, current) in uses {
            self.histories[index as usize].record(current);
        }

        gpu_trace!("interconnect::RenderPassNode",
            "Added subpass {} ({} inputs, {} colors, depth/stencil: {}, {} preserved)",
            subpass, desc.input_attachments.len(), desc.color_attachments.len(),
            desc.depth_stencil_attachment.is_some(), desc.preserve_attachments.len());

        self.subpasses.push(desc);
        Ok(subpass)
    }

    fn add_dependency(&mut self, previous: AttachmentUse, current: AttachmentUse) {
        let src_access = if previous.writes { previous.write_access } else { AccessFlags::empty() };

        if let Some(dependency) = self.dependencies.iter_mut().find(|dependency| {
            dependency.src_subpass == previous.subpass && dependency.dst_subpass == current.subpass
        }) {
            dependency.src_stage_mask |= previous.stages;
            dependency.dst_stage_mask |= current.stages;
            dependency.src_access_mask |= src_access;
            dependency.dst_access_mask |= current.access;
            return;
        }

        self.dependencies.push(SubpassDependency {
            src_subpass: previous.subpass,
            dst_subpass: current.subpass,
            src_stage_mask: previous.stages,
            dst_stage_mask: current.stages,
            src_access_mask: src_access,
            dst_access_mask: current.access,
            dependency_flags: DependencyFlags::BY_REGION,
        });
    }

    // ===== Clears =====

    /// Fold a clear of color attachment `color_index` of the last subpass
    /// into its load operation
    ///
    /// Returns false when the clear could not be folded (no subpass yet, the
    /// attachment is used elsewhere in the render pass, or its load operation
    /// is already committed to something else). The caller must then clear
    /// the attachment by other means.
    pub fn clear_color_attachment(&mut self, color_index: u32, value: [f32; 4]) -> Result<bool> {
        self.ensure_not_executed()?;
        let Some(last) = self.subpasses.last() else {
            return Ok(false);
        };
        let reference = last.color_attachments.get(color_index as usize).ok_or_else(|| {
            Error::InvalidResource(format!(
                "Color attachment {} out of range (last subpass has {})",
                color_index, last.color_attachments.len()))
        })?;
        let attachment = reference.attachment;

        if self.reference_count(attachment) > 1 {
            return Ok(false);
        }

        let value = ClearValue::Color(value);
        let description = &mut self.attachment_descriptions[attachment as usize];
        match description.load_op {
            LoadOp::Load => {
                description.load_op = LoadOp::Clear;
                self.set_clear_value(attachment, value);
                Ok(true)
            }
            LoadOp::Clear => Ok(self.has_clear_value(attachment, value)),
            LoadOp::DontCare => Ok(false),
        }
    }

    /// Fold a clear of the last subpass's depth/stencil attachment into its
    /// load operations
    ///
    /// The depth aspect uses `load_op`, the stencil aspect `stencil_load_op`;
    /// every aspect of the format must be foldable for the clear to succeed.
    pub fn clear_depth_stencil_attachment(&mut self, depth: f32, stencil: u32) -> Result<bool> {
        self.ensure_not_executed()?;
        let Some(last) = self.subpasses.last() else {
            return Ok(false);
        };
        let reference = last.depth_stencil_attachment.ok_or_else(|| {
            Error::InvalidResource("Last subpass has no depth/stencil attachment".to_string())
        })?;
        let attachment = reference.attachment;

        if self.reference_count(attachment) > 1 {
            return Ok(false);
        }

        let value = ClearValue::DepthStencil { depth, stencil };
        let description = &self.attachment_descriptions[attachment as usize];
        let mut ops = Vec::with_capacity(2);
        if description.aspect.contains(ImageAspect::DEPTH) {
            ops.push(description.load_op);
        }
        if description.aspect.contains(ImageAspect::STENCIL) {
            ops.push(description.stencil_load_op);
        }

        if !ops.is_empty() && ops.iter().all(|op| *op == LoadOp::Load) {
            let aspect = description.aspect;
            let description = &mut self.attachment_descriptions[attachment as usize];
            if aspect.contains(ImageAspect::DEPTH) {
                description.load_op = LoadOp::Clear;
            }
            if aspect.contains(ImageAspect::STENCIL) {
                description.stencil_load_op = LoadOp::Clear;
            }
            self.set_clear_value(attachment, value);
            return Ok(true);
        }
        if !ops.is_empty() && ops.iter().all(|op| *op == LoadOp::Clear) {
            return Ok(self.has_clear_value(attachment, value));
        }
        Ok(false)
    }

    /// Number of references to `attachment` across every slot of every subpass
    fn reference_count(&self, attachment: u32) -> usize {
        self.subpasses.iter().map(|subpass| subpass.reference_count(attachment)).sum()
    }

    fn set_clear_value(&mut self, attachment: u32, value: ClearValue) {
        let index = attachment as usize;
        if self.clear_values.len() <= index {
            self.clear_values.resize(index + 1, ClearValue::default());
        }
        self.clear_values[index] = value;
    }

    /// Bitwise comparison, so a NaN clear color matches itself
    fn has_clear_value(&self, attachment: u32, value: ClearValue) -> bool {
        match (self.clear_values.get(attachment as usize), value) {
            (Some(ClearValue::Color(current)), ClearValue::Color(value)) => {
                current.iter().zip(value.iter()).all(|(a, b)| a.to_bits() == b.to_bits())
            }
            (
                Some(ClearValue::DepthStencil { depth: current_depth, stencil: current_stencil }),
                ClearValue::DepthStencil { depth, stencil },
            ) => current_depth.to_bits() == depth.to_bits() && *current_stencil == stencil,
            _ => false,
        }
    }

    fn ensure_not_executed(&self) -> Result<()> {
        if self.storage.is_some() {
            return Err(Error::InvalidState("Render pass was already executed".to_string()));
        }
        Ok(())
    }

    // ===== Execution =====

    /// Framebuffer size covering the render area from the origin
    fn framebuffer_extent(&self) -> Result<(u32, u32)> {
        let area = self.render_area;
        let width = (area.x.max(0) as u32).checked_add(area.width);
        let height = (area.y.max(0) as u32).checked_add(area.height);
        match (width, height) {
            (Some(width), Some(height)) => Ok((width, height)),
            _ => Err(Error::InvalidResource(format!(
                "Render area {:?} exceeds the framebuffer size range", area))),
        }
    }

    /// Full creation descriptor, including the dependencies on work
    /// recorded outside the render pass
    pub fn render_pass_desc(&self) -> RenderPassDesc {
        let mut dependencies = Vec::with_capacity(self.dependencies.len() + 2);
        dependencies.push(external_dependency(SUBPASS_EXTERNAL, 0));
        dependencies.extend_from_slice(&self.dependencies);
        let last = self.subpasses.len().saturating_sub(1) as u32;
        dependencies.push(external_dependency(last, SUBPASS_EXTERNAL));

        RenderPassDesc {
            attachments: self.attachment_descriptions.clone(),
            subpasses: self.subpasses.clone(),
            dependencies,
        }
    }

    /// Create the native render pass and framebuffer, tie them to `cycle`
    /// and begin the render pass on `cmd`
    ///
    /// Returns the created render pass so later subpass nodes can refer to it.
    pub fn execute(
        &mut self,
        cmd: &mut dyn CommandList,
        cycle: &Arc<FenceCycle>,
        gpu: &dyn GraphicsDevice,
    ) -> Result<Arc<dyn RenderPass>> {
        self.ensure_not_executed()?;
        if self.subpasses.is_empty() {
            return Err(Error::InvalidState("Render pass has no subpasses".to_string()));
        }

        let (width, height) = self.framebuffer_extent()?;
        let render_pass = gpu.create_render_pass(&self.render_pass_desc())?;
        let framebuffer = gpu.create_framebuffer(&FramebufferDesc {
            render_pass: &render_pass,
            attachments: &self.attachments,
            width,
            height,
            layers: 1,
        })?;

        let storage = Arc::new(RenderPassStorage {
            render_pass: render_pass.clone(),
            framebuffer: framebuffer.clone(),
            attachments: self.attachments.clone(),
        });
        cycle.attach_object(storage.clone());
        self.storage = Some(storage);

        cmd.begin_render_pass(&render_pass, &framebuffer, self.render_area, &self.clear_values)?;

        gpu_debug!("interconnect::RenderPassNode",
            "Began render pass: {} attachments, {} subpasses, {} dependencies",
            self.attachments.len(), self.subpasses.len(), self.dependencies.len());

        Ok(render_pass)
    }
}

fn general_reference(attachment: u32) -> AttachmentReference {
    AttachmentReference {
        attachment,
        layout: ImageLayout::General,
    }
}

fn external_dependency(src_subpass: u32, dst_subpass: u32) -> SubpassDependency {
    SubpassDependency {
        src_subpass,
        dst_subpass,
        src_stage_mask: PipelineStages::ALL_COMMANDS,
        dst_stage_mask: PipelineStages::ALL_COMMANDS,
        src_access_mask: AccessFlags::MEMORY_WRITE,
        dst_access_mask: AccessFlags::MEMORY_READ | AccessFlags::MEMORY_WRITE,
        dependency_flags: DependencyFlags::empty(),
    }
}

#[cfg(test)]
#[path = "render_pass_node_tests.rs"]
mod tests;
