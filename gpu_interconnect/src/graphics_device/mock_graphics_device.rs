/// Mock graphics device for unit tests (no GPU required)
///
/// Records created objects and recorded commands so command graphs, render
/// pass builders and fence cycles can be tested without a real backend.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::error::Result;
use crate::fence_cycle::{Fence, FenceCycle, FenceCycleDependency};
use crate::graphics_device::{
    GraphicsDevice, CommandList, RenderPass, Framebuffer, TextureView,
    RenderPassDesc, FramebufferDesc, TextureFormat, SampleCount, ImageLayout,
    Viewport, Rect2D, ClearValue, ClearAttachment,
};
use crate::gpu_bail;

// ============================================================================
// Mock TextureView
// ============================================================================

#[derive(Debug)]
pub struct MockTextureView {
    pub handle: u64,
    pub format: TextureFormat,
    pub samples: SampleCount,
    pub layout: ImageLayout,
    pub width: u32,
    pub height: u32,
}

impl MockTextureView {
    /// 64x64 single-sampled view in `layout`
    pub fn new(handle: u64, format: TextureFormat, layout: ImageLayout) -> Arc<dyn TextureView> {
        Arc::new(Self {
            handle,
            format,
            samples: SampleCount::S1,
            layout,
            width: 64,
            height: 64,
        })
    }

    /// Color view in the color attachment layout
    pub fn color(handle: u64) -> Arc<dyn TextureView> {
        Self::new(handle, TextureFormat::R8G8B8A8_UNORM, ImageLayout::ColorAttachment)
    }

    /// Combined depth/stencil view in the depth/stencil attachment layout
    pub fn depth_stencil(handle: u64) -> Arc<dyn TextureView> {
        Self::new(handle, TextureFormat::D24_UNORM_S8_UINT, ImageLayout::DepthStencilAttachment)
    }
}

impl TextureView for MockTextureView {
    fn handle(&self) -> u64 { self.handle }
    fn format(&self) -> TextureFormat { self.format }
    fn samples(&self) -> SampleCount { self.samples }
    fn layout(&self) -> ImageLayout { self.layout }
    fn width(&self) -> u32 { self.width }
    fn height(&self) -> u32 { self.height }
}

// ============================================================================
// Mock RenderPass
// ============================================================================

#[derive(Debug)]
pub struct MockRenderPass {
    pub subpass_count: u32,
    destroyed: Arc<AtomicUsize>,
}

impl MockRenderPass {
    pub fn new(subpass_count: u32, destroyed: Arc<AtomicUsize>) -> Self {
        Self { subpass_count, destroyed }
    }
}

impl RenderPass for MockRenderPass {
    fn subpass_count(&self) -> u32 {
        self.subpass_count
    }
}

impl Drop for MockRenderPass {
    fn drop(&mut self) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Mock Framebuffer
// ============================================================================

#[derive(Debug)]
pub struct MockFramebuffer {
    pub width: u32,
    pub height: u32,
    pub layers: u32,
    pub attachment_handles: Vec<u64>,
    destroyed: Arc<AtomicUsize>,
}

impl Framebuffer for MockFramebuffer {
    fn width(&self) -> u32 { self.width }
    fn height(&self) -> u32 { self.height }
    fn layers(&self) -> u32 { self.layers }
}

impl Drop for MockFramebuffer {
    fn drop(&mut self) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Mock CommandList
// ============================================================================

/// Everything recorded into mock command lists sharing the log
#[derive(Debug, Default)]
pub struct MockCommandLog {
    pub commands: Vec<String>,
    pub clear_values: Vec<Vec<ClearValue>>,
    pub cleared_attachments: Vec<Vec<ClearAttachment>>,
}

#[derive(Debug)]
pub struct MockCommandList {
    pub log: Arc<Mutex<MockCommandLog>>,
    dropped: Arc<AtomicUsize>,
}

impl MockCommandList {
    pub fn new() -> Self {
        Self::with_log(Arc::new(Mutex::new(MockCommandLog::default())), Arc::new(AtomicUsize::new(0)))
    }

    pub fn with_log(log: Arc<Mutex<MockCommandLog>>, dropped: Arc<AtomicUsize>) -> Self {
        Self { log, dropped }
    }

    /// Names of the recorded commands, in order
    pub fn commands(&self) -> Vec<String> {
        self.log.lock().unwrap().commands.clone()
    }

    fn push(&self, command: String) {
        self.log.lock().unwrap().commands.push(command);
    }
}

impl CommandList for MockCommandList {
    fn begin(&mut self) -> Result<()> {
        self.push("begin".to_string());
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.push("end".to_string());
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        _render_pass: &Arc<dyn RenderPass>,
        _framebuffer: &Arc<dyn Framebuffer>,
        _render_area: Rect2D,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        log.commands.push("begin_render_pass".to_string());
        log.clear_values.push(clear_values.to_vec());
        Ok(())
    }

    fn next_subpass(&mut self) -> Result<()> {
        self.push("next_subpass".to_string());
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.push("end_render_pass".to_string());
        Ok(())
    }

    fn clear_attachments(&mut self, attachments: &[ClearAttachment], _rect: Rect2D) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        log.commands.push("clear_attachments".to_string());
        log.cleared_attachments.push(attachments.to_vec());
        Ok(())
    }

    fn set_viewport(&mut self, _viewport: Viewport) -> Result<()> {
        self.push("set_viewport".to_string());
        Ok(())
    }

    fn set_scissor(&mut self, _scissor: Rect2D) -> Result<()> {
        self.push("set_scissor".to_string());
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.push(format!("draw({}, {})", vertex_count, first_vertex));
        Ok(())
    }
}

impl Drop for MockCommandList {
    fn drop(&mut self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Mock Fence
// ============================================================================

/// Fence signalled by the test through the shared flag
///
/// `wait()` behaves like a GPU finishing its work: it signals the fence,
/// unless `fail_wait` is set.
#[derive(Debug)]
pub struct MockFence {
    pub signalled: Arc<AtomicBool>,
    pub waits: Arc<AtomicUsize>,
    pub fail_wait: Arc<AtomicBool>,
}

impl MockFence {
    pub fn new() -> Self {
        Self {
            signalled: Arc::new(AtomicBool::new(false)),
            waits: Arc::new(AtomicUsize::new(0)),
            fail_wait: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Fence for MockFence {
    fn is_signalled(&self) -> Result<bool> {
        Ok(self.signalled.load(Ordering::SeqCst))
    }

    fn wait(&self, _timeout_ns: u64) -> Result<()> {
        self.waits.fetch_add(1, Ordering::SeqCst);
        if self.fail_wait.load(Ordering::SeqCst) {
            gpu_bail!("interconnect::mock", "fence wait: injected failure");
        }
        self.signalled.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Mock dependency
// ============================================================================

/// Dependency counting how often it was released
pub struct MockDependency {
    released: Arc<AtomicUsize>,
}

impl MockDependency {
    pub fn new(released: Arc<AtomicUsize>) -> Arc<dyn FenceCycleDependency> {
        Arc::new(Self { released })
    }
}

impl FenceCycleDependency for MockDependency {}

impl Drop for MockDependency {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

/// Mock device that tracks created objects without GPU
pub struct MockGraphicsDevice {
    pub config: Config,
    /// Descriptions passed to `create_render_pass`, in call order
    pub render_pass_descs: Mutex<Vec<RenderPassDesc>>,
    /// (width, height, layers, attachment handles) of created framebuffers
    pub framebuffer_descs: Mutex<Vec<(u32, u32, u32, Vec<u64>)>>,
    pub destroyed_render_passes: Arc<AtomicUsize>,
    pub destroyed_framebuffers: Arc<AtomicUsize>,
    pub dropped_command_lists: Arc<AtomicUsize>,
    /// Log shared by every command list this device creates
    pub command_log: Arc<Mutex<MockCommandLog>>,
    /// Signal flags of every fence this device created
    pub fences: Mutex<Vec<Arc<AtomicBool>>>,
    pub submits: AtomicUsize,
    pub fail_render_pass: AtomicBool,
    pub fail_framebuffer: AtomicBool,
    pub fail_submit: AtomicBool,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            render_pass_descs: Mutex::new(Vec::new()),
            framebuffer_descs: Mutex::new(Vec::new()),
            destroyed_render_passes: Arc::new(AtomicUsize::new(0)),
            destroyed_framebuffers: Arc::new(AtomicUsize::new(0)),
            dropped_command_lists: Arc::new(AtomicUsize::new(0)),
            command_log: Arc::new(Mutex::new(MockCommandLog::default())),
            fences: Mutex::new(Vec::new()),
            submits: AtomicUsize::new(0),
            fail_render_pass: AtomicBool::new(false),
            fail_framebuffer: AtomicBool::new(false),
            fail_submit: AtomicBool::new(false),
        }
    }

    /// Signal every fence created so far, as if the GPU finished all work
    pub fn signal_all(&self) {
        for fence in self.fences.lock().unwrap().iter() {
            fence.store(true, Ordering::SeqCst);
        }
    }

    /// Commands recorded into command lists created by this device
    pub fn commands(&self) -> Vec<String> {
        self.command_log.lock().unwrap().commands.clone()
    }

    pub fn destroyed_render_passes(&self) -> usize {
        self.destroyed_render_passes.load(Ordering::SeqCst)
    }

    pub fn destroyed_framebuffers(&self) -> usize {
        self.destroyed_framebuffers.load(Ordering::SeqCst)
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_command_list(&self) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(MockCommandList::with_log(
            self.command_log.clone(),
            self.dropped_command_lists.clone(),
        )))
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>> {
        if self.fail_render_pass.load(Ordering::SeqCst) {
            gpu_bail!("interconnect::mock", "create_render_pass: injected failure");
        }
        self.render_pass_descs.lock().unwrap().push(desc.clone());
        Ok(Arc::new(MockRenderPass::new(
            desc.subpasses.len() as u32,
            self.destroyed_render_passes.clone(),
        )))
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>> {
        if self.fail_framebuffer.load(Ordering::SeqCst) {
            gpu_bail!("interconnect::mock", "create_framebuffer: injected failure");
        }
        let handles: Vec<u64> = desc.attachments.iter().map(|view| view.handle()).collect();
        self.framebuffer_descs.lock().unwrap()
            .push((desc.width, desc.height, desc.layers, handles.clone()));
        Ok(Arc::new(MockFramebuffer {
            width: desc.width,
            height: desc.height,
            layers: desc.layers,
            attachment_handles: handles,
            destroyed: self.destroyed_framebuffers.clone(),
        }))
    }

    fn create_fence(&self) -> Result<Box<dyn Fence>> {
        let fence = MockFence::new();
        self.fences.lock().unwrap().push(fence.signalled.clone());
        Ok(Box::new(fence))
    }

    fn submit(&self, _commands: &dyn CommandList, _cycle: &FenceCycle) -> Result<()> {
        if self.fail_submit.load(Ordering::SeqCst) {
            gpu_bail!("interconnect::mock", "submit: injected failure");
        }
        self.submits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        self.signal_all();
        Ok(())
    }

    fn config(&self) -> &Config {
        &self.config
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
