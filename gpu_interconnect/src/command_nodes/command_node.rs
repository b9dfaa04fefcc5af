/// Command nodes - the recordable operations a `CommandGraph` is made of

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::fence_cycle::FenceCycle;
use crate::graphics_device::{GraphicsDevice, CommandList, RenderPass};
use crate::command_nodes::RenderPassNode;

/// Callback recording arbitrary commands outside of subpass bookkeeping
pub type NodeFunction = Box<
    dyn FnMut(&mut dyn CommandList, &Arc<FenceCycle>, &dyn GraphicsDevice) -> Result<()>
        + Send
        + Sync,
>;

/// Callback recording commands inside a render pass
///
/// Receives the active render pass and the index of the subpass it runs in.
pub type SubpassNodeFunction = Box<
    dyn FnMut(&mut dyn CommandList, &Arc<FenceCycle>, &dyn GraphicsDevice, &Arc<dyn RenderPass>, u32)
        -> Result<()>
        + Send
        + Sync,
>;

/// Runs a callback
pub struct FunctionNode {
    function: NodeFunction,
}

impl FunctionNode {
    pub fn new<F>(function: F) -> Self
    where
        F: FnMut(&mut dyn CommandList, &Arc<FenceCycle>, &dyn GraphicsDevice) -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        Self { function: Box::new(function) }
    }

    pub fn execute(
        &mut self,
        cmd: &mut dyn CommandList,
        cycle: &Arc<FenceCycle>,
        gpu: &dyn GraphicsDevice,
    ) -> Result<()> {
        (self.function)(cmd, cycle, gpu)
    }
}

/// Advances the active render pass to its next subpass
#[derive(Debug, Default, Clone, Copy)]
pub struct NextSubpassNode;

impl NextSubpassNode {
    pub fn execute(&mut self, cmd: &mut dyn CommandList) -> Result<()> {
        cmd.next_subpass()
    }
}

/// Runs a callback in the current subpass of the active render pass
pub struct SubpassFunctionNode {
    function: SubpassNodeFunction,
}

impl SubpassFunctionNode {
    pub fn new<F>(function: F) -> Self
    where
        F: FnMut(&mut dyn CommandList, &Arc<FenceCycle>, &dyn GraphicsDevice, &Arc<dyn RenderPass>, u32)
            -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        Self { function: Box::new(function) }
    }

    pub fn execute(
        &mut self,
        cmd: &mut dyn CommandList,
        cycle: &Arc<FenceCycle>,
        gpu: &dyn GraphicsDevice,
        render_pass: &Arc<dyn RenderPass>,
        subpass_index: u32,
    ) -> Result<()> {
        (self.function)(cmd, cycle, gpu, render_pass, subpass_index)
    }
}

/// Advances to the next subpass, then runs a callback with the new index
pub struct NextSubpassFunctionNode {
    function: SubpassNodeFunction,
}

impl NextSubpassFunctionNode {
    pub fn new<F>(function: F) -> Self
    where
        F: FnMut(&mut dyn CommandList, &Arc<FenceCycle>, &dyn GraphicsDevice, &Arc<dyn RenderPass>, u32)
            -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        Self { function: Box::new(function) }
    }

    /// `subpass_index` is the index of the subpass being advanced to
    pub fn execute(
        &mut self,
        cmd: &mut dyn CommandList,
        cycle: &Arc<FenceCycle>,
        gpu: &dyn GraphicsDevice,
        render_pass: &Arc<dyn RenderPass>,
        subpass_index: u32,
    ) -> Result<()> {
        cmd.next_subpass()?;
        (self.function)(cmd, cycle, gpu, render_pass, subpass_index)
    }
}

/// Ends the active render pass
#[derive(Debug, Default, Clone, Copy)]
pub struct RenderPassEndNode;

impl RenderPassEndNode {
    pub fn execute(&mut self, cmd: &mut dyn CommandList) -> Result<()> {
        cmd.end_render_pass()
    }
}

/// Render pass state carried from node to node while a graph is replayed
#[derive(Default)]
pub(crate) struct RecordState {
    render_pass: Option<Arc<dyn RenderPass>>,
    subpass_index: u32,
    subpass_count: u32,
}

impl RecordState {
    pub(crate) fn is_in_render_pass(&self) -> bool {
        self.render_pass.is_some()
    }

    fn active_render_pass(&self, node: &str) -> Result<Arc<dyn RenderPass>> {
        self.render_pass.clone().ok_or_else(|| {
            Error::InvalidState(format!("{} outside of a render pass", node))
        })
    }

    fn next_subpass_index(&self, node: &str) -> Result<u32> {
        let next = self.subpass_index + 1;
        if next >= self.subpass_count {
            return Err(Error::InvalidState(format!(
                "{} past the last subpass (render pass has {} subpasses)",
                node, self.subpass_count)));
        }
        Ok(next)
    }
}

/// A recordable operation
///
/// Nodes are replayed exactly once, in the order they were appended.
pub enum CommandNode {
    Function(FunctionNode),
    RenderPass(RenderPassNode),
    NextSubpass(NextSubpassNode),
    SubpassFunction(SubpassFunctionNode),
    NextSubpassFunction(NextSubpassFunctionNode),
    RenderPassEnd(RenderPassEndNode),
}

impl CommandNode {
    /// Short name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            CommandNode::Function(_) => "Function",
            CommandNode::RenderPass(_) => "RenderPass",
            CommandNode::NextSubpass(_) => "NextSubpass",
            CommandNode::SubpassFunction(_) => "SubpassFunction",
            CommandNode::NextSubpassFunction(_) => "NextSubpassFunction",
            CommandNode::RenderPassEnd(_) => "RenderPassEnd",
        }
    }

    /// Record this node into `cmd`, updating the render pass state
    pub(crate) fn execute(
        &mut self,
        cmd: &mut dyn CommandList,
        cycle: &Arc<FenceCycle>,
        gpu: &dyn GraphicsDevice,
        state: &mut RecordState,
    ) -> Result<()> {
        match self {
            CommandNode::Function(node) => node.execute(cmd, cycle, gpu),
            CommandNode::RenderPass(node) => {
                if state.is_in_render_pass() {
                    return Err(Error::InvalidState(
                        "RenderPass begun while another render pass is active".to_string()));
                }
                let render_pass = node.execute(cmd, cycle, gpu)?;
                *state = RecordState {
                    subpass_count: render_pass.subpass_count(),
                    render_pass: Some(render_pass),
                    subpass_index: 0,
                };
                Ok(())
            }
            CommandNode::NextSubpass(node) => {
                state.active_render_pass("NextSubpass")?;
                let next = state.next_subpass_index("NextSubpass")?;
                node.execute(cmd)?;
                state.subpass_index = next;
                Ok(())
            }
            CommandNode::SubpassFunction(node) => {
                let render_pass = state.active_render_pass("SubpassFunction")?;
                node.execute(cmd, cycle, gpu, &render_pass, state.subpass_index)
            }
            CommandNode::NextSubpassFunction(node) => {
                let render_pass = state.active_render_pass("NextSubpassFunction")?;
                let next = state.next_subpass_index("NextSubpassFunction")?;
                state.subpass_index = next;
                node.execute(cmd, cycle, gpu, &render_pass, next)
            }
            CommandNode::RenderPassEnd(node) => {
                state.active_render_pass("RenderPassEnd")?;
                node.execute(cmd)?;
                *state = RecordState::default();
                Ok(())
            }
        }
    }
}
