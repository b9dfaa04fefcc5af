/// Command graph - ordered sequence of command nodes replayed into one
/// command list

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::fence_cycle::FenceCycle;
use crate::graphics_device::{GraphicsDevice, CommandList, RenderPass, Rect2D};
use crate::command_nodes::{
    CommandNode, RecordState, RenderPassNode, FunctionNode, NextSubpassNode,
    SubpassFunctionNode, NextSubpassFunctionNode, RenderPassEndNode,
};
use crate::gpu_trace;

/// Append-only list of command nodes
///
/// The producer appends nodes while translating emulated work; the graph is
/// then replayed once, in append order, by `execute()`. Render passes stay
/// open for modification (new subpasses, clears) until their end node is
/// appended.
#[derive(Default)]
pub struct CommandGraph {
    nodes: Vec<CommandNode>,
    /// Index of the render pass node not yet followed by an end node
    open_render_pass: Option<usize>,
}

impl CommandGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[CommandNode] {
        &self.nodes
    }

    /// Append `node` and return its index
    pub fn push(&mut self, node: CommandNode) -> usize {
        let index = self.nodes.len();
        match node {
            CommandNode::RenderPass(_) => self.open_render_pass = Some(index),
            CommandNode::RenderPassEnd(_) => self.open_render_pass = None,
            _ => {}
        }
        self.nodes.push(node);
        index
    }

    pub fn add_function<F>(&mut self, function: F) -> usize
    where
        F: FnMut(&mut dyn CommandList, &Arc<FenceCycle>, &dyn GraphicsDevice) -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.push(CommandNode::Function(FunctionNode::new(function)))
    }

    pub fn add_subpass_function<F>(&mut self, function: F) -> usize
    where
        F: FnMut(&mut dyn CommandList, &Arc<FenceCycle>, &dyn GraphicsDevice, &Arc<dyn RenderPass>, u32)
            -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.push(CommandNode::SubpassFunction(SubpassFunctionNode::new(function)))
    }

    pub fn add_next_subpass(&mut self) -> usize {
        self.push(CommandNode::NextSubpass(NextSubpassNode))
    }

    pub fn add_next_subpass_function<F>(&mut self, function: F) -> usize
    where
        F: FnMut(&mut dyn CommandList, &Arc<FenceCycle>, &dyn GraphicsDevice, &Arc<dyn RenderPass>, u32)
            -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.push(CommandNode::NextSubpassFunction(NextSubpassFunctionNode::new(function)))
    }

    /// Append a render pass builder covering `render_area` and return it
    pub fn begin_render_pass(&mut self, render_area: Rect2D) -> &mut RenderPassNode {
        let index = self.push(CommandNode::RenderPass(RenderPassNode::new(render_area)));
        match &mut self.nodes[index] {
            CommandNode::RenderPass(node) => node,
            _ => unreachable!("node {} was just pushed as a render pass", index),
        }
    }

    pub fn end_render_pass(&mut self) -> usize {
        self.push(CommandNode::RenderPassEnd(RenderPassEndNode))
    }

    /// The render pass builder appended last, until its end node is appended
    pub fn render_pass_mut(&mut self) -> Option<&mut RenderPassNode> {
        match self.open_render_pass.and_then(|index| self.nodes.get_mut(index)) {
            Some(CommandNode::RenderPass(node)) => Some(node),
            _ => None,
        }
    }

    /// Check that subpass transitions and render pass boundaries are well
    /// formed without recording anything
    pub fn validate(&self) -> Result<()> {
        // Subpass count of the open render pass, and the current subpass
        let mut open: Option<(usize, usize)> = None;

        for (index, node) in self.nodes.iter().enumerate() {
            let misplaced = || Error::InvalidState(format!(
                "{} node {} is not inside a render pass", node.name(), index));

            match node {
                CommandNode::Function(_) => {}
                CommandNode::RenderPass(render_pass) => {
                    if open.is_some() {
                        return Err(Error::InvalidState(format!(
                            "RenderPass node {} begins while another render pass is open", index)));
                    }
                    if render_pass.subpass_count() == 0 {
                        return Err(Error::InvalidState(format!(
                            "RenderPass node {} has no subpasses", index)));
                    }
                    open = Some((render_pass.subpass_count(), 0));
                }
                CommandNode::NextSubpass(_) | CommandNode::NextSubpassFunction(_) => {
                    let (count, current) = open.as_mut().ok_or_else(misplaced)?;
                    if *current + 1 >= *count {
                        return Err(Error::InvalidState(format!(
                            "{} node {} advances past the last of {} subpasses",
                            node.name(), index, count)));
                    }
                    *current += 1;
                }
                CommandNode::SubpassFunction(_) => {
                    open.ok_or_else(misplaced)?;
                }
                CommandNode::RenderPassEnd(_) => {
                    open.take().ok_or_else(misplaced)?;
                }
            }
        }

        if open.is_some() {
            return Err(Error::InvalidState("Command graph ends inside a render pass".to_string()));
        }
        Ok(())
    }

    /// Replay every node, in order, into `cmd`
    ///
    /// Native objects created during replay are attached to `cycle`. The
    /// graph is validated first; an invalid graph records nothing.
    pub fn execute(
        &mut self,
        cmd: &mut dyn CommandList,
        cycle: &Arc<FenceCycle>,
        gpu: &dyn GraphicsDevice,
    ) -> Result<()> {
        self.validate()?;

        let mut state = RecordState::default();
        for node in &mut self.nodes {
            node.execute(cmd, cycle, gpu, &mut state)?;
        }
        if state.is_in_render_pass() {
            return Err(Error::InvalidState("Command graph ends inside a render pass".to_string()));
        }

        gpu_trace!("interconnect::CommandGraph", "Recorded {} nodes", self.nodes.len());
        Ok(())
    }
}

#[cfg(test)]
#[path = "command_graph_tests.rs"]
mod tests;
