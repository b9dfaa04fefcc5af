/// Command recorder - replays command graphs into native command lists and
/// submits them

use std::sync::Arc;
use crate::command_nodes::CommandGraph;
use crate::error::Result;
use crate::fence_cycle::{FenceCycle, FenceCycleDependency, FenceCycleTracker};
use crate::graphics_device::{GraphicsDevice, CommandList};
use crate::{gpu_debug, gpu_warn};

/// Submitted command list, kept alive until the GPU finished executing it
struct SubmittedCommands {
    _commands: Box<dyn CommandList>,
}

impl FenceCycleDependency for SubmittedCommands {}

/// Turns command graphs into GPU submissions
///
/// Each `submit()` records a graph into a fresh command list, submits it
/// with a fresh fence cycle and tracks that cycle until it completes.
pub struct CommandRecorder {
    gpu: Arc<dyn GraphicsDevice>,
    tracker: FenceCycleTracker,
}

impl CommandRecorder {
    pub fn new(gpu: Arc<dyn GraphicsDevice>) -> Self {
        Self {
            gpu,
            tracker: FenceCycleTracker::new(),
        }
    }

    pub fn gpu(&self) -> &Arc<dyn GraphicsDevice> {
        &self.gpu
    }

    /// Cycles submitted by this recorder that have not completed yet
    pub fn tracker(&self) -> &FenceCycleTracker {
        &self.tracker
    }

    /// Record `graph` into `cmd` between `begin()` and `end()`
    pub fn record(
        &self,
        graph: &mut CommandGraph,
        cmd: &mut dyn CommandList,
        cycle: &Arc<FenceCycle>,
    ) -> Result<()> {
        cmd.begin()?;
        graph.execute(cmd, cycle, self.gpu.as_ref())?;
        cmd.end()
    }

    /// Record `graph` and submit it to the GPU
    ///
    /// Returns the cycle that completes when the GPU finished the work. If
    /// recording or submission fails, the cycle is cancelled so everything
    /// attached during recording is released right away.
    pub fn submit(&self, graph: &mut CommandGraph) -> Result<Arc<FenceCycle>> {
        let mut commands = self.gpu.create_command_list()?;
        let cycle = FenceCycle::with_timeout(
            self.gpu.create_fence()?,
            self.gpu.config().fence_timeout_ns,
        );

        let submitted = self.record(graph, commands.as_mut(), &cycle)
            .and_then(|_| self.gpu.submit(commands.as_ref(), &cycle));
        if let Err(e) = submitted {
            gpu_warn!("interconnect::CommandRecorder",
                "Dropping command graph of {} nodes: {}", graph.len(), e);
            cycle.cancel()?;
            return Err(e);
        }

        cycle.mark_submitted()?;
        cycle.attach_object(Arc::new(SubmittedCommands { _commands: commands }));
        self.tracker.track(cycle.clone());

        gpu_debug!("interconnect::CommandRecorder",
            "Submitted command graph of {} nodes ({} cycles in flight)",
            graph.len(), self.tracker.in_flight());
        Ok(cycle)
    }
}

#[cfg(test)]
#[path = "command_recorder_tests.rs"]
mod tests;
