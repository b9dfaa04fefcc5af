/*!
# GPU Interconnect

Command-recording core of a hardware-accelerated graphics emulation layer.

Emulated rendering work is translated into a `CommandGraph`: an ordered list
of command nodes that is replayed, once, into a native command list. Render
passes are described incrementally with a `RenderPassNode` (attachments,
subpasses, clears folded into load operations) and only become native
objects at replay time. Native objects created that way are attached to the
`FenceCycle` of the submission and destroyed once the GPU has finished with
them.

## Architecture

- **GraphicsDevice**: Factory trait for native objects and submission
- **CommandList**: Native command recording trait
- **FenceCycle**: Fence plus the objects it keeps alive
- **RenderPassNode**: Multi-subpass render pass builder
- **CommandGraph**: Append-only command node sequence
- **CommandRecorder**: Records and submits graphs, tracks their cycles

Backend implementations (e.g. `gpu_interconnect_vulkan`) provide concrete
types that implement the device traits.
*/

// Internal modules
mod error;
mod config;
pub mod log;
pub mod graphics_device;
pub mod fence_cycle;
pub mod command_nodes;
pub mod command_recorder;

// Main interconnect namespace module
pub mod interconnect {
    // Error types
    pub use crate::error::{Error, Result};

    // Configuration
    pub use crate::config::{Config, DebugSeverity};

    // Graphics device factory trait
    pub use crate::graphics_device::GraphicsDevice;

    // Completion dependencies
    pub use crate::fence_cycle::{Fence, FenceCycle, FenceCycleDependency, FenceCycleTracker};

    // Command graph
    pub use crate::command_nodes::{
        CommandGraph, CommandNode, RenderPassNode, RenderPassStorage,
        FunctionNode, NextSubpassNode, SubpassFunctionNode, NextSubpassFunctionNode,
        RenderPassEndNode, NodeFunction, SubpassNodeFunction,
    };
    pub use crate::command_recorder::CommandRecorder;

    // Logging sub-module (types only, macros are exported at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Render sub-module with all device-level types
    pub mod render {
        pub use crate::graphics_device::*;
    }
}
