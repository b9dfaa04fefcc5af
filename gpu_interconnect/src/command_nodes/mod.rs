//! Command node graph and render pass builder
//!
//! A `CommandGraph` collects the operations produced while translating
//! emulated GPU work. Render passes are described incrementally through a
//! `RenderPassNode` and only become native objects when the graph is
//! replayed into a command list.

mod command_node;
mod command_graph;
mod render_pass_node;

pub use command_node::{
    CommandNode, FunctionNode, NextSubpassNode, SubpassFunctionNode,
    NextSubpassFunctionNode, RenderPassEndNode, NodeFunction, SubpassNodeFunction,
};
pub(crate) use command_node::RecordState;
pub use command_graph::CommandGraph;
pub use render_pass_node::{RenderPassNode, RenderPassStorage};
