/// Graphics device module - native collaborator traits and description types

pub mod graphics_device;
pub mod command_list;
pub mod render_pass;
pub mod frame_buffer;
pub mod texture;

pub use graphics_device::*;
pub use command_list::*;
pub use render_pass::*;
pub use frame_buffer::*;
pub use texture::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
