//! Error types for the GPU interconnect
//!
//! This module defines the error type shared by the command node graph,
//! the render pass builder, the fence cycle machinery and the backends.

use std::fmt;

/// Result type for interconnect operations
pub type Result<T> = std::result::Result<T, Error>;

/// Interconnect errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan, mock device, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (unknown attachment, missing depth/stencil, etc.)
    InvalidResource(String),

    /// Initialization failed (device, instance, allocator)
    InitializationFailed(String),

    /// Operation issued in a state where it is not valid
    /// (subpass transition outside a render pass, double submission, etc.)
    InvalidState(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
