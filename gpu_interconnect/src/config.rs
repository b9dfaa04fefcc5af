//! Interconnect configuration
//!
//! Settings consumed by graphics device backends at creation time and by
//! fence cycles when they have to block on unfinished GPU work.

use crate::error::{Error, Result};

/// Severity filter for validation layer messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    /// Only report errors
    ErrorsOnly,
    /// Report errors and warnings
    ErrorsAndWarnings,
    /// Report everything (info and verbose included)
    All,
}

/// Interconnect / device configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Application name reported to the driver
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Validation message filter
    pub debug_severity: DebugSeverity,
    /// Timeout used when a fence cycle has to wait for its fence on drop
    pub fence_timeout_ns: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "GPU Interconnect".to_string(),
            app_version: (1, 0, 0),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            fence_timeout_ns: u64::MAX,
        }
    }
}

impl Config {
    /// Check the configuration before a device is created from it
    pub fn validate(&self) -> Result<()> {
        if self.app_name.is_empty() {
            return Err(Error::InitializationFailed("Config::app_name must not be empty".to_string()));
        }
        if self.fence_timeout_ns == 0 {
            return Err(Error::InitializationFailed("Config::fence_timeout_ns must be non-zero".to_string()));
        }
        Ok(())
    }
}
