//! Completion dependency registry
//!
//! Ties the lifetime of GPU-resident objects to the completion of the
//! submission that uses them. An object attached to a `FenceCycle` is
//! dropped exactly once, never before the cycle's fence has signalled
//! (or the cycle was cancelled before ever being submitted).

mod fence_cycle;
mod fence_cycle_tracker;

pub use fence_cycle::{Fence, FenceCycle, FenceCycleDependency};
pub use fence_cycle_tracker::FenceCycleTracker;
