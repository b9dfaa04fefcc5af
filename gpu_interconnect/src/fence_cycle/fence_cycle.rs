/// Fence cycle - one submission's fence plus the objects that must outlive it

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use crate::error::{Error, Result};
use crate::{gpu_error, gpu_trace};

/// Native fence signalled by the GPU when a submission completes
pub trait Fence: Send + Sync {
    /// Non-blocking check of the fence state
    fn is_signalled(&self) -> Result<bool>;

    /// Block until the fence is signalled or `timeout_ns` elapses
    fn wait(&self, timeout_ns: u64) -> Result<()>;
}

/// Marker for objects whose destruction is deferred by a `FenceCycle`
///
/// The object's `Drop` is its release action.
pub trait FenceCycleDependency: Send + Sync {}

/// A fence and the dependencies released when it signals
///
/// Shared (via `Arc`) between the thread that records and submits work and
/// whatever polls for completion. Dependencies are released exactly once,
/// by whichever of `poll()`, `wait()`, `cancel()` or `Drop` observes
/// completion first. A cycle dropped in flight whose fence wait fails leaks
/// its dependencies instead.
pub struct FenceCycle {
    fence: Box<dyn Fence>,
    /// Timeout used when the cycle is dropped while still in flight
    timeout_ns: u64,
    /// Set once the fence has been handed to the GPU
    submitted: AtomicBool,
    /// Set once dependencies have been released (signalled or cancelled)
    released: AtomicBool,
    dependencies: Mutex<Vec<Arc<dyn FenceCycleDependency>>>,
}

impl FenceCycle {
    /// Create a cycle around an unsignalled fence
    pub fn new(fence: Box<dyn Fence>) -> Arc<Self> {
        Self::with_timeout(fence, u64::MAX)
    }

    /// Create a cycle which waits at most `timeout_ns` when dropped in flight
    pub fn with_timeout(fence: Box<dyn Fence>, timeout_ns: u64) -> Arc<Self> {
        Arc::new(Self {
            fence,
            timeout_ns,
            submitted: AtomicBool::new(false),
            released: AtomicBool::new(false),
            dependencies: Mutex::new(Vec::new()),
        })
    }

    /// The native fence
    pub fn fence(&self) -> &dyn Fence {
        self.fence.as_ref()
    }

    /// Register `dependency` so it is dropped only after this cycle completes
    ///
    /// If the cycle already completed, the dependency is dropped immediately.
    pub fn attach_object(&self, dependency: Arc<dyn FenceCycleDependency>) {
        let mut dependencies = self.dependencies.lock().unwrap_or_else(PoisonError::into_inner);
        if self.released.load(Ordering::Acquire) {
            drop(dependencies);
            drop(dependency);
            return;
        }
        dependencies.push(dependency);
    }

    /// Number of dependencies still held
    pub fn dependency_count(&self) -> usize {
        self.dependencies.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Record that the fence was handed to the GPU
    pub fn mark_submitted(&self) -> Result<()> {
        if self.released.load(Ordering::Acquire) {
            return Err(Error::InvalidState("FenceCycle was already released".to_string()));
        }
        if self.submitted.swap(true, Ordering::AcqRel) {
            return Err(Error::InvalidState("FenceCycle submitted twice".to_string()));
        }
        Ok(())
    }

    /// True once the fence was handed to the GPU
    pub fn is_submitted(&self) -> bool {
        self.submitted.load(Ordering::Acquire)
    }

    /// True once dependencies were released
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Check the fence, releasing dependencies if it signalled
    ///
    /// Returns true once the cycle is complete. A cycle that was never
    /// submitted is never complete.
    pub fn poll(&self) -> Result<bool> {
        if self.is_released() {
            return Ok(true);
        }
        if !self.is_submitted() {
            return Ok(false);
        }
        if self.fence.is_signalled()? {
            self.release();
            return Ok(true);
        }
        Ok(false)
    }

    /// Block until the fence signals, then release dependencies
    pub fn wait(&self, timeout_ns: u64) -> Result<()> {
        if self.is_released() {
            return Ok(());
        }
        if !self.is_submitted() {
            return Err(Error::InvalidState("Waiting on a FenceCycle that was never submitted".to_string()));
        }
        self.fence.wait(timeout_ns)?;
        self.release();
        Ok(())
    }

    /// Release dependencies of a cycle whose work will never be submitted
    pub fn cancel(&self) -> Result<()> {
        if self.is_submitted() && !self.is_released() {
            return Err(Error::InvalidState("Cannot cancel a FenceCycle that is in flight".to_string()));
        }
        self.release();
        Ok(())
    }

    fn release(&self) {
        let released = {
            let mut dependencies = self.dependencies.lock().unwrap_or_else(PoisonError::into_inner);
            self.released.store(true, Ordering::Release);
            std::mem::take(&mut *dependencies)
        };

        if !released.is_empty() {
            gpu_trace!("interconnect::FenceCycle", "Releasing {} dependencies", released.len());
        }
        // Dropped outside the lock, release actions may take other locks
        drop(released);
    }

    /// Give up on dependencies the GPU may still be using
    ///
    /// Their release actions never run.
    fn leak(&self, cause: &Error) {
        let leaked = {
            let mut dependencies = self.dependencies.lock().unwrap_or_else(PoisonError::into_inner);
            self.released.store(true, Ordering::Release);
            std::mem::take(&mut *dependencies)
        };

        gpu_error!("interconnect::FenceCycle",
            "Failed to wait for in-flight fence, leaking {} dependencies: {}", leaked.len(), cause);
        std::mem::forget(leaked);
    }
}

impl Drop for FenceCycle {
    fn drop(&mut self) {
        if self.is_released() {
            return;
        }
        if self.is_submitted() {
            if let Err(e) = self.fence.wait(self.timeout_ns) {
                self.leak(&e);
                return;
            }
        }
        self.release();
    }
}

#[cfg(test)]
#[path = "fence_cycle_tests.rs"]
mod tests;
