/// Fence cycle tracker - retires in-flight submissions as their fences signal

use std::sync::{Arc, Mutex, PoisonError};
use crate::error::Result;
use crate::fence_cycle::FenceCycle;
use crate::{gpu_debug, gpu_error};

/// Holds every submitted cycle until it completes
///
/// `poll()` is meant to be called regularly (e.g. once per emulated frame)
/// from any thread; completed cycles release their dependencies and are
/// dropped from the tracker.
pub struct FenceCycleTracker {
    in_flight: Mutex<Vec<Arc<FenceCycle>>>,
}

impl FenceCycleTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(Vec::new()),
        }
    }

    /// Start tracking a submitted cycle
    pub fn track(&self, cycle: Arc<FenceCycle>) {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).push(cycle);
    }

    /// Number of cycles still in flight
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Retire every cycle whose fence has signalled
    ///
    /// Returns the number of cycles retired.
    pub fn poll(&self) -> Result<usize> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let mut retired = 0;
        let mut index = 0;
        while index < in_flight.len() {
            if in_flight[index].poll()? {
                in_flight.remove(index);
                retired += 1;
            } else {
                index += 1;
            }
        }

        if retired > 0 {
            gpu_debug!("interconnect::FenceCycleTracker",
                "Retired {} cycles, {} still in flight", retired, in_flight.len());
        }
        Ok(retired)
    }

    /// Block until every tracked cycle completed
    ///
    /// On a failed wait, that cycle and the ones not waited on yet stay in
    /// flight.
    pub fn wait_all(&self, timeout_ns: u64) -> Result<()> {
        let mut cycles = std::mem::take(&mut *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner))
            .into_iter();
        while let Some(cycle) = cycles.next() {
            if let Err(e) = cycle.wait(timeout_ns) {
                let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
                let tracked_meanwhile = std::mem::take(&mut *in_flight);
                in_flight.push(cycle);
                in_flight.extend(cycles);
                in_flight.extend(tracked_meanwhile);
                gpu_error!("interconnect::FenceCycleTracker",
                    "Wait failed, {} cycles still in flight: {}", in_flight.len(), e);
                return Err(e);
            }
        }
        Ok(())
    }
}

impl Default for FenceCycleTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "fence_cycle_tracker_tests.rs"]
mod tests;
