//! Integration tests for interconnect logging
//!
//! These tests check severity filtering, the error-building macros and the
//! entries emitted by fence cycles and render pass builders.
//! No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use gpu_interconnect::interconnect::log::{Logger, LogEntry, LogSeverity};
use gpu_interconnect::interconnect::render::{
    ImageLayout, Rect2D, SampleCount, TextureFormat, TextureView,
};
use gpu_interconnect::interconnect::{
    Error, Fence, FenceCycle, FenceCycleDependency, FenceCycleTracker, RenderPassNode, Result,
};
use gpu_interconnect::log::{log, min_severity, reset_logger, set_logger, set_min_severity};
use gpu_interconnect::{gpu_bail, gpu_err};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST LOGGER / FENCE / VIEW
// ============================================================================

/// Captured entry, without the timestamp
#[derive(Debug, Clone, PartialEq)]
struct Captured {
    severity: LogSeverity,
    source: String,
    message: String,
    has_location: bool,
}

struct TestLogger {
    entries: Arc<Mutex<Vec<Captured>>>,
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(Captured {
            severity: entry.severity,
            source: entry.source.clone(),
            message: entry.message.clone(),
            has_location: entry.file.is_some() && entry.line.is_some(),
        });
    }
}

fn capture() -> Arc<Mutex<Vec<Captured>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    set_logger(TestLogger { entries: entries.clone() });
    entries
}

fn from_source(entries: &Arc<Mutex<Vec<Captured>>>, source: &str) -> Vec<Captured> {
    entries.lock().unwrap().iter().filter(|e| e.source == source).cloned().collect()
}

/// Fence whose wait either signals it or fails
struct HostFence {
    signalled: Arc<AtomicBool>,
    fail_wait: bool,
}

impl Fence for HostFence {
    fn is_signalled(&self) -> Result<bool> {
        Ok(self.signalled.load(Ordering::SeqCst))
    }

    fn wait(&self, _timeout_ns: u64) -> Result<()> {
        if self.fail_wait {
            return Err(Error::BackendError("device lost".to_string()));
        }
        self.signalled.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct CountedObject {
    destroyed: Arc<AtomicUsize>,
}

impl FenceCycleDependency for CountedObject {}

impl Drop for CountedObject {
    fn drop(&mut self) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

struct HostView {
    handle: u64,
}

impl TextureView for HostView {
    fn handle(&self) -> u64 { self.handle }
    fn format(&self) -> TextureFormat { TextureFormat::R8G8B8A8_UNORM }
    fn samples(&self) -> SampleCount { SampleCount::S1 }
    fn layout(&self) -> ImageLayout { ImageLayout::ColorAttachment }
    fn width(&self) -> u32 { 64 }
    fn height(&self) -> u32 { 64 }
}

fn submitted_cycle(fail_wait: bool, destroyed: &Arc<AtomicUsize>) -> (Arc<FenceCycle>, Arc<AtomicBool>) {
    let signalled = Arc::new(AtomicBool::new(false));
    let cycle = FenceCycle::new(Box::new(HostFence { signalled: signalled.clone(), fail_wait }));
    cycle.attach_object(Arc::new(CountedObject { destroyed: destroyed.clone() }));
    cycle.mark_submitted().unwrap();
    (cycle, signalled)
}

// ============================================================================
// FILTERING AND MACROS
// ============================================================================

#[test]
#[serial]
fn test_integration_min_severity_drops_lower_entries() {
    let entries = capture();
    set_min_severity(LogSeverity::Warn);
    assert_eq!(min_severity(), LogSeverity::Warn);

    log(LogSeverity::Debug, "interconnect::test", "dropped".to_string());
    log(LogSeverity::Info, "interconnect::test", "dropped".to_string());
    log(LogSeverity::Warn, "interconnect::test", "kept warning".to_string());
    log(LogSeverity::Error, "interconnect::test", "kept error".to_string());

    let messages: Vec<String> = entries.lock().unwrap().iter().map(|e| e.message.clone()).collect();
    assert_eq!(messages, vec!["kept warning", "kept error"]);

    set_min_severity(LogSeverity::Trace);
    reset_logger();
}

#[test]
#[serial]
fn test_integration_gpu_bail_returns_logged_backend_error() {
    fn create_framebuffer(width: u32) -> Result<u32> {
        if width == 0 {
            gpu_bail!("interconnect::test", "Framebuffer width {} is invalid", width);
        }
        Ok(width)
    }

    let entries = capture();

    assert_eq!(create_framebuffer(8).unwrap(), 8);
    match create_framebuffer(0) {
        Err(Error::BackendError(message)) => assert_eq!(message, "Framebuffer width 0 is invalid"),
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }

    let error = gpu_err!("interconnect::test", "Submit failed on queue {}", 2);
    assert!(matches!(error, Error::BackendError(ref m) if m == "Submit failed on queue 2"));

    let captured = entries.lock().unwrap().clone();
    assert_eq!(captured.len(), 2);
    assert!(captured.iter().all(|e| e.severity == LogSeverity::Error && e.has_location));
    assert_eq!(captured[0].message, "Framebuffer width 0 is invalid");
    assert_eq!(captured[1].message, "Submit failed on queue 2");

    reset_logger();
}

// ============================================================================
// COMPONENT SOURCES
// ============================================================================

#[test]
#[serial]
fn test_integration_fence_cycle_release_is_traced() {
    let entries = capture();
    let destroyed = Arc::new(AtomicUsize::new(0));
    let (cycle, signalled) = submitted_cycle(false, &destroyed);

    signalled.store(true, Ordering::SeqCst);
    assert!(cycle.poll().unwrap());

    let released = from_source(&entries, "interconnect::FenceCycle");
    assert_eq!(released.len(), 1);
    assert_eq!(released[0].severity, LogSeverity::Trace);
    assert_eq!(released[0].message, "Releasing 1 dependencies");

    reset_logger();
}

#[test]
#[serial]
fn test_integration_failed_drop_wait_logs_leak() {
    let entries = capture();
    let destroyed = Arc::new(AtomicUsize::new(0));
    let (cycle, _) = submitted_cycle(true, &destroyed);

    drop(cycle);

    assert_eq!(destroyed.load(Ordering::SeqCst), 0);
    let logged = from_source(&entries, "interconnect::FenceCycle");
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].severity, LogSeverity::Error);
    assert!(logged[0].has_location);
    assert!(logged[0].message.contains("leaking 1 dependencies"));

    reset_logger();
}

#[test]
#[serial]
fn test_integration_tracker_logs_retired_cycles() {
    let entries = capture();
    let destroyed = Arc::new(AtomicUsize::new(0));
    let tracker = FenceCycleTracker::new();
    let (first, first_signal) = submitted_cycle(false, &destroyed);
    let (second, _) = submitted_cycle(false, &destroyed);
    tracker.track(first);
    tracker.track(second);

    assert_eq!(tracker.poll().unwrap(), 0);
    assert!(from_source(&entries, "interconnect::FenceCycleTracker").is_empty());

    first_signal.store(true, Ordering::SeqCst);
    assert_eq!(tracker.poll().unwrap(), 1);

    let logged = from_source(&entries, "interconnect::FenceCycleTracker");
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].severity, LogSeverity::Debug);
    assert_eq!(logged[0].message, "Retired 1 cycles, 1 still in flight");

    tracker.wait_all(u64::MAX).unwrap();
    reset_logger();
}

#[test]
#[serial]
fn test_integration_render_pass_node_traces_subpasses() {
    let entries = capture();
    let color: Arc<dyn TextureView> = Arc::new(HostView { handle: 1 });
    let other: Arc<dyn TextureView> = Arc::new(HostView { handle: 2 });
    let mut node = RenderPassNode::new(Rect2D::new(0, 0, 64, 64));

    node.add_subpass(&[], &[color.clone()], None).unwrap();
    node.add_subpass(&[color], &[other], None).unwrap();

    let logged = from_source(&entries, "interconnect::RenderPassNode");
    let subpasses: Vec<&Captured> = logged.iter()
        .filter(|e| e.message.starts_with("Added subpass"))
        .collect();
    assert_eq!(subpasses.len(), 2);
    assert!(subpasses.iter().all(|e| e.severity == LogSeverity::Trace));
    assert_eq!(subpasses[0].message,
        "Added subpass 0 (0 inputs, 1 colors, depth/stencil: false, 0 preserved)");
    assert_eq!(subpasses[1].message,
        "Added subpass 1 (1 inputs, 1 colors, depth/stencil: false, 0 preserved)");

    reset_logger();
}
