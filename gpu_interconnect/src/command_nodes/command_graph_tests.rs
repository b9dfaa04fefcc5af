/// Unit tests for CommandGraph and command nodes

use super::*;
use crate::graphics_device::mock_graphics_device::{
    MockGraphicsDevice, MockCommandList, MockFence, MockTextureView,
};
use std::sync::atomic::{AtomicUsize, Ordering};

fn cycle() -> Arc<FenceCycle> {
    FenceCycle::new(Box::new(MockFence::new()))
}

fn area() -> Rect2D {
    Rect2D::new(0, 0, 64, 64)
}

/// Graph with one render pass of `subpasses` single-color subpasses
fn graph_with_render_pass(subpasses: u64) -> CommandGraph {
    let mut graph = CommandGraph::new();
    let render_pass = graph.begin_render_pass(area());
    for handle in 0..subpasses {
        render_pass.add_subpass(&[], &[MockTextureView::color(handle + 1)], None).unwrap();
    }
    graph
}

fn replay(graph: &mut CommandGraph) -> (Result<()>, Vec<String>) {
    let gpu = MockGraphicsDevice::new();
    let mut cmd = MockCommandList::new();
    let result = graph.execute(&mut cmd, &cycle(), &gpu);
    (result, cmd.commands())
}

// ============================================================================
// Producer API
// ============================================================================

#[test]
fn test_push_returns_indices_in_order() {
    let mut graph = CommandGraph::new();
    assert!(graph.is_empty());
    assert_eq!(graph.add_function(|_, _, _| Ok(())), 0);
    assert_eq!(graph.add_next_subpass(), 1);
    assert_eq!(graph.end_render_pass(), 2);
    assert_eq!(graph.len(), 3);
    assert_eq!(graph.nodes()[1].name(), "NextSubpass");
}

#[test]
fn test_render_pass_mut_tracks_open_pass() {
    let mut graph = CommandGraph::new();
    assert!(graph.render_pass_mut().is_none());

    graph.begin_render_pass(area());
    graph.add_function(|_, _, _| Ok(()));
    let render_pass = graph.render_pass_mut().unwrap();
    render_pass.add_subpass(&[], &[MockTextureView::color(1)], None).unwrap();
    assert_eq!(render_pass.subpass_count(), 1);

    graph.end_render_pass();
    assert!(graph.render_pass_mut().is_none());
}

#[test]
fn test_graph_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<CommandGraph>();
}

// ============================================================================
// Replay
// ============================================================================

#[test]
fn test_replay_follows_append_order() {
    let mut graph = CommandGraph::new();
    graph.add_function(|cmd, _, _| cmd.draw(1, 0));
    graph.add_function(|cmd, _, _| cmd.draw(2, 0));
    let (result, commands) = replay(&mut graph);
    result.unwrap();
    assert_eq!(commands, vec!["draw(1, 0)", "draw(2, 0)"]);

    let mut reordered = CommandGraph::new();
    reordered.add_function(|cmd, _, _| cmd.draw(2, 0));
    reordered.add_function(|cmd, _, _| cmd.draw(1, 0));
    let (result, commands) = replay(&mut reordered);
    result.unwrap();
    assert_eq!(commands, vec!["draw(2, 0)", "draw(1, 0)"]);
}

#[test]
fn test_replay_render_pass_with_subpasses() {
    let mut graph = graph_with_render_pass(2);
    graph.add_subpass_function(|cmd, _, _, render_pass, index| {
        assert_eq!(render_pass.subpass_count(), 2);
        cmd.draw(10, index)
    });
    graph.add_next_subpass_function(|cmd, _, _, _, index| cmd.draw(20, index));
    graph.end_render_pass();

    let (result, commands) = replay(&mut graph);
    result.unwrap();
    assert_eq!(commands, vec![
        "begin_render_pass",
        "draw(10, 0)",
        "next_subpass",
        "draw(20, 1)",
        "end_render_pass",
    ]);
}

#[test]
fn test_replay_plain_next_subpass() {
    let mut graph = graph_with_render_pass(3);
    graph.add_next_subpass();
    graph.add_next_subpass();
    graph.add_subpass_function(|cmd, _, _, _, index| cmd.draw(0, index));
    graph.end_render_pass();

    let (result, commands) = replay(&mut graph);
    result.unwrap();
    assert_eq!(commands, vec![
        "begin_render_pass", "next_subpass", "next_subpass", "draw(0, 2)", "end_render_pass",
    ]);
}

#[test]
fn test_callbacks_receive_cycle_and_device() {
    let released = Arc::new(AtomicUsize::new(0));
    let counter = released.clone();
    let mut graph = CommandGraph::new();
    graph.add_function(move |_, cycle, gpu| {
        assert_eq!(gpu.config().fence_timeout_ns, u64::MAX);
        cycle.attach_object(crate::graphics_device::mock_graphics_device::MockDependency::new(counter.clone()));
        Ok(())
    });

    let gpu = MockGraphicsDevice::new();
    let mut cmd = MockCommandList::new();
    let cycle = cycle();
    graph.execute(&mut cmd, &cycle, &gpu).unwrap();
    assert_eq!(cycle.dependency_count(), 1);

    drop(cycle);
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_callback_error_aborts_replay() {
    let mut graph = CommandGraph::new();
    graph.add_function(|cmd, _, _| cmd.draw(1, 0));
    graph.add_function(|_, _, _| Err(Error::BackendError("device lost".to_string())));
    graph.add_function(|cmd, _, _| cmd.draw(2, 0));

    let (result, commands) = replay(&mut graph);
    assert!(matches!(result, Err(Error::BackendError(_))));
    assert_eq!(commands, vec!["draw(1, 0)"]);
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_next_subpass_outside_render_pass_is_invalid() {
    let mut graph = CommandGraph::new();
    graph.add_next_subpass();

    let (result, commands) = replay(&mut graph);
    assert!(matches!(result, Err(Error::InvalidState(_))));
    assert!(commands.is_empty());
}

#[test]
fn test_subpass_function_outside_render_pass_is_invalid() {
    let mut graph = CommandGraph::new();
    graph.add_subpass_function(|_, _, _, _, _| Ok(()));
    assert!(matches!(graph.validate(), Err(Error::InvalidState(_))));
}

#[test]
fn test_advancing_past_last_subpass_is_invalid() {
    let mut graph = graph_with_render_pass(2);
    graph.add_next_subpass();
    graph.add_next_subpass_function(|_, _, _, _, _| Ok(()));
    graph.end_render_pass();

    let (result, commands) = replay(&mut graph);
    assert!(matches!(result, Err(Error::InvalidState(_))));
    assert!(commands.is_empty());
}

#[test]
fn test_end_without_render_pass_is_invalid() {
    let mut graph = CommandGraph::new();
    graph.end_render_pass();
    assert!(matches!(graph.validate(), Err(Error::InvalidState(_))));
}

#[test]
fn test_nested_render_pass_is_invalid() {
    let mut graph = graph_with_render_pass(1);
    graph.begin_render_pass(area())
        .add_subpass(&[], &[MockTextureView::color(99)], None).unwrap();
    graph.end_render_pass();
    graph.end_render_pass();
    assert!(matches!(graph.validate(), Err(Error::InvalidState(_))));
}

#[test]
fn test_unterminated_render_pass_is_invalid() {
    let mut graph = graph_with_render_pass(1);
    let (result, commands) = replay(&mut graph);
    assert!(matches!(result, Err(Error::InvalidState(_))));
    assert!(commands.is_empty());
}

#[test]
fn test_render_pass_without_subpasses_is_invalid() {
    let mut graph = CommandGraph::new();
    graph.begin_render_pass(area());
    graph.end_render_pass();
    assert!(matches!(graph.validate(), Err(Error::InvalidState(_))));
}

#[test]
fn test_valid_graph_passes_validation() {
    let mut graph = graph_with_render_pass(2);
    graph.add_next_subpass();
    graph.end_render_pass();
    graph.add_function(|_, _, _| Ok(()));
    assert!(graph.validate().is_ok());
}
