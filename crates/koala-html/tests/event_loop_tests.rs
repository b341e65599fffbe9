//! Integration tests for the event loop and completion barriers.

use koala_dom::DocumentId;
use koala_html::{CompletionBarrier, EventLoop, EventLoopError, EventLoopHost, TaskSource};

/// Minimal host: an event loop plus a log of what ran.
#[derive(Default)]
struct Host {
    event_loop: EventLoop<Host>,
    log: Vec<&'static str>,
}

impl EventLoopHost for Host {
    fn event_loop(&mut self) -> &mut EventLoop<Self> {
        &mut self.event_loop
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_tasks_run_in_queue_order() {
    init_logging();
    let mut host = Host::default();
    let _ = host
        .event_loop
        .queue_task(TaskSource::DomManipulation, None, |host: &mut Host| {
            host.log.push("first");
        });
    let _ = host
        .event_loop
        .queue_task(TaskSource::Networking, None, |host: &mut Host| {
            host.log.push("second");
        });

    assert_eq!(EventLoop::run_until_idle(&mut host), 2);
    assert_eq!(host.log, ["first", "second"]);
    assert!(host.event_loop.is_empty());
}

#[test]
fn test_task_can_queue_more_tasks() {
    let mut host = Host::default();
    let _ = host
        .event_loop
        .queue_task(TaskSource::DomManipulation, None, |host: &mut Host| {
            host.log.push("outer");
            let _ = host
                .event_loop
                .queue_task(TaskSource::DomManipulation, None, |host: &mut Host| {
                    host.log.push("inner");
                });
        });

    assert_eq!(EventLoop::run_until_idle(&mut host), 2);
    assert_eq!(host.log, ["outer", "inner"]);
}

#[test]
fn test_spin_until_stops_when_condition_holds() {
    let mut host = Host::default();
    for name in ["a", "b", "c"] {
        let _ = host
            .event_loop
            .queue_task(TaskSource::DomManipulation, None, move |host: &mut Host| {
                host.log.push(name);
            });
    }

    let ran = EventLoop::spin_until(&mut host, |host| host.log.len() == 2);
    assert_eq!(ran, Ok(2));
    assert_eq!(host.event_loop.len(), 1);
}

#[test]
fn test_spin_until_already_true_runs_nothing() {
    let mut host = Host::default();
    let _ = host
        .event_loop
        .queue_task(TaskSource::DomManipulation, None, |host: &mut Host| {
            host.log.push("never");
        });

    assert_eq!(EventLoop::spin_until(&mut host, |_| true), Ok(0));
    assert!(host.log.is_empty());
}

#[test]
fn test_spin_until_reports_stall() {
    init_logging();
    let mut host = Host::default();
    let result = EventLoop::spin_until(&mut host, |host| !host.log.is_empty());
    assert_eq!(result, Err(EventLoopError::Stalled { pending: 0 }));
}

#[test]
fn test_spin_with_source_leaves_other_sources_queued() {
    let mut host = Host::default();
    let _ = host
        .event_loop
        .queue_task(TaskSource::DomManipulation, None, |host: &mut Host| {
            host.log.push("dom");
        });
    let _ = host
        .event_loop
        .queue_task(TaskSource::NavigationAndTraversal, None, |host: &mut Host| {
            host.log.push("nav");
        });

    let result = EventLoop::spin_processing_tasks_with_source_until(
        &mut host,
        TaskSource::NavigationAndTraversal,
        |host| host.log.contains(&"nav"),
    );
    assert_eq!(result, Ok(1));
    assert_eq!(host.log, ["nav"]);
    assert_eq!(host.event_loop.len(), 1);

    let stalled = EventLoop::spin_processing_tasks_with_source_until(
        &mut host,
        TaskSource::NavigationAndTraversal,
        |host| host.log.len() == 2,
    );
    assert_eq!(stalled, Err(EventLoopError::Stalled { pending: 1 }));
}

#[test]
fn test_barrier_released_after_every_signal() {
    let mut host = Host::default();
    let barrier = CompletionBarrier::new(3);
    for _ in 0..3 {
        let signal = barrier.signal();
        let _ = host
            .event_loop
            .queue_task(TaskSource::NavigationAndTraversal, None, move |host: &mut Host| {
                host.log.push("child");
                signal.complete();
            });
    }

    assert!(!barrier.is_released());
    let result = EventLoop::spin_until(&mut host, |_| barrier.is_released());
    assert_eq!(result, Ok(3));
    assert_eq!(barrier.completed(), 3);
    assert_eq!(barrier.expected(), 3);
}

#[test]
fn test_empty_barrier_is_released() {
    let barrier = CompletionBarrier::new(0);
    assert!(barrier.is_released());
}

#[test]
fn test_removed_task_still_releases_barrier() {
    let mut host = Host::default();
    let doc = DocumentId(7);
    let barrier = CompletionBarrier::new(2);
    for document in [Some(doc), None] {
        let signal = barrier.signal();
        let _ = host
            .event_loop
            .queue_task(TaskSource::NavigationAndTraversal, document, move |host: &mut Host| {
                host.log.push("child");
                signal.complete();
            });
    }

    let removed = host
        .event_loop
        .remove_tasks_matching(|task| task.document() == Some(doc));
    assert_eq!(removed, 1);
    assert_eq!(barrier.completed(), 1);

    let result = EventLoop::spin_processing_tasks_with_source_until(
        &mut host,
        TaskSource::NavigationAndTraversal,
        |_| barrier.is_released(),
    );
    assert_eq!(result, Ok(1));
    assert_eq!(host.log, ["child"]);
}

#[test]
fn test_remove_tasks_for_document() {
    let mut host = Host::default();
    let doc = DocumentId(4);
    let _ = host
        .event_loop
        .queue_task(TaskSource::DomManipulation, Some(doc), |host: &mut Host| {
            host.log.push("doc");
        });
    let _ = host
        .event_loop
        .queue_task(TaskSource::DomManipulation, None, |host: &mut Host| {
            host.log.push("global");
        });

    assert_eq!(host.event_loop.pending_tasks_for(doc), 1);
    let removed = host
        .event_loop
        .remove_tasks_matching(|task| task.document() == Some(doc));
    assert_eq!(removed, 1);

    let _ = EventLoop::run_until_idle(&mut host);
    assert_eq!(host.log, ["global"]);
}

#[test]
fn test_termination_nesting_level() {
    let host = Host::default();
    assert_eq!(host.event_loop.termination_nesting_level(), 0);
    {
        let _outer = host.event_loop.enter_termination_nesting();
        let _inner = host.event_loop.enter_termination_nesting();
        assert_eq!(host.event_loop.termination_nesting_level(), 2);
    }
    assert_eq!(host.event_loop.termination_nesting_level(), 0);
}

#[test]
fn test_task_source_names() {
    assert_eq!(
        TaskSource::NavigationAndTraversal.to_string(),
        "navigation and traversal"
    );
    assert_eq!(TaskSource::DomManipulation.to_string(), "DOM manipulation");
}
