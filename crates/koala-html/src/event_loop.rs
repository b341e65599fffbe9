//! The event loop.
//!
//! [§ 8.1.7 Event loops](https://html.spec.whatwg.org/multipage/webappapis.html#event-loops)
//!
//! "To coordinate events, user interaction, scripts, rendering, networking,
//! and so forth, user agents must use event loops."
//!
//! Koala runs one event loop on one thread. Tasks are closures over the host
//! that owns the loop (the page); the host is handed to each task when it
//! runs, so tasks reach documents and windows through ids rather than
//! holding references to them.
//!
//! The only way to wait inside an algorithm is [`EventLoop::spin_until`]:
//! it keeps running queued tasks (never rendering) until a condition holds.
//! Fan-out/fan-in algorithms pair it with a [`CompletionBarrier`], which is
//! released once every queued task has consumed its [`CompletionSignal`].

use std::cell::Cell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use koala_common::nesting::{NestingCounter, NestingGuard};
use koala_dom::DocumentId;
use strum_macros::Display;
use thiserror::Error;

/// [§ 8.1.7.4 Generic task sources](https://html.spec.whatwg.org/multipage/webappapis.html#generic-task-sources)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum TaskSource {
    /// "This task source is used for features that react to DOM
    /// manipulations ..."
    #[strum(serialize = "DOM manipulation")]
    DomManipulation,
    /// "This task source is used for features that react to user
    /// interaction ..."
    #[strum(serialize = "user interaction")]
    UserInteraction,
    /// "This task source is used for features that trigger in response to
    /// network activity."
    #[strum(serialize = "networking")]
    Networking,
    /// "This task source is used to queue tasks involved in navigation and
    /// history traversal."
    #[strum(serialize = "navigation and traversal")]
    NavigationAndTraversal,
}

/// Identifier of a queued task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

/// [§ 8.1.7.1 Definitions](https://html.spec.whatwg.org/multipage/webappapis.html#concept-task)
///
/// "A task is a struct which has: Steps ..., A source ..., A document ...,
/// A script evaluation environment settings object set ..."
pub struct Task<H> {
    id: TaskId,
    source: TaskSource,
    document: Option<DocumentId>,
    steps: Box<dyn FnOnce(&mut H)>,
}

impl<H> Task<H> {
    /// This task's id.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// "A source: One of the task sources, used to group and serialize
    /// related tasks."
    #[must_use]
    pub const fn source(&self) -> TaskSource {
        self.source
    }

    /// "A document: A Document associated with the task, or null for tasks
    /// that are not in a window event loop."
    #[must_use]
    pub const fn document(&self) -> Option<DocumentId> {
        self.document
    }

    /// Run the task's steps.
    pub fn run(self, host: &mut H) {
        (self.steps)(host);
    }
}

impl<H> fmt::Debug for Task<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

/// Errors from spinning the event loop.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventLoopError {
    /// The queue ran dry while the condition still did not hold. On a single
    /// thread nothing else can make it true, so waiting longer would hang.
    #[error("event loop stalled: condition unmet with no runnable task ({pending} task(s) pending)")]
    Stalled {
        /// Tasks still queued (from other task sources) when the loop gave up.
        pending: usize,
    },
}

/// Access to the event loop owned by a host.
///
/// Implemented by whatever owns the loop; tasks receive that host when they
/// run.
pub trait EventLoopHost: Sized {
    /// The host's event loop.
    fn event_loop(&mut self) -> &mut EventLoop<Self>;
}

/// [§ 8.1.7 Event loops](https://html.spec.whatwg.org/multipage/webappapis.html#event-loops)
///
/// A single FIFO task queue plus the termination nesting level.
pub struct EventLoop<H> {
    tasks: VecDeque<Task<H>>,
    next_task_id: u64,

    /// [§ 8.1.7](https://html.spec.whatwg.org/multipage/webappapis.html#termination-nesting-level)
    /// "Each event loop has a termination nesting level counter, which must
    /// initially be 0."
    termination_nesting_level: NestingCounter,
}

impl<H: EventLoopHost> EventLoop<H> {
    /// Create an empty event loop.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
            next_task_id: 0,
            termination_nesting_level: NestingCounter::new(),
        }
    }

    /// [§ 8.1.7.2 Queuing tasks](https://html.spec.whatwg.org/multipage/webappapis.html#queue-a-task)
    ///
    /// STEP 1-4: "Let task be a new task, with the steps steps, the source
    ///            source, the document document ..."
    /// STEP 5:   "Append task to queue."
    pub fn queue_task(
        &mut self,
        source: TaskSource,
        document: Option<DocumentId>,
        steps: impl FnOnce(&mut H) + 'static,
    ) -> TaskId {
        let id = TaskId(self.next_task_id);
        self.next_task_id += 1;
        let task = Task {
            id,
            source,
            document,
            steps: Box::new(steps),
        };
        log::trace!(target: "event_loop", "queued {task:?}");
        self.tasks.push_back(task);
        id
    }

    /// Take the oldest queued task, optionally only from `source`.
    pub fn take_first_runnable(&mut self, source: Option<TaskSource>) -> Option<Task<H>> {
        let index = match source {
            None => 0,
            Some(source) => self.tasks.iter().position(|task| task.source == source)?,
        };
        self.tasks.remove(index)
    }

    /// Remove, without running them, all tasks for which `predicate` holds.
    /// Returns how many were removed.
    pub fn remove_tasks_matching(&mut self, mut predicate: impl FnMut(&Task<H>) -> bool) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| !predicate(task));
        before - self.tasks.len()
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of queued tasks owned by `document`.
    #[must_use]
    pub fn pending_tasks_for(&self, document: DocumentId) -> usize {
        self.tasks
            .iter()
            .filter(|task| task.document == Some(document))
            .count()
    }

    /// Increase the termination nesting level until the guard is dropped.
    #[must_use = "the nesting level is decreased again as soon as the guard is dropped"]
    pub fn enter_termination_nesting(&self) -> NestingGuard {
        self.termination_nesting_level.enter()
    }

    /// The current termination nesting level.
    #[must_use]
    pub fn termination_nesting_level(&self) -> u32 {
        self.termination_nesting_level.get()
    }

    /// Run the oldest queued task. Returns `false` if the queue was empty.
    pub fn run_one(host: &mut H) -> bool {
        let Some(task) = host.event_loop().take_first_runnable(None) else {
            return false;
        };
        log::trace!(target: "event_loop", "running {task:?}");
        task.run(host);
        true
    }

    /// Run tasks until the queue is empty. Returns how many ran.
    pub fn run_until_idle(host: &mut H) -> usize {
        let mut ran = 0;
        while Self::run_one(host) {
            ran += 1;
        }
        ran
    }

    /// [§ 8.1.7.3 Spin the event loop](https://html.spec.whatwg.org/multipage/webappapis.html#spin-the-event-loop)
    ///
    /// Keeps running queued tasks, oldest first, until `condition` holds.
    /// Only tasks are processed; rendering is never updated from here.
    ///
    /// # Errors
    ///
    /// Returns [`EventLoopError::Stalled`] if the queue runs dry before the
    /// condition holds.
    pub fn spin_until(
        host: &mut H,
        condition: impl FnMut(&H) -> bool,
    ) -> Result<usize, EventLoopError> {
        Self::spin(host, None, condition)
    }

    /// Like [`EventLoop::spin_until`], but only tasks from `source` are run;
    /// tasks from other sources stay queued in order.
    ///
    /// # Errors
    ///
    /// Returns [`EventLoopError::Stalled`] if no task from `source` is left
    /// before the condition holds.
    pub fn spin_processing_tasks_with_source_until(
        host: &mut H,
        source: TaskSource,
        condition: impl FnMut(&H) -> bool,
    ) -> Result<usize, EventLoopError> {
        Self::spin(host, Some(source), condition)
    }

    fn spin(
        host: &mut H,
        source: Option<TaskSource>,
        mut condition: impl FnMut(&H) -> bool,
    ) -> Result<usize, EventLoopError> {
        let mut ran = 0;
        while !condition(host) {
            let Some(task) = host.event_loop().take_first_runnable(source) else {
                let pending = host.event_loop().len();
                log::warn!(
                    target: "event_loop",
                    "spin stalled after {ran} task(s), {pending} unrelated task(s) pending"
                );
                return Err(EventLoopError::Stalled { pending });
            };
            log::trace!(target: "event_loop", "spin running {task:?}");
            task.run(host);
            ran += 1;
        }
        Ok(ran)
    }
}

impl<H: EventLoopHost> Default for EventLoop<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fan-in point for a batch of queued tasks.
///
/// The coordinating algorithm creates the barrier with the number of tasks
/// it is about to queue, gives each task one [`CompletionSignal`], and spins
/// the event loop until [`CompletionBarrier::is_released`]. The count is
/// reference-counted, so it stays valid however long the tasks stay queued.
#[derive(Debug)]
pub struct CompletionBarrier {
    completed: Rc<Cell<usize>>,
    expected: usize,
}

impl CompletionBarrier {
    /// A barrier released after `expected` signals.
    #[must_use]
    pub fn new(expected: usize) -> Self {
        Self {
            completed: Rc::new(Cell::new(0)),
            expected,
        }
    }

    /// Hand out one completion signal.
    #[must_use]
    pub fn signal(&self) -> CompletionSignal {
        CompletionSignal {
            completed: Rc::clone(&self.completed),
        }
    }

    /// Number of signals completed so far.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.get()
    }

    /// Number of signals needed to release the barrier.
    #[must_use]
    pub const fn expected(&self) -> usize {
        self.expected
    }

    /// Whether every expected signal has completed.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.completed.get() >= self.expected
    }
}

/// One task's share of a [`CompletionBarrier`].
///
/// The share is counted when the signal is dropped, so a task that is
/// removed from the queue without running still releases its barrier.
#[derive(Debug)]
pub struct CompletionSignal {
    completed: Rc<Cell<usize>>,
}

impl CompletionSignal {
    /// Count this task as done.
    pub fn complete(self) {
        drop(self);
    }
}

impl Drop for CompletionSignal {
    fn drop(&mut self) {
        self.completed.set(self.completed.get() + 1);
    }
}
