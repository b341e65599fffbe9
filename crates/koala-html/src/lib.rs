//! HTML Standard infrastructure for the Koala browser.
//!
//! This crate provides the pieces of the
//! [HTML Living Standard](https://html.spec.whatwg.org/multipage/) that the
//! document lifecycle is coordinated through:
//!
//! - [`event_loop`] - [§ 8.1.7 Event loops](https://html.spec.whatwg.org/multipage/webappapis.html#event-loops):
//!   the task queue, the "spin the event loop until" primitive and
//!   completion barriers
//! - [`navigable`] - [§ 7.3.1 Navigables](https://html.spec.whatwg.org/multipage/document-sequences.html#navigables)
//! - [`session_history`] - [§ 7.4.1 Session history](https://html.spec.whatwg.org/multipage/browsing-the-web.html#session-history-infrastructure)
//! - [`window`] - the Window object with its `History` and `Navigation`
//!   APIs, and message ports
//!
//! # Not Yet Implemented
//!
//! - Rendering opportunities and the "update the rendering" steps
//! - Microtask checkpoints
//! - Worker event loops

pub mod event_loop;
pub mod navigable;
pub mod session_history;
pub mod window;

pub use event_loop::{
    CompletionBarrier, CompletionSignal, EventLoop, EventLoopError, EventLoopHost, Task, TaskId,
    TaskSource,
};
pub use navigable::Navigable;
pub use session_history::{DocumentState, NavigationType, SessionHistoryEntry};
pub use window::{History, MessagePort, Navigation, Window};
