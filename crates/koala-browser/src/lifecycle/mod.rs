//! The document lifecycle coordinator.
//!
//! [§ 7.6 Document lifecycle](https://html.spec.whatwg.org/multipage/document-lifecycle.html)
//!
//! Every operation here is an `impl Page` block: the coordinator reads and
//! writes document state through the page's arenas and fans work out to
//! descendant navigables through the page's event loop.
//!
//! - [`readiness`] - readiness, "finished loading" notification, visibility
//! - [`activation`] - making a document active in its navigable
//! - [`unload`] - unloading a document and its descendants
//! - [`destroy`] - destroying a document and its descendants
//! - [`abort`] - aborting a document and its descendants
//! - [`history_step`] - applying a session history step to a document
//! - [`beforeunload`] - the `beforeunload` guard
//! - [`loading`] - "the end" of loading
//!
//! Subtree unload and destroy are the only places that wait: they queue one
//! task per document on the navigation and traversal task source and spin
//! the event loop until a [`koala_html::CompletionBarrier`] is released.
//! Descendants always finish a phase before their ancestors, and the whole
//! subtree is unloaded before anything in it is destroyed.

pub mod abort;
pub mod activation;
pub mod beforeunload;
pub mod destroy;
pub mod history_step;
pub mod loading;
pub mod readiness;
pub mod unload;

pub use beforeunload::BeforeUnloadOutcome;
pub use history_step::HistoryStepApplication;
