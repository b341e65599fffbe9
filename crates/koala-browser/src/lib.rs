//! Document lifecycle and navigation coordination for the Koala browser.
//!
//! # Scope
//!
//! This crate decides *when* documents change lifecycle state and in what
//! order the rest of the engine hears about it:
//! - **Readiness** - `loading` → `interactive` → `complete`, and the
//!   "finished loading" notification
//! - **Activation** - making a committed document active in its navigable
//! - **Unload / destroy** - tearing down a document and every document
//!   nested below it, descendants first, all unloads before any destroy
//! - **Abort** - stopping in-flight parsing and navigation
//! - **History steps** - `popstate`, `hashchange` and the Navigation API
//!   entry list on session history traversal
//! - **Beforeunload** - the cancelable guard in front of unloading
//!
//! Everything lives in a [`Page`], which owns the documents, navigables,
//! windows and the event loop, and reports to the embedder through a
//! [`PageClient`].
//!
//! # Not Yet Implemented
//!
//! - Restoring documents from the back/forward cache
//! - Persisted user state (scroll positions, form state)
//! - Unload timing info

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod page;

pub use koala_dom as dom;
pub use koala_html as html;

pub use config::{ConfigError, PageConfig};
pub use error::LifecycleError;
pub use lifecycle::{BeforeUnloadOutcome, HistoryStepApplication};
pub use page::{Continuation, EventListener, NewDocument, NullPageClient, Page, PageClient};
