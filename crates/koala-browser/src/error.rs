//! Lifecycle errors.
//!
//! Lifecycle outcomes (a document that cannot be cached, an unload prompt the
//! user cancelled) are state, not errors. What ends up here is misuse: ids
//! that do not resolve, calls that arrive while the document is unloading,
//! history steps missing the data they need, and barriers that can never be
//! released.

use koala_dom::{DocumentId, HistoryEntryId, NavigableId, WindowId};
use koala_html::EventLoopError;
use thiserror::Error;

/// Errors from the lifecycle operations on a [`crate::Page`].
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// No document with this id was ever created on the page.
    #[error("unknown document {0}")]
    UnknownDocument(DocumentId),

    /// No navigable with this id exists (any more).
    #[error("unknown navigable {0}")]
    UnknownNavigable(NavigableId),

    /// No window with this id exists (any more).
    #[error("unknown window {0}")]
    UnknownWindow(WindowId),

    /// No session history entry with this id exists (any more).
    #[error("unknown session history entry {0}")]
    UnknownHistoryEntry(HistoryEntryId),

    /// The document has already been destroyed.
    #[error("{0} has been destroyed")]
    DocumentDestroyed(DocumentId),

    /// The document is not presented in any navigable.
    #[error("{0} has no navigable")]
    NoNavigable(DocumentId),

    /// The operation needs a top-level traversable.
    #[error("{0} is not a top-level traversable")]
    NotTraversable(NavigableId),

    /// The document's unload counter is non-zero.
    #[error("{0} is being unloaded")]
    UnloadInProgress(DocumentId),

    /// A history step changing the entry of an existing document needs a
    /// navigation type.
    #[error("history step for {0} changes its entry but has no navigation type")]
    MissingNavigationType(DocumentId),

    /// The first history step of a document needs the navigation API entries.
    #[error("first history step for {0} has no navigation API entries")]
    MissingNavigationEntries(DocumentId),

    /// Serialized history state could not be restored.
    #[error("history state could not be restored: {0}")]
    HistoryState(#[from] serde_json::Error),

    /// A completion barrier could not be released.
    #[error(transparent)]
    EventLoop(#[from] EventLoopError),
}
