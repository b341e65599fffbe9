//! The Window object.
//!
//! [§ 7.2 The Window object](https://html.spec.whatwg.org/multipage/nav-history-apis.html#the-window-object)
//!
//! A [`Window`] is a document's relevant global object. The lifecycle
//! coordinator needs four things from it: the execution-ready flag of its
//! settings object, its [`History`] object, its [`Navigation`] object, and
//! whether it has sticky user activation. Message ports owned by a window
//! are modeled by [`MessagePort`].

use koala_dom::{DocumentId, HistoryEntryId, MessagePortId, WindowId};
use serde_json::Value;

use crate::session_history::NavigationType;

/// [§ 7.2.5 The History interface](https://html.spec.whatwg.org/multipage/nav-history-apis.html#the-history-interface)
///
/// "Each History object has state, initially null. Each History object has a
/// length, a non-negative integer, initially 0. Each History object has an
/// index, a non-negative integer, initially 0."
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    /// "index"
    pub index: usize,
    /// "length"
    pub length: usize,
    /// "state"
    pub state: Value,
}

impl Default for History {
    fn default() -> Self {
        Self {
            index: 0,
            length: 0,
            state: Value::Null,
        }
    }
}

/// [§ 7.2.6 The Navigation interface](https://html.spec.whatwg.org/multipage/nav-history-apis.html#navigation-interface)
///
/// "Each Navigation has an associated entry list, a list of
/// NavigationHistoryEntry objects, initially empty. Each Navigation has an
/// associated current entry index, an integer, initially −1."
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigation {
    entries: Vec<HistoryEntryId>,
    current_index: Option<usize>,
}

impl Navigation {
    /// The entry list.
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntryId] {
        &self.entries
    }

    /// The current entry, if any.
    #[must_use]
    pub fn current_entry(&self) -> Option<HistoryEntryId> {
        self.current_index
            .and_then(|index| self.entries.get(index).copied())
    }

    /// The current entry index.
    #[must_use]
    pub const fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// [§ 7.2.6.3](https://html.spec.whatwg.org/multipage/nav-history-apis.html#initialize-the-navigation-api-entries-for-a-new-document)
    ///
    /// "To initialize the navigation API entries for a new document given a
    /// Navigation navigation, a list of session history entries newSHEs, and
    /// a session history entry initialSHE:
    ///  1. Assert: navigation's entry list is empty.
    ///  2. Assert: navigation's current entry index is −1.
    ///  3. If navigation has entries and events disabled, then return.
    ///  4. For each newSHE of newSHEs: ... Append newNHE to navigation's
    ///     entry list.
    ///  5. Set navigation's current entry index to the result of getting the
    ///     navigation API entry index of initialSHE within navigation."
    pub fn initialize_for_new_document(
        &mut self,
        entries: Vec<HistoryEntryId>,
        initial: HistoryEntryId,
    ) {
        if !self.entries.is_empty() {
            log::warn!(target: "history", "navigation API entries initialized twice");
        }
        self.current_index = entries.iter().position(|&entry| entry == initial);
        self.entries = entries;
    }

    /// [§ 7.2.6.3](https://html.spec.whatwg.org/multipage/nav-history-apis.html#update-the-navigation-api-entries-for-a-same-document-navigation)
    ///
    /// Updates the entry list for a same-document navigation to
    /// `destination` and returns the entries that were disposed of.
    pub fn update_for_same_document_navigation(
        &mut self,
        destination: HistoryEntryId,
        navigation_type: NavigationType,
    ) -> Vec<HistoryEntryId> {
        let mut disposed = Vec::new();
        match navigation_type {
            // "If navigationType is "traverse", then:
            //  1. Set navigation's current entry index to the result of
            //     getting the navigation API entry index of destinationSHE
            //     within navigation.
            //  2. Assert: navigation's current entry index is not −1."
            NavigationType::Traverse => {
                match self.entries.iter().position(|&entry| entry == destination) {
                    Some(index) => self.current_index = Some(index),
                    None => log::warn!(
                        target: "history",
                        "traversal to {destination} which is not in the navigation API entry list"
                    ),
                }
            }
            // "Otherwise, if navigationType is "push", then:
            //  1. Set navigation's current entry index to navigation's current
            //     entry index + 1.
            //  2. Let i be navigation's current entry index.
            //  3. While i < navigation's entry list's size: append
            //     navigation's entry list[i] to disposedNHEs, set i to i + 1.
            //  4. Remove all items in disposedNHEs from navigation's entry
            //     list."
            NavigationType::Push => {
                // With no current entry the new one goes after every kept entry.
                let index = self.current_index.map_or(self.entries.len(), |index| index + 1);
                if index < self.entries.len() {
                    disposed.extend(self.entries.drain(index..));
                }
                self.entries.push(destination);
                self.current_index = Some(index);
            }
            // "Otherwise, if navigationType is "replace", then append
            // oldCurrentNHE to disposedNHEs."
            NavigationType::Replace => match self.current_index {
                Some(index) if index < self.entries.len() => {
                    disposed.push(std::mem::replace(&mut self.entries[index], destination));
                }
                _ => {
                    self.entries.push(destination);
                    self.current_index = Some(self.entries.len() - 1);
                }
            },
            NavigationType::Reload => {}
        }
        disposed
    }
}

/// A document's relevant global object.
#[derive(Debug, Clone)]
pub struct Window {
    id: WindowId,

    /// "A Window object has an associated Document"
    document: DocumentId,

    /// [§ 8.1.3.1](https://html.spec.whatwg.org/multipage/webappapis.html#concept-environment-execution-ready-flag)
    /// "An environment has an execution ready flag ... initially unset."
    execution_ready: bool,

    /// [§ 6.4.1](https://html.spec.whatwg.org/multipage/interaction.html#sticky-activation)
    sticky_activation: bool,

    /// The `History` object.
    pub history: History,

    /// The `Navigation` object.
    pub navigation: Navigation,
}

impl Window {
    /// Create the window for `document`.
    #[must_use]
    pub fn new(id: WindowId, document: DocumentId) -> Self {
        Self {
            id,
            document,
            execution_ready: false,
            sticky_activation: false,
            history: History::default(),
            navigation: Navigation::default(),
        }
    }

    /// This window's id.
    #[must_use]
    pub const fn id(&self) -> WindowId {
        self.id
    }

    /// The associated document.
    #[must_use]
    pub const fn associated_document(&self) -> DocumentId {
        self.document
    }

    /// Whether the execution ready flag is set.
    #[must_use]
    pub const fn is_execution_ready(&self) -> bool {
        self.execution_ready
    }

    /// Set the execution ready flag. Returns `true` if it flipped.
    pub fn mark_execution_ready(&mut self) -> bool {
        !std::mem::replace(&mut self.execution_ready, true)
    }

    /// Whether the window has sticky activation.
    #[must_use]
    pub const fn has_sticky_activation(&self) -> bool {
        self.sticky_activation
    }

    /// [§ 6.4.1](https://html.spec.whatwg.org/multipage/interaction.html#activation-notification)
    ///
    /// Record an activation-triggering input event.
    pub fn notify_user_activation(&mut self) {
        self.sticky_activation = true;
    }
}

/// [§ 9.4.4 Message ports](https://html.spec.whatwg.org/multipage/web-messaging.html#message-ports)
///
/// "Each MessagePort object can be entangled with another (a symmetric
/// relationship)."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePort {
    id: MessagePortId,
    owner: WindowId,
    entangled: Option<MessagePortId>,
}

impl MessagePort {
    /// A new, not yet entangled port owned by `owner`.
    #[must_use]
    pub const fn new(id: MessagePortId, owner: WindowId) -> Self {
        Self {
            id,
            owner,
            entangled: None,
        }
    }

    /// This port's id.
    #[must_use]
    pub const fn id(&self) -> MessagePortId {
        self.id
    }

    /// The window whose realm the port belongs to.
    #[must_use]
    pub const fn owner(&self) -> WindowId {
        self.owner
    }

    /// The port this one is entangled with.
    #[must_use]
    pub const fn entangled_port(&self) -> Option<MessagePortId> {
        self.entangled
    }

    /// Entangle with `other` (one side of the symmetric relation).
    pub fn entangle(&mut self, other: MessagePortId) {
        self.entangled = Some(other);
    }

    /// Disentangle, returning the former peer.
    pub fn disentangle(&mut self) -> Option<MessagePortId> {
        self.entangled.take()
    }
}
