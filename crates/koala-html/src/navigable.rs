//! Navigables.
//!
//! [§ 7.3.1 Navigables](https://html.spec.whatwg.org/multipage/document-sequences.html#navigables)
//!
//! "A navigable presents a Document to the user via its active session
//! history entry."
//!
//! Navigables form a strict tree through [`Navigable::parent`]. A child
//! navigable is hosted by a container element (iframe, frame) that lives in
//! its parent's document; only that document's id is kept here.

use koala_dom::{
    BrowsingContextId, DocumentId, HistoryEntryId, NavigableId, NavigationId, VisibilityState,
    WindowId,
};

/// A navigable and, for top-level ones, its traversable state.
#[derive(Debug, Clone)]
pub struct Navigable {
    id: NavigableId,

    /// "A navigable has a parent, a navigable or null, initially null."
    parent: Option<NavigableId>,

    /// The node document of the navigable's container.
    container_document: Option<DocumentId>,

    /// "A navigable has an active session history entry ... its active
    /// document is its active session history entry's document."
    active_document: Option<DocumentId>,

    /// The `[[Window]]` slot of the active browsing context's `WindowProxy`.
    window_proxy: Option<WindowId>,

    browsing_context: BrowsingContextId,

    /// "A navigable has a current session history entry ..." together with
    /// the entries it owns, oldest first.
    session_history: Vec<HistoryEntryId>,
    active_entry: Option<HistoryEntryId>,

    /// "A navigable has an ongoing navigation, which is a navigation ID,
    /// "traversal", or null, initially null."
    ongoing_navigation: Option<NavigationId>,

    /// [§ 7.3.1.1](https://html.spec.whatwg.org/multipage/document-sequences.html#system-visibility-state)
    /// "A traversable navigable has a system visibility state, which is
    /// either "hidden" or "visible"."
    system_visibility_state: VisibilityState,
}

impl Navigable {
    /// [§ 7.3.1.1 Top-level traversables](https://html.spec.whatwg.org/multipage/document-sequences.html#top-level-traversable)
    #[must_use]
    pub const fn new_top_level(id: NavigableId, browsing_context: BrowsingContextId) -> Self {
        Self {
            id,
            parent: None,
            container_document: None,
            active_document: None,
            window_proxy: None,
            browsing_context,
            session_history: Vec::new(),
            active_entry: None,
            ongoing_navigation: None,
            system_visibility_state: VisibilityState::Visible,
        }
    }

    /// [§ 7.3.1.2 Child navigables](https://html.spec.whatwg.org/multipage/document-sequences.html#child-navigable)
    #[must_use]
    pub const fn new_child(
        id: NavigableId,
        parent: NavigableId,
        container_document: DocumentId,
        browsing_context: BrowsingContextId,
    ) -> Self {
        Self {
            id,
            parent: Some(parent),
            container_document: Some(container_document),
            active_document: None,
            window_proxy: None,
            browsing_context,
            session_history: Vec::new(),
            active_entry: None,
            ongoing_navigation: None,
            system_visibility_state: VisibilityState::Hidden,
        }
    }

    /// This navigable's id.
    #[must_use]
    pub const fn id(&self) -> NavigableId {
        self.id
    }

    /// The parent navigable, `None` for top-level traversables.
    #[must_use]
    pub const fn parent(&self) -> Option<NavigableId> {
        self.parent
    }

    /// "A navigable is a top-level traversable if it ... has a null parent."
    #[must_use]
    pub const fn is_traversable(&self) -> bool {
        self.parent.is_none()
    }

    /// The document hosting this navigable's container.
    #[must_use]
    pub const fn container_document(&self) -> Option<DocumentId> {
        self.container_document
    }

    /// The active document.
    #[must_use]
    pub const fn active_document(&self) -> Option<DocumentId> {
        self.active_document
    }

    /// Exchange the active document, returning the previous one.
    pub fn replace_active_document(&mut self, document: Option<DocumentId>) -> Option<DocumentId> {
        std::mem::replace(&mut self.active_document, document)
    }

    /// The window bound into the `WindowProxy`.
    #[must_use]
    pub const fn window_proxy(&self) -> Option<WindowId> {
        self.window_proxy
    }

    /// Bind a window into the `WindowProxy`'s `[[Window]]` slot.
    pub fn set_window_proxy(&mut self, window: Option<WindowId>) {
        self.window_proxy = window;
    }

    /// The browsing context the navigable presents documents in.
    #[must_use]
    pub const fn browsing_context(&self) -> BrowsingContextId {
        self.browsing_context
    }

    /// Entries owned by this navigable, oldest first.
    #[must_use]
    pub fn session_history(&self) -> &[HistoryEntryId] {
        &self.session_history
    }

    /// Append an entry to the owned list.
    pub fn push_session_history_entry(&mut self, entry: HistoryEntryId) {
        self.session_history.push(entry);
    }

    /// Take every owned entry, leaving the list empty.
    pub fn take_session_history(&mut self) -> Vec<HistoryEntryId> {
        std::mem::take(&mut self.session_history)
    }

    /// The active session history entry.
    #[must_use]
    pub const fn active_entry(&self) -> Option<HistoryEntryId> {
        self.active_entry
    }

    /// Set the active session history entry.
    pub fn set_active_entry(&mut self, entry: Option<HistoryEntryId>) {
        self.active_entry = entry;
    }

    /// The ongoing navigation.
    #[must_use]
    pub const fn ongoing_navigation(&self) -> Option<NavigationId> {
        self.ongoing_navigation
    }

    /// [§ 7.4.2.1](https://html.spec.whatwg.org/multipage/browsing-the-web.html#set-the-ongoing-navigation)
    ///
    /// "To set the ongoing navigation for a navigable navigable to newValue:
    ///  1. If navigable's ongoing navigation is equal to newValue, then return.
    ///  2. Inform the navigation API about aborting navigation given navigable.
    ///  3. Set navigable's ongoing navigation to newValue."
    ///
    /// Returns the navigation that was replaced.
    pub fn set_ongoing_navigation(
        &mut self,
        navigation: Option<NavigationId>,
    ) -> Option<NavigationId> {
        if self.ongoing_navigation == navigation {
            return None;
        }
        std::mem::replace(&mut self.ongoing_navigation, navigation)
    }

    /// The system visibility state (meaningful for traversables).
    #[must_use]
    pub const fn system_visibility_state(&self) -> VisibilityState {
        self.system_visibility_state
    }

    /// Record a new system visibility state. Returns `true` if it changed.
    pub fn set_system_visibility_state(&mut self, state: VisibilityState) -> bool {
        if self.system_visibility_state == state {
            return false;
        }
        self.system_visibility_state = state;
        true
    }
}
