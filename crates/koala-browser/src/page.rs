//! The page: the single owner of every document, navigable and window.
//!
//! Documents, navigables, windows, history entries and message ports point
//! at each other in every direction. [`Page`] keeps one [`Arena`] per kind
//! and everything else holds typed ids that are resolved when used. An id
//! whose object is gone simply stops resolving; destruction is an explicit
//! arena step.
//!
//! The page also owns the event loop (it is the loop's host, so queued tasks
//! receive `&mut Page`), the event listeners registered on windows,
//! documents and containers, and the embedder's [`PageClient`].

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use koala_common::warning::clear_warnings;
use koala_dom::{
    ActiveParser, Arena, BrowsingContextId, Document, DocumentId, Event, EventDetail, EventName, EventTarget,
    HistoryEntryId, MessagePortId, NavigableId, NavigationId, WindowId,
};
use koala_html::{EventLoop, EventLoopHost, MessagePort, Navigable, SessionHistoryEntry, TaskSource, Window};
use url::Url;

use crate::config::PageConfig;
use crate::error::LifecycleError;

/// Callbacks from the page to its embedder.
///
/// Every method has a no-op default so embedders only implement what they
/// care about.
pub trait PageClient {
    /// A top-level document reached "complete" readiness while active.
    fn page_did_finish_loading(&mut self, _url: &Url) {}

    /// Ask the user whether to leave the page. Returns `true` if the user
    /// confirmed leaving.
    fn page_did_request_unload_confirmation(&mut self, _document: DocumentId) -> bool {
        true
    }

    /// Scroll `document` to its indicated part, `None` meaning the top.
    fn page_did_request_scroll_to_fragment(
        &mut self,
        _document: DocumentId,
        _fragment: Option<&str>,
    ) {
    }

    /// `document` stopped being active in its navigable.
    fn document_became_inactive(&mut self, _document: DocumentId) {}

    /// `document` was destroyed.
    fn page_did_destroy_document(&mut self, _document: DocumentId) {}
}

/// A [`PageClient`] that ignores every notification and confirms every
/// unload prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPageClient;

impl PageClient for NullPageClient {}

/// An event listener. Listeners get the page back, so they can run nested
/// lifecycle operations from inside a dispatch.
pub type EventListener = Rc<dyn Fn(&mut Page, &mut Event)>;

/// Steps run once a subtree coordination has finished.
pub type Continuation = Box<dyn FnOnce(&mut Page)>;

/// The objects created for a freshly committed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewDocument {
    /// The document.
    pub document: DocumentId,
    /// Its relevant global object.
    pub window: WindowId,
    /// The session history entry it was committed into.
    pub entry: HistoryEntryId,
}

/// A script waiting for its document to be allowed to run scripts.
struct ParkedScript {
    document: DocumentId,
    run: Box<dyn FnOnce(&mut Page)>,
}

/// One page: a tree of navigables under one or more top-level traversables,
/// the documents they present, and the event loop driving them.
pub struct Page {
    pub(crate) config: PageConfig,
    pub(crate) client: Box<dyn PageClient>,
    pub(crate) event_loop: EventLoop<Self>,

    pub(crate) documents: Arena<DocumentId, Document>,
    pub(crate) navigables: Arena<NavigableId, Navigable>,
    pub(crate) windows: Arena<WindowId, Window>,
    pub(crate) history_entries: Arena<HistoryEntryId, SessionHistoryEntry>,
    pub(crate) message_ports: Arena<MessagePortId, MessagePort>,

    browsing_context_count: usize,
    next_navigation_id: u64,
    listeners: HashMap<(EventTarget, EventName), Vec<EventListener>>,
    parked_scripts: Vec<ParkedScript>,
    time_origin: Instant,
}

impl EventLoopHost for Page {
    fn event_loop(&mut self) -> &mut EventLoop<Self> {
        &mut self.event_loop
    }
}

impl Page {
    /// Create an empty page that reports to nobody.
    #[must_use]
    pub fn new(config: PageConfig) -> Self {
        Self::with_client(config, NullPageClient)
    }

    /// Create an empty page reporting to `client`.
    #[must_use]
    pub fn with_client(config: PageConfig, client: impl PageClient + 'static) -> Self {
        clear_warnings();
        Self {
            config,
            client: Box::new(client),
            event_loop: EventLoop::new(),
            documents: Arena::new(),
            navigables: Arena::new(),
            windows: Arena::new(),
            history_entries: Arena::new(),
            message_ports: Arena::new(),
            browsing_context_count: 0,
            next_navigation_id: 0,
            listeners: HashMap::new(),
            parked_scripts: Vec::new(),
            time_origin: Instant::now(),
        }
    }

    /// The page's configuration.
    #[must_use]
    pub const fn config(&self) -> &PageConfig {
        &self.config
    }

    /// Time elapsed since the page was created.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.time_origin.elapsed()
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    fn next_browsing_context(&mut self) -> BrowsingContextId {
        let id = BrowsingContextId(self.browsing_context_count);
        self.browsing_context_count += 1;
        id
    }

    /// [§ 7.3.1.1](https://html.spec.whatwg.org/multipage/document-sequences.html#creating-a-new-top-level-traversable)
    ///
    /// Create a top-level traversable with no document yet.
    pub fn create_top_level_traversable(&mut self) -> NavigableId {
        let browsing_context = self.next_browsing_context();
        let id = self
            .navigables
            .alloc_with(|id| Navigable::new_top_level(id, browsing_context));
        log::debug!(target: "lifecycle", "created top-level traversable {id}");
        id
    }

    /// [§ 7.3.1.2](https://html.spec.whatwg.org/multipage/document-sequences.html#create-a-new-child-navigable)
    ///
    /// Create a child navigable for a container element inserted into
    /// `container_document`.
    ///
    /// # Errors
    ///
    /// Fails if the container document does not exist, was destroyed, or is
    /// not presented in a navigable.
    pub fn create_child_navigable(
        &mut self,
        container_document: DocumentId,
    ) -> Result<NavigableId, LifecycleError> {
        let parent = self.navigable_of(container_document)?;
        let browsing_context = self.next_browsing_context();
        let id = self.navigables.alloc_with(|id| {
            Navigable::new_child(id, parent, container_document, browsing_context)
        });
        log::debug!(target: "lifecycle", "created child navigable {id} in {container_document}");
        Ok(id)
    }

    /// Commit a new document for `url` into `navigable`: the document, its
    /// window and a session history entry holding it.
    ///
    /// The document is neither active nor attached to its entry yet; that
    /// is what [`Page::apply_history_step`] and [`Page::activate`] do.
    ///
    /// # Errors
    ///
    /// Fails if `navigable` does not exist.
    pub fn create_document(
        &mut self,
        navigable: NavigableId,
        url: Url,
    ) -> Result<NewDocument, LifecycleError> {
        let browsing_context = self
            .navigables
            .get(navigable)
            .ok_or(LifecycleError::UnknownNavigable(navigable))?
            .browsing_context();

        let document = self
            .documents
            .alloc_with(|id| Document::new(id, url.clone(), Some(navigable)));
        let window = self.windows.alloc_with(|id| Window::new(id, document));
        let entry = self.push_session_history_entry(navigable, url)?;
        if let Some(state) = self.history_entries.get_mut(entry) {
            state.document_state.document = Some(document);
            state.document_state.ever_populated = true;
        }
        if let Some(doc) = self.documents.get_mut(document) {
            doc.set_browsing_context(Some(browsing_context));
            doc.set_window(Some(window));
        }
        log::debug!(target: "lifecycle", "created {document} with {window} in {navigable}");
        Ok(NewDocument {
            document,
            window,
            entry,
        })
    }

    /// Append a new session history entry for `url` to `navigable`'s list.
    ///
    /// # Errors
    ///
    /// Fails if `navigable` does not exist.
    pub fn push_session_history_entry(
        &mut self,
        navigable: NavigableId,
        url: Url,
    ) -> Result<HistoryEntryId, LifecycleError> {
        if !self.navigables.contains(navigable) {
            return Err(LifecycleError::UnknownNavigable(navigable));
        }
        let entry = self
            .history_entries
            .alloc_with(|id| SessionHistoryEntry::new(id, navigable, url));
        if let Some(owner) = self.navigables.get_mut(navigable) {
            owner.push_session_history_entry(entry);
        }
        Ok(entry)
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// A document by id. Destroyed documents stay visible here until
    /// [`Page::collect_destroyed_documents`] runs.
    #[must_use]
    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id)
    }

    pub(crate) fn document_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.documents.get_mut(id)
    }

    /// Attach the parser that is producing `document`, so aborting the
    /// document stops it.
    ///
    /// # Errors
    ///
    /// Fails if the document is unknown or destroyed.
    pub fn set_active_parser(
        &mut self,
        document: DocumentId,
        parser: Box<dyn ActiveParser>,
    ) -> Result<(), LifecycleError> {
        let _ = self.live_doc(document)?;
        self.doc_mut(document)?.set_active_parser(parser);
        Ok(())
    }

    /// Set whether `document`'s browsing context is sandboxed against modal
    /// dialogs.
    ///
    /// # Errors
    ///
    /// Fails if the document is unknown or destroyed.
    pub fn set_sandboxed_modals(&mut self, document: DocumentId, sandboxed: bool) -> Result<(), LifecycleError> {
        let _ = self.live_doc(document)?;
        self.doc_mut(document)?.set_sandboxed_modals(sandboxed);
        Ok(())
    }

    /// A navigable by id.
    #[must_use]
    pub fn navigable(&self, id: NavigableId) -> Option<&Navigable> {
        self.navigables.get(id)
    }

    /// A window by id.
    #[must_use]
    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(id)
    }

    /// A session history entry by id.
    #[must_use]
    pub fn history_entry(&self, id: HistoryEntryId) -> Option<&SessionHistoryEntry> {
        self.history_entries.get(id)
    }

    /// A mutable session history entry by id.
    pub fn history_entry_mut(&mut self, id: HistoryEntryId) -> Option<&mut SessionHistoryEntry> {
        self.history_entries.get_mut(id)
    }

    /// A message port by id.
    #[must_use]
    pub fn message_port(&self, id: MessagePortId) -> Option<&MessagePort> {
        self.message_ports.get(id)
    }

    /// Number of navigables still registered.
    #[must_use]
    pub fn navigable_count(&self) -> usize {
        self.navigables.len()
    }

    /// Number of documents in the arena, destroyed ones included.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub(crate) fn doc(&self, id: DocumentId) -> Result<&Document, LifecycleError> {
        self.documents
            .get(id)
            .ok_or(LifecycleError::UnknownDocument(id))
    }

    pub(crate) fn doc_mut(&mut self, id: DocumentId) -> Result<&mut Document, LifecycleError> {
        self.documents
            .get_mut(id)
            .ok_or(LifecycleError::UnknownDocument(id))
    }

    /// Resolve a document that must not have been destroyed.
    pub(crate) fn live_doc(&self, id: DocumentId) -> Result<&Document, LifecycleError> {
        let document = self.doc(id)?;
        if document.is_destroyed() {
            return Err(LifecycleError::DocumentDestroyed(id));
        }
        Ok(document)
    }

    /// The navigable `document` is presented in.
    ///
    /// # Errors
    ///
    /// Fails if the document is unknown, destroyed, or its navigable is gone.
    pub fn navigable_of(&self, document: DocumentId) -> Result<NavigableId, LifecycleError> {
        let navigable = self
            .live_doc(document)?
            .navigable()
            .ok_or(LifecycleError::NoNavigable(document))?;
        if !self.navigables.contains(navigable) {
            return Err(LifecycleError::NoNavigable(document));
        }
        Ok(navigable)
    }

    /// [§ 7.3.1](https://html.spec.whatwg.org/multipage/document-sequences.html#nav-traversable)
    ///
    /// The top-level traversable above `navigable` (itself for traversables).
    #[must_use]
    pub fn traversable_of(&self, navigable: NavigableId) -> Option<NavigableId> {
        let mut current = self.navigables.get(navigable)?;
        while let Some(parent) = current.parent() {
            current = self.navigables.get(parent)?;
        }
        Some(current.id())
    }

    /// Whether `document` is the active document of a top-level traversable.
    #[must_use]
    pub fn is_top_level_active_document(&self, document: DocumentId) -> bool {
        self.documents
            .get(document)
            .and_then(Document::navigable)
            .and_then(|id| self.navigables.get(id))
            .is_some_and(|nav| nav.is_traversable() && nav.active_document() == Some(document))
    }

    /// [§ 7.3.1](https://html.spec.whatwg.org/multipage/document-sequences.html#child-navigable)
    ///
    /// "A Document's child navigables are the ... navigables whose container
    /// is a shadow-including descendant of document."
    #[must_use]
    pub fn child_navigables(&self, document: DocumentId) -> Vec<NavigableId> {
        self.navigables
            .iter()
            .filter(|(_, nav)| nav.container_document() == Some(document))
            .map(|(id, _)| id)
            .collect()
    }

    /// [§ 7.3.1](https://html.spec.whatwg.org/multipage/document-sequences.html#descendant-navigables)
    ///
    /// "The descendant navigables of a Document document is the list
    /// returned by the following algorithm:
    ///  1. Let navigables be a new list.
    ///  2. Let navigableContainers be a list of all shadow-including
    ///     descendants of document that are navigable containers, in
    ///     shadow-including tree order.
    ///  3. For each navigableContainer of navigableContainers:
    ///     1. If navigableContainer's content navigable is null, then
    ///        continue.
    ///     2. Extend navigables with navigableContainer's content
    ///        navigable's active document's inclusive descendant
    ///        navigables.
    ///  4. Return navigables."
    ///
    /// Children without an active document contribute themselves but no
    /// descendants.
    #[must_use]
    pub fn descendant_navigables(&self, document: DocumentId) -> Vec<NavigableId> {
        let mut navigables = Vec::new();
        for child in self.child_navigables(document) {
            navigables.push(child);
            if let Some(active) = self.navigables.get(child).and_then(Navigable::active_document) {
                navigables.extend(self.descendant_navigables(active));
            }
        }
        navigables
    }

    /// "The inclusive descendant navigables of a Document document is the
    /// list returned by: 1. Let navigables be « document's node navigable ».
    /// 2. Extend navigables with document's descendant navigables."
    #[must_use]
    pub fn inclusive_descendant_navigables(&self, document: DocumentId) -> Vec<NavigableId> {
        let mut navigables: Vec<NavigableId> = self
            .documents
            .get(document)
            .and_then(Document::navigable)
            .into_iter()
            .collect();
        navigables.extend(self.descendant_navigables(document));
        navigables
    }

    /// Number of ancestors of `navigable`.
    pub(crate) fn navigable_depth(&self, navigable: NavigableId) -> usize {
        let mut depth = 0;
        let mut current = self.navigables.get(navigable).and_then(Navigable::parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.navigables.get(parent).and_then(Navigable::parent);
        }
        depth
    }

    /// The active document of `navigable`, if it has one with a window.
    pub(crate) fn active_document_with_window(&self, navigable: NavigableId) -> Option<DocumentId> {
        let document = self.navigables.get(navigable)?.active_document()?;
        let doc = self.documents.get(document)?;
        (!doc.is_destroyed() && doc.window().is_some()).then_some(document)
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Register `listener` for `name` events at `target`.
    pub fn add_event_listener(
        &mut self,
        target: EventTarget,
        name: EventName,
        listener: impl Fn(&mut Self, &mut Event) + 'static,
    ) {
        self.listeners
            .entry((target, name))
            .or_default()
            .push(Rc::new(listener));
    }

    /// Drop every listener registered at `target`.
    pub(crate) fn remove_listeners_at(&mut self, target: EventTarget) {
        self.listeners.retain(|(at, _), _| *at != target);
    }

    /// [§ 2.9 Dispatching events](https://dom.spec.whatwg.org/#concept-event-dispatch)
    ///
    /// Run the listeners registered for the event's target and type, in
    /// registration order. Listeners added during dispatch do not see the
    /// event. Returns `false` if the event was canceled.
    pub fn dispatch_event(&mut self, event: &mut Event) -> bool {
        log::trace!(target: "lifecycle", "dispatching {} at {:?}", event.name(), event.target());
        let listeners = self
            .listeners
            .get(&(event.target(), event.name()))
            .cloned()
            .unwrap_or_default();
        for listener in listeners {
            listener(self, event);
        }
        !event.default_prevented()
    }

    /// [§ 2.10 Firing events](https://dom.spec.whatwg.org/#concept-event-fire)
    pub(crate) fn fire_event(
        &mut self,
        target: EventTarget,
        name: EventName,
        detail: EventDetail,
    ) -> Event {
        let mut event = Event::new(name, target).with_detail(detail);
        let _ = self.dispatch_event(&mut event);
        event
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    /// [§ 8.1.7.2](https://html.spec.whatwg.org/multipage/webappapis.html#queue-a-global-task)
    ///
    /// Queue `steps` on `source`, owned by `document` so they are dropped if
    /// the document is destroyed first.
    pub fn queue_global_task(
        &mut self,
        source: TaskSource,
        document: DocumentId,
        steps: impl FnOnce(&mut Self) + 'static,
    ) {
        let _ = self.event_loop.queue_task(source, Some(document), steps);
    }

    /// Run queued tasks until none are left. Returns how many ran.
    pub fn run_until_idle(&mut self) -> usize {
        EventLoop::run_until_idle(self)
    }

    /// Number of tasks waiting in the event loop.
    #[must_use]
    pub fn pending_task_count(&self) -> usize {
        self.event_loop.len()
    }

    /// The event loop's termination nesting level.
    #[must_use]
    pub fn termination_nesting_level(&self) -> u32 {
        self.event_loop.termination_nesting_level()
    }

    // ------------------------------------------------------------------
    // Scripts
    // ------------------------------------------------------------------

    /// Whether scripts may run for `document`: its window is
    /// execution-ready and the document is ready to run scripts.
    #[must_use]
    pub fn can_run_scripts(&self, document: DocumentId) -> bool {
        let Some(doc) = self.documents.get(document) else {
            return false;
        };
        !doc.is_destroyed()
            && doc.is_ready_to_run_scripts()
            && doc
                .window()
                .and_then(|window| self.windows.get(window))
                .is_some_and(Window::is_execution_ready)
    }

    /// Queue `script` to run for `document`. Until the document can run
    /// scripts the script is parked; it is released onto the DOM
    /// manipulation task source once it can.
    ///
    /// # Errors
    ///
    /// Fails if the document is unknown or destroyed.
    pub fn queue_script(
        &mut self,
        document: DocumentId,
        script: impl FnOnce(&mut Self) + 'static,
    ) -> Result<(), LifecycleError> {
        let _ = self.live_doc(document)?;
        if self.can_run_scripts(document) {
            self.queue_global_task(TaskSource::DomManipulation, document, script);
        } else {
            log::trace!(target: "lifecycle", "parking script for {document}");
            self.parked_scripts.push(ParkedScript {
                document,
                run: Box::new(script),
            });
        }
        Ok(())
    }

    /// Move `document`'s parked scripts onto the task queue if it can run
    /// scripts now.
    pub(crate) fn release_parked_scripts(&mut self, document: DocumentId) {
        if !self.can_run_scripts(document) {
            return;
        }
        let (ready, parked): (Vec<_>, Vec<_>) = std::mem::take(&mut self.parked_scripts)
            .into_iter()
            .partition(|script| script.document == document);
        self.parked_scripts = parked;
        for script in ready {
            self.queue_global_task(TaskSource::DomManipulation, document, script.run);
        }
    }

    /// Drop `document`'s parked scripts without running them.
    pub(crate) fn discard_parked_scripts(&mut self, document: DocumentId) {
        self.parked_scripts.retain(|script| script.document != document);
    }

    /// Number of scripts parked until their document can run scripts.
    #[must_use]
    pub fn parked_script_count(&self) -> usize {
        self.parked_scripts.len()
    }

    // ------------------------------------------------------------------
    // Windows
    // ------------------------------------------------------------------

    /// [§ 6.4.1](https://html.spec.whatwg.org/multipage/interaction.html#activation-notification)
    ///
    /// Record an activation-triggering input event in `window`.
    ///
    /// # Errors
    ///
    /// Fails if the window no longer exists.
    pub fn notify_user_activation(&mut self, window: WindowId) -> Result<(), LifecycleError> {
        self.windows
            .get_mut(window)
            .ok_or(LifecycleError::UnknownWindow(window))?
            .notify_user_activation();
        Ok(())
    }

    /// [§ 8.7.1 Simple dialogs](https://html.spec.whatwg.org/multipage/timers-and-user-prompts.html#cannot-show-simple-dialogs)
    ///
    /// "To determine if we cannot show simple dialogs given a Window window:
    ///  1. If the active sandboxing flag set of window's associated Document
    ///     has the sandboxed modals flag set, then return true.
    ///  2. ...
    ///  3. If window's relevant agent's event loop's termination nesting
    ///     level is nonzero, then optionally return true."
    ///
    /// Koala takes the option, so `alert()` and friends are blocked while
    /// `beforeunload`, `pagehide` or `unload` listeners run.
    ///
    /// # Errors
    ///
    /// Fails if the window no longer exists.
    pub fn may_show_simple_dialog(&self, window: WindowId) -> Result<bool, LifecycleError> {
        let document = self
            .windows
            .get(window)
            .ok_or(LifecycleError::UnknownWindow(window))?
            .associated_document();
        let sandboxed = self.doc(document)?.has_sandboxed_modals();
        Ok(!sandboxed && self.event_loop.termination_nesting_level() == 0)
    }

    /// [§ 9.4.3 Message channels](https://html.spec.whatwg.org/multipage/web-messaging.html#message-channels)
    ///
    /// Create two entangled ports, one owned by each window.
    ///
    /// # Errors
    ///
    /// Fails if either window no longer exists.
    pub fn create_message_channel(
        &mut self,
        first: WindowId,
        second: WindowId,
    ) -> Result<(MessagePortId, MessagePortId), LifecycleError> {
        for window in [first, second] {
            if !self.windows.contains(window) {
                return Err(LifecycleError::UnknownWindow(window));
            }
        }
        let port1 = self
            .message_ports
            .alloc_with(|id| MessagePort::new(id, first));
        let port2 = self
            .message_ports
            .alloc_with(|id| MessagePort::new(id, second));
        if let Some(port) = self.message_ports.get_mut(port1) {
            port.entangle(port2);
        }
        if let Some(port) = self.message_ports.get_mut(port2) {
            port.entangle(port1);
        }
        Ok((port1, port2))
    }

    /// [§ 9.4.4](https://html.spec.whatwg.org/multipage/web-messaging.html#disentangle)
    ///
    /// Disentangle every port owned by `window`, and its peers.
    pub(crate) fn disentangle_ports_of(&mut self, window: WindowId) {
        let owned: Vec<MessagePortId> = self
            .message_ports
            .iter()
            .filter(|(_, port)| port.owner() == window)
            .map(|(id, _)| id)
            .collect();
        for id in owned {
            let peer = self.message_ports.get_mut(id).and_then(MessagePort::disentangle);
            if let Some(peer) = peer.and_then(|peer| self.message_ports.get_mut(peer)) {
                let _ = peer.disentangle();
            }
            log::trace!(target: "lifecycle", "disentangled {id}");
        }
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// [§ 7.4.2.2 Beginning navigation](https://html.spec.whatwg.org/multipage/browsing-the-web.html#navigate)
    ///
    /// Start a navigation in `navigable`: allocate a navigation id, make it
    /// the navigable's ongoing navigation (replacing any previous one) and
    /// record it as the active document's during-loading navigation id.
    ///
    /// "If navigable's active document's unload counter is greater than 0,
    /// then ... return."
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::UnloadInProgress`] in that case, and fails
    /// if the navigable no longer exists.
    pub fn begin_navigation(
        &mut self,
        navigable: NavigableId,
    ) -> Result<NavigationId, LifecycleError> {
        let active = self
            .navigables
            .get(navigable)
            .ok_or(LifecycleError::UnknownNavigable(navigable))?
            .active_document();
        if let Some(document) = active
            && self.doc(document)?.is_unloading()
        {
            log::debug!(target: "lifecycle", "navigation of {navigable} refused: {document} is unloading");
            return Err(LifecycleError::UnloadInProgress(document));
        }

        let id = NavigationId(self.next_navigation_id);
        self.next_navigation_id += 1;
        if let Some(nav) = self.navigables.get_mut(navigable) {
            let replaced = nav.set_ongoing_navigation(Some(id));
            if let Some(replaced) = replaced {
                log::debug!(target: "lifecycle", "{navigable}: navigation {replaced:?} superseded");
            }
        }
        if let Some(document) = active {
            self.doc_mut(document)?.set_navigation_id(id);
        }
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Housekeeping
    // ------------------------------------------------------------------

    /// Remove destroyed documents from the arena. Returns how many were
    /// removed. Their ids stop resolving afterwards.
    pub fn collect_destroyed_documents(&mut self) -> usize {
        let destroyed: Vec<DocumentId> = self
            .documents
            .iter()
            .filter(|(_, doc)| doc.is_destroyed())
            .map(|(id, _)| id)
            .collect();
        for &id in &destroyed {
            let _ = self.documents.remove(id);
        }
        if !destroyed.is_empty() {
            log::debug!(target: "lifecycle", "collected {} destroyed document(s)", destroyed.len());
        }
        destroyed.len()
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("config", &self.config)
            .field("documents", &self.documents)
            .field("navigables", &self.navigables)
            .field("windows", &self.windows)
            .field("pending_tasks", &self.event_loop.len())
            .finish_non_exhaustive()
    }
}
