//! Document lifecycle state.
//!
//! [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)
//! [§ 7.6 Document lifecycle](https://html.spec.whatwg.org/multipage/document-lifecycle.html)
//!
//! A [`Document`] here is only the part of a document the lifecycle
//! coordinator cares about: readiness, salvageability, the unload counter,
//! history back-references and load bookkeeping. The node tree, style and
//! layout belong to other subsystems.
//!
//! The setters are shaped so the lifecycle invariants cannot be broken from
//! outside: readiness only moves forward, `salvageable` can only be cleared,
//! and the unload counter is only changed through scoped guards.

use std::fmt;
use std::time::Duration;

use koala_common::nesting::{NestingCounter, NestingGuard};
use strum_macros::{AsRefStr, Display};
use url::Url;

use crate::{BrowsingContextId, DocumentId, HistoryEntryId, NavigableId, NavigationId, WindowId};

/// [§ 3.1.2 Resource metadata management](https://html.spec.whatwg.org/multipage/dom.html#current-document-readiness)
///
/// "Each Document has a current document readiness, a string, initially
/// "complete"."
///
/// Documents created for a navigation start out as `Loading`. The variants
/// are ordered so that readiness can only advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum DocumentReadyState {
    /// "The Document is still loading."
    Loading,
    /// "The document has finished loading and the document has been parsed
    /// but sub-resources such as scripts, images, stylesheets and frames are
    /// still loading."
    Interactive,
    /// "The document and all sub-resources have finished loading."
    Complete,
}

/// [§ 6.2 Page visibility](https://html.spec.whatwg.org/multipage/interaction.html#page-visibility)
///
/// "A Document has a visibility state, which is either "hidden" or
/// "visible", initially set to "hidden"."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum VisibilityState {
    /// "hidden"
    Hidden,
    /// "visible"
    Visible,
}

/// Outcome of [`Document::advance_readiness`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessTransition {
    /// The document already had the requested readiness.
    Unchanged,
    /// The readiness moved forward.
    Advanced,
    /// The requested readiness is behind the current one and was ignored.
    Refused,
}

/// [Navigation Timing § 4.1](https://html.spec.whatwg.org/multipage/dom.html#document-load-timing-info)
///
/// "The document load timing info struct has the following items: ..."
///
/// Times are relative to the page's time origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentLoadTimingInfo {
    /// "DOM interactive time"
    pub dom_interactive_time: Option<Duration>,
    /// "DOM complete time"
    pub dom_complete_time: Option<Duration>,
}

/// The HTML parser seen from the lifecycle coordinator.
///
/// [§ 13.2.7 Aborting a parser](https://html.spec.whatwg.org/multipage/parsing.html#abort-a-parser)
///
/// Parsing itself is done elsewhere; the coordinator only ever needs to stop
/// it.
pub trait ActiveParser {
    /// "Throw away any pending content in the input stream, and discard any
    /// future content that would have been added to it."
    fn abort(&mut self);
}

/// A document's lifecycle state.
#[allow(clippy::struct_excessive_bools)]
pub struct Document {
    id: DocumentId,

    /// [§ 4.5](https://dom.spec.whatwg.org/#concept-document-url)
    /// "Each document has an associated ... URL"
    url: Url,

    /// The navigable this document was created in. A document is that
    /// navigable's "node navigable" only while it is its active document.
    navigable: Option<NavigableId>,

    /// [§ 7.3.2](https://html.spec.whatwg.org/multipage/document-sequences.html#concept-document-bc)
    /// "A Document has a browsing context, which is either null or a browsing
    /// context."
    browsing_context: Option<BrowsingContextId>,

    /// The document's relevant global object.
    window: Option<WindowId>,

    readiness: DocumentReadyState,
    load_timing_info: DocumentLoadTimingInfo,
    parser_associated: bool,
    active_parser: Option<Box<dyn ActiveParser>>,

    /// [§ 13.2.7](https://html.spec.whatwg.org/multipage/parsing.html#active-parser-was-aborted)
    active_parser_was_aborted: bool,

    /// [§ 7.6](https://html.spec.whatwg.org/multipage/document-lifecycle.html#concept-document-salvageable)
    /// "Documents have a salvageable state, which must initially be true"
    salvageable: bool,

    /// [§ 7.6](https://html.spec.whatwg.org/multipage/document-lifecycle.html#unload-counter)
    /// "Document objects have an unload counter, which is used to ignore
    /// certain operations while the below algorithms run. Initially, the
    /// counter must be set to zero."
    unload_counter: NestingCounter,

    /// [§ 7.6](https://html.spec.whatwg.org/multipage/document-lifecycle.html#page-showing)
    /// "A Document has a boolean page showing, initially false."
    page_showing: bool,

    visibility_state: VisibilityState,

    /// [§ 7.4.1.1](https://html.spec.whatwg.org/multipage/browsing-the-web.html#latest-entry)
    /// "Each Document has a latest entry, a session history entry or null."
    latest_entry: Option<HistoryEntryId>,

    /// [§ 7.4.6.3](https://html.spec.whatwg.org/multipage/document-lifecycle.html#completely-loaded-time)
    completely_loaded_time: Option<Duration>,

    /// [§ 7.4.2.3](https://html.spec.whatwg.org/multipage/document-lifecycle.html#concept-document-navigation-id)
    /// "During-loading navigation ID for WebDriver BiDi"
    navigation_id: Option<NavigationId>,

    /// Set when the document became complete before it had a navigable to
    /// report "finished loading" through.
    needs_finished_loading_notification: bool,

    /// Scripts may only run once the first history step has been applied.
    ready_to_run_scripts: bool,

    /// [§ 7.1.5](https://html.spec.whatwg.org/multipage/browsers.html#sandboxed-modals-flag)
    sandboxed_modals: bool,

    has_been_unloaded: bool,
    destroyed: bool,
}

impl Document {
    /// Create the document for a committed response.
    #[must_use]
    pub fn new(id: DocumentId, url: Url, navigable: Option<NavigableId>) -> Self {
        Self {
            id,
            url,
            navigable,
            browsing_context: None,
            window: None,
            readiness: DocumentReadyState::Loading,
            load_timing_info: DocumentLoadTimingInfo::default(),
            parser_associated: false,
            active_parser: None,
            active_parser_was_aborted: false,
            salvageable: true,
            unload_counter: NestingCounter::new(),
            page_showing: false,
            visibility_state: VisibilityState::Hidden,
            latest_entry: None,
            completely_loaded_time: None,
            navigation_id: None,
            needs_finished_loading_notification: false,
            ready_to_run_scripts: false,
            sandboxed_modals: false,
            has_been_unloaded: false,
            destroyed: false,
        }
    }

    /// This document's id.
    #[must_use]
    pub const fn id(&self) -> DocumentId {
        self.id
    }

    /// The document's URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Replace the document's URL (same-document navigations).
    pub fn set_url(&mut self, url: Url) {
        self.url = url;
    }

    /// The navigable this document was created in.
    #[must_use]
    pub const fn navigable(&self) -> Option<NavigableId> {
        self.navigable
    }

    /// The document's browsing context, `None` once destroyed.
    #[must_use]
    pub const fn browsing_context(&self) -> Option<BrowsingContextId> {
        self.browsing_context
    }

    /// Associate the document with a browsing context.
    pub fn set_browsing_context(&mut self, browsing_context: Option<BrowsingContextId>) {
        self.browsing_context = browsing_context;
    }

    /// The document's relevant global object, `None` once released.
    #[must_use]
    pub const fn window(&self) -> Option<WindowId> {
        self.window
    }

    /// Associate the document with its window.
    pub fn set_window(&mut self, window: Option<WindowId>) {
        self.window = window;
    }

    /// The current document readiness.
    #[must_use]
    pub const fn readiness(&self) -> DocumentReadyState {
        self.readiness
    }

    /// [§ 3.1.2 Update the current document readiness](https://html.spec.whatwg.org/multipage/dom.html#update-the-current-document-readiness)
    ///
    /// Performs the state part of the algorithm; firing `readystatechange`
    /// is left to the caller, which must only do so on
    /// [`ReadinessTransition::Advanced`].
    ///
    /// STEP 1: "If document's current document readiness equals
    ///          readinessValue, then return."
    ///
    /// Going backwards is refused: readiness only ever advances.
    pub fn advance_readiness(
        &mut self,
        readiness: DocumentReadyState,
        now: Duration,
    ) -> ReadinessTransition {
        if self.readiness == readiness {
            return ReadinessTransition::Unchanged;
        }
        if readiness < self.readiness {
            log::warn!(
                target: "lifecycle",
                "{}: refusing readiness {} -> {}",
                self.id,
                self.readiness,
                readiness
            );
            return ReadinessTransition::Refused;
        }

        // STEP 2: "Set document's current document readiness to readinessValue."
        self.readiness = readiness;

        // STEP 3: "If document is associated with an HTML parser, then:"
        if self.parser_associated {
            let timing = &mut self.load_timing_info;
            match readiness {
                // "If readinessValue is "complete", and document's load timing
                // info's DOM complete time is 0, then set ... to now."
                DocumentReadyState::Complete => {
                    let _ = timing.dom_complete_time.get_or_insert(now);
                }
                // "Otherwise, if readinessValue is "interactive", and ... DOM
                // interactive time is 0, then set ... to now."
                DocumentReadyState::Interactive => {
                    let _ = timing.dom_interactive_time.get_or_insert(now);
                }
                DocumentReadyState::Loading => {}
            }
        }
        ReadinessTransition::Advanced
    }

    /// The document's load timing info.
    #[must_use]
    pub const fn load_timing_info(&self) -> &DocumentLoadTimingInfo {
        &self.load_timing_info
    }

    /// Attach the parser that is producing this document.
    pub fn set_active_parser(&mut self, parser: Box<dyn ActiveParser>) {
        self.parser_associated = true;
        self.active_parser = Some(parser);
    }

    /// Detach the parser once it has stopped on its own.
    pub fn detach_parser(&mut self) {
        self.active_parser = None;
    }

    /// [§ 13.2.1](https://html.spec.whatwg.org/multipage/parsing.html#active-parser)
    #[must_use]
    pub const fn has_active_parser(&self) -> bool {
        self.active_parser.is_some()
    }

    /// Abort the active parser, if any. Returns `true` if a parser was
    /// actually aborted.
    ///
    /// [§ 7.6 Aborting a document load](https://html.spec.whatwg.org/multipage/document-lifecycle.html#abort-a-document)
    ///
    /// "If document has an active parser, then:
    ///  1. Set document's active parser was aborted to true.
    ///  2. Abort that parser.
    ///  3. Set document's salvageable state to false."
    pub fn abort_active_parser(&mut self) -> bool {
        let Some(mut parser) = self.active_parser.take() else {
            return false;
        };
        self.active_parser_was_aborted = true;
        parser.abort();
        self.mark_unsalvageable();
        true
    }

    /// Whether an in-flight parse was ever aborted.
    #[must_use]
    pub const fn active_parser_was_aborted(&self) -> bool {
        self.active_parser_was_aborted
    }

    /// Whether the document may be kept in the back/forward cache.
    #[must_use]
    pub const fn is_salvageable(&self) -> bool {
        self.salvageable
    }

    /// Clear the salvageable state. There is no way back to `true`.
    pub fn mark_unsalvageable(&mut self) {
        if self.salvageable {
            log::trace!(target: "lifecycle", "{}: no longer salvageable", self.id);
        }
        self.salvageable = false;
    }

    /// Increase the unload counter until the returned guard is dropped.
    #[must_use = "the unload counter is decreased again as soon as the guard is dropped"]
    pub fn enter_unload(&self) -> NestingGuard {
        self.unload_counter.enter()
    }

    /// Current value of the unload counter.
    #[must_use]
    pub fn unload_counter(&self) -> u32 {
        self.unload_counter.get()
    }

    /// Whether an unload or beforeunload is running for this document.
    #[must_use]
    pub fn is_unloading(&self) -> bool {
        self.unload_counter.is_nonzero()
    }

    /// Whether the page is showing.
    #[must_use]
    pub const fn is_page_showing(&self) -> bool {
        self.page_showing
    }

    /// Set the page showing flag.
    pub fn set_page_showing(&mut self, page_showing: bool) {
        self.page_showing = page_showing;
    }

    /// The document's visibility state.
    #[must_use]
    pub const fn visibility_state(&self) -> VisibilityState {
        self.visibility_state
    }

    /// Set the visibility state. Returns `true` if it changed.
    pub fn set_visibility_state(&mut self, visibility_state: VisibilityState) -> bool {
        if self.visibility_state == visibility_state {
            return false;
        }
        self.visibility_state = visibility_state;
        true
    }

    /// The document's latest session history entry.
    #[must_use]
    pub const fn latest_entry(&self) -> Option<HistoryEntryId> {
        self.latest_entry
    }

    /// Update the latest entry back-reference.
    pub fn set_latest_entry(&mut self, entry: Option<HistoryEntryId>) {
        self.latest_entry = entry;
    }

    /// When the document completely finished loading.
    #[must_use]
    pub const fn completely_loaded_time(&self) -> Option<Duration> {
        self.completely_loaded_time
    }

    /// Whether the document completely finished loading.
    #[must_use]
    pub const fn is_completely_loaded(&self) -> bool {
        self.completely_loaded_time.is_some()
    }

    /// Record the completely-loaded time. Only the first call has an effect.
    pub fn mark_completely_loaded(&mut self, now: Duration) {
        let _ = self.completely_loaded_time.get_or_insert(now);
    }

    /// The during-loading navigation id.
    #[must_use]
    pub const fn navigation_id(&self) -> Option<NavigationId> {
        self.navigation_id
    }

    /// Set the during-loading navigation id.
    pub fn set_navigation_id(&mut self, navigation_id: NavigationId) {
        self.navigation_id = Some(navigation_id);
    }

    /// Clear the during-loading navigation id, returning it.
    pub fn take_navigation_id(&mut self) -> Option<NavigationId> {
        self.navigation_id.take()
    }

    /// Remember that "finished loading" must be reported on activation.
    pub fn defer_finished_loading_notification(&mut self) {
        self.needs_finished_loading_notification = true;
    }

    /// Consume the deferred "finished loading" flag.
    pub fn take_finished_loading_notification(&mut self) -> bool {
        std::mem::take(&mut self.needs_finished_loading_notification)
    }

    /// Whether a "finished loading" notification is pending activation.
    #[must_use]
    pub const fn needs_finished_loading_notification(&self) -> bool {
        self.needs_finished_loading_notification
    }

    /// Whether scripts may run for this document.
    #[must_use]
    pub const fn is_ready_to_run_scripts(&self) -> bool {
        self.ready_to_run_scripts
    }

    /// Allow scripts to run. Returns `true` if the flag flipped.
    pub fn mark_ready_to_run_scripts(&mut self) -> bool {
        !std::mem::replace(&mut self.ready_to_run_scripts, true)
    }

    /// Whether the sandboxed modals flag is set.
    #[must_use]
    pub const fn has_sandboxed_modals(&self) -> bool {
        self.sandboxed_modals
    }

    /// Set the sandboxed modals flag.
    pub fn set_sandboxed_modals(&mut self, sandboxed: bool) {
        self.sandboxed_modals = sandboxed;
    }

    /// Whether `unload` has run for this document.
    #[must_use]
    pub const fn has_been_unloaded(&self) -> bool {
        self.has_been_unloaded
    }

    /// Record that `unload` ran.
    pub fn mark_unloaded(&mut self) {
        self.has_been_unloaded = true;
    }

    /// Whether the document has been destroyed.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Record destruction and drop every association the document owns.
    pub fn mark_destroyed(&mut self) {
        self.destroyed = true;
        self.salvageable = false;
        self.active_parser = None;
        self.browsing_context = None;
        self.window = None;
        self.latest_entry = None;
        self.navigation_id = None;
        self.needs_finished_loading_notification = false;
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("url", &self.url.as_str())
            .field("readiness", &self.readiness)
            .field("salvageable", &self.salvageable)
            .field("unload_counter", &self.unload_counter.get())
            .field("page_showing", &self.page_showing)
            .field("latest_entry", &self.latest_entry)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}
