//! Applying session history steps to documents.

use koala_common::url::{equals_excluding_fragments, fragments_differ, indicated_fragment};
use koala_common::warning::warn_once;
use koala_dom::{Document, DocumentId, EventDetail, EventName, EventTarget, HistoryEntryId};
use koala_html::{NavigationType, TaskSource};
use serde_json::Value;
use url::Url;

use crate::error::LifecycleError;
use crate::page::Page;

/// The arguments of one history step application to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStepApplication {
    /// The session history entry the document now belongs to.
    pub entry: HistoryEntryId,
    /// Whether a document whose entry did not change must not be
    /// reactivated (it is finishing a synchronous navigation instead of
    /// coming back from the back/forward cache).
    pub do_not_reactivate: bool,
    /// `history.length` after the step.
    pub script_history_length: usize,
    /// `history.index` after the step.
    pub script_history_index: usize,
    /// How the step was reached; required when an existing document changes
    /// entry.
    pub navigation_type: Option<NavigationType>,
    /// The Navigation API entry list; required for the first step of a new
    /// document.
    pub entries_for_navigation_api: Option<Vec<HistoryEntryId>>,
    /// Whether the Navigation API entries should be touched at all.
    pub update_navigation_api: bool,
}

impl HistoryStepApplication {
    /// A step to `entry` with a single-entry history and nothing else set.
    #[must_use]
    pub const fn new(entry: HistoryEntryId) -> Self {
        Self {
            entry,
            do_not_reactivate: false,
            script_history_length: 1,
            script_history_index: 0,
            navigation_type: None,
            entries_for_navigation_api: None,
            update_navigation_api: true,
        }
    }

    /// Set how the step was reached.
    #[must_use]
    pub const fn with_navigation_type(mut self, navigation_type: NavigationType) -> Self {
        self.navigation_type = Some(navigation_type);
        self
    }

    /// Set the Navigation API entry list for a new document.
    #[must_use]
    pub fn with_navigation_api_entries(mut self, entries: Vec<HistoryEntryId>) -> Self {
        self.entries_for_navigation_api = Some(entries);
        self
    }

    /// Set `history.length` and `history.index`.
    #[must_use]
    pub const fn with_script_history(mut self, length: usize, index: usize) -> Self {
        self.script_history_length = length;
        self.script_history_index = index;
        self
    }

    /// Do not reactivate the document if its entry is unchanged.
    #[must_use]
    pub const fn without_reactivation(mut self) -> Self {
        self.do_not_reactivate = true;
        self
    }
}

impl Page {
    /// [§ 7.4.6.2 Updating the document](https://html.spec.whatwg.org/multipage/browsing-the-web.html#update-document-for-history-step-application)
    ///
    /// "To update document for history step application given a Document
    /// document, a session history entry entry, a boolean doNotReactivate,
    /// integers scriptHistoryLength and scriptHistoryIndex, NavigationType
    /// or null navigationType, an optional list of session history entries
    /// entriesForNavigationAPI, and an optional session history entry
    /// previousEntryForActivation:
    ///  1. Let documentIsNew be true if document's latest entry is null;
    ///     otherwise false.
    ///  2. Let documentsEntryChanged be true if document's latest entry is
    ///     not entry; otherwise false.
    ///  3. Set document's history object's index to scriptHistoryIndex.
    ///  4. Set document's history object's length to scriptHistoryLength.
    ///  5. Let navigation be history's relevant global object's navigation
    ///     API.
    ///  6. If documentsEntryChanged is true, then: ...
    ///  8. If documentIsNew is true, then:
    ///     1. Try to scroll to the fragment for document.
    ///     2. At this point scripts may run for the newly-created document
    ///        document.
    ///  9. Otherwise, if documentsEntryChanged is false and doNotReactivate
    ///     is false, then: ... Reactivate document ..."
    ///
    /// For an existing document that changes entry, `popstate` is fired
    /// synchronously and `hashchange` (only if the fragment changed) is
    /// queued on the DOM manipulation task source, so it is always observed
    /// after `popstate`.
    ///
    /// # Errors
    ///
    /// Fails, before changing anything, if the document or entry is unknown,
    /// the document is destroyed, an existing document changes entry without
    /// a navigation type, a new document has no Navigation API entries, or
    /// the entry's classic history state cannot be deserialized.
    pub fn apply_history_step(
        &mut self,
        document: DocumentId,
        step: HistoryStepApplication,
    ) -> Result<(), LifecycleError> {
        let doc = self.live_doc(document)?;
        let window = doc.window();
        let latest_entry = doc.latest_entry();
        let entry = self
            .history_entries
            .get(step.entry)
            .ok_or(LifecycleError::UnknownHistoryEntry(step.entry))?;

        // STEP 1
        let document_is_new = latest_entry.is_none();
        // STEP 2
        let entry_changed = latest_entry != Some(step.entry);

        if entry_changed && document_is_new && step.entries_for_navigation_api.is_none() {
            return Err(LifecycleError::MissingNavigationEntries(document));
        }
        if entry_changed && !document_is_new && step.navigation_type.is_none() {
            return Err(LifecycleError::MissingNavigationType(document));
        }
        let restored_state: Option<Value> = if entry_changed {
            Some(entry.classic_history_api_state()?)
        } else {
            None
        };
        let entry_url = entry.url().clone();
        let old_url = latest_entry
            .and_then(|latest| self.history_entries.get(latest))
            .map_or_else(|| doc.url().clone(), |latest| latest.url().clone());

        // STEP 3-4
        if let Some(window) = window.and_then(|window| self.windows.get_mut(window)) {
            window.history.index = step.script_history_index;
            window.history.length = step.script_history_length;
        }

        // STEP 6
        if let Some(state) = restored_state {
            self.attach_to_entry(document, step.entry);
            // "Restore the history object state given document and entry."
            if let Some(window) = window.and_then(|window| self.windows.get_mut(window)) {
                window.history.state = state;
            }
            if document_is_new {
                self.initialize_navigation_entries(document, &step);
            } else {
                self.apply_same_document_step(document, &step, &old_url, entry_url);
            }
        }

        // STEP 8
        if document_is_new {
            let url = self.doc(document)?.url().clone();
            self.client
                .page_did_request_scroll_to_fragment(document, indicated_fragment(&url));
            if self.doc_mut(document)?.mark_ready_to_run_scripts() {
                self.release_parked_scripts(document);
            }
        }
        // STEP 9
        else if !entry_changed && !step.do_not_reactivate {
            warn_once(
                "lifecycle",
                "reactivating a document from the back/forward cache is not supported",
            );
        }
        Ok(())
    }

    /// Make `entry` the document's latest entry and the entry's document the
    /// document.
    fn attach_to_entry(&mut self, document: DocumentId, entry: HistoryEntryId) {
        let navigable = self.documents.get_mut(document).and_then(|doc| {
            doc.set_latest_entry(Some(entry));
            doc.navigable()
        });
        if let Some(state) = self.history_entries.get_mut(entry) {
            state.document_state.document = Some(document);
            state.document_state.ever_populated = true;
        }
        if let Some(navigable) = navigable.and_then(|navigable| self.navigables.get_mut(navigable))
            && navigable.active_document() == Some(document)
        {
            navigable.set_active_entry(Some(entry));
        }
    }

    /// STEP 6.5: "Otherwise: ... Initialize the navigation API entries for a
    /// new document given navigation, entriesForNavigationAPI, and entry."
    fn initialize_navigation_entries(&mut self, document: DocumentId, step: &HistoryStepApplication) {
        if !step.update_navigation_api {
            return;
        }
        let Some(entries) = step.entries_for_navigation_api.clone() else {
            return;
        };
        let window = self.documents.get(document).and_then(Document::window);
        if let Some(window) = window.and_then(|window| self.windows.get_mut(window)) {
            window.navigation.initialize_for_new_document(entries, step.entry);
        }
    }

    /// STEP 6.4: "If documentIsNew is false, then: ..."
    fn apply_same_document_step(
        &mut self,
        document: DocumentId,
        step: &HistoryStepApplication,
        old_url: &Url,
        entry_url: Url,
    ) {
        let window = self.documents.get(document).and_then(Document::window);
        if !equals_excluding_fragments(old_url, &entry_url) {
            log::trace!(target: "history", "{document}: {old_url} -> {entry_url}");
        }
        let fragment_changed = fragments_differ(old_url, &entry_url);
        let new_url = entry_url.to_string();
        if let Some(doc) = self.documents.get_mut(document) {
            doc.set_url(entry_url);
        }
        let Some(window) = window else {
            return;
        };

        // "Update the navigation API entries for a same-document navigation
        // given navigation, entry, and navigationType."
        if step.update_navigation_api
            && let Some(navigation_type) = step.navigation_type
        {
            let disposed = self.windows.get_mut(window).map(|window| {
                window
                    .navigation
                    .update_for_same_document_navigation(step.entry, navigation_type)
            });
            if let Some(disposed) = disposed.filter(|disposed| !disposed.is_empty()) {
                log::trace!(target: "history", "{document}: disposed navigation entries {disposed:?}");
            }
            let _ = self.fire_event(
                EventTarget::Window(window),
                EventName::CurrentEntryChange,
                EventDetail::None,
            );
        }

        // "Fire an event named popstate at document's relevant global object,
        // using PopStateEvent, with the state attribute initialized to
        // document's history object's state ..."
        let state = self
            .windows
            .get(window)
            .map_or(Value::Null, |window| window.history.state.clone());
        let _ = self.fire_event(
            EventTarget::Window(window),
            EventName::PopState,
            EventDetail::PopState { state },
        );

        // "Restore persisted state given entry."
        warn_once("history", "restoring persisted user state is not supported");

        // "If oldURL's fragment is not equal to entry's URL's fragment, then
        // queue a global task on the DOM manipulation task source given
        // document's relevant global object to fire an event named hashchange
        // at document's relevant global object, using HashChangeEvent ..."
        if fragment_changed {
            let detail = EventDetail::HashChange {
                old_url: old_url.to_string(),
                new_url,
            };
            self.queue_global_task(TaskSource::DomManipulation, document, move |page| {
                if page.window(window).is_some() {
                    let _ = page.fire_event(EventTarget::Window(window), EventName::HashChange, detail);
                }
            });
        }
    }
}
