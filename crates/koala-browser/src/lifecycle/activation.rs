//! Activation.

use koala_dom::{DocumentId, VisibilityState};
use koala_html::Navigable;

use crate::error::LifecycleError;
use crate::page::Page;

impl Page {
    /// [§ 7.4.2.3.4 Make active](https://html.spec.whatwg.org/multipage/browsing-the-web.html#make-active)
    ///
    /// "To make active a Document document:
    ///  1. Let window be document's relevant global object.
    ///  2. Set document's browsing context's WindowProxy's \[\[Window\]\]
    ///     internal slot value to window.
    ///  3. Set document's visibility state to document's node navigable's
    ///     traversable navigable's system visibility state.
    ///  4. Set window's relevant settings object's execution ready flag."
    ///
    /// The document also becomes its navigable's active document, scripts
    /// parked on the execution ready flag are released, and a "finished
    /// loading" notification deferred by [`Page::advance_readiness`] is
    /// delivered.
    ///
    /// # Errors
    ///
    /// Fails if the document is unknown, destroyed, or has no navigable.
    pub fn activate(&mut self, document: DocumentId) -> Result<(), LifecycleError> {
        let navigable_id = self.navigable_of(document)?;
        let doc = self.live_doc(document)?;
        let window = doc.window();
        let latest_entry = doc.latest_entry();
        let system_visibility_state = self
            .traversable_of(navigable_id)
            .and_then(|traversable| self.navigables.get(traversable))
            .map_or(VisibilityState::Hidden, Navigable::system_visibility_state);

        let Some(navigable) = self.navigables.get_mut(navigable_id) else {
            return Err(LifecycleError::UnknownNavigable(navigable_id));
        };
        let previous = navigable.replace_active_document(Some(document));
        // STEP 2
        navigable.set_window_proxy(window);
        if latest_entry.is_some() {
            navigable.set_active_entry(latest_entry);
        }
        let browsing_context = navigable.browsing_context();
        if let Some(previous) = previous.filter(|&previous| previous != document) {
            log::debug!(target: "lifecycle", "{navigable_id}: {document} replaces {previous}");
        }

        let doc = self.doc_mut(document)?;
        doc.set_browsing_context(Some(browsing_context));
        // STEP 3
        let _ = doc.set_visibility_state(system_visibility_state);

        // STEP 4
        if let Some(window) = window.and_then(|window| self.windows.get_mut(window)) {
            let _ = window.mark_execution_ready();
        }
        self.release_parked_scripts(document);

        if self.doc_mut(document)?.take_finished_loading_notification() {
            let url = self.doc(document)?.url().clone();
            self.client.page_did_finish_loading(&url);
        }
        log::debug!(target: "lifecycle", "activated {document} in {navigable_id}");
        Ok(())
    }
}
