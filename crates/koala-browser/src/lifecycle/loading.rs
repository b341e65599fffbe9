//! The end of loading.

use koala_dom::{DocumentId, DocumentReadyState, EventDetail, EventName, EventTarget};
use koala_html::{Navigable, TaskSource};

use crate::error::LifecycleError;
use crate::page::Page;

impl Page {
    /// [§ 13.2.7 The end](https://html.spec.whatwg.org/multipage/parsing.html#the-end)
    ///
    /// Called once the parser has stopped: the parser is detached, the
    /// document becomes `interactive`, and a task on the DOM manipulation
    /// task source finishes the load:
    ///
    /// "1. Update the current document readiness to "complete".
    ///  2. If the Document object's browsing context is null, then abort
    ///     these steps.
    ///  3. Let window be the Document's relevant global object.
    ///  ...
    ///  5. Fire an event named load at window, with legacy target override
    ///     flag set.
    ///  ...
    ///  7. Set the Document's during-loading navigation ID for WebDriver
    ///     BiDi to null.
    ///  ...
    ///  10. Set the Document's page showing flag to true.
    ///  11. Fire a page transition event named pageshow at window with
    ///      false.
    ///  12. Completely finish loading the Document."
    ///
    /// # Errors
    ///
    /// Fails if the document is unknown or destroyed.
    pub fn finish_loading(&mut self, document: DocumentId) -> Result<(), LifecycleError> {
        let _ = self.live_doc(document)?;
        self.doc_mut(document)?.detach_parser();
        let _ = self.advance_readiness(document, DocumentReadyState::Interactive)?;

        self.queue_global_task(TaskSource::DomManipulation, document, move |page| {
            if let Err(error) = page.complete_load(document) {
                log::warn!(target: "lifecycle", "finishing the load of {document} failed: {error}");
            }
        });
        Ok(())
    }

    fn complete_load(&mut self, document: DocumentId) -> Result<(), LifecycleError> {
        // STEP 1
        let _ = self.advance_readiness(document, DocumentReadyState::Complete)?;

        // STEP 2-3
        let doc = self.live_doc(document)?;
        let (Some(_), Some(window)) = (doc.browsing_context(), doc.window()) else {
            return Ok(());
        };

        // STEP 5
        let _ = self.fire_event(EventTarget::Window(window), EventName::Load, EventDetail::None);

        // STEP 7
        let _ = self.doc_mut(document)?.take_navigation_id();

        // STEP 9-11
        let doc = self.doc_mut(document)?;
        if doc.is_page_showing() {
            log::warn!(target: "lifecycle", "{document} was already showing when it finished loading");
        }
        doc.set_page_showing(true);
        let _ = self.fire_event(
            EventTarget::Window(window),
            EventName::PageShow,
            EventDetail::PageTransition { persisted: false },
        );

        // STEP 12
        self.completely_finish_loading(document)
    }

    /// [§ 7.4.6.1](https://html.spec.whatwg.org/multipage/document-lifecycle.html#completely-finish-loading)
    ///
    /// "To completely finish loading a Document document:
    ///  1. Assert: document's browsing context is non-null.
    ///  2. Set document's completely loaded time to the current time.
    ///  3. Let container be document's node navigable's container.
    ///  ...
    ///  5. Otherwise, if container is non-null, then queue an element task
    ///     on the DOM manipulation task source given container to fire an
    ///     event named load at container."
    fn completely_finish_loading(&mut self, document: DocumentId) -> Result<(), LifecycleError> {
        if self.doc(document)?.is_destroyed() {
            return Ok(());
        }
        let now = self.now();
        self.doc_mut(document)?.mark_completely_loaded(now);

        let Some(navigable) = self.doc(document)?.navigable() else {
            return Ok(());
        };
        let Some(container_document) = self
            .navigable(navigable)
            .and_then(Navigable::container_document)
        else {
            return Ok(());
        };
        self.queue_global_task(TaskSource::DomManipulation, container_document, move |page| {
            let container_alive = page
                .document(container_document)
                .is_some_and(|doc| !doc.is_destroyed())
                && page.navigable(navigable).is_some();
            if container_alive {
                let _ = page.fire_event(
                    EventTarget::Container(navigable),
                    EventName::Load,
                    EventDetail::None,
                );
            }
        });
        log::debug!(target: "lifecycle", "{document} completely loaded");
        Ok(())
    }
}
