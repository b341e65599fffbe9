//! Document readiness and visibility.

use koala_dom::{
    DocumentId, DocumentReadyState, EventDetail, EventName, EventTarget, NavigableId,
    ReadinessTransition, VisibilityState,
};
use koala_html::TaskSource;

use crate::error::LifecycleError;
use crate::page::Page;

impl Page {
    /// [§ 3.1.2 Update the current document readiness](https://html.spec.whatwg.org/multipage/dom.html#update-the-current-document-readiness)
    ///
    /// Move `document` forward to `readiness` and fire `readystatechange`.
    /// Asking for the current readiness again does nothing; asking for an
    /// earlier one is refused.
    ///
    /// Reaching `complete` reports "finished loading" to the client right
    /// away if the document is the active document of a top-level
    /// traversable, and otherwise defers the report until
    /// [`Page::activate`].
    ///
    /// # Errors
    ///
    /// Fails if the document is unknown or destroyed.
    pub fn advance_readiness(
        &mut self,
        document: DocumentId,
        readiness: DocumentReadyState,
    ) -> Result<ReadinessTransition, LifecycleError> {
        let _ = self.live_doc(document)?;
        let now = self.now();
        let transition = self.doc_mut(document)?.advance_readiness(readiness, now);
        if transition != ReadinessTransition::Advanced {
            return Ok(transition);
        }
        log::debug!(target: "lifecycle", "{document}: readiness is now {readiness}");

        // STEP 4: "Fire an event named readystatechange at document."
        let _ = self.fire_event(
            EventTarget::Document(document),
            EventName::ReadyStateChange,
            EventDetail::None,
        );

        if readiness == DocumentReadyState::Complete {
            if self.is_top_level_active_document(document) {
                let url = self.doc(document)?.url().clone();
                self.client.page_did_finish_loading(&url);
            } else {
                self.doc_mut(document)?.defer_finished_loading_notification();
            }
        }
        Ok(transition)
    }

    /// [§ 6.2 Update the visibility state](https://html.spec.whatwg.org/multipage/interaction.html#update-the-visibility-state)
    ///
    /// "1. If document's visibility state equals visibilityState, then
    ///     return.
    ///  2. Set document's visibility state to visibilityState.
    ///  ...
    ///  7. Fire an event named visibilitychange at document, with its
    ///     bubbles attribute initialized to true."
    ///
    /// Returns `true` if the state changed.
    ///
    /// # Errors
    ///
    /// Fails if the document is unknown.
    pub fn update_visibility_state(
        &mut self,
        document: DocumentId,
        visibility_state: VisibilityState,
    ) -> Result<bool, LifecycleError> {
        if !self.doc_mut(document)?.set_visibility_state(visibility_state) {
            return Ok(false);
        }
        log::trace!(target: "lifecycle", "{document}: visibility is now {visibility_state}");
        let _ = self.fire_event(
            EventTarget::Document(document),
            EventName::VisibilityChange,
            EventDetail::None,
        );
        Ok(true)
    }

    /// [§ 7.3.1.1 System visibility state](https://html.spec.whatwg.org/multipage/document-sequences.html#system-visibility-state)
    ///
    /// "When a user-agent determines that the system visibility state for
    /// traversable navigable traversable has changed to newState, it must
    /// run the following steps:
    ///  1. Let navigables be the inclusive descendant navigables of
    ///     traversable's active document.
    ///  2. For each navigable of navigables:
    ///     1. Let document be navigable's active document.
    ///     2. Queue a global task on the user interaction task source given
    ///        document's relevant global object to update the visibility
    ///        state of document with newState."
    ///
    /// # Errors
    ///
    /// Fails if `traversable` is unknown or not a top-level traversable.
    pub fn set_system_visibility_state(
        &mut self,
        traversable: NavigableId,
        visibility_state: VisibilityState,
    ) -> Result<(), LifecycleError> {
        let navigable = self
            .navigables
            .get_mut(traversable)
            .ok_or(LifecycleError::UnknownNavigable(traversable))?;
        if !navigable.is_traversable() {
            return Err(LifecycleError::NotTraversable(traversable));
        }
        if !navigable.set_system_visibility_state(visibility_state) {
            return Ok(());
        }
        let Some(active) = navigable.active_document() else {
            return Ok(());
        };

        for navigable in self.inclusive_descendant_navigables(active) {
            let Some(document) = self.active_document_with_window(navigable) else {
                continue;
            };
            self.queue_global_task(TaskSource::UserInteraction, document, move |page| {
                if let Err(error) = page.update_visibility_state(document, visibility_state) {
                    log::warn!(target: "lifecycle", "visibility update for {document} failed: {error}");
                }
            });
        }
        Ok(())
    }
}
