//! Unloading documents.

use std::cmp::Reverse;

use koala_dom::{DocumentId, EventDetail, EventName, EventTarget, VisibilityState};
use koala_html::{CompletionBarrier, EventLoop, TaskSource};

use crate::error::LifecycleError;
use crate::page::{Continuation, Page};

impl Page {
    /// [§ 7.6.4 Unloading documents](https://html.spec.whatwg.org/multipage/document-lifecycle.html#unload-a-document)
    ///
    /// Unload `document`, firing `pagehide` and `unload` at its window.
    /// `new_document` is the document replacing it, if any.
    ///
    /// The event loop's termination nesting level and the document's unload
    /// counter are raised for the duration of the algorithm and lowered
    /// again on every exit path.
    ///
    /// # Errors
    ///
    /// Fails if either document is unknown, `document` is destroyed, or
    /// `document` is already being unloaded (a listener trying to unload it
    /// again from inside its own unload).
    pub fn unload(
        &mut self,
        document: DocumentId,
        new_document: Option<DocumentId>,
    ) -> Result<(), LifecycleError> {
        if let Some(new_document) = new_document {
            let _ = self.doc(new_document)?;
        }
        let doc = self.live_doc(document)?;
        if doc.is_unloading() {
            return Err(LifecycleError::UnloadInProgress(document));
        }
        let window = doc.window();

        // STEP 4: "Let intendToKeepInBFCache be true if the user agent intends
        //          to keep oldDocument in the session history entry ..."
        let intend_to_keep_in_bfcache = self.config.back_forward_cache && doc.is_salvageable();

        // STEP 7: "Increase eventLoop's termination nesting level by 1."
        let nesting = self.event_loop.enter_termination_nesting();
        // STEP 8: "Increase oldDocument's unload counter by 1."
        let unloading = doc.enter_unload();

        // STEP 9: "If intendToKeepInBFCache is false, then set oldDocument's
        //          salvageable state to false."
        if !intend_to_keep_in_bfcache {
            self.doc_mut(document)?.mark_unsalvageable();
        }

        // STEP 10: "If oldDocument's page showing is true: ..."
        if self.doc(document)?.is_page_showing() {
            self.doc_mut(document)?.set_page_showing(false);
            let persisted = self.doc(document)?.is_salvageable();
            if let Some(window) = window {
                let _ = self.fire_event(
                    EventTarget::Window(window),
                    EventName::PageHide,
                    EventDetail::PageTransition { persisted },
                );
            }
            let _ = self.update_visibility_state(document, VisibilityState::Hidden)?;
        }

        // STEP 12: "If oldDocument's salvageable state is false, then fire an
        //           event named unload at oldDocument's relevant global
        //           object, with legacy target override flag set."
        if !self.doc(document)?.is_salvageable()
            && let Some(window) = window
        {
            let _ = self.fire_event(EventTarget::Window(window), EventName::Unload, EventDetail::None);
        }

        // STEP 14: "Decrease eventLoop's termination nesting level by 1."
        drop(nesting);
        // STEP 19: "Decrease oldDocument's unload counter by 1."
        drop(unloading);

        self.doc_mut(document)?.mark_unloaded();
        self.client.document_became_inactive(document);
        match new_document {
            Some(new_document) => {
                log::debug!(target: "lifecycle", "unloaded {document} for {new_document}");
            }
            None => log::debug!(target: "lifecycle", "unloaded {document}"),
        }
        Ok(())
    }

    /// [§ 7.6.4](https://html.spec.whatwg.org/multipage/document-lifecycle.html#unload-a-document-and-its-descendants)
    ///
    /// Unload `document` and every document below it, then destroy them all
    /// with [`Page::destroy_subtree`], which runs `after_all` at the end.
    ///
    /// One unload task per descendant navigable's active document is queued
    /// on the navigation and traversal task source, deepest navigables
    /// first, followed by one for `document` itself. The event loop is spun
    /// until all of them have run, so no document is destroyed before the
    /// whole subtree has been unloaded.
    ///
    /// # Errors
    ///
    /// Fails if the document is unknown or destroyed, or if the event loop
    /// runs dry before every unload task has completed. A task dropped
    /// because a listener destroyed its document still counts as
    /// completed.
    pub fn unload_subtree(
        &mut self,
        document: DocumentId,
        new_document: Option<DocumentId>,
        after_all: Option<Continuation>,
    ) -> Result<(), LifecycleError> {
        let _ = self.live_doc(document)?;

        let mut descendants: Vec<(usize, DocumentId)> = self
            .descendant_navigables(document)
            .into_iter()
            .filter_map(|navigable| {
                self.active_document_with_window(navigable)
                    .map(|active| (self.navigable_depth(navigable), active))
            })
            .collect();
        descendants.sort_by_key(|&(depth, _)| Reverse(depth));

        let barrier = CompletionBarrier::new(descendants.len() + 1);
        for (_, descendant) in descendants {
            let signal = barrier.signal();
            self.queue_global_task(TaskSource::NavigationAndTraversal, descendant, move |page| {
                if let Err(error) = page.unload(descendant, None) {
                    log::warn!(target: "lifecycle", "unloading {descendant} failed: {error}");
                }
                signal.complete();
            });
        }
        let signal = barrier.signal();
        self.queue_global_task(TaskSource::NavigationAndTraversal, document, move |page| {
            if let Err(error) = page.unload(document, new_document) {
                log::warn!(target: "lifecycle", "unloading {document} failed: {error}");
            }
            signal.complete();
        });

        let ran = EventLoop::spin_processing_tasks_with_source_until(
            self,
            TaskSource::NavigationAndTraversal,
            |_| barrier.is_released(),
        )?;
        log::debug!(
            target: "lifecycle",
            "unloaded subtree of {document}: {} document(s), {ran} task(s)",
            barrier.expected()
        );

        self.destroy_subtree(document, after_all)
    }
}
