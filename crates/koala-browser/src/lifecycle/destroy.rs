//! Destroying documents.

use koala_dom::{DocumentId, EventTarget, NavigableId};
use koala_html::{CompletionBarrier, EventLoop, Navigable, TaskSource};

use crate::error::LifecycleError;
use crate::page::{Continuation, Page};

impl Page {
    /// [§ 7.6.3 Destroying documents](https://html.spec.whatwg.org/multipage/document-lifecycle.html#destroy-a-document)
    ///
    /// "To destroy a Document document:
    ///  1. Assert: this is running as part of a task queued on document's
    ///     relevant agent's event loop.
    ///  2. Abort document.
    ///  3. Set document's salvageable state to false.
    ///  4. Let ports be the list of MessagePorts whose relevant global
    ///     object's associated Document is document.
    ///  5. For each port in ports, disentangle port.
    ///  6. Run any unloading document cleanup steps for document ...
    ///  7. Remove any tasks whose document is document from any task queue
    ///     (without running those tasks).
    ///  8. Set document's browsing context to null.
    ///  9. Set document's node navigable's active session history entry's
    ///     document state's document to null."
    ///
    /// Child navigables go first: every document still alive in them is
    /// destroyed and the navigables are removed, whether or not they ever
    /// had an active document. The window is released, and the navigable
    /// is removed once no live document belongs to it any more. The document itself stays in the
    /// arena as a tombstone until [`Page::collect_destroyed_documents`].
    /// Destroying a destroyed document does nothing.
    ///
    /// # Errors
    ///
    /// Fails if the document is unknown.
    pub fn destroy(&mut self, document: DocumentId) -> Result<(), LifecycleError> {
        if self.doc(document)?.is_destroyed() {
            log::trace!(target: "lifecycle", "{document} already destroyed");
            return Ok(());
        }
        self.discard_child_navigables(document);

        // STEP 2-3
        self.abort(document)?;
        self.doc_mut(document)?.mark_unsalvageable();

        // STEP 4-5
        let window = self.doc(document)?.window();
        if let Some(window) = window {
            self.disentangle_ports_of(window);
        }

        // STEP 6
        self.discard_parked_scripts(document);

        // STEP 7
        let removed = self
            .event_loop
            .remove_tasks_matching(|task| task.document() == Some(document));
        if removed > 0 {
            log::debug!(target: "lifecycle", "{document}: dropped {removed} queued task(s)");
        }

        // STEP 9
        let navigable = self.doc(document)?.navigable();
        let latest_entry = self.doc(document)?.latest_entry();
        let active_entry = navigable
            .and_then(|navigable| self.navigables.get(navigable))
            .and_then(Navigable::active_entry);
        for entry in [active_entry, latest_entry].into_iter().flatten() {
            if let Some(entry) = self.history_entries.get_mut(entry)
                && entry.document_state.document == Some(document)
            {
                entry.document_state.document = None;
            }
        }

        // STEP 8, plus releasing the window.
        if let Some(window) = window {
            let _ = self.windows.remove(window);
            self.remove_listeners_at(EventTarget::Window(window));
        }
        if let Some(navigable) = navigable.and_then(|navigable| self.navigables.get_mut(navigable)) {
            if navigable.active_document() == Some(document) {
                let _ = navigable.replace_active_document(None);
            }
            if window.is_some() && navigable.window_proxy() == window {
                navigable.set_window_proxy(None);
            }
        }
        self.remove_listeners_at(EventTarget::Document(document));
        self.doc_mut(document)?.mark_destroyed();

        if let Some(navigable) = navigable {
            self.remove_navigable_if_unused(navigable);
        }
        self.client.page_did_destroy_document(document);
        log::debug!(target: "lifecycle", "destroyed {document}");
        Ok(())
    }

    /// Drop `navigable` (and the session history it owns) once none of its
    /// documents is alive.
    fn remove_navigable_if_unused(&mut self, navigable: NavigableId) {
        let in_use = self
            .documents
            .iter()
            .any(|(_, doc)| doc.navigable() == Some(navigable) && !doc.is_destroyed());
        if in_use {
            return;
        }
        self.remove_navigable(navigable);
    }

    /// Drop `navigable` together with its session history and container
    /// listeners.
    fn remove_navigable(&mut self, navigable: NavigableId) {
        let Some(mut removed) = self.navigables.remove(navigable) else {
            return;
        };
        for entry in removed.take_session_history() {
            let _ = self.history_entries.remove(entry);
        }
        self.remove_listeners_at(EventTarget::Container(navigable));
        log::debug!(target: "lifecycle", "removed {navigable}");
    }

    /// [§ 7.6.3](https://html.spec.whatwg.org/multipage/document-lifecycle.html#destroy-a-document-and-its-descendants)
    ///
    /// "To destroy a document and its descendants given a Document document
    /// and an optional set of steps afterAllDestruction, perform the
    /// following steps in parallel:
    ///  1. If document is not fully active, then: ...
    ///  2. Let childNavigables be document's child navigables.
    ///  3. Let numberDestroyed be 0.
    ///  4. For each childNavigable of childNavigables, queue a global task
    ///     on the navigation and traversal task source given
    ///     childNavigable's active window to perform the following steps:
    ///     1. Let incrementDestroyed be an algorithm step which increments
    ///        numberDestroyed.
    ///     2. Destroy a document and its descendants given childNavigable's
    ///        active document and incrementDestroyed.
    ///  5. Wait until numberDestroyed equals childNavigable's size.
    ///  6. Queue a global task ... to perform the following steps:
    ///     1. Destroy document.
    ///     2. If afterAllDestruction was given, then run it."
    ///
    /// Every level of the tree is one round trip through the event loop;
    /// `document` itself is destroyed directly once its children are gone.
    /// Child navigables without an active document are swept by
    /// [`Page::destroy`].
    ///
    /// # Errors
    ///
    /// Fails if the document is unknown, or if the event loop runs dry
    /// before every child has been destroyed.
    pub fn destroy_subtree(
        &mut self,
        document: DocumentId,
        after_all: Option<Continuation>,
    ) -> Result<(), LifecycleError> {
        let _ = self.doc(document)?;

        let children: Vec<DocumentId> = self
            .child_navigables(document)
            .into_iter()
            .filter_map(|navigable| self.active_document_with_window(navigable))
            .collect();

        let barrier = CompletionBarrier::new(children.len());
        for child in children {
            let signal = barrier.signal();
            self.queue_global_task(TaskSource::NavigationAndTraversal, child, move |page| {
                if let Err(error) = page.destroy_subtree(child, None) {
                    log::warn!(target: "lifecycle", "destroying {child} failed: {error}");
                }
                signal.complete();
            });
        }
        let _ = EventLoop::spin_processing_tasks_with_source_until(
            self,
            TaskSource::NavigationAndTraversal,
            |_| barrier.is_released(),
        )?;

        self.destroy(document)?;
        if let Some(after_all) = after_all {
            after_all(self);
        }
        Ok(())
    }

    /// Destroy whatever documents are still alive in `container`'s child
    /// navigables, then remove those navigables.
    fn discard_child_navigables(&mut self, container: DocumentId) {
        for navigable in self.child_navigables(container) {
            let leftovers: Vec<DocumentId> = self
                .documents
                .iter()
                .filter(|(_, doc)| doc.navigable() == Some(navigable) && !doc.is_destroyed())
                .map(|(id, _)| id)
                .collect();
            for leftover in leftovers {
                if let Err(error) = self.destroy(leftover) {
                    log::warn!(target: "lifecycle", "destroying {leftover} failed: {error}");
                }
            }
            self.remove_navigable(navigable);
        }
    }
}
