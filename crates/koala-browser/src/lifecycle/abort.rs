//! Aborting document loads.

use koala_dom::{Document, DocumentId};
use koala_html::{Navigable, TaskSource};

use crate::error::LifecycleError;
use crate::page::Page;

impl Page {
    /// [§ 7.6.5 Aborting a document load](https://html.spec.whatwg.org/multipage/document-lifecycle.html#abort-a-document)
    ///
    /// "To abort a Document document:
    ///  1. Assert: this is running as part of a task queued on document's
    ///     relevant agent's event loop.
    ///  2. Cancel any instances of the fetch algorithm in the context of
    ///     document ...
    ///  3. If document's during-loading navigation ID for WebDriver BiDi is
    ///     non-null, then: ... set document's during-loading navigation ID
    ///     for WebDriver BiDi to null.
    ///  4. If document has an active parser, then:
    ///     1. Set document's active parser was aborted to true.
    ///     2. Abort that parser.
    ///     3. Set document's salvageable state to false."
    ///
    /// The navigable's ongoing navigation is cleared along with the
    /// document's navigation id. A document without an active parser stays
    /// salvageable. Aborting a destroyed document does nothing.
    ///
    /// # Errors
    ///
    /// Fails if the document is unknown.
    pub fn abort(&mut self, document: DocumentId) -> Result<(), LifecycleError> {
        let doc = self.doc_mut(document)?;
        if doc.is_destroyed() {
            return Ok(());
        }

        // STEP 3
        let navigation_id = doc.take_navigation_id();
        // STEP 4
        let parser_aborted = doc.abort_active_parser();
        let navigable = doc.navigable();

        if let Some(navigation_id) = navigation_id
            && let Some(navigable) = navigable.and_then(|navigable| self.navigables.get_mut(navigable))
            && navigable.ongoing_navigation() == Some(navigation_id)
        {
            let _ = navigable.set_ongoing_navigation(None);
        }
        if navigation_id.is_some() || parser_aborted {
            log::debug!(
                target: "lifecycle",
                "aborted {document} (navigation {navigation_id:?}, parser aborted: {parser_aborted})"
            );
        }
        Ok(())
    }

    /// [§ 7.6.5](https://html.spec.whatwg.org/multipage/document-lifecycle.html#abort-a-document-and-its-descendants)
    ///
    /// "To abort a document and its descendants given a Document document:
    ///  1. Assert: this is running as part of a task queued on document's
    ///     relevant agent's event loop.
    ///  2. Let descendantNavigables be document's descendant navigables.
    ///  3. For each descendantNavigable of descendantNavigables, queue a
    ///     global task on the navigation and traversal task source given
    ///     descendantNavigable's active window to perform the following
    ///     steps:
    ///     1. Let descendantDocument be descendantNavigable's active
    ///        document.
    ///     2. Abort descendantDocument.
    ///     3. If descendantDocument's salvageable is false, then set
    ///        document's salvageable to false.
    ///  4. Abort document."
    ///
    /// Nothing waits for the descendant tasks: `document` is aborted before
    /// any of them has run. Each task also clears its navigable's ongoing
    /// navigation.
    ///
    /// # Errors
    ///
    /// Fails if the document is unknown.
    pub fn abort_subtree(&mut self, document: DocumentId) -> Result<(), LifecycleError> {
        let _ = self.doc(document)?;

        for navigable in self.descendant_navigables(document) {
            let Some(owner) = self.active_document_with_window(navigable) else {
                continue;
            };
            self.queue_global_task(TaskSource::NavigationAndTraversal, owner, move |page| {
                if let Some(nav) = page.navigables.get_mut(navigable) {
                    let _ = nav.set_ongoing_navigation(None);
                }
                let Some(descendant) = page
                    .navigables
                    .get(navigable)
                    .and_then(Navigable::active_document)
                else {
                    return;
                };
                if let Err(error) = page.abort(descendant) {
                    log::warn!(target: "lifecycle", "aborting {descendant} failed: {error}");
                    return;
                }
                let descendant_salvageable = page
                    .document(descendant)
                    .is_some_and(Document::is_salvageable);
                if !descendant_salvageable && let Some(root) = page.document_mut(document) {
                    root.mark_unsalvageable();
                }
            });
        }

        self.abort(document)
    }
}
