//! The `beforeunload` guard.

use koala_dom::{DocumentId, Event, EventName, EventTarget};
use koala_html::Window;

use crate::error::LifecycleError;
use crate::page::Page;

/// What happened when `beforeunload` was fired at a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BeforeUnloadOutcome {
    /// The user was asked to confirm leaving the page.
    pub prompt_shown: bool,
    /// The user chose to stay on the page.
    pub prompt_canceled: bool,
}

impl Page {
    /// [§ 7.4.2.4 Checking if unloading is canceled](https://html.spec.whatwg.org/multipage/browsing-the-web.html#checking-if-unloading-is-canceled)
    ///
    /// For one document of the navigables being unloaded:
    ///
    /// "1. Increase the document's unload counter by 1.
    ///  2. Increase the event loop's termination nesting level by 1.
    ///  3. Let event be the result of creating an event using
    ///     BeforeUnloadEvent.
    ///  4. Initialize event's type attribute to beforeunload and its
    ///     cancelable attribute true.
    ///  5. Dispatch event at document's relevant global object.
    ///  6. Decrease the event loop's termination nesting level by 1.
    ///  7. If all of the following are true:
    ///     - unloadPromptShown is false;
    ///     - document's active sandboxing flag set does not have its
    ///       sandboxed modals flag set;
    ///     - document's relevant global object has sticky activation; and
    ///     - event's canceled flag is set, or the returnValue attribute of
    ///       event is set to a non-empty string,
    ///     then:
    ///     1. Set unloadPromptShown to true.
    ///     2. ... ask the user to confirm that they wish to unload the
    ///        document ...
    ///     3. If the user did not confirm the page navigation, set
    ///        unloadPromptCanceled to true.
    ///  8. Decrease document's unload counter by 1."
    ///
    /// `prompt_already_shown` carries `unloadPromptShown` over from
    /// documents checked earlier in the same navigation. Prompts are only
    /// shown if [`crate::PageConfig::unload_prompts`] allows them.
    ///
    /// # Errors
    ///
    /// Fails if the document is unknown, destroyed, or already being
    /// unloaded.
    pub fn fire_beforeunload(
        &mut self,
        document: DocumentId,
        prompt_already_shown: bool,
    ) -> Result<BeforeUnloadOutcome, LifecycleError> {
        let doc = self.live_doc(document)?;
        if doc.is_unloading() {
            return Err(LifecycleError::UnloadInProgress(document));
        }
        let mut outcome = BeforeUnloadOutcome {
            prompt_shown: prompt_already_shown,
            prompt_canceled: false,
        };
        let Some(window) = doc.window() else {
            return Ok(outcome);
        };

        // STEP 1-2
        let unloading = doc.enter_unload();
        let nesting = self.event_loop.enter_termination_nesting();

        // STEP 3-5
        let mut event = Event::new(EventName::BeforeUnload, EventTarget::Window(window)).cancelable();
        let _ = self.dispatch_event(&mut event);

        // STEP 6
        drop(nesting);

        // STEP 7
        let sandboxed = self.doc(document)?.has_sandboxed_modals();
        let sticky_activation = self
            .window(window)
            .is_some_and(Window::has_sticky_activation);
        let requested = event.default_prevented() || !event.return_value().is_empty();
        if !outcome.prompt_shown && !sandboxed && sticky_activation && requested {
            if self.config.unload_prompts {
                outcome.prompt_shown = true;
                let confirmed = self.client.page_did_request_unload_confirmation(document);
                outcome.prompt_canceled = !confirmed;
            } else {
                log::debug!(target: "lifecycle", "{document}: unload prompt suppressed by configuration");
            }
        }

        // STEP 8
        drop(unloading);
        log::debug!(target: "lifecycle", "beforeunload at {document}: {outcome:?}");
        Ok(outcome)
    }
}
