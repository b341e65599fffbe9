//! Lifecycle events.
//!
//! [§ 2.2 Interface Event](https://dom.spec.whatwg.org/#interface-event)
//!
//! Only the events fired by the document lifecycle are modeled. Dispatch
//! (listeners, propagation) is done by the page that owns the windows; an
//! [`Event`] carries just enough state for listeners to observe the
//! transition and, for cancelable events, to cancel it.

use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::{DocumentId, NavigableId, WindowId};

/// [§ 8.1.8.2 Event names](https://html.spec.whatwg.org/multipage/indices.html#events-2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum EventName {
    /// Fired at the Document when its readiness changes.
    ReadyStateChange,
    /// Fired at the Document when its visibility state changes.
    VisibilityChange,
    /// Fired at the Window when the page starts being shown.
    PageShow,
    /// Fired at the Window when the page stops being shown.
    PageHide,
    /// Fired at the Window when the document is going away.
    Unload,
    /// Fired at the Window before the document is unloaded; cancelable.
    BeforeUnload,
    /// Fired at the Window, and at the container, once loading finished.
    Load,
    /// Fired at the Window on same-document history traversals.
    PopState,
    /// Fired at the Window when the URL fragment changed.
    HashChange,
    /// Fired at the Navigation object when the current entry changed.
    CurrentEntryChange,
}

/// Where an event is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    /// A document's relevant global object.
    Window(WindowId),
    /// The document itself.
    Document(DocumentId),
    /// The container element (iframe, frame) hosting a child navigable, in
    /// its parent document.
    Container(NavigableId),
}

/// Interface-specific event attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum EventDetail {
    /// A plain `Event`.
    None,
    /// [§ 7.4.6.5 PageTransitionEvent](https://html.spec.whatwg.org/multipage/nav-history-apis.html#pagetransitionevent)
    PageTransition {
        /// "Returns false if the page is newly being loaded ... Returns true
        /// if the page is being restored from (or added to) the bfcache."
        persisted: bool,
    },
    /// [§ 7.2.5.2 HashChangeEvent](https://html.spec.whatwg.org/multipage/nav-history-apis.html#hashchangeevent)
    HashChange {
        /// The serialization of the URL before the traversal.
        old_url: String,
        /// The serialization of the URL after the traversal.
        new_url: String,
    },
    /// [§ 7.2.5.1 PopStateEvent](https://html.spec.whatwg.org/multipage/nav-history-apis.html#popstateevent)
    PopState {
        /// The history object's state.
        state: Value,
    },
}

/// A lifecycle event being dispatched.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    name: EventName,
    target: EventTarget,
    cancelable: bool,
    canceled: bool,
    return_value: String,
    detail: EventDetail,
}

impl Event {
    /// Create a non-cancelable event.
    #[must_use]
    pub const fn new(name: EventName, target: EventTarget) -> Self {
        Self {
            name,
            target,
            cancelable: false,
            canceled: false,
            return_value: String::new(),
            detail: EventDetail::None,
        }
    }

    /// Make the event cancelable.
    #[must_use]
    pub const fn cancelable(mut self) -> Self {
        self.cancelable = true;
        self
    }

    /// Attach interface-specific attributes.
    #[must_use]
    pub fn with_detail(mut self, detail: EventDetail) -> Self {
        self.detail = detail;
        self
    }

    /// The event type.
    #[must_use]
    pub const fn name(&self) -> EventName {
        self.name
    }

    /// The dispatch target.
    #[must_use]
    pub const fn target(&self) -> EventTarget {
        self.target
    }

    /// Whether listeners may cancel the event.
    #[must_use]
    pub const fn is_cancelable(&self) -> bool {
        self.cancelable
    }

    /// The interface-specific attributes.
    #[must_use]
    pub const fn detail(&self) -> &EventDetail {
        &self.detail
    }

    /// [§ 2.2](https://dom.spec.whatwg.org/#dom-event-preventdefault)
    ///
    /// "The preventDefault() method steps are to set the canceled flag for
    /// this if its cancelable attribute value is true ..."
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.canceled = true;
        }
    }

    /// Whether the canceled flag is set.
    #[must_use]
    pub const fn default_prevented(&self) -> bool {
        self.canceled
    }

    /// [§ 7.6.2 BeforeUnloadEvent](https://html.spec.whatwg.org/multipage/nav-history-apis.html#dom-beforeunloadevent-returnvalue)
    ///
    /// Setting a non-empty return value also requests a confirmation prompt.
    pub fn set_return_value(&mut self, value: impl Into<String>) {
        self.return_value = value.into();
    }

    /// The beforeunload return value.
    #[must_use]
    pub fn return_value(&self) -> &str {
        &self.return_value
    }
}
