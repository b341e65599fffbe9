//! Document objects for the Koala browser.
//!
//! This crate provides the per-document lifecycle state following the
//! [DOM Living Standard](https://dom.spec.whatwg.org/) and the
//! [HTML Living Standard](https://html.spec.whatwg.org/multipage/document-lifecycle.html),
//! the events fired while a document moves through that lifecycle, and the
//! arena every browser object lives in.
//!
//! # Design
//!
//! Documents, windows, navigables and session history entries reference each
//! other in cycles (document → window → navigable → history entry →
//! document). Instead of shared pointers, every object is owned by exactly one
//! [`Arena`] and referred to by a typed id ([`DocumentId`], [`NavigableId`],
//! ...). Ids are resolved through the arena at use time, so a destroyed object
//! is simply a missing slot.

pub mod document;
pub mod event;

pub use document::{
    ActiveParser, Document, DocumentLoadTimingInfo, DocumentReadyState, ReadinessTransition,
    VisibilityState,
};
pub use event::{Event, EventDetail, EventName, EventTarget};

use std::fmt;
use std::marker::PhantomData;

/// A type-safe index into an [`Arena`].
///
/// Ids are never reused: once a slot is removed, its id resolves to `None`
/// forever.
pub trait ArenaId: Copy + Eq + fmt::Debug {
    /// Build the id for slot `index`.
    fn from_index(index: usize) -> Self;

    /// The slot index this id refers to.
    fn index(self) -> usize;
}

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub usize);

        impl ArenaId for $name {
            fn from_index(index: usize) -> Self {
                Self(index)
            }

            fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

arena_id!(
    /// [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)
    DocumentId
);

arena_id!(
    /// [§ 7.3.1 Navigables](https://html.spec.whatwg.org/multipage/document-sequences.html#navigables)
    NavigableId
);

arena_id!(
    /// [§ 7.2.2 The Window object](https://html.spec.whatwg.org/multipage/nav-history-apis.html#the-window-object)
    WindowId
);

arena_id!(
    /// [§ 7.3.2 Browsing contexts](https://html.spec.whatwg.org/multipage/document-sequences.html#browsing-context)
    BrowsingContextId
);

arena_id!(
    /// [§ 7.4.1.1 Session history entries](https://html.spec.whatwg.org/multipage/browsing-the-web.html#session-history-entry)
    HistoryEntryId
);

arena_id!(
    /// [§ 9.4.4 Message ports](https://html.spec.whatwg.org/multipage/web-messaging.html#message-ports)
    MessagePortId
);

/// Identifier of an in-flight navigation.
///
/// [§ 7.4.2.1 Navigation](https://html.spec.whatwg.org/multipage/browsing-the-web.html#navigation-id)
///
/// "A navigable has an ongoing navigation, which is a navigation ID, ..."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NavigationId(pub u64);

/// Slot storage owning every object of one kind.
///
/// Modeled on an arena DOM tree: objects live in a contiguous vector and all
/// relationships are expressed as indices. Unlike a tree arena, slots can be
/// emptied; removing an object is how it stops existing.
pub struct Arena<I, T> {
    slots: Vec<Option<T>>,
    live: usize,
    _id: PhantomData<I>,
}

impl<I: ArenaId, T> Arena<I, T> {
    /// Create an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
            _id: PhantomData,
        }
    }

    /// Allocate a new object, building it from the id it will live at.
    pub fn alloc_with(&mut self, build: impl FnOnce(I) -> T) -> I {
        let id = I::from_index(self.slots.len());
        self.slots.push(Some(build(id)));
        self.live += 1;
        id
    }

    /// Get an object by id.
    #[must_use]
    pub fn get(&self, id: I) -> Option<&T> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Get a mutable reference to an object by id.
    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Whether `id` still resolves to an object.
    #[must_use]
    pub fn contains(&self, id: I) -> bool {
        self.get(id).is_some()
    }

    /// Remove an object, returning it if it was still present.
    pub fn remove(&mut self, id: I) -> Option<T> {
        let removed = self.slots.get_mut(id.index()).and_then(Option::take);
        if removed.is_some() {
            self.live -= 1;
        }
        removed
    }

    /// Number of live objects.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// Whether the arena holds no live objects.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterate over live objects in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|value| (I::from_index(index), value)))
    }

    /// Ids of all live objects in allocation order.
    #[must_use]
    pub fn ids(&self) -> Vec<I> {
        self.iter().map(|(id, _)| id).collect()
    }
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T: fmt::Debug> fmt::Debug for Arena<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
