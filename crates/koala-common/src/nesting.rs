//! Scoped nesting counters.
//!
//! Several lifecycle algorithms bracket their work with "increase X by 1" and
//! "decrease X by 1" steps, for example the event loop's
//! [termination nesting level](https://html.spec.whatwg.org/multipage/webappapis.html#termination-nesting-level)
//! and a document's
//! [unload counter](https://html.spec.whatwg.org/multipage/document-lifecycle.html#unload-counter).
//!
//! [`NestingCounter::enter`] performs the increase and hands back a
//! [`NestingGuard`] that performs the matching decrease when it is dropped,
//! so every exit path of the bracketed algorithm is balanced.
//!
//! The counter is shared through an `Rc<Cell<_>>` so a guard does not borrow
//! the object that owns the counter; the guarded algorithm can keep mutating
//! that object (and re-enter it) while the guard is alive.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// A non-negative counter that is only changed through [`NestingGuard`]s.
#[derive(Clone, Default)]
pub struct NestingCounter {
    level: Rc<Cell<u32>>,
}

impl NestingCounter {
    /// Create a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increase the counter by one until the returned guard is dropped.
    #[must_use = "the counter is decreased again as soon as the guard is dropped"]
    pub fn enter(&self) -> NestingGuard {
        self.level.set(self.level.get() + 1);
        NestingGuard {
            level: Rc::clone(&self.level),
        }
    }

    /// The current nesting depth.
    #[must_use]
    pub fn get(&self) -> u32 {
        self.level.get()
    }

    /// Whether at least one guard is alive.
    #[must_use]
    pub fn is_nonzero(&self) -> bool {
        self.level.get() > 0
    }
}

impl fmt::Debug for NestingCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NestingCounter").field(&self.level.get()).finish()
    }
}

/// RAII guard returned by [`NestingCounter::enter`].
///
/// On drop the counter is decreased by one.
pub struct NestingGuard {
    level: Rc<Cell<u32>>,
}

impl Drop for NestingGuard {
    fn drop(&mut self) {
        // enter() is the only way to obtain a guard, so the level is >= 1 here.
        self.level.set(self.level.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_restores_level() {
        let counter = NestingCounter::new();
        {
            let _outer = counter.enter();
            assert_eq!(counter.get(), 1);
            {
                let _inner = counter.enter();
                assert_eq!(counter.get(), 2);
            }
            assert_eq!(counter.get(), 1);
        }
        assert_eq!(counter.get(), 0);
        assert!(!counter.is_nonzero());
    }

    #[test]
    fn test_guard_released_on_early_return() {
        fn bail_out(counter: &NestingCounter, early: bool) -> Option<u32> {
            let _guard = counter.enter();
            if early {
                return None;
            }
            Some(counter.get())
        }

        let counter = NestingCounter::new();
        assert_eq!(bail_out(&counter, true), None);
        assert_eq!(counter.get(), 0);
        assert_eq!(bail_out(&counter, false), Some(1));
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn test_clones_share_level() {
        let counter = NestingCounter::new();
        let alias = counter.clone();
        let _guard = alias.enter();
        assert_eq!(counter.get(), 1);
    }
}
