//! Debug-only detection of overlapping operations on one map.
//!
//! Each public operation holds an [`Access`] token for its duration. An
//! operation that starts while another is still running on the same map
//! (a key's `Eq` or `Hash` calling back into the map through a raw pointer,
//! say) finds the map busy and panics in debug builds. Release builds keep
//! no state and the token is a zero-sized marker.
//!
//! The tracker uses a `Cell`, so a map embedding it is `!Sync` but stays
//! `Send`: it can be handed to another thread or shared behind a mutex.

use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug, Default)]
pub(crate) struct AccessTracker {
    #[cfg(debug_assertions)]
    busy: Cell<bool>,
    _not_sync: PhantomData<Cell<()>>,
}

impl AccessTracker {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            busy: Cell::new(false),
            _not_sync: PhantomData,
        }
    }

    /// Marks the map busy until the returned token drops.
    #[inline]
    pub(crate) fn enter(&self) -> Access<'_> {
        #[cfg(debug_assertions)]
        {
            let was_busy = self.busy.replace(true);
            assert!(
                !was_busy,
                "map re-entered while another operation on it was in progress"
            );
            Access { tracker: self }
        }

        #[cfg(not(debug_assertions))]
        {
            Access {
                _tracker: PhantomData,
            }
        }
    }
}

pub(crate) struct Access<'a> {
    #[cfg(debug_assertions)]
    tracker: &'a AccessTracker,
    #[cfg(not(debug_assertions))]
    _tracker: PhantomData<&'a AccessTracker>,
}

impl Drop for Access<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.tracker.busy.set(false);
    }
}
