//! Ordering of keys that share a spread hash inside a tree bucket.
//!
//! A tree bucket sorts entries by hash first. Entries with equal hashes are
//! sorted by the map's [`TieBreak`] policy:
//!
//! - [`KeyOrder`] uses the key's `Ord`, so a lookup among equal hashes
//!   descends a single path and stays O(log n).
//! - [`InsertionOrder`] imposes nothing on the key type. Equal-hash entries
//!   keep insertion order and a lookup that meets one has to search both
//!   subtrees.
//!
//! A policy may also answer `None` (or `Equal` for keys that are not `Eq`)
//! for some pairs; lookups fall back to the two-subtree search there.

use core::cmp::Ordering;

/// Comparator used on a hash tie, as stored and passed around internally.
pub(crate) type TieBreakFn<Q> = fn(&Q, &Q) -> Option<Ordering>;

/// Orders two keys (or borrowed forms of keys) whose spread hashes are equal.
///
/// An implementation must agree with `Eq` on the key and be a total order
/// wherever it returns `Some`. For borrowed lookups it must also agree with
/// the owned key's order, as `Borrow` already requires of `Ord`.
pub trait TieBreak<Q: ?Sized> {
    fn tie_break(a: &Q, b: &Q) -> Option<Ordering>;
}

/// Equal-hash entries stay in insertion order. Works for any key type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InsertionOrder;

impl<Q: ?Sized> TieBreak<Q> for InsertionOrder {
    #[inline]
    fn tie_break(_: &Q, _: &Q) -> Option<Ordering> {
        None
    }
}

/// Equal-hash entries are sorted by the key's `Ord`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyOrder;

impl<Q: ?Sized + Ord> TieBreak<Q> for KeyOrder {
    #[inline]
    fn tie_break(a: &Q, b: &Q) -> Option<Ordering> {
        Some(a.cmp(b))
    }
}
