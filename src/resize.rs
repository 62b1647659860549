//! Doubling resize.
//!
//! Capacities are powers of two, so doubling adds exactly one bit to the
//! bucket mask. An entry in old bucket `i` lands either in `i` (that bit of
//! its hash is 0) or in `i + old_capacity` (the bit is 1). Each old bucket
//! is split in a single pass over its entries, relinking them in place and
//! keeping their relative order; no hash is recomputed.

use crate::hashing::{
    bucket_index, DEFAULT_INITIAL_CAPACITY, MAXIMUM_CAPACITY, UNTREEIFY_THRESHOLD,
};
use crate::node::{Arena, NodeKey};
use crate::order::TieBreakFn;
use crate::table::{Bucket, BucketArray};
use crate::tree::{self, TreeBin};

/// What the next resize should do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Growth {
    Grow { capacity: usize, threshold: usize },
    /// Already at `MAXIMUM_CAPACITY`: stop growing, only lift the threshold.
    Saturate,
}

/// Computes the next capacity and threshold.
///
/// `threshold` doubles as the requested initial capacity while nothing is
/// allocated (`capacity == 0`); zero there means "use the default".
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn plan(capacity: usize, threshold: usize, load_factor: f32) -> Growth {
    let (new_capacity, mut new_threshold) = if capacity > 0 {
        if capacity >= MAXIMUM_CAPACITY {
            return Growth::Saturate;
        }
        let doubled = capacity << 1;
        if doubled < MAXIMUM_CAPACITY && capacity >= DEFAULT_INITIAL_CAPACITY {
            (doubled, threshold.saturating_mul(2))
        } else {
            (doubled, 0)
        }
    } else if threshold > 0 {
        (threshold, 0)
    } else {
        (DEFAULT_INITIAL_CAPACITY, 0)
    };

    if new_threshold == 0 {
        let ft = new_capacity as f32 * load_factor;
        new_threshold = if new_capacity < MAXIMUM_CAPACITY && ft < MAXIMUM_CAPACITY as f32 {
            ft as usize
        } else {
            usize::MAX
        };
    }
    Growth::Grow {
        capacity: new_capacity,
        threshold: new_threshold,
    }
}

/// Moves every entry of `old` into a fresh array of `new_capacity` buckets.
/// `tie` orders equal hashes in any tree half that has to be rebuilt.
pub(crate) fn redistribute<K, V>(
    nodes: &mut Arena<K, V>,
    old: BucketArray,
    new_capacity: usize,
    tie: TieBreakFn<K>,
) -> BucketArray {
    let old_capacity = old.capacity();
    let mut table = BucketArray::with_capacity(new_capacity);
    for (index, bucket) in old.iter() {
        match bucket {
            Bucket::Empty => {}
            Bucket::Chain(head) if nodes[head].next.is_none() => {
                table.set(bucket_index(nodes[head].hash, new_capacity), Bucket::Chain(head));
            }
            Bucket::Chain(head) => split_chain(nodes, head, index, old_capacity, &mut table),
            Bucket::Tree(bin) => split_tree(nodes, bin, index, old_capacity, &mut table, tie),
        }
    }
    table
}

/// Entries collected for one of the two destination buckets of a split.
#[derive(Debug, Default)]
struct Half {
    head: Option<NodeKey>,
    tail: Option<NodeKey>,
    len: usize,
}

impl Half {
    /// Appends `e`, keeping both `next` and the traversal `prev` link
    /// current. Chains simply ignore `prev`.
    fn push<K, V>(&mut self, nodes: &mut Arena<K, V>, e: NodeKey) {
        nodes[e].next = None;
        nodes[e].tree.prev = self.tail;
        match self.tail {
            Some(t) => nodes[t].next = Some(e),
            None => self.head = Some(e),
        }
        self.tail = Some(e);
        self.len += 1;
    }
}

/// Walks the list from `first`, routing each entry to the low or high half
/// by the hash bit `old_capacity` selects.
fn partition<K, V>(nodes: &mut Arena<K, V>, first: NodeKey, old_capacity: usize) -> (Half, Half) {
    let mut lo = Half::default();
    let mut hi = Half::default();
    let mut cur = Some(first);
    while let Some(e) = cur {
        cur = nodes[e].next;
        if (nodes[e].hash as usize) & old_capacity == 0 {
            lo.push(nodes, e);
        } else {
            hi.push(nodes, e);
        }
    }
    (lo, hi)
}

fn split_chain<K, V>(
    nodes: &mut Arena<K, V>,
    head: NodeKey,
    index: usize,
    old_capacity: usize,
    table: &mut BucketArray,
) {
    let (lo, hi) = partition(nodes, head, old_capacity);
    if let Some(h) = lo.head {
        table.set(index, Bucket::Chain(h));
    }
    if let Some(h) = hi.head {
        table.set(index + old_capacity, Bucket::Chain(h));
    }
}

fn split_tree<K, V>(
    nodes: &mut Arena<K, V>,
    bin: TreeBin,
    index: usize,
    old_capacity: usize,
    table: &mut BucketArray,
    tie: TieBreakFn<K>,
) {
    let (lo, hi) = partition(nodes, bin.first, old_capacity);
    for (half, at) in [(lo, index), (hi, index + old_capacity)] {
        let Some(head) = half.head else { continue };
        let bucket = if half.len <= UNTREEIFY_THRESHOLD {
            tracing::trace!(bucket = at, len = half.len, "untreeified bucket during split");
            Bucket::Chain(tree::untreeify(nodes, head))
        } else if half.len == bin.len {
            // Nothing moved out; the tree and its traversal order are intact.
            Bucket::Tree(bin)
        } else {
            Bucket::Tree(tree::treeify(nodes, head, tie))
        };
        table.set(at, bucket);
    }
}
