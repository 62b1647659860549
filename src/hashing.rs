//! Hash spreading and bucket-array sizing.
//!
//! Keys are hashed by the map's `BuildHasher` into a `u64`, folded to a
//! 32-bit raw hash, then spread so that the high bits take part in bucket
//! selection. Bucket indices are always `spread_hash & (capacity - 1)`.

/// Capacity used when the map is first materialized without a size hint.
pub const DEFAULT_INITIAL_CAPACITY: usize = 1 << 4;

/// The bucket array never grows beyond this many buckets.
pub const MAXIMUM_CAPACITY: usize = 1 << 30;

pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// A chain longer than this is converted into a tree.
pub const TREEIFY_THRESHOLD: usize = 8;

/// A tree with at most this many entries is converted back into a chain.
pub const UNTREEIFY_THRESHOLD: usize = 6;

/// Below this capacity a crowded chain triggers a resize instead of a treeify.
pub const MIN_TREEIFY_CAPACITY: usize = 64;

/// XOR-folds the upper 16 bits of `raw` into the lower 16.
///
/// Small tables only look at the low bits of a hash; without this, keys
/// differing only in their high bits would all land in the same bucket.
/// `spread(0) == 0`.
#[inline]
pub const fn spread(raw: u32) -> u32 {
    raw ^ (raw >> 16)
}

/// Reduces a 64-bit hasher output to the 32-bit raw hash used for indexing.
#[inline]
pub const fn fold(hash: u64) -> u32 {
    (hash ^ (hash >> 32)) as u32
}

/// Smallest power of two `>= requested`, clamped to [`MAXIMUM_CAPACITY`].
///
/// `table_size_for(0) == table_size_for(1) == 1`.
pub const fn table_size_for(requested: usize) -> usize {
    if requested >= MAXIMUM_CAPACITY {
        return MAXIMUM_CAPACITY;
    }
    // Fill every bit below the highest set bit of `requested - 1`.
    let mut n = requested.saturating_sub(1);
    n |= n >> 1;
    n |= n >> 2;
    n |= n >> 4;
    n |= n >> 8;
    n |= n >> 16;
    n + 1
}

/// Bucket index of `hash` in a table of `capacity` buckets (a power of two).
#[inline]
pub(crate) const fn bucket_index(hash: u32, capacity: usize) -> usize {
    (hash as usize) & (capacity - 1)
}
