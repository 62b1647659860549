//! tree-hashmap: a chained hash map whose crowded buckets escalate into
//! red-black trees, bounding worst-case lookups at O(log n) per bucket.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep average-case O(1) hashing while surviving adversarial or
//!   low-quality hashes without degrading to linear scans.
//! - Layers:
//!   - `RawTreeMap<K, V, O>`: hash-agnostic core. Takes precomputed spread
//!     hashes, owns the entry arena and the bucket array, and runs the
//!     insert / treeify / resize / remove state machine.
//!   - `TreeHashMap<K, V, S, O>`: public API. Hashes keys with `S`, folds and
//!     spreads the result, and holds a debug-only access guard around each
//!     operation.
//!
//! Storage
//! - Entries live in a `slotmap` arena and are linked by `NodeKey`. A
//!   bucket is empty, a singly linked chain, or a `TreeBin`: a red-black
//!   tree whose nodes also keep a doubly linked traversal list in
//!   insertion order.
//! - Resizing relinks entries by key; nothing is copied or re-hashed and
//!   keys stay valid for the lifetime of their entry.
//!
//! Escalation policy
//! - A chain that reaches more than `TREEIFY_THRESHOLD` entries becomes a
//!   tree, unless the table has fewer than `MIN_TREEIFY_CAPACITY` buckets,
//!   in which case the table doubles instead.
//! - A tree that drops to `UNTREEIFY_THRESHOLD` entries or fewer (after a
//!   removal or a resize split) goes back to a chain.
//! - Trees order nodes by hash. Among equal hashes the order policy `O`
//!   decides: `InsertionOrder` (the default, keys need only `Eq + Hash`)
//!   keeps insertion order and searches both subtrees on a tie, while
//!   `KeyOrder` (the `ordered_*` constructors, `K: Ord`) sorts by key and
//!   keeps every lookup on one root-to-leaf path.
//!
//! Hashing
//! - `BuildHasher` output is folded to 32 bits and spread (`h ^ h >> 16`)
//!   so high bits reach the bucket mask. The spread hash is stored per
//!   entry and reused for every later resize.
//!
//! Reentrancy
//! - User code runs inside an operation only through `K: Eq/Hash/Ord`. In
//!   debug builds, calling back into the same map from there panics.
//! - `get_or_insert_with` runs its closure between two guarded steps, and
//!   keys or values the map does not keep (duplicates, rejected or
//!   replaced values, cleared entries) drop after the operation ends. Their
//!   `Drop` may read the map. `remove` returns `(K, V)` only after the
//!   structure is consistent again.
//!
//! Threading
//! - `Send` but not `Sync`; share it behind a `Mutex`.

mod access;
mod chain;
mod config;
pub mod hashing;
mod map;
mod map_proptest;
mod node;
mod order;
mod raw;
mod resize;
mod table;
mod test_hashers;
mod tree;

// Public surface
pub use config::{ConfigError, MapConfig};
pub use map::TreeHashMap;
pub use order::{InsertionOrder, KeyOrder, TieBreak};
