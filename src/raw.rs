//! RawTreeMap: the hash-agnostic core.
//!
//! Every operation takes the entry's spread hash precomputed by the caller,
//! so this layer never runs user `Hash` code. It owns the entry arena, the
//! bucket array and the capacity/threshold state machine. Keys and values
//! it does not keep are handed back to the caller instead of dropped here.

use crate::chain::{self, ChainSeek};
use crate::hashing::{bucket_index, MIN_TREEIFY_CAPACITY, TREEIFY_THRESHOLD, UNTREEIFY_THRESHOLD};
use crate::node::{Arena, Node, NodeKey};
use crate::order::{InsertionOrder, TieBreak};
use crate::resize::{self, Growth};
use crate::table::{Bucket, BucketArray};
use crate::tree::{self, TreeInsert};
use core::borrow::Borrow;
use core::marker::PhantomData;
use core::mem;
use slotmap::SlotMap;

/// How `put_val` treats a key that is already present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PutMode {
    Overwrite,
    KeepExisting,
}

#[derive(Debug)]
pub(crate) enum PutOutcome<K, V> {
    Inserted(NodeKey),
    /// The key was present. `key` is the caller's duplicate key. `value` is
    /// the replaced value under `Overwrite`, or the caller's rejected value
    /// under `KeepExisting`.
    Occupied { node: NodeKey, key: K, value: V },
}

/// `O` orders equal-hash keys inside tree buckets.
#[derive(Debug)]
pub(crate) struct RawTreeMap<K, V, O = InsertionOrder> {
    nodes: Arena<K, V>,
    table: BucketArray,
    /// Resize when the entry count exceeds this. Before the first
    /// allocation it holds the requested initial capacity (0 = default).
    threshold: usize,
    load_factor: f32,
    _order: PhantomData<fn() -> O>,
}

impl<K, V, O> RawTreeMap<K, V, O> {
    /// `initial_capacity` must already be a power of two, or 0 for the
    /// default.
    pub(crate) fn new(initial_capacity: usize, load_factor: f32) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            table: BucketArray::default(),
            threshold: initial_capacity,
            load_factor,
            _order: PhantomData,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub(crate) fn load_factor(&self) -> f32 {
        self.load_factor
    }

    #[cfg(test)]
    pub(crate) fn threshold(&self) -> usize {
        self.threshold
    }

    pub(crate) fn entry(&self, node: NodeKey) -> (&K, &V) {
        let n = &self.nodes[node];
        (&n.key, &n.value)
    }

    pub(crate) fn value_mut(&mut self, node: NodeKey) -> &mut V {
        &mut self.nodes[node].value
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.nodes.values().map(|n| (&n.key, &n.value))
    }

    /// Detaches every entry and hands the old arena back for the caller to
    /// drop. The bucket array keeps its capacity.
    pub(crate) fn clear(&mut self) -> Arena<K, V> {
        self.table.clear();
        mem::take(&mut self.nodes)
    }
}

impl<K, V, O> RawTreeMap<K, V, O>
where
    O: TieBreak<K>,
{
    pub(crate) fn find<Q>(&self, hash: u32, q: &Q) -> Option<NodeKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        O: TieBreak<Q>,
    {
        let index = self.table.index_of(hash)?;
        match self.table.get(index) {
            Bucket::Empty => None,
            Bucket::Chain(head) => chain::find(&self.nodes, head, hash, q),
            Bucket::Tree(bin) => tree::find(&self.nodes, &bin, hash, q, O::tie_break),
        }
    }

    pub(crate) fn put_val(&mut self, hash: u32, key: K, value: V, mode: PutMode) -> PutOutcome<K, V>
    where
        K: Eq,
    {
        if !self.table.is_allocated() {
            self.resize();
        }
        let index = bucket_index(hash, self.table.capacity());

        let existing = match self.table.get(index) {
            Bucket::Empty => {
                let x = self.nodes.insert(Node::new(hash, key, value));
                self.table.set(index, Bucket::Chain(x));
                return self.after_insert(x);
            }
            Bucket::Chain(head) => match chain::seek(&self.nodes, head, hash, &key) {
                ChainSeek::Found(node) => (node, key, value),
                ChainSeek::Missing { tail, len } => {
                    let x = self.nodes.insert(Node::new(hash, key, value));
                    self.nodes[tail].next = Some(x);
                    if len + 1 > TREEIFY_THRESHOLD {
                        self.treeify_bin(index);
                    }
                    return self.after_insert(x);
                }
            },
            Bucket::Tree(mut bin) => {
                match tree::put_tree_val(&mut self.nodes, &mut bin, hash, key, value, O::tie_break) {
                    TreeInsert::Found { node, key, value } => (node, key, value),
                    TreeInsert::Inserted(x) => {
                        self.table.set(index, Bucket::Tree(bin));
                        return self.after_insert(x);
                    }
                }
            }
        };

        let (node, key, value) = existing;
        let value = match mode {
            PutMode::Overwrite => mem::replace(&mut self.nodes[node].value, value),
            PutMode::KeepExisting => value,
        };
        PutOutcome::Occupied { node, key, value }
    }

    fn after_insert(&mut self, x: NodeKey) -> PutOutcome<K, V> {
        if self.nodes.len() > self.threshold {
            self.resize();
        }
        PutOutcome::Inserted(x)
    }

    /// Converts the chain at `index` into a tree, or grows the table
    /// instead while it is too small for trees to pay off.
    fn treeify_bin(&mut self, index: usize) {
        if self.table.capacity() < MIN_TREEIFY_CAPACITY {
            self.resize();
            return;
        }
        if let Bucket::Chain(head) = self.table.get(index) {
            let bin = tree::treeify(&mut self.nodes, head, O::tie_break);
            tracing::trace!(bucket = index, len = bin.len, "treeified bucket");
            self.table.set(index, Bucket::Tree(bin));
        }
    }

    /// Doubles the bucket array (or allocates it) and redistributes every
    /// entry. The new array replaces the old one only once fully built.
    fn resize(&mut self) {
        let old_capacity = self.table.capacity();
        match resize::plan(old_capacity, self.threshold, self.load_factor) {
            Growth::Saturate => {
                self.threshold = usize::MAX;
                tracing::debug!(
                    capacity = old_capacity,
                    len = self.nodes.len(),
                    "bucket array at maximum capacity; growth disabled"
                );
            }
            Growth::Grow {
                capacity,
                threshold,
            } => {
                let old = mem::take(&mut self.table);
                self.table = resize::redistribute(&mut self.nodes, old, capacity, O::tie_break);
                self.threshold = threshold;
                tracing::debug!(
                    old_capacity,
                    new_capacity = capacity,
                    threshold,
                    len = self.nodes.len(),
                    "resized bucket array"
                );
            }
        }
    }

    pub(crate) fn remove<Q>(&mut self, hash: u32, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
        O: TieBreak<Q>,
    {
        let index = self.table.index_of(hash)?;
        let node = match self.table.get(index) {
            Bucket::Empty => return None,
            Bucket::Chain(head) => {
                let (rest, node) = chain::unlink(&mut self.nodes, head, hash, q)?;
                self.table.set(index, rest.map_or(Bucket::Empty, Bucket::Chain));
                node
            }
            Bucket::Tree(bin) => {
                let node = tree::find(&self.nodes, &bin, hash, q, O::tie_break)?;
                let bucket = match tree::remove_tree_node(&mut self.nodes, bin, node, O::tie_break) {
                    None => Bucket::Empty,
                    Some(rest) if rest.len <= UNTREEIFY_THRESHOLD => {
                        tracing::trace!(bucket = index, len = rest.len, "untreeified bucket");
                        Bucket::Chain(tree::untreeify(&mut self.nodes, rest.first))
                    }
                    Some(rest) => Bucket::Tree(rest),
                };
                self.table.set(index, bucket);
                node
            }
        };
        let removed = self.nodes.remove(node)?;
        Some((removed.key, removed.value))
    }
}

/// Shape of one bucket, for structural assertions in tests.
#[cfg(test)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Shape {
    Empty,
    Chain(usize),
    Tree(usize),
}

#[cfg(test)]
impl<K, V, O> RawTreeMap<K, V, O> {
    pub(crate) fn shape(&self, index: usize) -> Shape {
        match self.table.get(index) {
            Bucket::Empty => Shape::Empty,
            Bucket::Chain(head) => Shape::Chain(chain::len(&self.nodes, head)),
            Bucket::Tree(bin) => Shape::Tree(bin.len),
        }
    }

    /// Checks every structural invariant: each entry is reachable from
    /// exactly one bucket, sits at `hash & (capacity - 1)`, and tree buckets
    /// are valid red-black trees.
    pub(crate) fn validate(&self) -> Result<(), String>
    where
        O: TieBreak<K>,
    {
        use slotmap::SecondaryMap;

        if !self.table.is_allocated() {
            return if self.nodes.is_empty() {
                Ok(())
            } else {
                Err("entries without a bucket array".into())
            };
        }
        let capacity = self.table.capacity();
        if !capacity.is_power_of_two() {
            return Err(format!("capacity {capacity} is not a power of two"));
        }

        let mut seen: SecondaryMap<NodeKey, usize> = SecondaryMap::new();
        for (index, bucket) in self.table.iter() {
            let first = match bucket {
                Bucket::Empty => continue,
                Bucket::Chain(head) => head,
                Bucket::Tree(bin) => {
                    tree::check(&self.nodes, &bin, O::tie_break).map_err(|e| format!("bucket {index}: {e}"))?;
                    if bin.len <= UNTREEIFY_THRESHOLD {
                        return Err(format!("bucket {index}: tree with only {} entries", bin.len));
                    }
                    bin.first
                }
            };
            let mut cur = Some(first);
            while let Some(k) = cur {
                let node = self
                    .nodes
                    .get(k)
                    .ok_or_else(|| format!("bucket {index} links a freed entry"))?;
                if bucket_index(node.hash, capacity) != index {
                    return Err(format!(
                        "entry with hash {:#x} found in bucket {index}, expected {}",
                        node.hash,
                        bucket_index(node.hash, capacity)
                    ));
                }
                if seen.insert(k, index).is_some() {
                    return Err(format!("entry reachable twice (bucket {index})"));
                }
                cur = node.next;
            }
        }
        if seen.len() != self.nodes.len() {
            return Err(format!(
                "{} entries reachable, {} allocated",
                seen.len(),
                self.nodes.len()
            ));
        }
        Ok(())
    }
}
