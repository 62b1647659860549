//! Arena-allocated entries shared by chain and tree buckets.
//!
//! Every entry lives in one `SlotMap` for the lifetime of the map; buckets
//! refer to entries by `NodeKey`. A resize therefore only rewrites links and
//! never moves keys or values. Back-references (`parent`, `prev`) are plain
//! keys and carry no ownership.

use slotmap::SlotMap;

slotmap::new_key_type! {
    pub(crate) struct NodeKey;
}

pub(crate) type Arena<K, V> = SlotMap<NodeKey, Node<K, V>>;

#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) hash: u32,
    pub(crate) key: K,
    pub(crate) value: V,
    /// Chain successor, or traversal successor while the bucket is a tree.
    pub(crate) next: Option<NodeKey>,
    pub(crate) tree: TreeLinks,
}

impl<K, V> Node<K, V> {
    pub(crate) fn new(hash: u32, key: K, value: V) -> Self {
        Self {
            hash,
            key,
            value,
            next: None,
            tree: TreeLinks::default(),
        }
    }
}

/// Links that are only meaningful while the entry sits in a tree bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TreeLinks {
    pub(crate) parent: Option<NodeKey>,
    pub(crate) left: Option<NodeKey>,
    pub(crate) right: Option<NodeKey>,
    /// Traversal predecessor; `Node::next` is the successor.
    pub(crate) prev: Option<NodeKey>,
    pub(crate) red: bool,
}
