//! List-form buckets: singly linked through `Node::next`.

use crate::node::{Arena, NodeKey};
use core::borrow::Borrow;

/// Outcome of walking a chain in search of a key.
pub(crate) enum ChainSeek {
    Found(NodeKey),
    /// Key absent; `tail` is the last entry and `len` the chain length.
    Missing { tail: NodeKey, len: usize },
}

pub(crate) fn find<K, V, Q>(nodes: &Arena<K, V>, head: NodeKey, hash: u32, q: &Q) -> Option<NodeKey>
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    let mut cur = Some(head);
    while let Some(k) = cur {
        let node = &nodes[k];
        // Integer compare first; `Eq` may be arbitrarily expensive.
        if node.hash == hash && node.key.borrow() == q {
            return Some(k);
        }
        cur = node.next;
    }
    None
}

pub(crate) fn seek<K, V>(nodes: &Arena<K, V>, head: NodeKey, hash: u32, key: &K) -> ChainSeek
where
    K: Eq,
{
    let mut cur = head;
    let mut len = 1;
    loop {
        let node = &nodes[cur];
        if node.hash == hash && node.key == *key {
            return ChainSeek::Found(cur);
        }
        match node.next {
            Some(next) => {
                cur = next;
                len += 1;
            }
            None => return ChainSeek::Missing { tail: cur, len },
        }
    }
}

/// Unlinks the entry matching `q`. Returns the new head (if any entry is
/// left) and the unlinked entry, which is still allocated in the arena.
pub(crate) fn unlink<K, V, Q>(
    nodes: &mut Arena<K, V>,
    head: NodeKey,
    hash: u32,
    q: &Q,
) -> Option<(Option<NodeKey>, NodeKey)>
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    let mut prev: Option<NodeKey> = None;
    let mut cur = Some(head);
    while let Some(k) = cur {
        let node = &nodes[k];
        let next = node.next;
        if node.hash == hash && node.key.borrow() == q {
            let new_head = match prev {
                None => next,
                Some(p) => {
                    nodes[p].next = next;
                    Some(head)
                }
            };
            nodes[k].next = None;
            return Some((new_head, k));
        }
        prev = Some(k);
        cur = next;
    }
    None
}

#[cfg(test)]
pub(crate) fn len<K, V>(nodes: &Arena<K, V>, head: NodeKey) -> usize {
    let mut n = 0;
    let mut cur = Some(head);
    while let Some(k) = cur {
        n += 1;
        cur = nodes[k].next;
    }
    n
}
