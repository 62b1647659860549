//! Tree-form buckets: a red-black tree over the bucket's entries.
//!
//! Entries are ordered by spread hash. Entries with equal hashes are ordered
//! by the map's tie-break comparator when it has an answer, and otherwise
//! by insertion: the new entry goes after every equal-hash entry already
//! present. A lookup that meets an equal hash the comparator cannot order
//! has to search both subtrees.
//!
//! Alongside the tree links, entries form a doubly linked traversal list
//! (`TreeLinks::prev` / `Node::next`) in insertion order. The list is what
//! a resize splits and what `untreeify` turns back into a plain chain.

use crate::node::{Arena, Node, NodeKey, TreeLinks};
use crate::order::TieBreakFn;
use core::borrow::Borrow;
use core::cmp::Ordering;

/// Head of a tree-form bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TreeBin {
    pub(crate) root: NodeKey,
    /// First entry of the traversal list.
    pub(crate) first: NodeKey,
    /// Last entry of the traversal list; new entries are appended here.
    pub(crate) last: NodeKey,
    pub(crate) len: usize,
}

pub(crate) enum TreeInsert<K, V> {
    /// The key was already present; the rejected key and value are handed
    /// back.
    Found { node: NodeKey, key: K, value: V },
    Inserted(NodeKey),
}

pub(crate) fn find<K, V, Q>(
    nodes: &Arena<K, V>,
    bin: &TreeBin,
    hash: u32,
    q: &Q,
    tie: TieBreakFn<Q>,
) -> Option<NodeKey>
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    find_from(nodes, Some(bin.root), hash, q, tie)
}

fn find_from<K, V, Q>(
    nodes: &Arena<K, V>,
    mut p: Option<NodeKey>,
    hash: u32,
    q: &Q,
    tie: TieBreakFn<Q>,
) -> Option<NodeKey>
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    while let Some(k) = p {
        let node = &nodes[k];
        if hash < node.hash {
            p = node.tree.left;
        } else if hash > node.hash {
            p = node.tree.right;
        } else if node.key.borrow() == q {
            return Some(k);
        } else {
            match tie(q, node.key.borrow()) {
                Some(Ordering::Less) => p = node.tree.left,
                Some(Ordering::Greater) => p = node.tree.right,
                _ => {
                    // Unordered equal-hash entries may sit on either side.
                    if let Some(found) = find_from(nodes, node.tree.right, hash, q, tie) {
                        return Some(found);
                    }
                    p = node.tree.left;
                }
            }
        }
    }
    None
}

/// Inserts `key` unless an equal key is already in the tree.
pub(crate) fn put_tree_val<K, V>(
    nodes: &mut Arena<K, V>,
    bin: &mut TreeBin,
    hash: u32,
    key: K,
    value: V,
    tie: TieBreakFn<K>,
) -> TreeInsert<K, V>
where
    K: Eq,
{
    if let Some(node) = find_from(nodes, Some(bin.root), hash, &key, tie) {
        return TreeInsert::Found { node, key, value };
    }

    let x = nodes.insert(Node::new(hash, key, value));
    nodes[x].tree.prev = Some(bin.last);
    nodes[bin.last].next = Some(x);
    bin.last = x;
    bin.len += 1;

    let mut rb = Rb {
        nodes: &mut *nodes,
        root: Some(bin.root),
    };
    rb.attach(x, tie);
    if let Some(root) = rb.root {
        bin.root = root;
    }
    debug_assert_eq!(check(nodes, bin, tie), Ok(()));
    TreeInsert::Inserted(x)
}

/// Unlinks `z` from both the tree and the traversal list. The entry stays
/// allocated. Returns `None` when `z` was the last entry.
pub(crate) fn remove_tree_node<K, V>(
    nodes: &mut Arena<K, V>,
    bin: TreeBin,
    z: NodeKey,
    tie: TieBreakFn<K>,
) -> Option<TreeBin> {
    let prev = nodes[z].tree.prev;
    let next = nodes[z].next;
    let mut first = Some(bin.first);
    let mut last = Some(bin.last);
    match prev {
        Some(p) => nodes[p].next = next,
        None => first = next,
    }
    match next {
        Some(n) => nodes[n].tree.prev = prev,
        None => last = prev,
    }
    nodes[z].next = None;

    let mut rb = Rb {
        nodes: &mut *nodes,
        root: Some(bin.root),
    };
    rb.detach(z);
    let rest = TreeBin {
        root: rb.root?,
        first: first?,
        last: last?,
        len: bin.len - 1,
    };
    debug_assert_eq!(check(nodes, &rest, tie), Ok(()));
    Some(rest)
}

/// Builds a tree from the chain starting at `head`, inserting entries in
/// chain order. The chain order becomes the traversal order.
pub(crate) fn treeify<K, V>(nodes: &mut Arena<K, V>, head: NodeKey, tie: TieBreakFn<K>) -> TreeBin {
    let mut rb = Rb {
        nodes: &mut *nodes,
        root: None,
    };
    let mut prev = None;
    let mut last = head;
    let mut len = 0;
    let mut cur = Some(head);
    while let Some(x) = cur {
        rb.nodes[x].tree = TreeLinks {
            prev,
            ..TreeLinks::default()
        };
        rb.attach(x, tie);
        prev = Some(x);
        last = x;
        len += 1;
        cur = rb.nodes[x].next;
    }
    let bin = TreeBin {
        root: rb.root.unwrap_or(head),
        first: head,
        last,
        len,
    };
    debug_assert_eq!(check(nodes, &bin, tie), Ok(()));
    bin
}

/// Drops the tree links of every entry reachable from `first`, leaving a
/// plain chain in traversal order. Returns the chain head.
pub(crate) fn untreeify<K, V>(nodes: &mut Arena<K, V>, first: NodeKey) -> NodeKey {
    let mut cur = Some(first);
    while let Some(k) = cur {
        let node = &mut nodes[k];
        node.tree = TreeLinks::default();
        cur = node.next;
    }
    first
}

/// Red-black operations over nodes borrowed from the arena.
struct Rb<'a, K, V> {
    nodes: &'a mut Arena<K, V>,
    root: Option<NodeKey>,
}

impl<K, V> Rb<'_, K, V> {
    fn links(&mut self, k: NodeKey) -> &mut TreeLinks {
        &mut self.nodes[k].tree
    }

    fn parent(&self, k: NodeKey) -> Option<NodeKey> {
        self.nodes[k].tree.parent
    }

    fn left(&self, k: NodeKey) -> Option<NodeKey> {
        self.nodes[k].tree.left
    }

    fn right(&self, k: NodeKey) -> Option<NodeKey> {
        self.nodes[k].tree.right
    }

    /// Missing children count as black.
    fn is_red(&self, k: Option<NodeKey>) -> bool {
        k.is_some_and(|k| self.nodes[k].tree.red)
    }

    fn set_red(&mut self, k: Option<NodeKey>, red: bool) {
        if let Some(k) = k {
            self.links(k).red = red;
        }
    }

    fn minimum(&self, mut k: NodeKey) -> NodeKey {
        while let Some(l) = self.left(k) {
            k = l;
        }
        k
    }

    /// Points whatever referenced `old` from `parent` (or the root) at `new`.
    fn replace_child(&mut self, parent: Option<NodeKey>, old: NodeKey, new: Option<NodeKey>) {
        match parent {
            None => self.root = new,
            Some(p) if self.left(p) == Some(old) => self.links(p).left = new,
            Some(p) => self.links(p).right = new,
        }
    }

    fn rotate_left(&mut self, p: NodeKey) {
        let Some(r) = self.right(p) else { return };
        let rl = self.left(r);
        self.links(p).right = rl;
        if let Some(rl) = rl {
            self.links(rl).parent = Some(p);
        }
        let pp = self.parent(p);
        self.links(r).parent = pp;
        self.replace_child(pp, p, Some(r));
        self.links(r).left = Some(p);
        self.links(p).parent = Some(r);
    }

    fn rotate_right(&mut self, p: NodeKey) {
        let Some(l) = self.left(p) else { return };
        let lr = self.right(l);
        self.links(p).left = lr;
        if let Some(lr) = lr {
            self.links(lr).parent = Some(p);
        }
        let pp = self.parent(p);
        self.links(l).parent = pp;
        self.replace_child(pp, p, Some(l));
        self.links(l).right = Some(p);
        self.links(p).parent = Some(l);
    }

    /// Links `x` as a leaf and rebalances. `x` must come after every entry
    /// already in the tree in traversal order, so an equal hash that `tie`
    /// cannot place on the left goes right.
    fn attach(&mut self, x: NodeKey, tie: TieBreakFn<K>) {
        let hash = self.nodes[x].hash;
        {
            let l = self.links(x);
            l.parent = None;
            l.left = None;
            l.right = None;
        }
        let Some(mut p) = self.root else {
            self.root = Some(x);
            self.links(x).red = false;
            return;
        };
        loop {
            let go_left = match hash.cmp(&self.nodes[p].hash) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => tie(&self.nodes[x].key, &self.nodes[p].key) == Some(Ordering::Less),
            };
            let child = if go_left { self.left(p) } else { self.right(p) };
            match child {
                Some(c) => p = c,
                None => {
                    if go_left {
                        self.links(p).left = Some(x);
                    } else {
                        self.links(p).right = Some(x);
                    }
                    self.links(x).parent = Some(p);
                    break;
                }
            }
        }
        self.balance_insertion(x);
    }

    fn balance_insertion(&mut self, mut x: NodeKey) {
        self.links(x).red = true;
        loop {
            let Some(mut xp) = self.parent(x) else { break };
            if !self.nodes[xp].tree.red {
                break;
            }
            let Some(xpp) = self.parent(xp) else { break };
            if self.left(xpp) == Some(xp) {
                let uncle = self.right(xpp);
                if self.is_red(uncle) {
                    self.set_red(uncle, false);
                    self.links(xp).red = false;
                    self.links(xpp).red = true;
                    x = xpp;
                    continue;
                }
                if self.right(xp) == Some(x) {
                    self.rotate_left(xp);
                    core::mem::swap(&mut x, &mut xp);
                }
                self.links(xp).red = false;
                self.links(xpp).red = true;
                self.rotate_right(xpp);
            } else {
                let uncle = self.left(xpp);
                if self.is_red(uncle) {
                    self.set_red(uncle, false);
                    self.links(xp).red = false;
                    self.links(xpp).red = true;
                    x = xpp;
                    continue;
                }
                if self.left(xp) == Some(x) {
                    self.rotate_right(xp);
                    core::mem::swap(&mut x, &mut xp);
                }
                self.links(xp).red = false;
                self.links(xpp).red = true;
                self.rotate_left(xpp);
            }
        }
        let root = self.root;
        self.set_red(root, false);
    }

    /// Replaces `u` by `v` under `u`'s parent.
    fn transplant(&mut self, u: NodeKey, v: Option<NodeKey>) {
        let up = self.parent(u);
        self.replace_child(up, u, v);
        if let Some(v) = v {
            self.links(v).parent = up;
        }
    }

    /// Removes `z` from the tree and rebalances. `z` keeps its arena slot;
    /// all of its tree links, `prev` included, are cleared.
    fn detach(&mut self, z: NodeKey) {
        let removed_red;
        let x;
        let x_parent;
        match (self.left(z), self.right(z)) {
            (None, right) => {
                removed_red = self.nodes[z].tree.red;
                x = right;
                x_parent = self.parent(z);
                self.transplant(z, right);
            }
            (left, None) => {
                removed_red = self.nodes[z].tree.red;
                x = left;
                x_parent = self.parent(z);
                self.transplant(z, left);
            }
            (Some(zl), Some(zr)) => {
                // Successor `y` takes z's place; the tree loses y's old slot.
                let y = self.minimum(zr);
                removed_red = self.nodes[y].tree.red;
                x = self.right(y);
                if y == zr {
                    x_parent = Some(y);
                } else {
                    x_parent = self.parent(y);
                    self.transplant(y, x);
                    self.links(y).right = Some(zr);
                    self.links(zr).parent = Some(y);
                }
                self.transplant(z, Some(y));
                self.links(y).left = Some(zl);
                self.links(zl).parent = Some(y);
                let z_red = self.nodes[z].tree.red;
                self.links(y).red = z_red;
            }
        }
        *self.links(z) = TreeLinks::default();
        if !removed_red {
            self.balance_deletion(x, x_parent);
        }
    }

    /// Restores black heights after a black entry left the tree above `x`.
    fn balance_deletion(&mut self, mut x: Option<NodeKey>, mut parent: Option<NodeKey>) {
        while x != self.root && !self.is_red(x) {
            let Some(xp) = parent else { break };
            if self.left(xp) == x {
                let mut w = self.right(xp);
                if self.is_red(w) {
                    self.set_red(w, false);
                    self.links(xp).red = true;
                    self.rotate_left(xp);
                    w = self.right(xp);
                }
                let Some(mut wk) = w else {
                    x = Some(xp);
                    parent = self.parent(xp);
                    continue;
                };
                let (wl, wr) = (self.left(wk), self.right(wk));
                if !self.is_red(wl) && !self.is_red(wr) {
                    self.links(wk).red = true;
                    x = Some(xp);
                    parent = self.parent(xp);
                } else {
                    if !self.is_red(wr) {
                        self.set_red(wl, false);
                        self.links(wk).red = true;
                        self.rotate_right(wk);
                        let Some(nw) = self.right(xp) else { break };
                        wk = nw;
                    }
                    let xp_red = self.nodes[xp].tree.red;
                    self.links(wk).red = xp_red;
                    self.links(xp).red = false;
                    let wr = self.right(wk);
                    self.set_red(wr, false);
                    self.rotate_left(xp);
                    x = self.root;
                    break;
                }
            } else {
                let mut w = self.left(xp);
                if self.is_red(w) {
                    self.set_red(w, false);
                    self.links(xp).red = true;
                    self.rotate_right(xp);
                    w = self.left(xp);
                }
                let Some(mut wk) = w else {
                    x = Some(xp);
                    parent = self.parent(xp);
                    continue;
                };
                let (wl, wr) = (self.left(wk), self.right(wk));
                if !self.is_red(wl) && !self.is_red(wr) {
                    self.links(wk).red = true;
                    x = Some(xp);
                    parent = self.parent(xp);
                } else {
                    if !self.is_red(wl) {
                        self.set_red(wr, false);
                        self.links(wk).red = true;
                        self.rotate_left(wk);
                        let Some(nw) = self.left(xp) else { break };
                        wk = nw;
                    }
                    let xp_red = self.nodes[xp].tree.red;
                    self.links(wk).red = xp_red;
                    self.links(xp).red = false;
                    let wl = self.left(wk);
                    self.set_red(wl, false);
                    self.rotate_right(xp);
                    x = self.root;
                    break;
                }
            }
        }
        self.set_red(x, false);
    }
}

/// Verifies the red-black properties, parent links, the traversal list and
/// the (hash, tie-break, insertion) ordering of a tree bucket.
pub(crate) fn check<K, V>(nodes: &Arena<K, V>, bin: &TreeBin, tie: TieBreakFn<K>) -> Result<(), String> {
    use slotmap::SecondaryMap;

    let root = nodes.get(bin.root).ok_or("root is not allocated")?;
    if root.tree.parent.is_some() {
        return Err("root has a parent".into());
    }
    if root.tree.red {
        return Err("root is red".into());
    }

    // Traversal list: consistent back links, exact length, correct tail.
    let mut position: SecondaryMap<NodeKey, usize> = SecondaryMap::new();
    let mut prev = None;
    let mut cur = Some(bin.first);
    while let Some(k) = cur {
        let node = nodes.get(k).ok_or("traversal list points at a freed entry")?;
        if node.tree.prev != prev {
            return Err("traversal prev link mismatch".into());
        }
        let pos = position.len();
        if position.insert(k, pos).is_some() || position.len() > bin.len {
            return Err("traversal list is longer than the bin".into());
        }
        prev = Some(k);
        cur = node.next;
    }
    if prev != Some(bin.last) {
        return Err("traversal list does not end at `last`".into());
    }
    if position.len() != bin.len {
        return Err(format!("traversal length {} != len {}", position.len(), bin.len));
    }

    let mut in_order = Vec::with_capacity(bin.len);
    check_subtree(nodes, Some(bin.root), None, &mut in_order)?;
    if in_order.len() != bin.len {
        return Err(format!("tree holds {} entries, len is {}", in_order.len(), bin.len));
    }
    let mut last_seen: Option<(NodeKey, usize)> = None;
    for k in in_order {
        let pos = *position.get(k).ok_or("tree entry missing from the traversal list")?;
        if let Some((a, a_pos)) = last_seen {
            let (na, nb) = (&nodes[a], &nodes[k]);
            let sorted = match na.hash.cmp(&nb.hash) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => match tie(&na.key, &nb.key) {
                    Some(Ordering::Less) => true,
                    Some(Ordering::Greater) => false,
                    Some(Ordering::Equal) | None => a_pos < pos,
                },
            };
            if !sorted {
                return Err("in-order walk is not sorted by (hash, tie-break, insertion)".into());
            }
        }
        last_seen = Some((k, pos));
    }
    Ok(())
}

/// Returns the black height of the subtree at `k`, collecting its entries
/// in order.
fn check_subtree<K, V>(
    nodes: &Arena<K, V>,
    k: Option<NodeKey>,
    parent: Option<NodeKey>,
    in_order: &mut Vec<NodeKey>,
) -> Result<usize, String> {
    let Some(k) = k else { return Ok(1) };
    let node = nodes.get(k).ok_or("tree link points at a freed entry")?;
    if node.tree.parent != parent {
        return Err("parent link mismatch".into());
    }
    let red = |c: Option<NodeKey>| c.is_some_and(|c| nodes.get(c).is_some_and(|n| n.tree.red));
    if node.tree.red && (red(node.tree.left) || red(node.tree.right)) {
        return Err("red entry with a red child".into());
    }
    let lh = check_subtree(nodes, node.tree.left, Some(k), in_order)?;
    in_order.push(k);
    let rh = check_subtree(nodes, node.tree.right, Some(k), in_order)?;
    if lh != rh {
        return Err(format!("black height mismatch: {lh} vs {rh}"));
    }
    Ok(lh + usize::from(!node.tree.red))
}
