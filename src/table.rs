//! The bucket array: one head per bucket, either empty, a chain or a tree.

use crate::hashing::bucket_index;
use crate::node::NodeKey;
use crate::tree::TreeBin;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum Bucket {
    #[default]
    Empty,
    /// Head of a singly linked chain.
    Chain(NodeKey),
    Tree(TreeBin),
}

/// Bucket heads. The length is zero before the first insertion and a power
/// of two afterwards.
#[derive(Debug, Default)]
pub(crate) struct BucketArray {
    buckets: Vec<Bucket>,
}

impl BucketArray {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        Self {
            buckets: vec![Bucket::Empty; capacity],
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn is_allocated(&self) -> bool {
        !self.buckets.is_empty()
    }

    /// Bucket index for `hash`, or `None` while nothing is allocated.
    #[inline]
    pub(crate) fn index_of(&self, hash: u32) -> Option<usize> {
        self.is_allocated()
            .then(|| bucket_index(hash, self.buckets.len()))
    }

    #[inline]
    pub(crate) fn get(&self, index: usize) -> Bucket {
        self.buckets[index]
    }

    #[inline]
    pub(crate) fn set(&mut self, index: usize, bucket: Bucket) {
        self.buckets[index] = bucket;
    }

    /// Empties every bucket, keeping the capacity.
    pub(crate) fn clear(&mut self) {
        self.buckets.fill(Bucket::Empty);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, Bucket)> + '_ {
        self.buckets.iter().copied().enumerate()
    }
}
