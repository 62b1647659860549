#![cfg(test)]

// Hashers that make bucket placement predictable in tests.

use std::hash::{BuildHasher, Hasher};

/// Integers hash to themselves, so a `u32` key `k < 65536` has spread hash
/// `k` and lands in bucket `k & (capacity - 1)`.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct IdentityState;

#[derive(Debug, Default)]
pub(crate) struct IdentityHasher(u64);

impl Hasher for IdentityHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.rotate_left(8) ^ u64::from(b);
        }
    }

    fn write_u32(&mut self, n: u32) {
        self.0 = u64::from(n);
    }

    fn write_u64(&mut self, n: u64) {
        self.0 = n;
    }
}

impl BuildHasher for IdentityState {
    type Hasher = IdentityHasher;
    fn build_hasher(&self) -> Self::Hasher {
        IdentityHasher::default()
    }
}

/// Every key hashes to zero: one bucket, one spread hash, worst case.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ConstState;

#[derive(Debug)]
pub(crate) struct ConstHasher;

impl Hasher for ConstHasher {
    fn finish(&self) -> u64 {
        0
    }
    fn write(&mut self, _bytes: &[u8]) {}
}

impl BuildHasher for ConstState {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}

/// Keeps only `bits` low bits of a std hash, so distinct keys share full
/// hashes often and buckets crowd quickly.
#[derive(Clone, Copy, Debug)]
pub(crate) struct NarrowState {
    pub(crate) bits: u32,
}

#[derive(Debug)]
pub(crate) struct NarrowHasher {
    inner: std::collections::hash_map::DefaultHasher,
    mask: u64,
}

impl Hasher for NarrowHasher {
    fn finish(&self) -> u64 {
        self.inner.finish() & self.mask
    }
    fn write(&mut self, bytes: &[u8]) {
        self.inner.write(bytes);
    }
}

impl BuildHasher for NarrowState {
    type Hasher = NarrowHasher;
    fn build_hasher(&self) -> Self::Hasher {
        NarrowHasher {
            inner: std::collections::hash_map::DefaultHasher::new(),
            mask: (1u64 << self.bits) - 1,
        }
    }
}
