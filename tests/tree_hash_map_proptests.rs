// TreeHashMap property tests through the public API.
//
// Property 1: model equivalence with `String` keys and `&str` queries.
//  - Model: std::collections::HashMap<String, u32>.
//  - Operations: insert, put_if_absent, remove, get, contains_key.
//  - Invariant: every return value and len() match the model at each step.
//
// Property 2: low-entropy hashing.
//  - A hasher that keeps only a few bits forces long chains and trees.
//  - Invariant: after a random insert/remove sequence every surviving key
//    maps to its last value and every removed key is absent.
//
// Property 3: sizing.
//  - Invariant: capacity is 0 before the first insert, a power of two
//    afterwards, and never below len() / load_factor.
use proptest::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hasher};
use tree_hashmap::TreeHashMap;

#[derive(Clone, Copy)]
struct LowBits(u32);
struct LowBitsHasher(DefaultHasher, u32);
impl BuildHasher for LowBits {
    type Hasher = LowBitsHasher;
    fn build_hasher(&self) -> LowBitsHasher {
        LowBitsHasher(DefaultHasher::new(), self.0)
    }
}
impl Hasher for LowBitsHasher {
    fn write(&mut self, bytes: &[u8]) {
        self.0.write(bytes);
    }
    fn finish(&self) -> u64 {
        self.0.finish() & ((1u64 << self.1) - 1)
    }
}

// Property 1: model equivalence.
proptest! {
    #[test]
    fn prop_matches_std_hashmap(ops in proptest::collection::vec((0u8..5, "[a-d]{1,3}", any::<u32>()), 1..200)) {
        let mut m: TreeHashMap<String, u32> = TreeHashMap::new();
        let mut model: HashMap<String, u32> = HashMap::new();
        for (op, key, v) in ops {
            match op {
                0 => prop_assert_eq!(m.insert(key.clone(), v), model.insert(key, v)),
                1 => {
                    let expected = model.get(&key).copied();
                    prop_assert_eq!(m.put_if_absent(key.clone(), v).copied(), expected);
                    model.entry(key).or_insert(v);
                }
                2 => prop_assert_eq!(m.remove(key.as_str()), model.remove(&key)),
                3 => prop_assert_eq!(m.get(key.as_str()), model.get(&key)),
                _ => prop_assert_eq!(m.contains_key(key.as_str()), model.contains_key(&key)),
            }
            prop_assert_eq!(m.len(), model.len());
        }
    }
}

// Property 2: low-entropy hashing.
proptest! {
    #[test]
    fn prop_low_entropy_hashes(bits in 1u32..6, ops in proptest::collection::vec((any::<bool>(), 0u32..500), 1..600)) {
        let mut m = TreeHashMap::with_hasher(LowBits(bits));
        let mut model: HashMap<u32, usize> = HashMap::new();
        for (step, (insert, k)) in ops.into_iter().enumerate() {
            if insert {
                m.insert(k, step);
                model.insert(k, step);
            } else {
                prop_assert_eq!(m.remove(&k), model.remove(&k));
            }
        }
        prop_assert_eq!(m.len(), model.len());
        for k in 0..500u32 {
            prop_assert_eq!(m.get(&k), model.get(&k));
        }
    }
}

// Property 3: sizing.
proptest! {
    #[test]
    fn prop_capacity_tracks_len(initial in 0usize..300, n in 0u32..2000) {
        let mut m = TreeHashMap::with_capacity(initial);
        prop_assert_eq!(m.capacity(), 0);
        for i in 0..n {
            m.insert(i, ());
            prop_assert!(m.capacity().is_power_of_two());
        }
        let floor = (m.len() as f32 / m.load_factor()).floor() as usize;
        prop_assert!(m.capacity() >= floor, "capacity {} below {}", m.capacity(), floor);
    }
}
