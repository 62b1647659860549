// TreeHashMap public API test suite.
//
// Each test documents the behavior being verified. The core properties
// exercised:
// - Last write wins: a key maps to the most recently put value.
// - Collisions: keys sharing a bucket, or an entire hash, stay reachable
//   through chains and through trees.
// - Growth: pre-sizing, load factor, and doubling never lose entries.
// - Ordered mode: `K: Ord` maps answer the same as unordered ones.
// - Hashing helpers: spread and power-of-two sizing are exposed and exact.
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::{Arc, Mutex};
use std::thread;
use tree_hashmap::hashing::{spread, table_size_for, MAXIMUM_CAPACITY};
use tree_hashmap::{ConfigError, KeyOrder, MapConfig, TreeHashMap};

// Every key hashes to the same value.
#[derive(Clone, Copy, Default)]
struct Collide;
struct CollideHasher;
impl BuildHasher for Collide {
    type Hasher = CollideHasher;
    fn build_hasher(&self) -> CollideHasher {
        CollideHasher
    }
}
impl Hasher for CollideHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0xdead_beef
    }
}

// Integer keys hash to themselves.
#[derive(Clone, Copy, Default)]
struct Identity;
#[derive(Default)]
struct IdentityHasher(u64);
impl BuildHasher for Identity {
    type Hasher = IdentityHasher;
    fn build_hasher(&self) -> IdentityHasher {
        IdentityHasher::default()
    }
}
impl Hasher for IdentityHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 << 8) | u64::from(b);
        }
    }
    fn write_u32(&mut self, n: u32) {
        self.0 = u64::from(n);
    }
    fn write_u64(&mut self, n: u64) {
        self.0 = n;
    }
    fn finish(&self) -> u64 {
        self.0
    }
}

// Key whose hash is chosen by the test, independent of its identity.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Pinned {
    id: u32,
    hash: u64,
}
impl Hash for Pinned {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

// Test: insert/overwrite/get on distinct keys.
// Verifies: insert returns the displaced value; len counts keys, not puts.
#[test]
fn overwrite_returns_previous_value() {
    let mut m = TreeHashMap::new();
    assert_eq!(m.insert("a", 1), None);
    assert_eq!(m.insert("b", 2), None);
    assert_eq!(m.insert("a", 3), Some(1));
    assert_eq!(m.get("a"), Some(&3));
    assert_eq!(m.get("b"), Some(&2));
    assert_eq!(m.get("c"), None);
    assert_eq!(m.len(), 2);
}

// Test: lazy allocation and default sizing.
// Verifies: no buckets until the first insert, then 16.
#[test]
fn table_is_allocated_on_first_insert() {
    let mut m: TreeHashMap<u32, u32> = TreeHashMap::new();
    assert_eq!(m.capacity(), 0);
    assert!(m.is_empty());
    assert_eq!(m.get(&1), None);
    assert_eq!(m.remove(&1), None);
    m.insert(1, 1);
    assert_eq!(m.capacity(), 16);
}

// Test: pre-sizing rounds up to a power of two.
#[test]
fn with_capacity_rounds_up() {
    let mut m: TreeHashMap<u32, u32> = TreeHashMap::with_capacity(100);
    assert_eq!(m.capacity(), 0);
    m.insert(0, 0);
    assert_eq!(m.capacity(), 128);

    let mut tiny: TreeHashMap<u32, u32> = TreeHashMap::with_capacity(1);
    tiny.insert(1, 1);
    tiny.insert(2, 2);
    assert!(tiny.capacity() >= 2);
    assert_eq!(tiny.get(&1), Some(&1));
    assert_eq!(tiny.get(&2), Some(&2));
}

// Test: default load factor 0.75.
// Verifies: the 13th entry doubles a 16-bucket table.
#[test]
fn grows_past_three_quarters_full() {
    let mut m: TreeHashMap<u32, u32> = TreeHashMap::new();
    for i in 0..12 {
        m.insert(i, i);
    }
    assert_eq!(m.capacity(), 16);
    m.insert(12, 12);
    assert_eq!(m.capacity(), 32);
    for i in 0..13 {
        assert_eq!(m.get(&i), Some(&i));
    }
}

// Test: constant hash for every key.
// Verifies: 1000 keys in a single bucket stay individually reachable
// through inserts, overwrites and removals.
#[test]
fn all_keys_colliding() {
    let mut m: TreeHashMap<u32, u32, Collide> = TreeHashMap::with_hasher(Collide);
    for i in 0..1000 {
        assert_eq!(m.insert(i, i * 2), None);
    }
    assert_eq!(m.len(), 1000);
    for i in 0..1000 {
        assert_eq!(m.get(&i), Some(&(i * 2)));
    }
    for i in (0..1000).step_by(3) {
        assert_eq!(m.insert(i, i), Some(i * 2));
    }
    for i in (0..1000).filter(|i| i % 2 == 1) {
        assert!(m.remove(&i).is_some());
    }
    assert_eq!(m.len(), 500);
    for i in 0..1000 {
        let expected = match (i % 2, i % 3) {
            (1, _) => None,
            (_, 0) => Some(i),
            _ => Some(i * 2),
        };
        assert_eq!(m.get(&i).copied(), expected, "key {i}");
    }
}

// Test: keys with distinct hashes that share a bucket.
// Verifies: a crowded bucket of distinct hashes survives treeify and the
// later resize split.
#[test]
fn same_bucket_distinct_hashes() {
    // Multiples of 1024 share bucket 0 until the table outgrows 1024 buckets.
    let mut m: TreeHashMap<Pinned, u32, Identity> = TreeHashMap::default();
    let keys: Vec<Pinned> = (0..40)
        .map(|id| Pinned {
            id,
            hash: u64::from(id) * 1024,
        })
        .collect();
    for k in &keys {
        m.insert(k.clone(), k.id);
    }
    for k in &keys {
        assert_eq!(m.get(k), Some(&k.id));
    }
    for k in keys.iter().take(35) {
        assert_eq!(m.remove(k), Some(k.id));
    }
    for k in keys.iter().skip(35) {
        assert_eq!(m.get(k), Some(&k.id));
    }
    assert_eq!(m.len(), 5);
}

// Test: equal hashes with unequal keys.
// Verifies: lookup distinguishes them by `Eq`, whichever subtree holds them.
#[test]
fn equal_hash_unequal_keys() {
    let mut m = TreeHashMap::new();
    for id in 0..64 {
        m.insert(Pinned { id, hash: 7 }, id);
    }
    for id in 0..64 {
        assert_eq!(m.get(&Pinned { id, hash: 7 }), Some(&id));
    }
    assert_eq!(m.get(&Pinned { id: 64, hash: 7 }), None);
    assert_eq!(m.get(&Pinned { id: 3, hash: 8 }), None);
}

// Test: put_if_absent and get_or_insert_with leave existing values alone.
#[test]
fn insert_without_overwrite() {
    let mut m = TreeHashMap::new();
    assert_eq!(m.put_if_absent("k".to_string(), 1), None);
    assert_eq!(m.put_if_absent("k".to_string(), 2), Some(&1));
    *m.get_or_insert_with("k".to_string(), || 99) += 10;
    assert_eq!(m.get("k"), Some(&11));
    assert_eq!(*m.get_or_insert_with("j".to_string(), || 5), 5);
    assert_eq!(m.len(), 2);
}

// Test: borrowed lookups with `String` keys and `&str` queries.
#[test]
fn borrowed_queries() {
    let mut m: TreeHashMap<String, usize> = ["x", "yy", "zzz"].iter().map(|s| (s.to_string(), s.len())).collect();
    assert!(m.contains_key("yy"));
    assert_eq!(m.get_key_value("zzz"), Some((&"zzz".to_string(), &3)));
    if let Some(v) = m.get_mut("x") {
        *v = 10;
    }
    assert_eq!(m.remove_entry("x"), Some(("x".to_string(), 10)));
    assert!(!m.contains_key("x"));
}

// Test: Extend on an existing map overwrites like insert.
#[test]
fn extend_overwrites() {
    let mut m: TreeHashMap<u8, char> = TreeHashMap::new();
    m.extend([(1, 'a'), (2, 'b')]);
    m.extend([(2, 'c'), (3, 'd')]);
    assert_eq!(m.len(), 3);
    assert_eq!(m.get(&2), Some(&'c'));
}

// Test: clear keeps the bucket array.
#[test]
fn clear_retains_capacity() {
    let mut m: TreeHashMap<u32, u32> = (0..500).map(|i| (i, i)).collect();
    let cap = m.capacity();
    m.clear();
    assert!(m.is_empty());
    assert_eq!(m.capacity(), cap);
    assert_eq!(m.get(&10), None);
    m.insert(10, 1);
    assert_eq!(m.get(&10), Some(&1));
}

// Test: configuration validation and custom load factor.
#[test]
fn configuration() {
    let m: TreeHashMap<u32, u32> = TreeHashMap::with_config(MapConfig::new().initial_capacity(10).load_factor(2.0)).unwrap();
    assert_eq!(m.load_factor(), 2.0);

    let err = TreeHashMap::<u32, u32>::with_capacity_and_load_factor(4, f32::NAN).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidLoadFactor(lf) if lf.is_nan()));
    assert!(err.to_string().starts_with("load factor must be a positive number"));

    // A load factor above 1 packs more entries than buckets.
    // Identity hashing puts exactly four keys in each bucket.
    let cfg = MapConfig::new().initial_capacity(16).load_factor(4.0);
    let mut dense: TreeHashMap<u32, u32, Identity> = TreeHashMap::with_config_and_hasher(cfg, Identity).unwrap();
    for i in 0..64 {
        dense.insert(i, i);
    }
    assert_eq!(dense.capacity(), 16);
    dense.insert(64, 64);
    assert_eq!(dense.capacity(), 32);
}

// Test: hashing helpers.
#[test]
fn spread_and_table_sizing() {
    assert_eq!(spread(0), 0);
    assert_eq!(spread(0x0001_0000), 0x0001_0001);
    assert_eq!(spread(0xffff_0000), 0xffff_ffff);
    assert_eq!(table_size_for(0), 1);
    assert_eq!(table_size_for(1), 1);
    assert_eq!(table_size_for(17), 32);
    assert_eq!(table_size_for(64), 64);
    assert_eq!(table_size_for(usize::MAX), MAXIMUM_CAPACITY);
}

// Test: many random keys against std's HashMap.
#[test]
fn agrees_with_std_on_bulk_workload() {
    let mut m = TreeHashMap::new();
    let mut model = std::collections::HashMap::new();
    let mut s: u64 = 42;
    for _ in 0..20_000 {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        let k = (s >> 33) % 4096;
        if s & 3 == 0 {
            assert_eq!(m.remove(&k), model.remove(&k));
        } else {
            assert_eq!(m.insert(k, s), model.insert(k, s));
        }
    }
    assert_eq!(m.len(), model.len());
    for (k, v) in &model {
        assert_eq!(m.get(k), Some(v));
    }
}

// Test: the map can move across threads and be shared behind a mutex.
#[test]
fn shared_behind_mutex() {
    let m = Arc::new(Mutex::new(TreeHashMap::new()));
    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let m = Arc::clone(&m);
            thread::spawn(move || {
                for i in 0..250 {
                    m.lock().unwrap().insert(t * 1000 + i, t);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let m = m.lock().unwrap();
    assert_eq!(m.len(), 1000);
    assert_eq!(m.get(&3_249), Some(&3));
}

// Test: Debug output lists entries as a map.
#[test]
fn debug_format() {
    let mut m = TreeHashMap::new();
    m.insert(1, "one");
    assert_eq!(format!("{m:?}"), r#"{1: "one"}"#);
}

// Test: key-ordered map with every key on one hash.
// Verifies: owned and borrowed lookups, overwrite and removal behave as in
// the default map; config validation applies to ordered constructors too.
#[test]
fn ordered_map_with_one_hash() {
    let mut m: TreeHashMap<String, usize, Collide, KeyOrder> = TreeHashMap::ordered_with_hasher(Collide);
    for i in (0..500).rev() {
        assert_eq!(m.insert(format!("k{i:03}"), i), None);
    }
    assert_eq!(m.len(), 500);
    assert_eq!(m.insert("k250".to_string(), 0), Some(250));
    for i in 0..500 {
        let want = if i == 250 { 0 } else { i };
        assert_eq!(m.get(format!("k{i:03}").as_str()), Some(&want));
    }
    assert!(m.get("k500").is_none());
    assert!(m.get("").is_none());

    for i in (0..500).filter(|i| i % 5 != 0) {
        assert_eq!(m.remove(format!("k{i:03}").as_str()), Some(i));
    }
    assert_eq!(m.len(), 100);
    assert_eq!(m.put_if_absent("k005".to_string(), 9), Some(&5));
    assert_eq!(m.put_if_absent("k006".to_string(), 6), None);

    let err = TreeHashMap::<u32, u32, Collide, KeyOrder>::ordered_with_config_and_hasher(
        MapConfig::new().load_factor(f32::NAN),
        Collide,
    );
    assert!(matches!(err, Err(ConfigError::InvalidLoadFactor(_))));

    let mut d = TreeHashMap::new_ordered();
    d.extend([(3u8, 'c'), (1, 'a'), (3, 'C')]);
    assert_eq!(d.get(&3), Some(&'C'));
    assert_eq!(d.len(), 2);
}
