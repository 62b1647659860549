#![cfg(test)]

// Property tests for TreeHashMap kept inside the crate so they can check
// the bucket structure through `RawTreeMap::validate` after every step.

use crate::map::TreeHashMap;
use crate::order::TieBreak;
use crate::test_hashers::{ConstState, NarrowState};
use hashbrown::HashMap;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::cell::Cell;
use std::hash::BuildHasher;

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, i32),
    PutIfAbsent(u16, i32),
    GetOrInsert(u16, i32),
    Remove(u16),
    Get(u16),
    Mutate(u16, i32),
    Clear,
}

// Keys come from a small range so the same key is hit repeatedly. `Clear`
// is rare so buckets get the chance to crowd.
fn arb_ops(key_space: u16, max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    let key = 0..key_space;
    let op = prop_oneof![
        6 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::PutIfAbsent(k, v)),
        2 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::GetOrInsert(k, v)),
        4 => key.clone().prop_map(Op::Remove),
        3 => key.clone().prop_map(Op::Get),
        2 => (key, any::<i32>()).prop_map(|(k, d)| Op::Mutate(k, d)),
        1 => Just(Op::Clear),
    ];
    proptest::collection::vec(op, 1..max_len)
}

fn run_ops<S, O>(sut: &mut TreeHashMap<u16, i32, S, O>, ops: Vec<Op>) -> Result<(), TestCaseError>
where
    S: BuildHasher,
    O: TieBreak<u16>,
{
    let mut model: HashMap<u16, i32> = HashMap::new();
    let default_calls = Cell::new(0usize);

    for op in ops {
        match op {
            Op::Insert(k, v) => {
                prop_assert_eq!(sut.insert(k, v), model.insert(k, v));
            }
            Op::PutIfAbsent(k, v) => {
                let expected = model.get(&k).copied();
                prop_assert_eq!(sut.put_if_absent(k, v).copied(), expected);
                model.entry(k).or_insert(v);
            }
            Op::GetOrInsert(k, v) => {
                let before = default_calls.get();
                let got = *sut.get_or_insert_with(k, || {
                    default_calls.set(default_calls.get() + 1);
                    v
                });
                let present = model.contains_key(&k);
                let expected = *model.entry(k).or_insert(v);
                prop_assert_eq!(got, expected);
                prop_assert_eq!(default_calls.get(), before + usize::from(!present));
            }
            Op::Remove(k) => {
                prop_assert_eq!(sut.remove_entry(&k), model.remove(&k).map(|v| (k, v)));
            }
            Op::Get(k) => {
                prop_assert_eq!(sut.get(&k), model.get(&k));
                prop_assert_eq!(sut.contains_key(&k), model.contains_key(&k));
            }
            Op::Mutate(k, d) => {
                if let Some(v) = sut.get_mut(&k) {
                    *v = v.wrapping_add(d);
                }
                if let Some(v) = model.get_mut(&k) {
                    *v = v.wrapping_add(d);
                }
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        if let Err(e) = sut.validate() {
            return Err(TestCaseError::fail(e));
        }
    }

    for (k, v) in &model {
        prop_assert_eq!(sut.get(k), Some(v));
    }
    Ok(())
}

// Property: TreeHashMap matches a hashbrown model across random operation
// sequences, and the bucket structure stays valid after every step.
// A 4-bit hash leaves 16 distinct hashes for 300 keys: buckets cross the
// treeify threshold with many equal-hash nodes in each tree.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_narrow_hash(ops in arb_ops(300, 400)) {
        let mut sut = TreeHashMap::with_hasher(NarrowState { bits: 4 });
        run_ops(&mut sut, ops)?;
    }

    #[test]
    fn prop_state_machine_wide_keys(ops in arb_ops(u16::MAX, 300)) {
        let mut sut = TreeHashMap::with_hasher(NarrowState { bits: 12 });
        run_ops(&mut sut, ops)?;
    }
}

// Property: same invariants when every key shares one hash. The whole map
// lives in bucket 0 and any tree there is ordered purely by insertion.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions(ops in arb_ops(60, 200)) {
        let mut sut = TreeHashMap::with_hasher(ConstState);
        run_ops(&mut sut, ops)?;
    }
}

// Property: the key-ordered trees hold the same invariants, including the
// stricter one that equal-hash nodes sit in key order.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_ordered_collisions(ops in arb_ops(60, 200)) {
        let mut sut = TreeHashMap::ordered_with_hasher(ConstState);
        run_ops(&mut sut, ops)?;
    }

    #[test]
    fn prop_state_machine_ordered_narrow_hash(ops in arb_ops(300, 400)) {
        let mut sut = TreeHashMap::ordered_with_hasher(NarrowState { bits: 4 });
        run_ops(&mut sut, ops)?;
    }
}
