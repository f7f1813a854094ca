use std::collections::BTreeMap;

use proptest::prelude::*;
use wavl_tree::{DefaultComparator, WavlMap, ascending, descending};

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 1_000;

/// Generates keys in a range small enough to force collisions.
fn key_strategy() -> impl Strategy<Value = i64> {
    -2_000i64..2_000i64
}

fn value_strategy() -> impl Strategy<Value = i64> {
    any::<i64>()
}

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum MapOp {
    Insert(i64, i64),
    Remove(i64),
    Delete(i64),
    Get(i64),
    Has(i64),
    FirstKey,
    LastKey,
}

fn map_op_strategy() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        5 => (key_strategy(), value_strategy()).prop_map(|(k, v)| MapOp::Insert(k, v)),
        3 => key_strategy().prop_map(MapOp::Remove),
        2 => key_strategy().prop_map(MapOp::Delete),
        2 => key_strategy().prop_map(MapOp::Get),
        1 => key_strategy().prop_map(MapOp::Has),
        1 => Just(MapOp::FirstKey),
        1 => Just(MapOp::LastKey),
    ]
}

// ─── Core CRUD operations ────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Replays a random sequence of operations on both WavlMap and BTreeMap
    /// and asserts identical results at every step.
    #[test]
    fn map_ops_match_btreemap(ops in proptest::collection::vec(map_op_strategy(), TEST_SIZE)) {
        let mut wavl: WavlMap<i64, i64> = WavlMap::new();
        let mut bt: BTreeMap<i64, i64> = BTreeMap::new();

        for op in &ops {
            match op {
                MapOp::Insert(k, v) => {
                    prop_assert_eq!(wavl.insert(*k, *v), bt.insert(*k, *v), "insert({}, {})", k, v);
                }
                MapOp::Remove(k) => {
                    prop_assert_eq!(wavl.remove(k), bt.remove(k), "remove({})", k);
                }
                MapOp::Delete(k) => {
                    prop_assert_eq!(wavl.delete(k), bt.remove(k).is_some(), "delete({})", k);
                }
                MapOp::Get(k) => {
                    prop_assert_eq!(wavl.get(k), bt.get(k), "get({})", k);
                }
                MapOp::Has(k) => {
                    prop_assert_eq!(wavl.has(k), bt.contains_key(k), "has({})", k);
                }
                MapOp::FirstKey => {
                    let wavl_first = wavl.first().key(&wavl).unwrap().copied();
                    prop_assert_eq!(wavl_first, bt.keys().next().copied(), "first");
                }
                MapOp::LastKey => {
                    let wavl_last = wavl.last().key(&wavl).unwrap().copied();
                    prop_assert_eq!(wavl_last, bt.keys().next_back().copied(), "last");
                }
            }
            prop_assert_eq!(wavl.size(), bt.len(), "size mismatch after {:?}", op);
            prop_assert_eq!(wavl.is_empty(), bt.is_empty(), "is_empty mismatch after {:?}", op);
        }
    }

    /// Iteration order and content match BTreeMap after random insertions.
    #[test]
    fn iter_matches_btreemap(entries in proptest::collection::vec((key_strategy(), value_strategy()), TEST_SIZE)) {
        let mut wavl: WavlMap<i64, i64> = WavlMap::new();
        let mut bt: BTreeMap<i64, i64> = BTreeMap::new();

        for (k, v) in &entries {
            wavl.insert(*k, *v);
            bt.insert(*k, *v);
        }

        // Forward iteration
        let wavl_items: Vec<_> = wavl.iter().map(|(&k, &v)| (k, v)).collect();
        let bt_items: Vec<_> = bt.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(&wavl_items, &bt_items, "iter() mismatch");

        // Reverse iteration
        let wavl_rev: Vec<_> = wavl.iter().rev().map(|(&k, &v)| (k, v)).collect();
        let bt_rev: Vec<_> = bt.iter().rev().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(&wavl_rev, &bt_rev, "iter().rev() mismatch");

        // Keys
        let wavl_keys: Vec<_> = wavl.keys().copied().collect();
        let bt_keys: Vec<_> = bt.keys().copied().collect();
        prop_assert_eq!(&wavl_keys, &bt_keys, "keys() mismatch");

        // Values
        let wavl_vals: Vec<_> = wavl.values().copied().collect();
        let bt_vals: Vec<_> = bt.values().copied().collect();
        prop_assert_eq!(&wavl_vals, &bt_vals, "values() mismatch");

        // into_iter
        let wavl_into: Vec<_> = wavl.clone().into_iter().collect();
        let bt_into: Vec<_> = bt.clone().into_iter().collect();
        prop_assert_eq!(&wavl_into, &bt_into, "into_iter() mismatch");

        // Cursor walk front to back
        let mut cursor_keys = Vec::new();
        let mut cursor = wavl.first();
        while !cursor.is_empty(&wavl).unwrap() {
            cursor_keys.push(*cursor.key(&wavl).unwrap().unwrap());
            let next = cursor.next(&wavl).unwrap();
            cursor = next;
        }
        prop_assert_eq!(&cursor_keys, &bt_keys, "cursor walk mismatch");
    }

    /// Rebuilding a map from its own entries under the same comparator
    /// yields an identical map.
    #[test]
    fn round_trip_from_entries(entries in proptest::collection::vec((key_strategy(), value_strategy()), 0..TEST_SIZE)) {
        let wavl: WavlMap<i64, i64> = entries.iter().copied().collect();
        let rebuilt =
            WavlMap::from_entries(wavl.to_entries(), ascending::<i64> as DefaultComparator<i64>);
        prop_assert_eq!(&wavl, &rebuilt);

        let forward: Vec<_> = wavl.keys().copied().collect();
        let desc = WavlMap::from_entries(wavl.to_entries(), descending::<i64>);
        let mut backward: Vec<_> = desc.keys().copied().collect();
        backward.reverse();
        prop_assert_eq!(forward, backward, "descending order must be the exact reverse");
    }

    /// Range queries match BTreeMap's range for both inclusive and
    /// exclusive ends, and count() equals the entry count.
    #[test]
    fn range_matches_btreemap(
        entries in proptest::collection::vec((key_strategy(), value_strategy()), 0..TEST_SIZE),
        a in key_strategy(),
        b in key_strategy(),
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        let mut wavl: WavlMap<i64, i64> = WavlMap::new();
        let mut bt: BTreeMap<i64, i64> = BTreeMap::new();
        for (k, v) in &entries {
            wavl.insert(*k, *v);
            bt.insert(*k, *v);
        }

        let inclusive = wavl.range(Some(&lo), Some(&hi), false).unwrap();
        let got: Vec<_> = inclusive.entries(&wavl).map(|(&k, &v)| (k, v)).collect();
        let expected: Vec<_> = bt.range(lo..=hi).map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(&got, &expected, "inclusive range mismatch");
        prop_assert_eq!(inclusive.count(&wavl), expected.len(), "count mismatch");
        prop_assert_eq!(inclusive.is_empty(), expected.is_empty());

        let exclusive = wavl.range(Some(&lo), Some(&hi), true).unwrap();
        let got: Vec<_> = exclusive.entries(&wavl).map(|(&k, &v)| (k, v)).collect();
        let expected: Vec<_> = bt.range(lo..hi).map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(&got, &expected, "exclusive range mismatch");
        prop_assert_eq!(exclusive.count(&wavl), expected.len(), "exclusive count mismatch");

        // Reverse iteration over the inclusive slice.
        let got_rev: Vec<_> = inclusive.entries(&wavl).rev().map(|(&k, &v)| (k, v)).collect();
        let expected_rev: Vec<_> = bt.range(lo..=hi).rev().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(&got_rev, &expected_rev, "reverse range mismatch");

        // Open-ended ranges.
        let from = wavl.range(Some(&lo), None, false).unwrap();
        let got: Vec<_> = from.keys(&wavl).copied().collect();
        let expected: Vec<_> = bt.range(lo..).map(|(&k, _)| k).collect();
        prop_assert_eq!(&got, &expected, "open-ended range mismatch");
    }

    /// After range(a, b).remove(), exactly the keys outside [a, b] remain,
    /// and the extracted pairs are the keys inside in order.
    #[test]
    fn range_remove_removes_exactly(
        entries in proptest::collection::vec((key_strategy(), value_strategy()), 0..TEST_SIZE),
        a in key_strategy(),
        b in key_strategy(),
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        let mut wavl: WavlMap<i64, i64> = WavlMap::new();
        let mut bt: BTreeMap<i64, i64> = BTreeMap::new();
        for (k, v) in &entries {
            wavl.insert(*k, *v);
            bt.insert(*k, *v);
        }

        let mut range = wavl.range(Some(&lo), Some(&hi), false).unwrap();
        let extracted = range.remove(&mut wavl).unwrap();
        let expected: Vec<_> = bt.range(lo..=hi).map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(&extracted, &expected, "extracted pairs mismatch");

        bt.retain(|k, _| *k < lo || *k > hi);
        let remaining: Vec<_> = wavl.iter().map(|(&k, &v)| (k, v)).collect();
        let expected: Vec<_> = bt.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(&remaining, &expected, "remaining entries mismatch");
    }

    /// Removing any key never invalidates a cursor on that key's successor.
    #[test]
    fn removal_keeps_successor_cursors_valid(
        keys in proptest::collection::btree_set(key_strategy(), 2..256),
        pick in any::<usize>(),
    ) {
        let mut wavl: WavlMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();

        let ordered: Vec<i64> = keys.iter().copied().collect();
        let victim_index = pick % (ordered.len() - 1);
        let victim = ordered[victim_index];
        let successor = ordered[victim_index + 1];

        let cursor = wavl.entry(successor);
        prop_assert!(wavl.delete(&victim));

        // The successor's cursor must still be usable.
        prop_assert_eq!(cursor.key(&wavl).unwrap(), &successor);
        let prev = cursor.prev(&wavl).unwrap();
        if victim_index > 0 {
            prop_assert_eq!(prev.key(&wavl).unwrap(), Some(&ordered[victim_index - 1]));
        } else {
            prop_assert_eq!(prev.key(&wavl).unwrap(), None);
        }
    }
}

// ─── Deterministic behavior ──────────────────────────────────────────────────

#[test]
fn for_each_passes_the_map() {
    let map = WavlMap::from([(1, 10), (2, 20), (3, 30)]);

    let mut seen = Vec::new();
    map.for_each(|k, v, m| {
        assert_eq!(m.size(), 3);
        seen.push((*k, *v));
    });
    assert_eq!(seen, [(1, 10), (2, 20), (3, 30)]);

    let mut seen = Vec::new();
    map.for_each_reverse(|k, _, _| seen.push(*k));
    assert_eq!(seen, [3, 2, 1]);
}

#[test]
fn clear_staleness_and_reuse() {
    let mut map = WavlMap::from([(1, "a"), (2, "b")]);
    let cursor = map.entry(1);
    map.clear();

    assert!(cursor.key(&map).is_err());
    assert!(map.is_empty());

    // The map is fully usable after a clear.
    map.insert(3, "c");
    assert_eq!(map.get(&3), Some(&"c"));
    assert_eq!(map.size(), 1);
}

#[test]
fn extend_and_builder_chaining() {
    let mut map = WavlMap::new();
    map.set(1, "one").set(2, "two");
    map.extend([(3, "three"), (1, "uno")]);

    assert_eq!(map.size(), 3);
    assert_eq!(map.get(&1), Some(&"uno"));
}

#[test]
fn debug_and_eq() {
    let a = WavlMap::from([(1, "a"), (2, "b")]);
    let b = WavlMap::from([(2, "b"), (1, "a")]);
    assert_eq!(a, b);
    assert_eq!(format!("{a:?}"), "{1: \"a\", 2: \"b\"}");
}
