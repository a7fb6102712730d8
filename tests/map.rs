use std::collections::BTreeMap;

use cordyceps_rbtree::{NotFound, RbMap};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn key_strategy() -> impl Strategy<Value = u16> {
    0u16..400
}

#[derive(Debug, Clone)]
enum MapOp {
    Insert(u16, u32),
    Erase(u16),
    Get(u16),
}

fn map_op_strategy() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        5 => (key_strategy(), any::<u32>()).prop_map(|(k, v)| MapOp::Insert(k, v)),
        3 => key_strategy().prop_map(MapOp::Erase),
        2 => key_strategy().prop_map(MapOp::Get),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Replays random operations on both `RbMap` and a `BTreeMap` that never overwrites.
    #[test]
    fn map_ops_match_btreemap(ops in proptest::collection::vec(map_op_strategy(), 0..2_000)) {
        let mut rb_map: RbMap<u16, u32> = RbMap::new();
        let mut bt_map: BTreeMap<u16, u32> = BTreeMap::new();

        for op in &ops {
            match *op {
                MapOp::Insert(k, v) => {
                    let expected = !bt_map.contains_key(&k);
                    bt_map.entry(k).or_insert(v);
                    prop_assert_eq!(rb_map.insert(k, v), expected, "insert({}, {})", k, v);
                }
                MapOp::Erase(k) => {
                    prop_assert_eq!(rb_map.erase(&k), bt_map.remove(&k).is_some(), "erase({})", k);
                }
                MapOp::Get(k) => {
                    prop_assert_eq!(rb_map.get(&k), bt_map.get(&k).ok_or(NotFound), "get({})", k);
                }
            }
        }

        rb_map.assert_invariants();
        prop_assert_eq!(rb_map.len(), bt_map.len());
        prop_assert_eq!(rb_map.first_key_value(), bt_map.first_key_value());
        prop_assert_eq!(rb_map.last_key_value(), bt_map.last_key_value());
        prop_assert!(rb_map.iter().eq(bt_map.iter()));
        prop_assert!(rb_map.keys().rev().eq(bt_map.keys().rev()));
    }
}

#[test]
fn string_keys_borrow_as_str() {
    let mut map = RbMap::new();
    map.insert(String::from("beta"), 2);
    map.insert(String::from("alpha"), 1);
    map.insert(String::from("gamma"), 3);

    assert_eq!(map["beta"], 2);
    assert_eq!(map.get("delta"), Err(NotFound));
    assert!(map.erase("alpha"));
    assert_eq!(
        map.iter().map(|(k, v)| (k.as_str(), *v)).collect::<Vec<_>>(),
        vec![("beta", 2), ("gamma", 3)]
    );
}

#[test]
fn values_follow_keys_through_rebalancing() {
    let mut map = RbMap::new();
    for k in (0..256u32).rev() {
        map.insert(k, k.to_string());
    }
    for k in (0..256u32).filter(|k| k % 3 == 0) {
        assert!(map.erase(&k));
    }
    map.assert_invariants();

    for (k, v) in &map {
        assert_eq!(*v, k.to_string());
    }
    assert_eq!(map.len(), 256 - 86);
}
