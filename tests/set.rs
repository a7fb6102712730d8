use std::collections::BTreeSet;

use cordyceps_rbtree::{Arena, NotFound, RbSet, SetNode, TeardownConfig};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// Generates values in a range small enough to collide often.
fn value_strategy() -> impl Strategy<Value = i64> {
    -500i64..500i64
}

#[derive(Debug, Clone)]
enum SetOp {
    Insert(i64),
    Erase(i64),
    Contains(i64),
    Get(i64),
}

fn set_op_strategy() -> impl Strategy<Value = SetOp> {
    prop_oneof![
        5 => value_strategy().prop_map(SetOp::Insert),
        3 => value_strategy().prop_map(SetOp::Erase),
        2 => value_strategy().prop_map(SetOp::Contains),
        2 => value_strategy().prop_map(SetOp::Get),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Replays random operations on both `RbSet` and `BTreeSet` and compares every result.
    #[test]
    fn set_ops_match_btreeset(ops in proptest::collection::vec(set_op_strategy(), 0..2_000)) {
        let mut rb_set: RbSet<i64> = RbSet::new();
        let mut bt_set: BTreeSet<i64> = BTreeSet::new();

        for op in &ops {
            match op {
                SetOp::Insert(v) => {
                    prop_assert_eq!(rb_set.insert(*v), bt_set.insert(*v), "insert({})", v);
                }
                SetOp::Erase(v) => {
                    prop_assert_eq!(rb_set.erase(v), bt_set.remove(v), "erase({})", v);
                }
                SetOp::Contains(v) => {
                    prop_assert_eq!(rb_set.contains(v), bt_set.contains(v), "contains({})", v);
                }
                SetOp::Get(v) => {
                    prop_assert_eq!(rb_set.get(v), bt_set.get(v).ok_or(NotFound), "get({})", v);
                }
            }
        }

        rb_set.assert_invariants();
        prop_assert_eq!(rb_set.len(), bt_set.len());
        prop_assert_eq!(rb_set.first(), bt_set.first());
        prop_assert_eq!(rb_set.last(), bt_set.last());
        prop_assert!(rb_set.iter().eq(bt_set.iter()));
        prop_assert!(rb_set.iter().rev().eq(bt_set.iter().rev()));
    }

    /// The arena-backed set behaves exactly like the default one.
    #[test]
    fn arena_set_matches_global(values in proptest::collection::vec(value_strategy(), 0..500)) {
        let mut global: RbSet<i64> = RbSet::new();
        let mut arena: RbSet<i64, Arena<SetNode<i64>>> = RbSet::new_in(Arena::new());

        for v in &values {
            prop_assert_eq!(global.insert(*v), arena.insert(*v));
        }
        for v in values.iter().step_by(2) {
            prop_assert_eq!(global.erase(v), arena.erase(v));
        }

        arena.assert_invariants();
        prop_assert_eq!(arena.allocator().live(), arena.len());
        prop_assert!(global.iter().eq(arena.iter()));
    }
}

#[test]
fn cursor_round_trip() {
    let set: RbSet<u32> = (1..=5).collect();

    let mut cursor = set.begin();
    let mut forward = Vec::new();
    while !cursor.is_end() {
        forward.push(*cursor.get().map(SetNode::key).unwrap());
        cursor.move_next();
    }
    assert_eq!(forward, vec![1, 2, 3, 4, 5]);
    assert_eq!(cursor, set.end());

    let mut backward = Vec::new();
    cursor.move_prev();
    while !cursor.is_end() {
        backward.push(*cursor.get().map(SetNode::key).unwrap());
        cursor.move_prev();
    }
    assert_eq!(backward, vec![5, 4, 3, 2, 1]);
}

#[test]
fn empty_set() {
    let mut set: RbSet<u32> = RbSet::default();

    assert!(set.is_empty());
    assert_eq!(set.len(), 0);
    assert_eq!(set.begin(), set.end());
    assert_eq!(set.iter().next(), None);
    assert_eq!(set.get(&1), Err(NotFound));
    assert!(!set.erase(&1));

    set.clear();
    set.assert_invariants();
}

#[test]
fn custom_teardown_policy() {
    let config = TeardownConfig::new()
        .with_initial_capacity(2)
        .with_growth_factor(1.25);
    let mut set: RbSet<u32, Arena<SetNode<u32>>> =
        RbSet::with_config_in(config, Arena::with_chunk_capacity(16));

    set.extend(0..5_000u32);
    assert_eq!(set.len(), 5_000);
    assert_eq!(set.allocator().live(), 5_000);

    set.clear();
    assert!(set.is_empty());
    assert_eq!(set.allocator().live(), 0);
}
