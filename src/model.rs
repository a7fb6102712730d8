extern crate std;

use std::{
    collections::{BTreeMap, BTreeSet},
    prelude::v1::*,
};

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::{MapNode, NotFound, RbMap, RbTree, SetNode};

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

impl ItemValue {
    // Resolves to a value already in `sorted` (when indexing a non-empty model) or to a random
    // value, so that lookups and erasures hit existing keys often.
    fn resolve(self, sorted: &[u32]) -> u32 {
        match self {
            ItemValue::Index(idx) => {
                if sorted.is_empty() {
                    idx as u32
                } else {
                    sorted[idx % sorted.len()]
                }
            }
            ItemValue::Random(v) => v,
        }
    }
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

fn insert_sorted(v: &mut Vec<u32>, value: u32) {
    if let Err(idx) = v.binary_search(&value) {
        v.insert(idx, value);
    }
}

fn remove_sorted(v: &mut Vec<u32>, value: u32) {
    if let Ok(idx) = v.binary_search(&value) {
        v.remove(idx);
    }
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue),
    Contains(ItemValue),
    Search(ItemValue),
    Erase(ItemValue),
    First,
    Last,
    Clear,
}

impl Op {
    fn finalize(self, sorted: &[u32]) -> FinalOp {
        match self {
            Op::Insert(item) => FinalOp::Insert(item.resolve(sorted)),
            Op::Contains(item) => FinalOp::Contains(item.resolve(sorted)),
            Op::Search(item) => FinalOp::Search(item.resolve(sorted)),
            Op::Erase(item) => FinalOp::Erase(item.resolve(sorted)),
            Op::First => FinalOp::First,
            Op::Last => FinalOp::Last,
            Op::Clear => FinalOp::Clear,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(u32),
    Contains(u32),
    Search(u32),
    Erase(u32),
    First,
    Last,
    Clear,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    // Clear is rare so that trees get a chance to grow.
    proptest::prop_oneof![
        8 => value_strategy().prop_map(Op::Insert),
        4 => value_strategy().prop_map(Op::Contains),
        4 => value_strategy().prop_map(Op::Search),
        6 => value_strategy().prop_map(Op::Erase),
        2 => Just(Op::First),
        2 => Just(Op::Last),
        1 => Just(Op::Clear),
    ]
}

pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut sorted_values = Vec::with_capacity(ops.len());
    let mut btree = BTreeSet::new();
    let mut rb: RbTree<SetNode<u32>> = RbTree::new();

    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&sorted_values);

        match final_op {
            FinalOp::Insert(value) => {
                insert_sorted(&mut sorted_values, value);

                let from_btree = btree.insert(value);
                let from_rb = rb.insert(value);

                assert_eq!(from_btree, from_rb, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Contains(value) => {
                let from_btree = btree.contains(&value);
                let from_rb = rb.contains(&value);

                assert_eq!(from_btree, from_rb, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Search(value) => {
                let from_btree = btree.get(&value).ok_or(NotFound);
                let from_rb = rb.search(&value).map(SetNode::key);

                assert_eq!(from_btree, from_rb, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Erase(value) => {
                remove_sorted(&mut sorted_values, value);

                let from_btree = btree.remove(&value);
                let from_rb = rb.erase(&value);

                assert_eq!(from_btree, from_rb, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::First => {
                let from_btree = btree.first();
                let from_rb = rb.first().map(SetNode::key);

                assert_eq!(from_btree, from_rb, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Last => {
                let from_btree = btree.last();
                let from_rb = rb.last().map(SetNode::key);

                assert_eq!(from_btree, from_rb, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Clear => {
                sorted_values.clear();
                btree.clear();
                rb.clear();
            }
        }

        rb.assert_invariants();
        assert_eq!(btree.len(), rb.len());
        assert!(btree.iter().eq(rb.iter().map(SetNode::key)));
        assert!(btree.iter().rev().eq(rb.iter().rev().map(SetNode::key)));
    }
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum MapOp {
    Insert(ItemValue, u32),
    Get(ItemValue),
    Erase(ItemValue),
    FirstKeyValue,
    LastKeyValue,
    Clear,
}

pub fn map_op_strategy() -> impl Strategy<Value = MapOp> {
    proptest::prop_oneof![
        8 => (value_strategy(), 0u32..1000).prop_map(|(key, value)| MapOp::Insert(key, value)),
        4 => value_strategy().prop_map(MapOp::Get),
        6 => value_strategy().prop_map(MapOp::Erase),
        2 => Just(MapOp::FirstKeyValue),
        2 => Just(MapOp::LastKeyValue),
        1 => Just(MapOp::Clear),
    ]
}

pub fn run_map_equivalence(ops: Vec<MapOp>) {
    let mut sorted_keys = Vec::with_capacity(ops.len());
    let mut btree = BTreeMap::new();
    let mut rb: RbMap<u32, u32> = RbMap::new();

    for (op_id, op) in ops.into_iter().enumerate() {
        match op {
            MapOp::Insert(key, value) => {
                let key = key.resolve(&sorted_keys);
                insert_sorted(&mut sorted_keys, key);

                // Inserting never overwrites an existing value.
                let from_btree = !btree.contains_key(&key);
                btree.entry(key).or_insert(value);
                let from_rb = rb.insert(key, value);

                assert_eq!(from_btree, from_rb, "MapOp #{op_id}: {op:?}");
            }

            MapOp::Get(key) => {
                let key = key.resolve(&sorted_keys);

                let from_btree = btree.get(&key).ok_or(NotFound);
                let from_rb = rb.get(&key);

                assert_eq!(from_btree, from_rb, "MapOp #{op_id}: {op:?}");
            }

            MapOp::Erase(key) => {
                let key = key.resolve(&sorted_keys);
                remove_sorted(&mut sorted_keys, key);

                let from_btree = btree.remove(&key).is_some();
                let from_rb = rb.erase(&key);

                assert_eq!(from_btree, from_rb, "MapOp #{op_id}: {op:?}");
            }

            MapOp::FirstKeyValue => {
                let from_btree = btree.first_key_value();
                let from_rb = rb.first_key_value();

                assert_eq!(from_btree, from_rb, "MapOp #{op_id}: {op:?}");
            }

            MapOp::LastKeyValue => {
                let from_btree = btree.last_key_value();
                let from_rb = rb.last_key_value();

                assert_eq!(from_btree, from_rb, "MapOp #{op_id}: {op:?}");
            }

            MapOp::Clear => {
                sorted_keys.clear();
                btree.clear();
                rb.clear();
            }
        }

        rb.assert_invariants();
        assert_eq!(btree.len(), rb.len());
        assert!(btree.iter().eq(rb.iter()));
        assert!(btree.iter().rev().eq(rb.iter().rev()));

        // A full cursor walk visits the same entries and ends on the end position.
        let mut cursor = rb.begin();
        for entry in &btree {
            assert_eq!(
                cursor.get().map(MapNode::key_value),
                Some(entry),
                "MapOp #{op_id}: {op:?}"
            );
            cursor.move_next();
        }
        assert_eq!(cursor, rb.end(), "MapOp #{op_id}: {op:?}");
    }
}

#[derive(Clone, Debug, Arbitrary)]
pub enum CursorOp {
    // Get is not an operation as it's executed on every loop iteration to check equivalence.
    MovePrev,
    MoveNext,
    PeekNext,
    PeekPrev,
}

pub fn cursor_op_strategy() -> impl Strategy<Value = CursorOp> {
    proptest::prop_oneof![
        Just(CursorOp::MovePrev),
        Just(CursorOp::MoveNext),
        Just(CursorOp::PeekNext),
        Just(CursorOp::PeekPrev),
    ]
}

#[derive(Clone, Debug)]
pub struct CursorEquivalenceInput {
    pub values: Vec<u32>,
    pub ops: Vec<CursorOp>,
}

impl<'a> arbitrary::Arbitrary<'a> for CursorEquivalenceInput {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        fn value(u: &mut arbitrary::Unstructured<'_>) -> u32 {
            u32::arbitrary(u).unwrap_or(0)
        }

        fn op(u: &mut arbitrary::Unstructured<'_>) -> CursorOp {
            CursorOp::arbitrary(u).unwrap_or(CursorOp::MoveNext)
        }

        let num_values = u8::arbitrary(u)? % 100;
        let num_ops = u16::arbitrary(u)? % 1000;

        let values = core::iter::repeat_with(|| value(u))
            .take(num_values.into())
            .collect();

        let ops = core::iter::repeat_with(|| op(u))
            .take(num_ops.into())
            .collect();

        Ok(CursorEquivalenceInput { values, ops })
    }
}

pub fn run_cursor_equivalence(mut values: Vec<u32>, ops: Vec<CursorOp>) {
    values.sort_unstable();
    values.dedup();

    // A `Vec` index models the cursor, with `None` as the end position.
    let mut vec = Vec::new();
    let mut rb: RbTree<MapNode<u32, ()>> = RbTree::new();

    for val in values {
        vec.push(val);
        rb.insert(val, ());
    }

    fn vec_curs_prev(v: &[u32], curs: Option<usize>) -> Option<usize> {
        match curs {
            Some(i) => i.checked_sub(1),
            None => v.len().checked_sub(1),
        }
    }

    fn vec_curs_next(v: &[u32], curs: Option<usize>) -> Option<usize> {
        match curs {
            Some(i) => i.checked_add(1).filter(|&i| i < v.len()),
            None => (!v.is_empty()).then_some(0),
        }
    }

    let mut vec_curs = vec_curs_next(&vec, None);
    let mut rb_curs = rb.begin();

    // Check that the initial states are equivalent.
    {
        let v = vec_curs.map(|i| &vec[i]);
        let r = rb_curs.get().map(MapNode::key);

        assert_eq!(v, r);
    }

    for op in ops {
        match op {
            CursorOp::MoveNext => {
                vec_curs = vec_curs_next(&vec, vec_curs);
                rb_curs.move_next();
            }

            CursorOp::MovePrev => {
                vec_curs = vec_curs_prev(&vec, vec_curs);
                rb_curs.move_prev();
            }

            CursorOp::PeekNext => {
                let v = vec_curs_next(&vec, vec_curs).map(|i| &vec[i]);
                let r = rb_curs.peek_next().map(MapNode::key);

                assert_eq!(v, r);
            }

            CursorOp::PeekPrev => {
                let v = vec_curs_prev(&vec, vec_curs).map(|i| &vec[i]);
                let r = rb_curs.peek_prev().map(MapNode::key);

                assert_eq!(v, r);
            }
        }

        let v = vec_curs.map(|i| &vec[i]);
        let r = rb_curs.get().map(MapNode::key);

        assert_eq!(v, r);
        assert_eq!(vec_curs.is_none(), rb_curs.is_end());
    }
}
