use core::{borrow::Borrow, fmt, iter::FusedIterator, ops::Index};

use allocator_api2::alloc::Global;

use crate::{Cursor, MapNode, NodeAllocator, NotFound, RbTree, TeardownConfig};

/// An ordered map based on a red-black tree.
///
/// Insertion never overwrites: inserting a key that is already present keeps the existing value
/// and drops the new key and value. To replace a value, [`erase`](Self::erase) the key first.
pub struct RbMap<K, V, A = Global>
where
    K: Ord,
    A: NodeAllocator<MapNode<K, V>>,
{
    tree: RbTree<MapNode<K, V>, A>,
}

impl<K: Ord, V> RbMap<K, V> {
    /// Creates a new, empty `RbMap` backed by the global allocator.
    pub fn new() -> Self {
        RbMap { tree: RbTree::new() }
    }
}

impl<K, V, A> RbMap<K, V, A>
where
    K: Ord,
    A: NodeAllocator<MapNode<K, V>>,
{
    /// Creates a new, empty `RbMap` whose nodes are allocated from `alloc`.
    pub fn new_in(alloc: A) -> Self {
        RbMap {
            tree: RbTree::new_in(alloc),
        }
    }

    /// Creates a new, empty `RbMap` whose nodes are allocated from `alloc`, tearing down with
    /// the stack policy in `teardown`.
    pub fn with_config_in(teardown: TeardownConfig, alloc: A) -> Self {
        RbMap {
            tree: RbTree::with_config_in(teardown, alloc),
        }
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the map.
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Inserts `value` at `key` if `key` is not already present.
    ///
    /// Returns `true` if the pair was inserted. If the key is already present the map is not
    /// modified, and `key` and `value` are dropped.
    #[inline]
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.tree.insert(key, value)
    }

    /// Removes `key` and its value from the map, returning `true` if it was present.
    #[inline]
    pub fn erase<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.erase(key)
    }

    /// Returns `true` if the map contains a value associated with `key`.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.contains(key)
    }

    /// Returns a reference to the value associated with `key`.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] if the map has no entry for `key`.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Result<&V, NotFound>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.search(key).map(MapNode::value)
    }

    /// Returns the stored key and the value associated with `key`.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] if the map has no entry for `key`.
    #[inline]
    pub fn get_key_value<Q>(&self, key: &Q) -> Result<(&K, &V), NotFound>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.search(key).map(MapNode::key_value)
    }

    /// Returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    #[inline]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first().map(MapNode::key_value)
    }

    /// Returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    #[inline]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last().map(MapNode::key_value)
    }

    /// Returns a cursor pointing at the entry with the minimum key, or at the end if the map is
    /// empty.
    pub fn begin(&self) -> Cursor<'_, MapNode<K, V>> {
        self.tree.begin()
    }

    /// Returns a cursor pointing at the end position.
    pub fn end(&self) -> Cursor<'_, MapNode<K, V>> {
        self.tree.end()
    }

    /// Returns an iterator over the entries of the map, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.tree.iter(),
        }
    }

    /// Returns an iterator over the keys of the map, in sorted order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over the values of the map, in key order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Clears the map, removing all elements.
    #[inline]
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Returns a reference to the node allocator.
    pub fn allocator(&self) -> &A {
        self.tree.allocator()
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        self.tree.assert_invariants();
    }
}

impl<K: Ord, V> Default for RbMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, A> fmt::Debug for RbMap<K, V, A>
where
    K: Ord + fmt::Debug,
    V: fmt::Debug,
    A: NodeAllocator<MapNode<K, V>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, Q, V, A> Index<&Q> for RbMap<K, V, A>
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
    A: NodeAllocator<MapNode<K, V>>,
{
    type Output = V;

    /// Returns a reference to the value associated with `key`.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    fn index(&self, key: &Q) -> &V {
        self.get(key).unwrap_or_else(|err| panic!("{err}"))
    }
}

impl<K, V, A> Extend<(K, V)> for RbMap<K, V, A>
where
    K: Ord,
    A: NodeAllocator<MapNode<K, V>>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for RbMap<K, V> {
    /// Collects pairs into a map. For repeated keys the first pair wins.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = RbMap::new();
        map.extend(iter);
        map
    }
}

impl<'a, K, V, A> IntoIterator for &'a RbMap<K, V, A>
where
    K: Ord,
    A: NodeAllocator<MapNode<K, V>>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the entries of an [`RbMap`], sorted by key.
pub struct Iter<'a, K: Ord, V> {
    inner: crate::Iter<'a, MapNode<K, V>>,
}

impl<'a, K: Ord, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(MapNode::key_value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Ord, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(MapNode::key_value)
    }
}

impl<K: Ord, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K: Ord, V> FusedIterator for Iter<'_, K, V> {}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::{format, prelude::v1::*, vec};

    use super::*;

    #[test]
    fn map_insert_keeps_first_value() {
        let mut map = RbMap::new();

        assert!(map.insert(1, "one"));
        assert!(!map.insert(1, "uno"));
        map.assert_invariants();

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Ok(&"one"));
        assert_eq!(map[&1], "one");

        // Replacing a value takes an explicit erase.
        assert!(map.erase(&1));
        assert!(map.insert(1, "uno"));
        assert_eq!(map[&1], "uno");
    }

    #[test]
    fn map_iteration_and_lookup() {
        let map: RbMap<u32, char> = [(3, 'c'), (1, 'a'), (2, 'b'), (1, 'z')].into_iter().collect();

        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(map.values().rev().copied().collect::<Vec<_>>(), vec!['c', 'b', 'a']);
        assert_eq!(map.first_key_value(), Some((&1, &'a')));
        assert_eq!(map.last_key_value(), Some((&3, &'c')));
        assert_eq!(map.get_key_value(&2), Ok((&2, &'b')));
        assert_eq!(map.get(&7), Err(NotFound));
        assert!(map.contains_key(&3));
        assert!(!map.contains_key(&7));
        assert_eq!(format!("{map:?}"), "{1: 'a', 2: 'b', 3: 'c'}");
    }

    #[test]
    #[should_panic(expected = "element not found")]
    fn map_index_missing_key_panics() {
        let map: RbMap<u32, u32> = RbMap::new();
        let _ = map[&0];
    }

    #[test]
    fn map_cursor_walks_entries() {
        let map: RbMap<u8, u8> = (0..4).map(|k| (k, k * 10)).collect();

        let mut cursor = map.begin();
        let mut seen = Vec::new();
        while let Some(node) = cursor.get() {
            seen.push(node.key_value());
            cursor.move_next();
        }

        assert_eq!(cursor, map.end());
        assert_eq!(seen, vec![(&0, &0), (&1, &10), (&2, &20), (&3, &30)]);
    }
}
