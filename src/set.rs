use core::{borrow::Borrow, fmt, iter::FusedIterator};

use allocator_api2::alloc::Global;

use crate::{Cursor, NodeAllocator, NotFound, RbTree, SetNode, TeardownConfig};

/// An ordered set based on a red-black tree.
///
/// Inserting a value that is already present keeps the stored value and drops the new one.
pub struct RbSet<K, A = Global>
where
    K: Ord,
    A: NodeAllocator<SetNode<K>>,
{
    tree: RbTree<SetNode<K>, A>,
}

impl<K: Ord> RbSet<K> {
    /// Creates a new, empty `RbSet` backed by the global allocator.
    pub fn new() -> Self {
        RbSet { tree: RbTree::new() }
    }
}

impl<K, A> RbSet<K, A>
where
    K: Ord,
    A: NodeAllocator<SetNode<K>>,
{
    /// Creates a new, empty `RbSet` whose nodes are allocated from `alloc`.
    pub fn new_in(alloc: A) -> Self {
        RbSet {
            tree: RbTree::new_in(alloc),
        }
    }

    /// Creates a new, empty `RbSet` whose nodes are allocated from `alloc`, tearing down with
    /// the stack policy in `teardown`.
    pub fn with_config_in(teardown: TeardownConfig, alloc: A) -> Self {
        RbSet {
            tree: RbTree::with_config_in(teardown, alloc),
        }
    }

    /// Returns `true` if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the set.
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Adds `value` to the set, returning `true` if it was not already present.
    pub fn insert(&mut self, value: K) -> bool {
        self.tree.insert(value)
    }

    /// Removes `value` from the set, returning `true` if it was present.
    pub fn erase<Q>(&mut self, value: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.erase(value)
    }

    /// Returns `true` if the set contains `value`.
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.contains(value)
    }

    /// Returns the stored value equal to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] if the set holds no such value.
    pub fn get<Q>(&self, value: &Q) -> Result<&K, NotFound>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.search(value).map(SetNode::key)
    }

    /// Returns the minimum value in the set.
    pub fn first(&self) -> Option<&K> {
        self.tree.first().map(SetNode::key)
    }

    /// Returns the maximum value in the set.
    pub fn last(&self) -> Option<&K> {
        self.tree.last().map(SetNode::key)
    }

    /// Returns a cursor pointing at the minimum value, or at the end if the set is empty.
    pub fn begin(&self) -> Cursor<'_, SetNode<K>> {
        self.tree.begin()
    }

    /// Returns a cursor pointing at the end position.
    pub fn end(&self) -> Cursor<'_, SetNode<K>> {
        self.tree.end()
    }

    /// Returns an iterator over the values of the set in ascending order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            inner: self.tree.iter(),
        }
    }

    /// Clears the set, removing all elements.
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

impl<K: Ord> Default for RbSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, A> fmt::Debug for RbSet<K, A>
where
    K: Ord + fmt::Debug,
    A: NodeAllocator<SetNode<K>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, A> Extend<K> for RbSet<K, A>
where
    K: Ord,
    A: NodeAllocator<SetNode<K>>,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<K: Ord> FromIterator<K> for RbSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = RbSet::new();
        set.extend(iter);
        set
    }
}

impl<'a, K, A> IntoIterator for &'a RbSet<K, A>
where
    K: Ord,
    A: NodeAllocator<SetNode<K>>,
{
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the values of an [`RbSet`] in ascending order.
pub struct Iter<'a, K: Ord> {
    inner: crate::Iter<'a, SetNode<K>>,
}

impl<'a, K: Ord> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(SetNode::key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Ord> DoubleEndedIterator for Iter<'_, K> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(SetNode::key)
    }
}

impl<K: Ord> ExactSizeIterator for Iter<'_, K> {}

impl<K: Ord> FusedIterator for Iter<'_, K> {}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::{format, prelude::v1::*, vec};

    use super::*;
    use crate::Arena;

    #[test]
    fn set_basics() {
        let mut set = RbSet::new();
        assert!(set.is_empty());
        assert_eq!(set.begin(), set.end());

        assert!(set.insert(3));
        assert!(set.insert(1));
        assert!(set.insert(2));
        assert!(!set.insert(2));
        set.assert_invariants();

        assert_eq!(set.len(), 3);
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(set.first(), Some(&1));
        assert_eq!(set.last(), Some(&3));
        assert_eq!(set.get(&2), Ok(&2));
        assert_eq!(set.get(&4), Err(NotFound));

        assert!(set.erase(&1));
        assert!(!set.erase(&1));
        assert!(!set.contains(&1));
        assert_eq!(format!("{set:?}"), "{2, 3}");
    }

    #[test]
    fn set_borrowed_lookup() {
        let set: RbSet<String> = ["pear", "apple", "fig"]
            .into_iter()
            .map(String::from)
            .collect();

        assert!(set.contains("fig"));
        assert_eq!(set.get("apple").map(String::as_str), Ok("apple"));
        assert_eq!(set.iter().map(String::as_str).collect::<Vec<_>>(), vec!["apple", "fig", "pear"]);
    }

    #[test]
    fn set_in_arena() {
        let mut set: RbSet<u32, Arena<SetNode<u32>>> = RbSet::new_in(Arena::with_chunk_capacity(4));

        set.extend(0..10u32);
        assert_eq!(set.allocator().live(), 10);

        for i in (0..10u32).step_by(2) {
            assert!(set.erase(&i));
        }
        assert_eq!(set.allocator().live(), 5);

        // Released slots are reused before the arena grows again.
        let capacity = set.allocator().capacity();
        set.extend(10..15);
        assert_eq!(set.allocator().capacity(), capacity);

        set.clear();
        assert_eq!(set.allocator().live(), 0);
        set.assert_invariants();
    }
}
