use core::{iter::FusedIterator, marker::PhantomData};

use crate::{node_ref, step, Dir, Link, Links, TreeNode};

/// An iterator over the nodes of an [`RbTree`](crate::RbTree) in ascending key order.
///
/// Each step follows the in-order successor (or predecessor, from the back) through child and
/// parent links, so iteration needs no auxiliary storage.
pub struct Iter<'tree, T>
where
    T: TreeNode<Links<T>>,
{
    front: Link<T>,
    back: Link<T>,
    nil: Link<T>,

    len: usize,

    _tree: PhantomData<&'tree T>,
}

impl<'tree, T> Iter<'tree, T>
where
    T: TreeNode<Links<T>>,
{
    pub(crate) fn new(front: Link<T>, back: Link<T>, nil: Link<T>, len: usize) -> Self {
        Iter {
            front,
            back,
            nil,
            len,
            _tree: PhantomData,
        }
    }
}

impl<'tree, T> Iterator for Iter<'tree, T>
where
    T: TreeNode<Links<T>>,
{
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let cur = self.front;
        debug_assert_ne!(cur, self.nil);

        self.len -= 1;
        self.front = unsafe { step(cur, self.nil, Dir::Right) };

        Some(unsafe { node_ref(cur) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'tree, T> DoubleEndedIterator for Iter<'tree, T>
where
    T: TreeNode<Links<T>>,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let cur = self.back;
        debug_assert_ne!(cur, self.nil);

        self.len -= 1;
        self.back = unsafe { step(cur, self.nil, Dir::Left) };

        Some(unsafe { node_ref(cur) })
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> where T: TreeNode<Links<T>> {}

impl<T> FusedIterator for Iter<'_, T> where T: TreeNode<Links<T>> {}

impl<T> Clone for Iter<'_, T>
where
    T: TreeNode<Links<T>>,
{
    fn clone(&self) -> Self {
        Iter { ..*self }
    }
}
