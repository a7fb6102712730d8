use core::{fmt, marker::PhantomData};

use crate::{extreme, node_ref, step, Dir, Link, Links, TreeNode};

/// A bidirectional cursor over an [`RbTree`](crate::RbTree).
///
/// A cursor points either to an element of the tree or to the end position, represented by the
/// tree's sentinel, which sits between the last element and the first. The borrow of the tree
/// keeps it from being modified while the cursor exists.
pub struct Cursor<'tree, T>
where
    T: TreeNode<Links<T>>,
{
    root: Link<T>,
    nil: Link<T>,
    cur: Link<T>,
    _tree: PhantomData<&'tree T>,
}

impl<'tree, T> Cursor<'tree, T>
where
    T: TreeNode<Links<T>>,
{
    pub(crate) fn new(root: Link<T>, nil: Link<T>, cur: Link<T>) -> Self {
        Cursor {
            root,
            nil,
            cur,
            _tree: PhantomData,
        }
    }

    /// Returns `true` if the cursor points to the end position.
    pub fn is_end(&self) -> bool {
        self.cur == self.nil
    }

    /// Returns a reference to the element the cursor points to.
    ///
    /// This returns `None` at the end position.
    pub fn get(&self) -> Option<&'tree T> {
        (!self.is_end()).then(|| unsafe { node_ref(self.cur) })
    }

    /// Moves the cursor to the next element in key order.
    ///
    /// From the last element this moves to the end position; from the end position it wraps to
    /// the first element.
    pub fn move_next(&mut self) {
        self.cur = self.neighbor(Dir::Right);
    }

    /// Moves the cursor to the previous element in key order.
    ///
    /// From the first element this moves to the end position; from the end position it wraps to
    /// the last element.
    pub fn move_prev(&mut self) {
        self.cur = self.neighbor(Dir::Left);
    }

    /// Returns a reference to the element [`move_next`](Self::move_next) would move to.
    pub fn peek_next(&self) -> Option<&'tree T> {
        let next = self.neighbor(Dir::Right);
        (next != self.nil).then(|| unsafe { node_ref(next) })
    }

    /// Returns a reference to the element [`move_prev`](Self::move_prev) would move to.
    pub fn peek_prev(&self) -> Option<&'tree T> {
        let prev = self.neighbor(Dir::Left);
        (prev != self.nil).then(|| unsafe { node_ref(prev) })
    }

    fn neighbor(&self, dir: Dir) -> Link<T> {
        unsafe {
            if self.is_end() {
                extreme(self.root, self.nil, !dir)
            } else {
                step(self.cur, self.nil, dir)
            }
        }
    }
}

impl<T> Clone for Cursor<'_, T>
where
    T: TreeNode<Links<T>>,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Cursor<'_, T> where T: TreeNode<Links<T>> {}

impl<T> PartialEq for Cursor<'_, T>
where
    T: TreeNode<Links<T>>,
{
    fn eq(&self, other: &Self) -> bool {
        self.nil == other.nil && self.cur == other.cur
    }
}

impl<T> Eq for Cursor<'_, T> where T: TreeNode<Links<T>> {}

impl<T> fmt::Debug for Cursor<'_, T>
where
    T: TreeNode<Links<T>> + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.get()).finish()
    }
}
