//! An allocator-parameterized red-black tree, and the ordered set and map built on it.
#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

// Conventions used in comments follow Cormen, Leiserson, Rivest and Stein:
// - `z` is the node being inserted or erased.
// - `y` is the node that is physically unlinked from its position. It is `z` itself when `z` has
//   at most one child, and `z`'s successor otherwise.
// - `x` is the node that moves into `y`'s old position (possibly NIL).
// - `w` is the sibling of `x` during delete fixup.
//
// The red-black invariants are:
// 1. Every node is red or black, and NIL is black.
// 2. The root is black.
// 3. A red node has no red child.
// 4. Every path from a node down to a NIL leaf passes through the same number of black nodes.
//
// NIL is a single sentinel per tree. It is linked to itself and is never written after
// construction: transplanting NIL into a position does not set its parent, and delete fixup
// carries the parent of `x` alongside it instead.

#[cfg(any(feature = "std", test))]
extern crate std;

extern crate alloc;

use alloc::boxed::Box;
use core::{
    borrow::Borrow,
    cell::UnsafeCell,
    cmp::Ordering,
    fmt,
    marker::{PhantomData, PhantomPinned},
    mem,
    ops::Not,
    ptr::NonNull,
};

use allocator_api2::alloc::Global;
use cordyceps::Linked;
use log::trace;

mod allocator;
pub mod cursor;
mod debug;
mod error;
pub mod iter;
pub mod map;
#[cfg(any(test, feature = "model"))]
pub mod model;
mod node;
pub mod set;
mod teardown;

pub use allocator::{Arena, NodeAllocator};
pub use cursor::Cursor;
pub use error::NotFound;
pub use iter::Iter;
pub use map::RbMap;
pub use node::{MapNode, SetNode};
pub use set::RbSet;
pub use teardown::TeardownConfig;

use teardown::GrowableStack;

/// A node shape that can be stored in an [`RbTree`].
///
/// # Safety
///
/// Implementors must be `#[repr(C)]` with their [`Links`] as the first field, and
/// [`Linked::links`] must return a pointer to that field. The tree converts freely between a
/// pointer to a node's links and a pointer to the node itself.
pub unsafe trait TreeNode<L>: Linked<L> {
    type Key: Ord;

    fn key(&self) -> &Self::Key;
}

/// A red-black tree whose nodes are owned by the allocator `A`.
///
/// The tree is insert-or-ignore: inserting a key that is already present discards the new node
/// and leaves the tree untouched.
pub struct RbTree<T, A = Global>
where
    T: TreeNode<Links<T>>,
    A: NodeAllocator<T>,
{
    root: Link<T>,
    nil: Link<T>,
    len: usize,
    alloc: A,
    teardown: TeardownConfig,
    _owns: PhantomData<T>,
}

/// The structural header embedded at the start of every tree node.
#[repr(C)]
pub struct Links<T> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[repr(C)]
struct LinksInner<T> {
    parent: Link<T>,
    children: [Link<T>; 2],
    color: Color,
    _node: PhantomData<NonNull<T>>,
    _unpin: PhantomPinned,
}

type Link<T> = NonNull<Links<T>>;

impl<T> RbTree<T, Global>
where
    T: TreeNode<Links<T>>,
{
    /// Returns a new empty tree backed by the global allocator.
    pub fn new() -> Self {
        Self::new_in(Global)
    }
}

impl<T> Default for RbTree<T, Global>
where
    T: TreeNode<Links<T>>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A> RbTree<T, A>
where
    T: TreeNode<Links<T>>,
    A: NodeAllocator<T>,
{
    /// Returns a new empty tree whose nodes are allocated from `alloc`.
    pub fn new_in(alloc: A) -> Self {
        Self::with_config_in(TeardownConfig::default(), alloc)
    }

    /// Returns a new empty tree whose nodes are allocated from `alloc`, tearing down with the
    /// stack policy in `teardown`.
    ///
    /// Only element nodes come from `alloc`. The tree's NIL sentinel carries no key or value, so
    /// it is a bare [`Links`] boxed on the global heap and freed when the tree is dropped.
    pub fn with_config_in(teardown: TeardownConfig, alloc: A) -> Self {
        let nil = Links::new_sentinel();

        RbTree {
            root: nil,
            nil,
            len: 0,
            alloc,
            teardown,
            _owns: PhantomData,
        }
    }

    /// Returns `true` if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        let empty = self.len == 0;
        debug_assert_eq!(empty, self.root == self.nil);
        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns a reference to the node allocator.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Returns the teardown stack policy used by [`clear`](Self::clear) and drop.
    pub fn teardown_config(&self) -> TeardownConfig {
        self.teardown
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        let nil = self.nil;

        unsafe {
            assert_eq!(color(nil), Color::Black, "sentinel must be black");
            assert!(
                parent(nil) == nil && child(nil, Dir::Left) == nil && child(nil, Dir::Right) == nil,
                "sentinel must link only to itself"
            );

            if self.root == nil {
                assert_eq!(self.len, 0, "empty tree must have length 0");
                return;
            }

            assert_eq!(color(self.root), Color::Black, "root must be black");
            assert_eq!(parent(self.root), nil, "root's parent must be the sentinel");

            let (count, _) = self.assert_invariants_at(self.root, None, None);
            assert_eq!(count, self.len, "length disagrees with node count");
        }
    }

    // Checks the subtree at `x`, whose keys must lie strictly between `lo` and `hi`.
    //
    // Returns the number of nodes in the subtree and its black height, counting NIL.
    unsafe fn assert_invariants_at<'a>(
        &'a self,
        x: Link<T>,
        lo: Option<&'a T::Key>,
        hi: Option<&'a T::Key>,
    ) -> (usize, usize) {
        if x == self.nil {
            return (0, 1);
        }

        unsafe {
            let key = node_ref(x).key();

            if let Some(lo) = lo {
                assert!(lo < key, "keys must be strictly increasing in order");
            }
            if let Some(hi) = hi {
                assert!(key < hi, "keys must be strictly increasing in order");
            }

            let mut count = 1;
            let mut heights = [0; 2];

            for dir in [Dir::Left, Dir::Right] {
                let c = child(x, dir);

                if c != self.nil {
                    assert_eq!(parent(c), x, "child's parent link must point back");

                    if color(x) == Color::Red {
                        assert_eq!(color(c), Color::Black, "red node must not have a red child");
                    }
                }

                let (lo, hi) = match dir {
                    Dir::Left => (lo, Some(key)),
                    Dir::Right => (Some(key), hi),
                };

                let (n, height) = self.assert_invariants_at(c, lo, hi);
                count += n;
                heights[dir as usize] = height;
            }

            assert_eq!(heights[0], heights[1], "black heights must match");

            (count, heights[0] + usize::from(color(x) == Color::Black))
        }
    }

    fn find<Q>(&self, key: &Q) -> Option<Link<T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.root;

        while cur != self.nil {
            unsafe {
                match key.cmp(node_ref(cur).key().borrow()) {
                    Ordering::Less => cur = child(cur, Dir::Left),
                    Ordering::Equal => return Some(cur),
                    Ordering::Greater => cur = child(cur, Dir::Right),
                }
            }
        }

        None
    }

    /// Returns `true` if the tree contains a node with a key equal to `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Returns the node whose key is equal to `key`.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] if no such node exists. Use [`contains`](Self::contains) to probe
    /// without an error.
    pub fn search<Q>(&self, key: &Q) -> Result<&T, NotFound>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key)
            .map(|x| unsafe { node_ref(x) })
            .ok_or(NotFound)
    }

    /// Returns the node with the minimum key.
    pub fn first(&self) -> Option<&T> {
        if self.root == self.nil {
            return None;
        }

        unsafe { Some(node_ref(extreme(self.root, self.nil, Dir::Left))) }
    }

    /// Returns the node with the maximum key.
    pub fn last(&self) -> Option<&T> {
        if self.root == self.nil {
            return None;
        }

        unsafe { Some(node_ref(extreme(self.root, self.nil, Dir::Right))) }
    }

    /// Returns a cursor pointing at the minimum element, or at the end if the tree is empty.
    pub fn begin(&self) -> Cursor<'_, T> {
        let first = unsafe { extreme(self.root, self.nil, Dir::Left) };
        Cursor::new(self.root, self.nil, first)
    }

    /// Returns a cursor pointing at the end position, one past the maximum element.
    pub fn end(&self) -> Cursor<'_, T> {
        Cursor::new(self.root, self.nil, self.nil)
    }

    /// Returns an iterator over the nodes of the tree in ascending key order.
    pub fn iter(&self) -> Iter<'_, T> {
        unsafe {
            Iter::new(
                extreme(self.root, self.nil, Dir::Left),
                extreme(self.root, self.nil, Dir::Right),
                self.nil,
                self.len,
            )
        }
    }

    /// Inserts `node` into the tree.
    ///
    /// The node is allocated first; if a node with an equal key is already present, the new node
    /// is handed straight back to the allocator and the tree is left unchanged. Returns `true` if
    /// the node was linked in.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert_node(&mut self, node: T) -> bool {
        let ptr = self.alloc.allocate(node);
        let nil = self.nil;

        unsafe {
            let z = T::links(ptr);

            let mut y = nil;
            let mut x = self.root;
            let mut dir = Dir::Left;

            // Hands the node back if a key comparison unwinds, or if the key is already present.
            let release = ReleaseOnDrop {
                alloc: &mut self.alloc,
                node: ptr,
            };

            // Descend the tree, looking for the leaf position of `z`.
            while x != nil {
                y = x;

                dir = match node_ref(z).key().cmp(node_ref(x).key()) {
                    Ordering::Less => Dir::Left,
                    Ordering::Greater => Dir::Right,
                    Ordering::Equal => {
                        drop(release);
                        return false;
                    }
                };

                x = child(x, dir);
            }

            mem::forget(release);

            set_parent(z, y);
            set_child(z, Dir::Left, self.nil);
            set_child(z, Dir::Right, self.nil);
            set_color(z, Color::Red);

            if y == self.nil {
                self.root = z;
            } else {
                set_child(y, dir, z);
            }

            self.len += 1;
            self.insert_fixup(z);
        }

        true
    }

    // Restores invariant 3 after the red leaf `z` has been linked in.
    fn insert_fixup(&mut self, mut z: Link<T>) {
        unsafe {
            while color(parent(z)) == Color::Red {
                // The parent is red, so it is not the root and the grandparent is a real node.
                let p = parent(z);
                let g = parent(p);
                let dir = which_child(g, p);
                let uncle = child(g, !dir);

                if color(uncle) == Color::Red {
                    // Push the violation two levels up.
                    set_color(p, Color::Black);
                    set_color(uncle, Color::Black);
                    set_color(g, Color::Red);
                    z = g;
                } else {
                    if z == child(p, !dir) {
                        // Inner grandchild: rotate it to the outside first.
                        z = p;
                        self.rotate(z, dir);
                    }

                    let p = parent(z);
                    let g = parent(p);

                    set_color(p, Color::Black);
                    set_color(g, Color::Red);
                    self.rotate(g, !dir);
                }
            }

            set_color(self.root, Color::Black);
        }
    }

    // Rotates the subtree at `x` so that `x` moves down into its `dir` side and its `!dir` child
    // takes its place. `rotate(x, Dir::Left)` is a left rotation.
    fn rotate(&mut self, x: Link<T>, dir: Dir) {
        unsafe {
            let y = child(x, !dir);
            debug_assert_ne!(y, self.nil, "rotation needs a child to lift");

            let across = child(y, dir);
            set_child(x, !dir, across);
            if across != self.nil {
                set_parent(across, x);
            }

            let p = parent(x);
            set_parent(y, p);

            if p == self.nil {
                self.root = y;
            } else {
                set_child(p, which_child(p, x), y);
            }

            set_child(y, dir, x);
            set_parent(x, y);
        }
    }

    // Puts `v` in `u`'s position under `u`'s parent. `u`'s own links are left untouched.
    fn transplant(&mut self, u: Link<T>, v: Link<T>) {
        unsafe {
            let p = parent(u);

            if p == self.nil {
                self.root = v;
            } else {
                set_child(p, which_child(p, u), v);
            }

            if v != self.nil {
                set_parent(v, p);
            }
        }
    }

    /// Removes the node whose key is equal to `key`, returning `true` if one was found.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn erase<Q>(&mut self, key: &Q) -> bool
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let Some(z) = self.find(key) else {
            return false;
        };

        unsafe {
            let mut y_color = color(z);
            let x;
            let x_parent;

            if child(z, Dir::Left) == self.nil {
                x = child(z, Dir::Right);
                x_parent = parent(z);
                self.transplant(z, x);
            } else if child(z, Dir::Right) == self.nil {
                x = child(z, Dir::Left);
                x_parent = parent(z);
                self.transplant(z, x);
            } else {
                // Two children: the successor `y` has no left child. Move it into `z`'s position,
                // taking `z`'s color, and let its right child take its old place.
                let y = extreme(child(z, Dir::Right), self.nil, Dir::Left);
                y_color = color(y);
                x = child(y, Dir::Right);

                if parent(y) == z {
                    x_parent = y;
                } else {
                    x_parent = parent(y);
                    self.transplant(y, x);

                    let right = child(z, Dir::Right);
                    set_child(y, Dir::Right, right);
                    set_parent(right, y);
                }

                self.transplant(z, y);

                let left = child(z, Dir::Left);
                set_child(y, Dir::Left, left);
                set_parent(left, y);
                set_color(y, color(z));
            }

            self.len -= 1;

            // Removing a black node shortens every path through `x` by one.
            if y_color == Color::Black {
                self.delete_fixup(x, x_parent);
            }

            // `z` is unlinked and the tree is balanced again, so a panicking destructor cannot
            // leave it inconsistent.
            self.alloc.deallocate(node_ptr(z));
        }

        true
    }

    // Restores invariant 4 after a black node was removed above `x`, whose parent is `parent`.
    //
    // `x` carries an extra black; the loop pushes it up or absorbs it with rotations.
    fn delete_fixup(&mut self, mut x: Link<T>, mut parent_x: Link<T>) {
        unsafe {
            while x != self.root && color(x) == Color::Black {
                let dir = if child(parent_x, Dir::Left) == x {
                    Dir::Left
                } else {
                    Dir::Right
                };

                // `x` is doubly black, so its sibling has black height at least one.
                let mut w = child(parent_x, !dir);
                debug_assert_ne!(w, self.nil, "doubly black node must have a sibling");

                if color(w) == Color::Red {
                    set_color(w, Color::Black);
                    set_color(parent_x, Color::Red);
                    self.rotate(parent_x, dir);
                    w = child(parent_x, !dir);
                }

                if color(child(w, dir)) == Color::Black && color(child(w, !dir)) == Color::Black {
                    set_color(w, Color::Red);
                    x = parent_x;
                    parent_x = parent(x);
                } else {
                    if color(child(w, !dir)) == Color::Black {
                        // Near child is red: turn it into the far child.
                        set_color(child(w, dir), Color::Black);
                        set_color(w, Color::Red);
                        self.rotate(w, !dir);
                        w = child(parent_x, !dir);
                    }

                    set_color(w, color(parent_x));
                    set_color(parent_x, Color::Black);
                    set_color(child(w, !dir), Color::Black);
                    self.rotate(parent_x, dir);

                    x = self.root;
                }
            }

            if x != self.nil {
                set_color(x, Color::Black);
            }
        }
    }

    /// Clears the tree, releasing every node to the allocator.
    ///
    /// Nodes are visited with an explicit stack rather than recursion, so the call stack does not
    /// grow with the tree.
    pub fn clear(&mut self) {
        if self.root == self.nil {
            return;
        }

        let expected = self.len;
        trace!("tearing down {expected} nodes");

        let mut stack = GrowableStack::new(self.teardown);
        stack.push_back(self.root);

        self.root = self.nil;
        self.len = 0;

        let mut released = 0;
        while let Some(x) = stack.pop_back() {
            unsafe {
                for dir in [Dir::Left, Dir::Right] {
                    let c = child(x, dir);
                    if c != self.nil {
                        stack.push_back(c);
                    }
                }

                self.alloc.deallocate(node_ptr(x));
            }

            released += 1;
        }

        debug_assert!(stack.is_empty());
        debug_assert_eq!(released, expected);
        trace!("teardown released {released} nodes");
    }
}

// Releases `node` back to `alloc` when dropped.
struct ReleaseOnDrop<'a, T, A: NodeAllocator<T>> {
    alloc: &'a mut A,
    node: NonNull<T>,
}

impl<T, A: NodeAllocator<T>> Drop for ReleaseOnDrop<'_, T, A> {
    fn drop(&mut self) {
        // SAFETY: the node came from `alloc` and was never linked into a tree.
        unsafe { self.alloc.deallocate(self.node) };
    }
}

impl<T, A> Drop for RbTree<T, A>
where
    T: TreeNode<Links<T>>,
    A: NodeAllocator<T>,
{
    fn drop(&mut self) {
        self.clear();

        // SAFETY: the sentinel was boxed in `with_config_in`, and the tree is now empty so nothing
        // links to it.
        unsafe { drop(Box::from_raw(self.nil.as_ptr())) };
    }
}

impl<T, A> fmt::Debug for RbTree<T, A>
where
    T: TreeNode<Links<T>> + fmt::Debug,
    A: NodeAllocator<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'tree, T, A> IntoIterator for &'tree RbTree<T, A>
where
    T: TreeNode<Links<T>>,
    A: NodeAllocator<T>,
{
    type Item = &'tree T;
    type IntoIter = Iter<'tree, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> Links<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: NonNull::dangling(),
                children: [NonNull::dangling(); 2],
                color: Color::Red,
                _node: PhantomData,
                _unpin: PhantomPinned,
            }),
        }
    }

    // Boxes a black, self-linked sentinel. It is freed by the owning tree's `Drop`.
    fn new_sentinel() -> Link<T> {
        let nil = NonNull::from(Box::leak(Box::new(Links::new())));

        unsafe {
            let links = nil.as_ref();
            links.set_parent(nil);
            links.set_child(Dir::Left, nil);
            links.set_child(Dir::Right, nil);
            links.set_color(Color::Black);
        }

        nil
    }

    #[inline]
    fn color(&self) -> Color {
        unsafe { (*self.inner.get()).color }
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    fn set_color(&self, color: Color) {
        unsafe { (*self.inner.get()).color = color }
    }

    #[inline]
    fn set_parent(&self, parent: Link<T>) {
        unsafe { (*self.inner.get()).parent = parent }
    }

    #[inline]
    fn set_child(&self, dir: Dir, child: Link<T>) {
        unsafe { (*self.inner.get()).children[dir as usize] = child }
    }
}

impl<T> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("color", &self.color())
            .finish_non_exhaustive()
    }
}

// Raw link accessors. Every `Link` passed in must point at a live node of the tree or at its
// sentinel.

#[inline]
unsafe fn color<T>(x: Link<T>) -> Color {
    unsafe { x.as_ref().color() }
}

#[inline]
unsafe fn parent<T>(x: Link<T>) -> Link<T> {
    unsafe { x.as_ref().parent() }
}

#[inline]
unsafe fn child<T>(x: Link<T>, dir: Dir) -> Link<T> {
    unsafe { x.as_ref().child(dir) }
}

#[inline]
unsafe fn set_color<T>(x: Link<T>, color: Color) {
    unsafe { x.as_ref().set_color(color) }
}

#[inline]
unsafe fn set_parent<T>(x: Link<T>, parent: Link<T>) {
    unsafe { x.as_ref().set_parent(parent) }
}

#[inline]
unsafe fn set_child<T>(x: Link<T>, dir: Dir, child: Link<T>) {
    unsafe { x.as_ref().set_child(dir, child) }
}

// Returns which child of `parent` the real node `x` is.
#[inline]
unsafe fn which_child<T>(parent: Link<T>, x: Link<T>) -> Dir {
    if unsafe { child(parent, Dir::Left) } == x {
        Dir::Left
    } else {
        Dir::Right
    }
}

// `x` must not be the sentinel.
#[inline]
unsafe fn node_ptr<T>(x: Link<T>) -> NonNull<T> {
    // SAFETY: nodes are `#[repr(C)]` with their links first (see `TreeNode`).
    x.cast()
}

#[inline]
unsafe fn node_ref<'a, T>(x: Link<T>) -> &'a T {
    unsafe { node_ptr(x).as_ref() }
}

// Returns the last node reached by following `dir` children from `x`, or `nil` if `x` is `nil`.
#[inline]
unsafe fn extreme<T>(mut x: Link<T>, nil: Link<T>, dir: Dir) -> Link<T> {
    unsafe {
        while child(x, dir) != nil {
            x = child(x, dir);
        }
    }

    x
}

// Returns the in-order neighbor of the real node `x` on its `dir` side (`Dir::Right` is the
// successor), or `nil` if `x` is the last node in that direction.
unsafe fn step<T>(x: Link<T>, nil: Link<T>, dir: Dir) -> Link<T> {
    unsafe {
        let c = child(x, dir);
        if c != nil {
            return extreme(c, nil, !dir);
        }

        let mut x = x;
        let mut y = parent(x);

        while y != nil && x == child(y, dir) {
            x = y;
            y = parent(y);
        }

        y
    }
}
