//! The two node shapes shipped with the crate.
//!
//! Both shapes share the same structural header and differ only in payload. A tree uses exactly
//! one of them, chosen by type, which is why key-only and key/value insertion are separate entry
//! points.

use core::{fmt, ptr::NonNull};

use cordyceps::Linked;

use crate::{Links, NodeAllocator, RbTree, TreeNode};

/// A key-only node, used by [`RbSet`](crate::RbSet).
#[repr(C)]
pub struct SetNode<K> {
    links: Links<SetNode<K>>,
    key: K,
}

/// A key/value node, used by [`RbMap`](crate::RbMap).
#[repr(C)]
pub struct MapNode<K, V> {
    links: Links<MapNode<K, V>>,
    key: K,
    value: V,
}

impl<K> SetNode<K> {
    pub const fn new(key: K) -> Self {
        SetNode {
            links: Links::new(),
            key,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K, V> MapNode<K, V> {
    pub const fn new(key: K, value: V) -> Self {
        MapNode {
            links: Links::new(),
            key,
            value,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn key_value(&self) -> (&K, &V) {
        (&self.key, &self.value)
    }
}

// Nodes are owned by the tree's allocator, so the handle is the node pointer itself.
unsafe impl<K> Linked<Links<SetNode<K>>> for SetNode<K> {
    type Handle = NonNull<SetNode<K>>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        r
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        ptr
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<SetNode<K>>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

unsafe impl<K: Ord> TreeNode<Links<SetNode<K>>> for SetNode<K> {
    type Key = K;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

unsafe impl<K, V> Linked<Links<MapNode<K, V>>> for MapNode<K, V> {
    type Handle = NonNull<MapNode<K, V>>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        r
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        ptr
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<MapNode<K, V>>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

unsafe impl<K: Ord, V> TreeNode<Links<MapNode<K, V>>> for MapNode<K, V> {
    type Key = K;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

impl<K: fmt::Debug> fmt::Debug for SetNode<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetNode")
            .field("links", &self.links)
            .field("key", &self.key)
            .finish()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for MapNode<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapNode")
            .field("links", &self.links)
            .field("key", &self.key)
            .field("value", &self.value)
            .finish()
    }
}

impl<K, A> RbTree<SetNode<K>, A>
where
    K: Ord,
    A: NodeAllocator<SetNode<K>>,
{
    /// Inserts `key`, returning `true` if it was not already present.
    ///
    /// An equal key already in the tree is kept; the new one is dropped.
    pub fn insert(&mut self, key: K) -> bool {
        self.insert_node(SetNode::new(key))
    }
}

impl<K, V, A> RbTree<MapNode<K, V>, A>
where
    K: Ord,
    A: NodeAllocator<MapNode<K, V>>,
{
    /// Inserts `key` with `value`, returning `true` if the key was not already present.
    ///
    /// If the key is already present, the existing value is kept and the new key and value are
    /// dropped.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.insert_node(MapNode::new(key, value))
    }
}
