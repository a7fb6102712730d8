//! Node storage.
//!
//! A tree never creates or frees node memory itself. Every node is constructed in storage handed
//! out by a [`NodeAllocator`] and given back to it when the node is erased or the tree is torn
//! down.

use alloc::{alloc::handle_alloc_error, boxed::Box, vec::Vec};
use core::{iter, mem::MaybeUninit, ptr, ptr::NonNull};

use allocator_api2::alloc::{Allocator, Layout};
use log::trace;

/// Storage backend for tree nodes.
///
/// Every [`Allocator`] is a `NodeAllocator`, allocating and freeing one node at a time. [`Arena`]
/// is a monotonic alternative that keeps its memory until it is dropped.
///
/// # Safety
///
/// `allocate` must return a pointer to a properly aligned `T` initialized with `node`. The node
/// must stay valid, and must not move, until the pointer is passed to `deallocate`.
pub unsafe trait NodeAllocator<T> {
    /// Moves `node` into storage owned by the allocator.
    fn allocate(&mut self, node: T) -> NonNull<T>;

    /// Drops the node at `node` and relinquishes its storage.
    ///
    /// # Safety
    ///
    /// `node` must have been returned by `allocate` on this allocator and must not have been
    /// deallocated since. It must not be used after this call.
    unsafe fn deallocate(&mut self, node: NonNull<T>);
}

unsafe impl<T, A: Allocator> NodeAllocator<T> for A {
    fn allocate(&mut self, node: T) -> NonNull<T> {
        let layout = Layout::new::<T>();

        let ptr = match <A as Allocator>::allocate(self, layout) {
            Ok(ptr) => ptr.cast::<T>(),
            Err(_) => handle_alloc_error(layout),
        };

        unsafe { ptr.as_ptr().write(node) };
        ptr
    }

    unsafe fn deallocate(&mut self, node: NonNull<T>) {
        unsafe {
            ptr::drop_in_place(node.as_ptr());
            <A as Allocator>::deallocate(self, node.cast(), Layout::new::<T>());
        }
    }
}

const DEFAULT_CHUNK_CAPACITY: usize = 32;

/// A monotonic node arena.
///
/// Nodes are carved out of chunks that double in size as the arena fills. A deallocated node is
/// dropped immediately and its slot is recycled by the next allocation, but chunk memory is only
/// returned to the system when the arena itself is dropped.
///
/// Nodes still live when the arena is dropped are leaked without running their destructors. A
/// tree always releases its nodes before its allocator is dropped.
pub struct Arena<T> {
    chunks: Vec<NonNull<[MaybeUninit<T>]>>,
    // Slots handed out from the newest chunk.
    used: usize,
    free: Vec<NonNull<T>>,
    next_chunk: usize,
    live: usize,
}

impl<T> Arena<T> {
    /// Returns an empty arena. No memory is reserved until the first allocation.
    pub const fn new() -> Self {
        Self::with_chunk_capacity(DEFAULT_CHUNK_CAPACITY)
    }

    /// Returns an empty arena whose first chunk holds `capacity` nodes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub const fn with_chunk_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "arena chunk capacity must be nonzero");

        Arena {
            chunks: Vec::new(),
            used: 0,
            free: Vec::new(),
            next_chunk: capacity,
            live: 0,
        }
    }

    /// Returns the number of nodes currently handed out.
    pub fn live(&self) -> usize {
        self.live
    }

    /// Returns the number of node slots reserved across all chunks.
    pub fn capacity(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.len()).sum()
    }

    fn reserve_slot(&mut self) -> NonNull<T> {
        if let Some(slot) = self.free.pop() {
            return slot;
        }

        let chunk = match self.chunks.last().copied() {
            Some(chunk) if self.used < chunk.len() => chunk,
            _ => self.grow(),
        };

        // SAFETY: `used < chunk.len()`, so the slot lies inside the chunk.
        let slot = unsafe { NonNull::new_unchecked(chunk.as_ptr().cast::<T>().add(self.used)) };
        self.used += 1;
        slot
    }

    fn grow(&mut self) -> NonNull<[MaybeUninit<T>]> {
        let capacity = self.next_chunk;
        trace!("arena reserving a chunk of {capacity} nodes");

        let chunk: Box<[MaybeUninit<T>]> = iter::repeat_with(MaybeUninit::uninit)
            .take(capacity)
            .collect();
        let chunk = NonNull::from(Box::leak(chunk));

        self.chunks.push(chunk);
        self.used = 0;
        self.next_chunk = capacity.saturating_mul(2);

        chunk
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl<T> NodeAllocator<T> for Arena<T> {
    fn allocate(&mut self, node: T) -> NonNull<T> {
        let slot = self.reserve_slot();

        unsafe { slot.as_ptr().write(node) };
        self.live += 1;

        slot
    }

    unsafe fn deallocate(&mut self, node: NonNull<T>) {
        self.live -= 1;

        unsafe { ptr::drop_in_place(node.as_ptr()) };
        self.free.push(node);
    }
}

impl<T> Drop for Arena<T> {
    fn drop(&mut self) {
        if self.live != 0 {
            trace!("arena dropped with {} live nodes", self.live);
        }

        for chunk in self.chunks.drain(..) {
            // SAFETY: every chunk was leaked from a box in `grow`. The slots are `MaybeUninit`, so
            // no node destructors run here.
            drop(unsafe { Box::from_raw(chunk.as_ptr()) });
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::{prelude::v1::*, rc::Rc};

    use super::*;

    struct DropCounter(Rc<core::cell::Cell<usize>>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn arena_grows_geometrically() {
        let mut arena: Arena<u64> = Arena::with_chunk_capacity(2);
        assert_eq!(arena.capacity(), 0);

        let nodes: Vec<_> = (0..7).map(|i| arena.allocate(i)).collect();
        assert_eq!(arena.live(), 7);
        // Chunks of 2, 4 and 8 slots.
        assert_eq!(arena.capacity(), 14);

        for (i, node) in nodes.iter().enumerate() {
            assert_eq!(unsafe { *node.as_ref() }, i as u64);
        }

        for node in nodes {
            unsafe { arena.deallocate(node) };
        }
        assert_eq!(arena.live(), 0);
    }

    #[test]
    fn arena_recycles_released_slots() {
        let mut arena: Arena<u32> = Arena::with_chunk_capacity(4);

        let a = arena.allocate(1);
        let b = arena.allocate(2);
        unsafe { arena.deallocate(a) };

        let c = arena.allocate(3);
        assert_eq!(a, c);
        assert_eq!(arena.capacity(), 4);

        unsafe {
            assert_eq!(*b.as_ref(), 2);
            assert_eq!(*c.as_ref(), 3);
            arena.deallocate(b);
            arena.deallocate(c);
        }
    }

    #[test]
    fn arena_drops_on_deallocate() {
        let drops = Rc::new(core::cell::Cell::new(0));
        let mut arena = Arena::new();

        let node = arena.allocate(DropCounter(drops.clone()));
        assert_eq!(drops.get(), 0);

        unsafe { arena.deallocate(node) };
        assert_eq!(drops.get(), 1);

        drop(arena);
        assert_eq!(drops.get(), 1);
    }
}
