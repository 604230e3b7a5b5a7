//! Growable bump allocation for component values.
//!
//! This module provides [`Arena`], the raw memory source behind a
//! [`Storage`](super::Storage). It hands out uninitialized, correctly aligned blocks and never
//! frees or moves anything it has handed out until the arena itself is dropped.
//!
//! # Purpose
//!
//! The arena handles the lowest level of the storage hierarchy:
//! - Raw buffer allocation and deallocation
//! - Alignment and element stride arithmetic
//! - Geometric growth by appending new buffers (old buffers stay where they are)
//!
//! Component values are constructed into and destroyed in arena memory through a
//! [`Slot`](super::Slot). The arena itself never runs a destructor.
//!
//! # Growth
//!
//! When a request does not fit into the remaining space of the active buffer, a new buffer of
//! `max(requested, 2 * allocated)` bytes is appended, where `allocated` is the running total of
//! bytes handed out so far. Earlier buffers are never reallocated, which is what keeps every
//! returned pointer stable.
//!
//! # Usage Example
//!
//! ```ignore
//! use rusty_store::ecs::storage::Arena;
//!
//! let arena = Arena::with_reserve(1024);
//! let ptr = arena.allocate(8, 8, 4)?; // room for four u64s
//! unsafe { ptr.cast::<u64>().write(42) };
//! assert_eq!(arena.allocated(), 32);
//! ```
//!
//! # Thread Safety
//!
//! [`Arena`] is [`Send`] and [`Sync`]. Allocation takes the write side of an internal
//! reader/writer lock, introspection the read side.

use std::{
    alloc::{self, Layout},
    cmp, mem,
    ptr::{self, NonNull},
};

use log::trace;
use parking_lot::RwLock;

use crate::{Error, Result};

/// Every buffer is aligned to at least this many bytes.
const MIN_BUFFER_ALIGN: usize = 16;

/// One contiguous block of raw memory owned by an arena.
#[derive(Debug)]
struct Buffer {
    /// The pointer to the underlying memory
    ptr: NonNull<u8>,
    /// The layout the memory was allocated with.
    layout: Layout,
}

// SAFETY: A buffer is plain owned memory. Access to its contents is coordinated by the arena's
// lock and by the owners of the values placed inside it.
unsafe impl Send for Buffer {}
unsafe impl Sync for Buffer {}

impl Buffer {
    /// Allocate a new buffer of `size` bytes aligned to `align`.
    fn new(size: usize, align: usize) -> Self {
        let layout = Layout::from_size_align(size, cmp::max(align, MIN_BUFFER_ALIGN))
            .expect("layout overflow");

        // SAFETY: Callers never request a zero-sized buffer.
        let ptr = unsafe { alloc::alloc(layout) };
        let Some(ptr) = NonNull::new(ptr) else {
            alloc::handle_alloc_error(layout);
        };
        Self { ptr, layout }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.layout.size()
    }

    #[inline]
    fn align(&self) -> usize {
        self.layout.align()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        // SAFETY: ptr was allocated with exactly this layout.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

/// The lock-protected state of an arena.
#[derive(Debug, Default)]
struct Inner {
    /// Every buffer ever allocated, the active one last.
    buffers: Vec<Buffer>,
    /// Bump offset into the active buffer.
    offset: usize,
    /// Running total of bytes handed out.
    allocated: usize,
}

impl Inner {
    /// Find where in the active buffer a block with `layout` would start, if it fits.
    fn fit(&self, layout: Layout) -> Option<(NonNull<u8>, usize)> {
        let buffer = self.buffers.last()?;
        let start = if buffer.align() >= layout.align() {
            self.offset.next_multiple_of(layout.align())
        } else {
            let addr = buffer.ptr.as_ptr() as usize + self.offset;
            self.offset + (addr.next_multiple_of(layout.align()) - addr)
        };
        let end = start.checked_add(layout.size())?;
        (end <= buffer.capacity()).then_some((buffer.ptr, start))
    }

    /// Append a buffer that fits `layout` at offset 0 and return its base pointer.
    fn grow(&mut self, layout: Layout) -> NonNull<u8> {
        let size = cmp::max(layout.size(), self.allocated.saturating_mul(2));
        trace!(
            "arena growing: buffer #{} of {} bytes (allocated {})",
            self.buffers.len() + 1,
            size,
            self.allocated
        );
        let buffer = Buffer::new(size, layout.align());
        let base = buffer.ptr;
        self.buffers.push(buffer);
        self.offset = 0;
        base
    }

    /// Hand out the next block for `layout`, growing if needed.
    fn bump(&mut self, layout: Layout) -> NonNull<u8> {
        let (base, start) = match self.fit(layout) {
            Some(found) => found,
            None => (self.grow(layout), 0),
        };
        self.offset = start + layout.size();
        self.allocated += layout.size();

        // SAFETY: start + size is within the active buffer's capacity.
        unsafe { base.add(start) }
    }
}

/// A growable bump allocator with stable addresses.
///
/// Memory is only ever released when the arena is dropped. See the [module docs](self).
#[derive(Debug, Default)]
pub struct Arena {
    inner: RwLock<Inner>,
}

impl Arena {
    /// The reserve used by [`Arena::new`]: 64 MiB.
    pub const DEFAULT_RESERVE: usize = 64 * 1024 * 1024;

    /// Create an arena with [`Arena::DEFAULT_RESERVE`] bytes pre-allocated.
    pub fn new() -> Self {
        Self::with_reserve(Self::DEFAULT_RESERVE)
    }

    /// Create an arena with `bytes` pre-allocated. A reserve of 0 allocates nothing up front.
    pub fn with_reserve(bytes: usize) -> Self {
        let mut inner = Inner::default();
        if bytes > 0 {
            inner.buffers.push(Buffer::new(bytes, MIN_BUFFER_ALIGN));
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Allocate contiguous, uninitialized storage for `count` elements of `size` bytes each,
    /// aligned to `align`.
    ///
    /// Each element occupies `size` rounded up to a multiple of `align`. Zero-sized requests
    /// return a dangling, well-aligned pointer without touching the buffers.
    ///
    /// # Errors
    /// [`Error::InvalidLayout`] if `align` is not a power of two or the total size overflows.
    pub fn allocate(&self, align: usize, size: usize, count: usize) -> Result<NonNull<u8>> {
        let invalid = || Error::InvalidLayout { align, size, count };
        let stride = Layout::from_size_align(size, align)
            .map_err(|_| invalid())?
            .pad_to_align()
            .size();
        let bytes = stride.checked_mul(count).ok_or_else(invalid)?;
        let layout = Layout::from_size_align(bytes, align).map_err(|_| invalid())?;
        Ok(self.allocate_layout(layout))
    }

    /// Allocate uninitialized storage for `layout`.
    pub fn allocate_layout(&self, layout: Layout) -> NonNull<u8> {
        if layout.size() == 0 {
            // SAFETY: Alignment is never zero.
            return unsafe { NonNull::new_unchecked(ptr::without_provenance_mut(layout.align())) };
        }
        self.inner.write().bump(layout)
    }

    /// Get the number of buffers allocated so far.
    #[inline]
    pub fn buffer_count(&self) -> usize {
        self.inner.read().buffers.len()
    }

    /// Get the running total of bytes handed out.
    #[inline]
    pub fn allocated(&self) -> usize {
        self.inner.read().allocated
    }

    /// Get the total capacity of every buffer, in bytes.
    pub fn reserved(&self) -> usize {
        self.inner
            .read()
            .buffers
            .iter()
            .map(Buffer::capacity)
            .sum()
    }

    /// Move every buffer into a new arena, leaving this one empty.
    ///
    /// Pointers handed out before the call stay valid; they now belong to the returned arena.
    pub fn take(&self) -> Arena {
        let mut inner = self.inner.write();
        Arena {
            inner: RwLock::new(mem::take(&mut *inner)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn allocate_is_aligned() {
        // Given
        let arena = Arena::with_reserve(256);

        // When
        let a = arena.allocate(1, 1, 3).unwrap();
        let b = arena.allocate(8, 8, 1).unwrap();
        let c = arena.allocate(64, 4, 1).unwrap();

        // Then
        assert_ne!(a, b);
        assert_eq!(b.as_ptr() as usize % 8, 0);
        assert_eq!(c.as_ptr() as usize % 64, 0);
        // Over-aligned elements are charged their padded stride
        assert_eq!(arena.allocated(), 3 + 8 + 64);
    }

    #[test]
    fn stride_is_padded_to_alignment() {
        // Given
        let arena = Arena::with_reserve(128);

        // When
        let first = arena.allocate(8, 8, 4).unwrap();
        let second = arena.allocate(8, 8, 4).unwrap();
        let padded = arena.allocate(4, 6, 2).unwrap();

        // Then - four 8 byte elements consume exactly 32 bytes
        assert_eq!(second.as_ptr() as usize - first.as_ptr() as usize, 32);
        assert_eq!(padded.as_ptr() as usize - second.as_ptr() as usize, 32);
        assert_eq!(arena.allocated(), 32 + 32 + 16);
        assert_eq!(arena.buffer_count(), 1);
    }

    #[test]
    fn grows_by_doubling_allocated() {
        // Given
        let arena = Arena::with_reserve(16);
        arena.allocate(8, 8, 1).unwrap();

        // When - doesn't fit the remaining 8 bytes
        arena.allocate(8, 64, 1).unwrap();

        // Then - max(64, 2 * 8)
        assert_eq!(arena.buffer_count(), 2);
        assert_eq!(arena.reserved(), 16 + 64);

        // When - the second buffer is full
        arena.allocate(1, 1, 1).unwrap();

        // Then - max(1, 2 * 72)
        assert_eq!(arena.buffer_count(), 3);
        assert_eq!(arena.reserved(), 16 + 64 + 144);
        assert_eq!(arena.allocated(), 73);
    }

    #[test]
    fn exhausted_reserve_adds_a_buffer() {
        // Given
        let arena = Arena::with_reserve(4);
        arena.allocate(4, 4, 1).unwrap();
        assert_eq!(arena.buffer_count(), 1);

        // When
        arena.allocate(4, 4, 1).unwrap();

        // Then
        assert_eq!(arena.buffer_count(), 2);
    }

    #[test]
    fn empty_arena_allocates_on_demand() {
        // Given
        let arena = Arena::default();
        assert_eq!(arena.buffer_count(), 0);
        assert_eq!(arena.reserved(), 0);

        // When
        let ptr = arena.allocate(4, 4, 2).unwrap();
        unsafe { ptr.cast::<[u32; 2]>().write([1, 2]) };

        // Then
        assert_eq!(arena.buffer_count(), 1);
        assert_eq!(arena.reserved(), 8);
        assert_eq!(unsafe { ptr.cast::<[u32; 2]>().read() }, [1, 2]);
    }

    #[test]
    fn zero_sized_requests_do_not_allocate() {
        // Given
        let arena = Arena::default();

        // When
        let zero_count = arena.allocate(8, 8, 0).unwrap();
        let zero_size = arena.allocate(32, 0, 10).unwrap();

        // Then
        assert_eq!(zero_count.as_ptr() as usize % 8, 0);
        assert_eq!(zero_size.as_ptr() as usize % 32, 0);
        assert_eq!(arena.buffer_count(), 0);
        assert_eq!(arena.allocated(), 0);
    }

    #[test]
    fn invalid_layouts_are_rejected() {
        // Given
        let arena = Arena::with_reserve(64);

        // Then
        assert_eq!(
            arena.allocate(3, 8, 1),
            Err(Error::InvalidLayout {
                align: 3,
                size: 8,
                count: 1
            })
        );
        assert!(arena.allocate(0, 8, 1).is_err());
        assert!(arena.allocate(8, 8, usize::MAX).is_err());
        assert_eq!(arena.allocated(), 0);
    }

    #[test]
    fn pointers_stay_valid_across_growth() {
        // Given
        let arena = Arena::with_reserve(8);
        let first = arena.allocate(8, 8, 1).unwrap();
        unsafe { first.cast::<u64>().write(0xDEAD_BEEF) };

        // When
        for i in 0..100u64 {
            let ptr = arena.allocate(8, 8, 1).unwrap();
            unsafe { ptr.cast::<u64>().write(i) };
        }

        // Then
        assert!(arena.buffer_count() > 1);
        assert_eq!(unsafe { first.cast::<u64>().read() }, 0xDEAD_BEEF);
    }

    #[test]
    fn take_transfers_buffers() {
        // Given
        let arena = Arena::with_reserve(64);
        let ptr = arena.allocate(4, 4, 1).unwrap();
        unsafe { ptr.cast::<u32>().write(7) };

        // When
        let taken = arena.take();

        // Then
        assert_eq!(arena.buffer_count(), 0);
        assert_eq!(arena.allocated(), 0);
        assert_eq!(taken.buffer_count(), 1);
        assert_eq!(taken.allocated(), 4);
        assert_eq!(unsafe { ptr.cast::<u32>().read() }, 7);

        // When - the emptied arena is still usable
        arena.allocate(4, 4, 1).unwrap();

        // Then
        assert_eq!(arena.buffer_count(), 1);
    }

    #[test]
    fn concurrent_allocation() {
        // Given
        let arena = Arena::with_reserve(64);

        // When
        let ptrs: Vec<usize> = crossbeam::scope(|scope| {
            let handles: Vec<_> = (0..8u64)
                .map(|t| {
                    let arena = &arena;
                    scope.spawn(move |_| {
                        (0..500u64)
                            .map(|i| {
                                let ptr = arena.allocate(8, 8, 1).unwrap();
                                unsafe { ptr.cast::<u64>().write(t * 1000 + i) };
                                ptr.as_ptr() as usize
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        })
        .unwrap();

        // Then - every block is distinct and kept its value
        let unique: HashSet<_> = ptrs.iter().copied().collect();
        assert_eq!(unique.len(), 8 * 500);
        assert_eq!(arena.allocated(), 8 * 500 * 8);
        let mut values: Vec<u64> = ptrs
            .iter()
            .map(|&addr| unsafe { (addr as *const u64).read() })
            .collect();
        values.sort();
        values.dedup();
        assert_eq!(values.len(), 8 * 500);
    }
}
