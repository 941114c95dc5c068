//! # Pool
//!
//! One contiguous arena sliced into equal-size chunks, with a LIFO free list.
//!
//! The arena is byte-addressed. Typed pointers are only produced by
//! [`PoolAllocator`](crate::PoolAllocator) at the point of return.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use tracing::debug;

use crate::stats::PoolStats;

/// Upper bound on the alignment an arena is reserved with.
pub const MAX_CHUNK_ALIGN: usize = 4096;

/// Alignment shared by every chunk of a pool with the given chunk size.
///
/// This is the largest power of two dividing `chunk_size`, capped at
/// [`MAX_CHUNK_ALIGN`].
#[inline]
#[must_use]
pub const fn chunk_align_for(chunk_size: usize) -> usize {
    let lowest_bit = chunk_size & chunk_size.wrapping_neg();
    if lowest_bit == 0 || lowest_bit > MAX_CHUNK_ALIGN {
        MAX_CHUNK_ALIGN
    } else {
        lowest_bit
    }
}

/// Layout of the arena backing `chunk_count` chunks of `chunk_size` bytes.
///
/// `None` when the byte size overflows or exceeds what a `Layout` can describe.
pub(crate) fn arena_layout(chunk_size: usize, chunk_count: usize) -> Option<Layout> {
    let bytes = chunk_size.checked_mul(chunk_count)?;
    Layout::from_size_align(bytes, chunk_align_for(chunk_size)).ok()
}

/// A fixed-chunk-size arena.
///
/// All chunks are carved out of a single reservation made in [`Pool::new`]
/// and released when the pool is dropped. Free chunks are handed out
/// last-in-first-out.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe and is neither `Send` nor `Sync`.
#[derive(Debug)]
pub struct Pool {
    /// First chunk of the arena.
    begin: NonNull<u8>,
    /// Last chunk of the arena (not one-past-the-end).
    last: NonNull<u8>,
    /// Layout the arena was reserved with.
    layout: Layout,
    /// Size of one chunk in bytes.
    chunk_size: usize,
    /// Number of chunks in the arena.
    chunk_count: usize,
    /// Free list - top of the stack is handed out next.
    free: Vec<NonNull<u8>>,
}

impl Pool {
    /// Reserves an arena of `chunk_count` chunks of `chunk_size` bytes.
    ///
    /// Every chunk starts out free. Chunks are pushed in ascending address
    /// order, so the highest chunk is handed out first.
    ///
    /// # Panics
    ///
    /// Panics if either argument is zero or the arena size overflows.
    /// Aborts through [`alloc::handle_alloc_error`] if the reservation fails.
    #[must_use]
    pub fn new(chunk_size: usize, chunk_count: usize) -> Self {
        assert!(chunk_size > 0, "Chunk size must be greater than zero");
        assert!(chunk_count > 0, "Chunk count must be greater than zero");

        let Some(layout) = arena_layout(chunk_size, chunk_count) else {
            panic!("arena of {chunk_count} x {chunk_size} bytes is too large");
        };

        // SAFETY: layout has a non-zero size, both factors are positive.
        let raw = unsafe { alloc::alloc(layout) };
        let Some(begin) = NonNull::new(raw) else {
            alloc::handle_alloc_error(layout);
        };

        let mut free = Vec::with_capacity(chunk_count);
        for index in 0..chunk_count {
            // SAFETY: index * chunk_size < layout.size(), so the offset
            // stays inside the reservation.
            free.push(unsafe { NonNull::new_unchecked(raw.add(index * chunk_size)) });
        }
        let last = free[chunk_count - 1];

        debug!(
            chunk_size,
            chunk_count,
            align = layout.align(),
            "pool arena reserved"
        );

        Self {
            begin,
            last,
            layout,
            chunk_size,
            chunk_count,
            free,
        }
    }

    /// Returns the size of one chunk in bytes.
    #[inline]
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the number of chunks in the arena.
    #[inline]
    #[must_use]
    pub const fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Returns the alignment every chunk is guaranteed to have.
    #[inline]
    #[must_use]
    pub const fn chunk_align(&self) -> usize {
        self.layout.align()
    }

    /// Returns the arena size in bytes.
    #[inline]
    #[must_use]
    pub const fn arena_bytes(&self) -> usize {
        self.layout.size()
    }

    /// Returns the address of the first chunk.
    #[inline]
    #[must_use]
    pub const fn arena_begin(&self) -> NonNull<u8> {
        self.begin
    }

    /// Returns the address of the last chunk.
    #[inline]
    #[must_use]
    pub const fn last_chunk(&self) -> NonNull<u8> {
        self.last
    }

    /// Returns the number of free chunks.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Returns the number of chunks currently handed out.
    #[inline]
    #[must_use]
    pub fn allocated_count(&self) -> usize {
        self.chunk_count - self.free.len()
    }

    /// Returns `true` when no chunk is free.
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.free.is_empty()
    }

    /// Returns `true` when every chunk is free.
    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.free.len() == self.chunk_count
    }

    /// Returns `true` if a request of `bytes` with alignment `align` fits one chunk.
    #[inline]
    #[must_use]
    pub const fn fits(&self, bytes: usize, align: usize) -> bool {
        self.chunk_size >= bytes && self.chunk_align() >= align
    }

    /// Inclusive range test against `[arena_begin, last_chunk]`.
    #[inline]
    #[must_use]
    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        self.begin <= ptr && ptr <= self.last
    }

    /// Exact ownership test: `ptr` is in range and on a chunk boundary.
    #[inline]
    #[must_use]
    pub fn owns(&self, ptr: NonNull<u8>) -> bool {
        self.contains(ptr)
            && (ptr.as_ptr() as usize - self.begin.as_ptr() as usize) % self.chunk_size == 0
    }

    /// Iterates over every chunk address in ascending order.
    pub fn chunks(&self) -> impl Iterator<Item = NonNull<u8>> + '_ {
        (0..self.chunk_count).map(move |index| {
            // SAFETY: same offsets as the ones computed in `new`.
            unsafe { NonNull::new_unchecked(self.begin.as_ptr().add(index * self.chunk_size)) }
        })
    }

    /// Pops the most recently freed chunk, or `None` if the pool is exhausted.
    ///
    /// This is a **O(1)** operation with **zero heap allocations**.
    #[inline]
    pub fn take(&mut self) -> Option<NonNull<u8>> {
        self.free.pop()
    }

    /// Pushes `ptr` back onto the free list.
    ///
    /// The free list never reallocates: its capacity is the chunk count.
    ///
    /// # Safety
    ///
    /// - `ptr` must have been returned by [`Pool::take`] on this pool
    /// - `ptr` must not have been given back since
    ///
    /// Neither condition is checked in release builds; violating them
    /// hands the same chunk to two callers. Debug builds assert both, which
    /// scans the free list and makes this call O(chunk count).
    #[inline]
    pub unsafe fn give_back(&mut self, ptr: NonNull<u8>) {
        debug_assert!(self.owns(ptr), "chunk {ptr:p} is not owned by this pool");
        debug_assert!(!self.free.contains(&ptr), "double free of chunk {ptr:p}");
        self.free.push(ptr);
    }

    /// Returns a snapshot of this pool's occupancy.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            chunk_size: self.chunk_size,
            chunk_count: self.chunk_count,
            free: self.free.len(),
        }
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        debug!(
            chunk_size = self.chunk_size,
            chunk_count = self.chunk_count,
            outstanding = self.allocated_count(),
            "pool arena released"
        );
        // SAFETY: `begin` was returned by `alloc::alloc` with this exact layout.
        unsafe { alloc::dealloc(self.begin.as_ptr(), self.layout) };
    }
}
