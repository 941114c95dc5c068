//! # Allocator Interface
//!
//! The allocator-shaped boundary generic containers depend on.

#![allow(unsafe_code)]

use std::ptr::NonNull;

use crate::allocator::PoolAllocator;
use crate::error::PoolResult;

/// An allocator handing out storage for `n` contiguous values of one type.
///
/// Implementors decide where memory comes from; callers only rely on
/// `allocate`/`deallocate` pairing and on [`ChunkAllocator::rebind`] to get
/// an allocator of the same shape for another element type.
pub trait ChunkAllocator {
    /// Element type storage is handed out for.
    type Value;

    /// Same allocator family, configured identically, for elements of type `U`.
    type Rebind<U>: ChunkAllocator<Value = U>;

    /// Hands out uninitialized storage for `n` values.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the pool allocator returns
    /// [`PoolError::Exhausted`](crate::PoolError::Exhausted) when it is full.
    fn allocate(&mut self, n: usize) -> PoolResult<NonNull<Self::Value>>;

    /// Returns storage obtained from [`ChunkAllocator::allocate`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this allocator, with the same `n`,
    /// and must not be used or deallocated again afterwards.
    unsafe fn deallocate(&mut self, ptr: NonNull<Self::Value>, n: usize);

    /// Builds a fresh allocator of the same shape for elements of type `U`.
    fn rebind<U>(&self) -> Self::Rebind<U>;
}

impl<T> ChunkAllocator for PoolAllocator<T> {
    type Value = T;
    type Rebind<U> = PoolAllocator<U>;

    #[inline]
    fn allocate(&mut self, n: usize) -> PoolResult<NonNull<T>> {
        Self::allocate(self, n)
    }

    #[inline]
    unsafe fn deallocate(&mut self, ptr: NonNull<T>, n: usize) {
        // SAFETY: forwarded contract.
        unsafe { Self::deallocate(self, ptr, n) }
    }

    #[inline]
    fn rebind<U>(&self) -> PoolAllocator<U> {
        Self::rebind(self)
    }
}
