//! # Pool Allocator
//!
//! First-fit dispatcher over an ordered set of [`Pool`]s.
//!
//! ## Routing
//!
//! ```text
//!   allocate(n)        bytes = size_of::<T>() * n
//!        │
//!        ▼
//!   ┌─────────┐  too small / exhausted  ┌─────────┐        ┌─────────┐
//!   │ pool 0  │ ──────────────────────▶ │ pool 1  │ ─ ··· ▶│ pool k  │ ──▶ Exhausted
//!   └────┬────┘                         └────┬────┘        └────┬────┘
//!        │ fits + free                       │                  │
//!        ▼                                   ▼                  ▼
//!     chunk                               chunk              chunk
//! ```
//!
//! Pools are tried in configured order, not by best size. A pool that fits
//! but is exhausted does not end the scan.

#![allow(unsafe_code)]

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use tracing::{debug, trace, warn};

use crate::config::AllocatorConfig;
use crate::error::{PoolError, PoolResult};
use crate::pool::Pool;
use crate::stats::AllocatorStats;

/// A fixed-size-class allocator for values of type `T`.
///
/// Every arena is reserved in [`PoolAllocator::new`] and released on drop.
/// The allocator uniquely owns its pools, so it is move-only; use
/// [`PoolAllocator::rebind`] to get a second allocator with the same shape.
///
/// # Thread Safety
///
/// This allocator is NOT thread-safe and is neither `Send` nor `Sync`.
///
/// # Example
///
/// ```rust,ignore
/// use fixpool::PoolAllocator;
///
/// let mut alloc: PoolAllocator<u64> = PoolAllocator::from_pairs(&[(8, 4), (64, 2)])?;
///
/// let one = alloc.allocate(1)?;   // served by the 8-byte pool
/// let many = alloc.allocate(4)?;  // 32 bytes, served by the 64-byte pool
///
/// unsafe {
///     alloc.deallocate(one, 1);
///     alloc.deallocate(many, 4);
/// }
/// # Ok::<(), fixpool::PoolError>(())
/// ```
pub struct PoolAllocator<T> {
    /// Pools in search order.
    pools: Vec<Pool>,
    /// Shape the pools were built from.
    config: AllocatorConfig,
    /// Marker for T.
    _phantom: PhantomData<T>,
}

impl<T> PoolAllocator<T> {
    /// Reserves one pool per configured shape, in order.
    #[must_use]
    pub fn new(config: AllocatorConfig) -> Self {
        let pools: Vec<Pool> = config
            .pools()
            .iter()
            .map(|p| Pool::new(p.chunk_size, p.chunk_count))
            .collect();

        debug!(
            pools = pools.len(),
            footprint = config.total_bytes(),
            element_size = mem::size_of::<T>(),
            "pool allocator ready"
        );

        Self {
            pools,
            config,
            _phantom: PhantomData,
        }
    }

    /// Validates `(chunk_size, chunk_count)` pairs and builds an allocator.
    ///
    /// # Errors
    ///
    /// Any configuration error from [`AllocatorConfig::new`].
    pub fn from_pairs(pairs: &[(usize, usize)]) -> PoolResult<Self> {
        AllocatorConfig::from_pairs(pairs).map(Self::new)
    }

    /// Builds an allocator with the same configuration for another element type.
    ///
    /// The new allocator has its own arenas; nothing is shared or moved.
    #[must_use]
    pub fn rebind<U>(&self) -> PoolAllocator<U> {
        PoolAllocator::new(self.config.clone())
    }

    /// Hands out one chunk able to hold `n` contiguous values of `T`.
    ///
    /// The first pool in configured order whose chunks are large and aligned
    /// enough and which has a free chunk serves the request.
    ///
    /// The returned memory is uninitialized.
    ///
    /// # Errors
    ///
    /// - [`PoolError::SizeOverflow`] if `size_of::<T>() * n` overflows
    /// - [`PoolError::Exhausted`] if no pool can serve the request right now
    pub fn allocate(&mut self, n: usize) -> PoolResult<NonNull<T>> {
        let element_size = mem::size_of::<T>();
        let requested_bytes = element_size
            .checked_mul(n)
            .ok_or(PoolError::SizeOverflow {
                element_size,
                count: n,
            })?;
        let align = mem::align_of::<T>();

        for (index, pool) in self.pools.iter_mut().enumerate() {
            if !pool.fits(requested_bytes, align) {
                continue;
            }
            if let Some(chunk) = pool.take() {
                trace!(pool = index, chunk = ?chunk, requested_bytes, "chunk allocated");
                return Ok(chunk.cast());
            }
        }

        debug!(requested_bytes, align, "no pool can serve request");
        Err(PoolError::Exhausted { requested_bytes })
    }

    /// Returns a chunk to the pool that owns it.
    ///
    /// `n` is only recorded for tracing; the owning pool is found by address.
    /// A pointer no pool owns is ignored.
    ///
    /// # Safety
    ///
    /// - `ptr` must have been returned by [`PoolAllocator::allocate`] on this
    ///   allocator
    /// - `ptr` must not have been deallocated since
    /// - `ptr` must not be used after this call
    pub unsafe fn deallocate(&mut self, ptr: NonNull<T>, n: usize) {
        let chunk = ptr.cast::<u8>();
        let Some((index, pool)) = self
            .pools
            .iter_mut()
            .enumerate()
            .find(|(_, pool)| pool.owns(chunk))
        else {
            warn!(chunk = ?chunk, count = n, "deallocate of a pointer no pool owns, ignored");
            return;
        };

        trace!(pool = index, chunk = ?chunk, count = n, "chunk released");
        // SAFETY: caller guarantees `ptr` is an outstanding chunk of this allocator.
        unsafe { pool.give_back(chunk) };
    }

    /// Returns `true` if `ptr` is a chunk of one of this allocator's pools.
    #[must_use]
    pub fn owns<U>(&self, ptr: NonNull<U>) -> bool {
        self.pool_index_of(ptr).is_some()
    }

    /// Returns the index of the pool owning `ptr`.
    #[must_use]
    pub fn pool_index_of<U>(&self, ptr: NonNull<U>) -> Option<usize> {
        let chunk = ptr.cast::<u8>();
        self.pools.iter().position(|pool| pool.owns(chunk))
    }

    /// Returns `true` if every chunk of `other` could be freed by `self`.
    ///
    /// This is the relation behind `==`: `a == b` is `b.covers(&a)`.
    #[must_use]
    pub fn covers<U>(&self, other: &PoolAllocator<U>) -> bool {
        other
            .pools
            .iter()
            .flat_map(Pool::chunks)
            .all(|chunk| self.owns(chunk))
    }

    /// Returns the pools in search order.
    #[inline]
    #[must_use]
    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    /// Returns the number of pools.
    #[inline]
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Returns the configuration this allocator was built from.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Total bytes reserved across all arenas.
    #[must_use]
    pub const fn footprint(&self) -> usize {
        self.config.total_bytes()
    }

    /// Largest chunk size of any pool.
    #[must_use]
    pub fn max_chunk_size(&self) -> usize {
        self.pools.iter().map(Pool::chunk_size).max().unwrap_or(0)
    }

    /// Total number of free chunks across all pools.
    #[must_use]
    pub fn free_chunks(&self) -> usize {
        self.pools.iter().map(Pool::free_count).sum()
    }

    /// Returns a snapshot of every pool's occupancy.
    #[must_use]
    pub fn stats(&self) -> AllocatorStats {
        AllocatorStats {
            pools: self.pools.iter().map(Pool::stats).collect(),
        }
    }
}

/// Chunk-containment equality.
///
/// `lhs == rhs` holds when every chunk address `lhs` owns is also owned by
/// `rhs`, i.e. `rhs` could free anything `lhs` hands out. The relation is
/// reflexive but not symmetric.
impl<T, U> PartialEq<PoolAllocator<U>> for PoolAllocator<T> {
    fn eq(&self, rhs: &PoolAllocator<U>) -> bool {
        rhs.covers(self)
    }
}

/// A single pool compares like an allocator configured with just that pool.
impl<T> PartialEq<PoolAllocator<T>> for Pool {
    fn eq(&self, rhs: &PoolAllocator<T>) -> bool {
        self.chunks().all(|chunk| rhs.owns(chunk))
    }
}

impl<T> PartialEq<Pool> for PoolAllocator<T> {
    fn eq(&self, rhs: &Pool) -> bool {
        self.pools
            .iter()
            .flat_map(Pool::chunks)
            .all(|chunk| rhs.owns(chunk))
    }
}

impl<T> fmt::Debug for PoolAllocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolAllocator")
            .field("element", &std::any::type_name::<T>())
            .field("pools", &self.pools)
            .finish()
    }
}
