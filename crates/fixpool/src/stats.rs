//! # Occupancy Statistics
//!
//! Point-in-time snapshots of how many chunks each pool has handed out.

use std::fmt;

/// Occupancy of a single pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolStats {
    /// Size of one chunk in bytes.
    pub chunk_size: usize,
    /// Total number of chunks.
    pub chunk_count: usize,
    /// Chunks currently on the free list.
    pub free: usize,
}

impl PoolStats {
    /// Returns the number of chunks handed out.
    #[inline]
    #[must_use]
    pub const fn allocated(&self) -> usize {
        self.chunk_count - self.free
    }

    /// Returns the arena size in bytes.
    #[inline]
    #[must_use]
    pub const fn arena_bytes(&self) -> usize {
        self.chunk_size * self.chunk_count
    }
}

/// Occupancy of every pool of an allocator, in configured order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Per-pool snapshots.
    pub pools: Vec<PoolStats>,
}

impl AllocatorStats {
    /// Total number of chunks across all pools.
    #[must_use]
    pub fn total_chunks(&self) -> usize {
        self.pools.iter().map(|p| p.chunk_count).sum()
    }

    /// Total number of free chunks across all pools.
    #[must_use]
    pub fn total_free(&self) -> usize {
        self.pools.iter().map(|p| p.free).sum()
    }

    /// Total number of chunks handed out across all pools.
    #[must_use]
    pub fn total_allocated(&self) -> usize {
        self.pools.iter().map(PoolStats::allocated).sum()
    }

    /// Total bytes reserved across all arenas.
    #[must_use]
    pub fn footprint(&self) -> usize {
        self.pools.iter().map(PoolStats::arena_bytes).sum()
    }
}

impl fmt::Display for AllocatorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "pool  chunk_size  chunk_count  free  allocated")?;
        for (index, pool) in self.pools.iter().enumerate() {
            writeln!(
                f,
                "{index:>4}  {:>10}  {:>11}  {:>4}  {:>9}",
                pool.chunk_size,
                pool.chunk_count,
                pool.free,
                pool.allocated()
            )?;
        }
        write!(
            f,
            "total: {} of {} chunks allocated, {} bytes reserved",
            self.total_allocated(),
            self.total_chunks(),
            self.footprint()
        )
    }
}
