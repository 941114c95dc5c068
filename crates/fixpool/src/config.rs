//! # Pool Configuration
//!
//! The ordered list of `(chunk_size, chunk_count)` pairs an allocator is
//! built from. A configuration is validated once and is immutable afterwards.
//!
//! ## File Format
//!
//! ```toml
//! [[pool]]
//! chunk_size = 16
//! chunk_count = 1024
//!
//! [[pool]]
//! chunk_size = 64
//! chunk_count = 256
//! ```
//!
//! Pool order is significant: it is the order allocation requests are
//! matched against.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PoolError, PoolResult};
use crate::pool::arena_layout;

/// Shape of a single pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Size of one chunk in bytes.
    pub chunk_size: usize,
    /// Number of chunks in the arena.
    pub chunk_count: usize,
}

impl PoolConfig {
    /// Creates a pool shape.
    #[inline]
    #[must_use]
    pub const fn new(chunk_size: usize, chunk_count: usize) -> Self {
        Self {
            chunk_size,
            chunk_count,
        }
    }

    fn validate(&self, index: usize) -> PoolResult<()> {
        if self.chunk_size == 0 {
            return Err(PoolError::ZeroChunkSize { index });
        }
        if self.chunk_count == 0 {
            return Err(PoolError::ZeroChunkCount { index });
        }
        if arena_layout(self.chunk_size, self.chunk_count).is_none() {
            return Err(PoolError::ArenaTooLarge {
                index,
                chunk_size: self.chunk_size,
                chunk_count: self.chunk_count,
            });
        }
        Ok(())
    }
}

impl From<(usize, usize)> for PoolConfig {
    fn from((chunk_size, chunk_count): (usize, usize)) -> Self {
        Self::new(chunk_size, chunk_count)
    }
}

/// Validated, ordered set of pool shapes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AllocatorConfig {
    #[serde(rename = "pool")]
    pools: Vec<PoolConfig>,
    /// Sum of every arena size, checked at validation.
    #[serde(skip)]
    total_bytes: usize,
}

/// On-disk layout before validation.
#[derive(Deserialize)]
struct ConfigFile {
    #[serde(default)]
    pool: Vec<PoolConfig>,
}

impl AllocatorConfig {
    /// Validates and wraps an ordered list of pool shapes.
    ///
    /// # Errors
    ///
    /// - [`PoolError::EmptyConfig`] if `pools` is empty
    /// - [`PoolError::ZeroChunkSize`] / [`PoolError::ZeroChunkCount`] for a
    ///   non-positive pool dimension
    /// - [`PoolError::ArenaTooLarge`] if an arena size overflows
    /// - [`PoolError::FootprintTooLarge`] if the arenas together overflow
    pub fn new(pools: Vec<PoolConfig>) -> PoolResult<Self> {
        if pools.is_empty() {
            return Err(PoolError::EmptyConfig);
        }
        let mut total_bytes: usize = 0;
        for (index, pool) in pools.iter().enumerate() {
            pool.validate(index)?;
            total_bytes = total_bytes
                .checked_add(pool.chunk_size * pool.chunk_count)
                .ok_or(PoolError::FootprintTooLarge)?;
        }
        Ok(Self { pools, total_bytes })
    }

    /// Builds a configuration from `(chunk_size, chunk_count)` pairs.
    ///
    /// # Errors
    ///
    /// Same as [`AllocatorConfig::new`].
    pub fn from_pairs(pairs: &[(usize, usize)]) -> PoolResult<Self> {
        Self::new(pairs.iter().copied().map(PoolConfig::from).collect())
    }

    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidConfig`] on a syntax error, otherwise the same as
    /// [`AllocatorConfig::new`].
    pub fn from_toml_str(source: &str) -> PoolResult<Self> {
        let file: ConfigFile =
            toml::from_str(source).map_err(|e| PoolError::InvalidConfig(e.to_string()))?;
        Self::new(file.pool)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidConfig`] if the file cannot be read, otherwise the
    /// same as [`AllocatorConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> PoolResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| PoolError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Renders the configuration back to TOML.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidConfig`] if serialization fails.
    pub fn to_toml_string(&self) -> PoolResult<String> {
        toml::to_string(self).map_err(|e| PoolError::InvalidConfig(e.to_string()))
    }

    /// Returns the pool shapes in search order.
    #[inline]
    #[must_use]
    pub fn pools(&self) -> &[PoolConfig] {
        &self.pools
    }

    /// Returns the number of pools.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Always `false`: an empty configuration never validates.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Total bytes the allocator will reserve.
    #[inline]
    #[must_use]
    pub const fn total_bytes(&self) -> usize {
        self.total_bytes
    }
}
