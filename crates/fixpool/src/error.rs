//! # Pool Error Types
//!
//! All errors that can occur while configuring or using a pool allocator.

use thiserror::Error;

/// Errors that can occur in the pool allocator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// No pool both fits the request and has a free chunk.
    ///
    /// The allocator stays usable; freeing a chunk makes room again.
    #[error("pool allocator exhausted: no free chunk can hold {requested_bytes} bytes")]
    Exhausted {
        /// Byte size of the failed request.
        requested_bytes: usize,
    },

    /// `element_size * count` does not fit in a `usize`.
    #[error("request size overflow: {count} elements of {element_size} bytes")]
    SizeOverflow {
        /// Size of one element in bytes.
        element_size: usize,
        /// Number of elements requested.
        count: usize,
    },

    /// The configuration lists no pools at all.
    #[error("allocator configuration has no pools")]
    EmptyConfig,

    /// A pool was configured with a chunk size of zero.
    #[error("pool {index}: chunk size must be greater than zero")]
    ZeroChunkSize {
        /// Position of the pool in the configuration.
        index: usize,
    },

    /// A pool was configured with a chunk count of zero.
    #[error("pool {index}: chunk count must be greater than zero")]
    ZeroChunkCount {
        /// Position of the pool in the configuration.
        index: usize,
    },

    /// `chunk_size * chunk_count` cannot be described as a single arena.
    #[error("pool {index}: arena of {chunk_count} x {chunk_size} bytes is too large")]
    ArenaTooLarge {
        /// Position of the pool in the configuration.
        index: usize,
        /// Configured chunk size.
        chunk_size: usize,
        /// Configured chunk count.
        chunk_count: usize,
    },

    /// The arenas together need more than `usize::MAX` bytes.
    #[error("allocator configuration reserves more than usize::MAX bytes in total")]
    FootprintTooLarge,

    /// Configuration source could not be read or parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
