//! # Fixpool
//!
//! Fixed-size-class pool allocator designed for:
//! - Workloads with a small number of known object sizes
//! - Deterministic O(pools) allocation and deallocation
//! - Zero heap traffic after construction
//!
//! ## Architecture Rules
//!
//! 1. **All memory is reserved up front** - one arena per configured pool
//! 2. **Pools never grow** - an exhausted allocator reports an error
//! 3. **First-fit routing** - pools are tried in configured order
//!
//! ## Example
//!
//! ```rust,ignore
//! use fixpool::{AllocatorConfig, PoolAllocator};
//!
//! let config = AllocatorConfig::load("pools.toml")?;
//! let mut alloc: PoolAllocator<Particle> = PoolAllocator::new(config);
//!
//! let slot = alloc.allocate(1)?;
//! // ... write a Particle into `slot`, use it ...
//! unsafe { alloc.deallocate(slot, 1) };
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod allocator;
pub mod config;
pub mod error;
pub mod pool;
pub mod stats;
pub mod traits;

pub use allocator::PoolAllocator;
pub use config::{AllocatorConfig, PoolConfig};
pub use error::{PoolError, PoolResult};
pub use pool::{Pool, MAX_CHUNK_ALIGN};
pub use stats::{AllocatorStats, PoolStats};
pub use traits::ChunkAllocator;
