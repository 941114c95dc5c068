//! # Pool Allocator Verification Tests
//!
//! End-to-end checks of the allocator contract:
//!
//! 1. **Round trip**: allocate + deallocate restores every pool's free count
//! 2. **Exhaustion**: a size class served by one pool runs out, then recovers
//! 3. **Uniqueness**: live allocations never share an address
//! 4. **Ownership**: every chunk belongs to exactly one pool
//! 5. **Routing**: first-fit over configured order
//!
//! Run with: cargo test -p fixpool --test allocator_properties

#![allow(unsafe_code)]

use std::collections::HashSet;
use std::ptr::NonNull;

use fixpool::{AllocatorConfig, ChunkAllocator, PoolAllocator, PoolError};

// ============================================================================
// ROUND TRIP
// ============================================================================

#[test]
fn allocate_then_deallocate_restores_free_counts() {
    let configs: [&[(usize, usize)]; 4] = [
        &[(8, 1)],
        &[(16, 4), (64, 2)],
        &[(64, 2), (8, 8), (8, 3)],
        &[(24, 5), (12, 2), (256, 1)],
    ];

    for pairs in configs {
        let mut alloc: PoolAllocator<u32> = PoolAllocator::from_pairs(pairs).unwrap();
        let before = alloc.stats();

        for n in [0, 1, 2] {
            let p = alloc.allocate(n).unwrap();
            assert_ne!(alloc.stats(), before);
            unsafe { alloc.deallocate(p, n) };
            assert_eq!(alloc.stats(), before, "config {pairs:?}, n = {n}");
        }
    }
}

// ============================================================================
// EXHAUSTION
// ============================================================================

#[test]
fn single_pool_size_class_exhausts() {
    // Only the 64-byte pool can hold 8 x u64.
    let mut alloc: PoolAllocator<u64> = PoolAllocator::from_pairs(&[(8, 16), (64, 3)]).unwrap();

    let held: Vec<_> = (0..3).map(|_| alloc.allocate(8).unwrap()).collect();
    assert_eq!(
        alloc.allocate(8),
        Err(PoolError::Exhausted { requested_bytes: 64 })
    );

    // Small requests are unaffected.
    let small = alloc.allocate(1).unwrap();
    assert_eq!(alloc.pool_index_of(small), Some(0));

    unsafe {
        alloc.deallocate(small, 1);
        for p in held {
            alloc.deallocate(p, 8);
        }
    }
    assert!(alloc.pools().iter().all(fixpool::Pool::is_idle));
}

#[test]
fn oversized_request_always_fails() {
    let mut alloc: PoolAllocator<u8> = PoolAllocator::from_pairs(&[(8, 4), (32, 4)]).unwrap();

    assert_eq!(alloc.max_chunk_size(), 32);
    assert_eq!(
        alloc.allocate(33),
        Err(PoolError::Exhausted { requested_bytes: 33 })
    );
    assert_eq!(alloc.free_chunks(), 8);
}

#[test]
fn exhaustion_error_message() {
    let mut alloc: PoolAllocator<u8> = PoolAllocator::from_pairs(&[(4, 1)]).unwrap();
    let err = alloc.allocate(5).unwrap_err();

    assert_eq!(
        err.to_string(),
        "pool allocator exhausted: no free chunk can hold 5 bytes"
    );
}

// ============================================================================
// UNIQUENESS + OWNERSHIP
// ============================================================================

#[test]
fn live_allocations_never_alias() {
    let mut alloc: PoolAllocator<u16> =
        PoolAllocator::from_pairs(&[(8, 32), (16, 16), (32, 8)]).unwrap();
    let total = alloc.free_chunks();

    let mut seen = HashSet::new();
    let mut held = Vec::new();
    for round in 0..total {
        let n = 1 + round % 4;
        let p = alloc.allocate(n).unwrap();
        assert!(seen.insert(p.as_ptr() as usize), "address handed out twice");
        held.push((p, n));
    }
    assert_eq!(alloc.free_chunks(), 0);

    for (p, n) in held {
        unsafe { alloc.deallocate(p, n) };
    }
    assert_eq!(alloc.free_chunks(), total);
}

#[test]
fn chunk_lies_in_exactly_one_pool() {
    let mut alloc: PoolAllocator<u8> =
        PoolAllocator::from_pairs(&[(16, 4), (16, 4), (48, 2)]).unwrap();

    let mut held = Vec::new();
    while let Ok(p) = alloc.allocate(10) {
        let chunk = p.cast::<u8>();
        let owners = alloc.pools().iter().filter(|pool| pool.owns(chunk)).count();
        assert_eq!(owners, 1);
        held.push(p);
    }
    assert_eq!(held.len(), 10);

    for p in held {
        let index = alloc.pool_index_of(p).unwrap();
        let before: Vec<_> = alloc.pools().iter().map(fixpool::Pool::free_count).collect();

        unsafe { alloc.deallocate(p, 10) };

        for (i, pool) in alloc.pools().iter().enumerate() {
            let expected = before[i] + usize::from(i == index);
            assert_eq!(pool.free_count(), expected);
        }
    }
}

#[test]
fn deallocate_count_does_not_pick_the_pool() {
    let mut alloc: PoolAllocator<u32> =
        PoolAllocator::from_pairs(&[(8, 4), (16, 2), (64, 1)]).unwrap();
    let before = alloc.stats();

    // 4 x u32 needs the 16-byte pool; a count of 1 or 0 would be served by
    // the 8-byte pool, but the chunk must still go home by address.
    for wrong_count in [1, 0] {
        let p = alloc.allocate(4).unwrap();
        assert_eq!(alloc.pool_index_of(p), Some(1));

        unsafe { alloc.deallocate(p, wrong_count) };

        assert_eq!(alloc.stats(), before, "deallocated with n = {wrong_count}");
        assert_eq!(alloc.pools()[0].free_count(), 4);
        assert_eq!(alloc.pools()[1].free_count(), 2);
        assert_eq!(alloc.allocate(4).map(|q| q == p), Ok(true));
        unsafe { alloc.deallocate(p, 4) };
    }
}

#[test]
fn chunks_are_writable_across_full_size() {
    let mut alloc: PoolAllocator<u64> = PoolAllocator::from_pairs(&[(32, 4)]).unwrap();

    let ptrs: Vec<NonNull<u64>> = (0..4).map(|_| alloc.allocate(4).unwrap()).collect();
    for (i, p) in ptrs.iter().enumerate() {
        for j in 0..4 {
            unsafe { p.as_ptr().add(j).write((i * 10 + j) as u64) };
        }
    }
    for (i, p) in ptrs.iter().enumerate() {
        for j in 0..4 {
            assert_eq!(unsafe { p.as_ptr().add(j).read() }, (i * 10 + j) as u64);
        }
    }

    for p in ptrs {
        unsafe { alloc.deallocate(p, 4) };
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn scenario_lifo_reuse_after_exhaustion() {
    let mut alloc: PoolAllocator<u64> = PoolAllocator::from_pairs(&[(16, 2)]).unwrap();

    let a = alloc.allocate(1).unwrap();
    let b = alloc.allocate(1).unwrap();
    assert_ne!(a, b);
    assert_eq!(
        alloc.allocate(1),
        Err(PoolError::Exhausted { requested_bytes: 8 })
    );

    unsafe { alloc.deallocate(a, 1) };
    let c = alloc.allocate(1).unwrap();
    assert_eq!(c, a);
}

#[test]
fn scenario_small_pool_skipped_for_large_request() {
    let mut alloc: PoolAllocator<u8> = PoolAllocator::from_pairs(&[(8, 1), (16, 1)]).unwrap();

    let p = alloc.allocate(16).unwrap();
    assert_eq!(alloc.pool_index_of(p), Some(1));
    assert_eq!(alloc.pools()[0].free_count(), 1);
}

#[test]
fn scenario_config_from_toml() {
    let config = AllocatorConfig::from_toml_str(
        r#"
        [[pool]]
        chunk_size = 8
        chunk_count = 2

        [[pool]]
        chunk_size = 64
        chunk_count = 1
        "#,
    )
    .unwrap();
    let mut alloc: PoolAllocator<[u8; 8]> = PoolAllocator::new(config);

    assert_eq!(alloc.footprint(), 80);
    let big = alloc.allocate(8).unwrap();
    assert_eq!(alloc.pool_index_of(big), Some(1));
    unsafe { alloc.deallocate(big, 8) };
}

#[test]
fn scenario_config_from_file() {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir().join(format!("fixpool_config_{id}.toml"));
    std::fs::write(&path, "[[pool]]\nchunk_size = 16\nchunk_count = 3\n").unwrap();

    let config = AllocatorConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let alloc: PoolAllocator<u8> = PoolAllocator::new(config);
    assert_eq!(alloc.stats().total_chunks(), 3);
}

// ============================================================================
// EQUALITY + REBIND
// ============================================================================

#[test]
#[allow(clippy::eq_op)]
fn equality_reflexive_and_identity_based() {
    let a: PoolAllocator<u8> = PoolAllocator::from_pairs(&[(8, 4)]).unwrap();
    let b: PoolAllocator<u8> = PoolAllocator::from_pairs(&[(8, 4)]).unwrap();

    assert!(a == a);
    // Same configuration, different arenas: neither can free the other's chunks.
    assert!(a != b);
}

#[test]
fn equality_subset_of_pools() {
    let alloc: PoolAllocator<u8> = PoolAllocator::from_pairs(&[(8, 4), (16, 2)]).unwrap();
    let first = &alloc.pools()[0];

    assert!(*first == alloc);
    assert!(alloc != *first);
}

#[test]
fn rebind_through_trait_is_independent() {
    fn rebound_footprint<A: ChunkAllocator>(alloc: &A) -> usize
    where
        A::Rebind<u64>: Into<PoolAllocator<u64>>,
    {
        let rebound: PoolAllocator<u64> = alloc.rebind::<u64>().into();
        rebound.footprint()
    }

    let mut alloc: PoolAllocator<u8> = PoolAllocator::from_pairs(&[(8, 4), (16, 2)]).unwrap();
    let p = alloc.allocate(1).unwrap();

    assert_eq!(rebound_footprint(&alloc), alloc.footprint());
    // Outstanding chunks stay with the original.
    assert_eq!(alloc.free_chunks(), 5);
    unsafe { alloc.deallocate(p, 1) };
}
