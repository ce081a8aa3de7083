//! # Pool Property Tests
//!
//! End-to-end checks of the allocation, limit and reclamation guarantees.
//!
//! Run with: cargo test -p ember_pool --test pool_properties

use std::collections::HashSet;
use std::thread;
use std::time::{Duration, Instant};

use ember_pool::{
    HeadlessScene, ParticleBuffer, ParticleHandle, ParticlePool, PoolConfig, SceneAttachment,
    SegmentId, SharedParticlePool,
};

/// Scene that only counts what is attached.
#[derive(Default)]
struct CountingScene {
    attached: HashSet<SegmentId>,
}

impl SceneAttachment for CountingScene {
    fn attach(&mut self, segment: SegmentId, _buffer: &ParticleBuffer) {
        self.attached.insert(segment);
    }

    fn detach(&mut self, segment: SegmentId) {
        self.attached.remove(&segment);
    }
}

fn config(maximum: usize, minimum: usize, per_segment: usize) -> PoolConfig {
    PoolConfig {
        maximum_particles: maximum,
        minimum_particles: minimum,
        particles_per_segment: per_segment,
        cleanup_interval_ms: Some(500),
        ..PoolConfig::default()
    }
}

fn counting_pool(maximum: usize, minimum: usize, per_segment: usize) -> ParticlePool<CountingScene> {
    ParticlePool::new(config(maximum, minimum, per_segment), CountingScene::default()).unwrap()
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn minimum_preallocation() {
    let pool = counting_pool(100, 10, 5);
    let stats = pool.stats();
    assert_eq!(stats.segment_count, 2);
    assert!(stats.segments.iter().all(|s| s.size == 5 && s.available == 5));

    let pool = counting_pool(100, 0, 5);
    assert_eq!(pool.segment_count(), 0);
    assert!(pool.scene().attached.is_empty());
}

// ============================================================================
// GROWTH AND LIMIT
// ============================================================================

#[test]
fn growth_on_demand_then_hard_limit() {
    let mut pool = counting_pool(20, 10, 5);
    for _ in 0..20 {
        assert!(pool.allocate().unwrap().is_some());
    }
    let stats = pool.stats();
    assert_eq!(stats.segment_count, 4);
    assert!(stats.segments.iter().all(|s| s.available == 0));

    for _ in 0..10 {
        assert_eq!(pool.allocate().unwrap(), None);
    }
    assert_eq!(pool.segment_count(), 4);
    assert_eq!(pool.scene().attached.len(), 4);
}

#[test]
fn reuse_after_single_free() {
    let mut pool = counting_pool(20, 10, 5);
    let handles: Vec<_> = (0..20).map(|_| pool.allocate().unwrap().unwrap()).collect();
    assert_eq!(pool.allocate().unwrap(), None);

    pool.free(handles[7]).unwrap();
    let reused = pool.allocate().unwrap().unwrap();
    assert!(handles.contains(&reused));
    assert_eq!(pool.allocate().unwrap(), None);
}

#[test]
fn lowest_segment_preference() {
    let mut pool = counting_pool(100, 0, 5);
    let first: Vec<_> = (0..5).map(|_| pool.allocate().unwrap().unwrap()).collect();
    let spill = pool.allocate().unwrap().unwrap();
    assert_eq!(spill.segment_index(), 1);

    pool.free(first[0]).unwrap();
    let next = pool.allocate().unwrap().unwrap();
    assert_eq!(next.segment_index(), 0);
    assert_eq!(pool.stats().segments[1].available, 4);
}

#[test]
fn live_handles_are_unique_and_bounded() {
    let mut pool = counting_pool(64, 8, 8);
    let mut live: Vec<ParticleHandle> = Vec::new();
    let mut seen = HashSet::new();

    // Deterministic churn: allocate in bursts, free every third.
    for round in 0..40usize {
        for _ in 0..(round % 7 + 1) {
            if let Some(h) = pool.allocate().unwrap() {
                assert!(seen.insert(h), "handle {h} handed out twice");
                live.push(h);
            }
        }
        let mut i = 0;
        live.retain(|&h| {
            i += 1;
            if i % 3 == 0 {
                pool.free(h).unwrap();
                seen.remove(&h);
                false
            } else {
                true
            }
        });
        assert!(pool.segment_count() * 8 >= live.len());
        assert_eq!(pool.live_count(), live.len());
    }
}

#[test]
fn free_then_allocate_round_trip() {
    let mut pool = counting_pool(30, 0, 5);
    let handles: Vec<_> = (0..13).map(|_| pool.allocate().unwrap().unwrap()).collect();
    for &h in handles.iter().rev() {
        pool.free(h).unwrap();
        assert_eq!(pool.allocate().unwrap(), Some(h));
    }
}

// ============================================================================
// CLEANUP
// ============================================================================

#[test]
fn cleanup_retains_one_spare() {
    let mut pool = counting_pool(100, 0, 10);
    let handles: Vec<_> = (0..50).map(|_| pool.allocate().unwrap().unwrap()).collect();
    assert_eq!(pool.segment_count(), 5);
    assert_eq!(pool.scene().attached.len(), 5);

    for h in handles {
        pool.free(h).unwrap();
    }

    let later = Instant::now() + Duration::from_millis(501);
    assert_eq!(pool.tick_at(later), 4);
    assert_eq!(pool.segment_count(), 1);
    assert_eq!(pool.scene().attached.len(), 1);
}

#[test]
fn cleanup_waits_for_interval() {
    let mut pool = counting_pool(100, 0, 10);
    let handles: Vec<_> = (0..30).map(|_| pool.allocate().unwrap().unwrap()).collect();
    for h in handles {
        pool.free(h).unwrap();
    }

    assert_eq!(pool.tick(), 0);
    assert_eq!(pool.segment_count(), 3);
}

#[test]
fn limit_adjustment_drives_growth() {
    let mut pool = counting_pool(10, 0, 5);
    while pool.allocate().unwrap().is_some() {}
    assert_eq!(pool.segment_count(), 2);

    pool.grow_pool(ember_pool::PoolAdjustment::DefaultRatio).unwrap();
    assert_eq!(pool.maximum_particles(), 11);
    assert!(pool.allocate().unwrap().is_some());
    assert_eq!(pool.segment_count(), 3);
}

// ============================================================================
// CONCURRENCY
// ============================================================================

#[test]
fn shared_pool_hands_out_unique_slots() {
    let pool = ParticlePool::new(config(4_000, 0, 100), HeadlessScene).unwrap();
    let shared = SharedParticlePool::new(pool);
    let threads = 8;
    let per_thread = 500;

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || {
                (0..per_thread)
                    .map(|_| shared.allocate().unwrap().unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut all = HashSet::new();
    for h in handles {
        for handle in h.join().unwrap() {
            assert!(all.insert(handle));
        }
    }
    assert_eq!(all.len(), threads * per_thread);

    let stats = shared.stats();
    assert_eq!(stats.used, threads * per_thread);
    assert_eq!(stats.segment_count, 40);
}
