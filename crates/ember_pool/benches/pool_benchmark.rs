//! # Particle Pool Benchmark
//!
//! Per-frame churn: a particle system spawning and retiring thousands of
//! particles every frame must not stall the frame.
//!
//! Run with: `cargo bench --package ember_pool`

// Benchmarks don't need docs
#![allow(missing_docs)]

use std::hint::black_box;
use std::time::{Duration, Instant};

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use ember_pool::{HeadlessScene, ParticlePool, PoolConfig};

/// Particles spawned and retired per simulated frame.
const CHURN_PER_FRAME: usize = 2_000;

fn warm_pool(live: usize) -> ParticlePool<HeadlessScene> {
    let config = PoolConfig {
        maximum_particles: 200_000,
        minimum_particles: live,
        ..PoolConfig::default()
    };
    let mut pool = ParticlePool::new(config, HeadlessScene).expect("valid config");
    for _ in 0..live {
        pool.allocate().expect("allocation").expect("capacity");
    }
    pool
}

/// Benchmark: allocate + free one particle on a pool with N live particles.
fn bench_allocate_free(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate_free");

    for live in [0, 15_000, 90_000] {
        group.bench_with_input(BenchmarkId::from_parameter(live), &live, |b, &live| {
            let mut pool = warm_pool(live);
            b.iter(|| {
                let handle = pool.allocate().expect("allocation").expect("capacity");
                pool.free(black_box(handle)).expect("valid handle");
            });
        });
    }

    group.finish();
}

/// Benchmark: one frame of churn followed by a tick.
fn bench_frame_churn(c: &mut Criterion) {
    c.bench_function("frame_churn_2k", |b| {
        let mut pool = warm_pool(30_000);
        let mut live = Vec::with_capacity(CHURN_PER_FRAME);
        b.iter(|| {
            for _ in 0..CHURN_PER_FRAME {
                if let Some(h) = pool.allocate().expect("allocation") {
                    live.push(h);
                }
            }
            for h in live.drain(..) {
                pool.free(h).expect("valid handle");
            }
            black_box(pool.tick())
        });
    });
}

/// Benchmark: cleanup of a pool that has fully drained.
fn bench_cleanup(c: &mut Criterion) {
    c.bench_function("cleanup_60_segments", |b| {
        b.iter_batched(
            || {
                let mut pool = warm_pool(0);
                let handles: Vec<_> = (0..90_000)
                    .map(|_| pool.allocate().expect("allocation").expect("capacity"))
                    .collect();
                for h in handles {
                    pool.free(h).expect("valid handle");
                }
                pool
            },
            |mut pool| black_box(pool.tick_at(Instant::now() + Duration::from_secs(60))),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_allocate_free, bench_frame_churn, bench_cleanup);
criterion_main!(benches);
