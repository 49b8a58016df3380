//! Performance benchmarks for cache-plex
//!
//! This benchmark suite measures:
//! - Local provider operations (set, get, exists, unset)
//! - Facade dispatch overhead including value encoding
//! - Key building and sweep passes
//!
//! Run with: cargo bench
//! View results: open target/criterion/report/index.html

use cache_plex::provider::{CacheProvider, LocalConfig, LocalProvider, PurgePolicy};
use cache_plex::{Cache, CacheConfig, CacheKeyBuilder, Expiry};
use chrono::{Duration as ChronoDuration, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde::{Deserialize, Serialize};
use std::hint::black_box;
use std::sync::Arc;

#[derive(Clone, Serialize, Deserialize)]
struct BenchValue {
    id: String,
    data: Vec<u8>,
}

impl BenchValue {
    fn new(size: usize) -> Self {
        BenchValue {
            id: "bench".to_string(),
            data: vec![0u8; size],
        }
    }
}

// ============================================================================
// Group 1: Local Provider Benchmarks
// ============================================================================

fn local_provider_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_provider");
    let later = Utc::now() + ChronoDuration::hours(1);

    for size in [100, 1_000, 10_000, 100_000].iter() {
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("set", size), size, |b, &size| {
                let provider = LocalProvider::new();
                let value = vec![1u8; size];

                b.iter(|| {
                    provider
                        .set(black_box("test_key"), black_box(value.clone()), later)
                        .expect("Failed to set")
                });
            });

        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("get_hit", size), size, |b, &size| {
                let provider = LocalProvider::new();
                provider
                    .set("test_key", vec![1u8; size], later)
                    .expect("Failed to set");

                b.iter(|| provider.get(black_box("test_key")));
            });
    }

    group.bench_function("get_miss", |b| {
        let provider = LocalProvider::new();
        b.iter(|| provider.get(black_box("nonexistent_key")));
    });

    group.bench_function("exists", |b| {
        let provider = LocalProvider::new();
        provider
            .set("test_key", vec![1u8; 1000], later)
            .expect("Failed to set");
        b.iter(|| provider.exists(black_box("test_key")));
    });

    group.bench_function("unset", |b| {
        let provider = LocalProvider::new();
        let value = vec![1u8; 1000];
        b.iter(|| {
            provider
                .set("test_key", value.clone(), later)
                .expect("Failed to set");
            provider.unset(black_box("test_key"))
        });
    });

    group.finish();
}

// ============================================================================
// Group 2: Facade Benchmarks
// ============================================================================

fn facade_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("facade");

    for size in [100, 1_000, 10_000].iter() {
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("set_get", size), size, |b, &size| {
                let cache = Cache::new(CacheConfig::default()).expect("Failed to create cache");
                cache
                    .register_provider(Arc::new(LocalProvider::new()), true)
                    .expect("Failed to register");
                let value = BenchValue::new(size);

                b.iter(|| {
                    cache
                        .set(black_box("bench"), &value, Expiry::Default)
                        .expect("Failed to set");
                    cache.get::<BenchValue>(black_box("bench"))
                });
            });
    }

    group.bench_function("compound_key", |b| {
        let keys = CacheKeyBuilder::new("bench");
        b.iter(|| keys.compound(&[Some(&"user"), Some(&black_box(42)), None]));
    });

    group.finish();
}

// ============================================================================
// Group 3: Sweep Benchmarks
// ============================================================================

fn sweep_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep");

    for entries in [1_000, 10_000].iter() {
        group.bench_with_input(
            BenchmarkId::new("expire_all", entries),
            entries,
            |b, &entries| {
                let provider = LocalProvider::new();
                let past = Utc::now() - ChronoDuration::seconds(1);

                b.iter(|| {
                    for i in 0..entries {
                        provider
                            .set(&format!("k{}", i), vec![0u8; 64], past)
                            .expect("Failed to set");
                    }
                    provider.sweep().expect("Failed to sweep")
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("evict_half_largest", entries),
            entries,
            |b, &entries| {
                let provider = LocalProvider::with_config(
                    LocalConfig::default()
                        .with_max_memory(entries as u64 * 32)
                        .with_purge_policy(PurgePolicy::Largest),
                );
                let later = Utc::now() + ChronoDuration::hours(1);

                b.iter(|| {
                    for i in 0..entries {
                        provider
                            .set(&format!("k{}", i), vec![0u8; 64], later)
                            .expect("Failed to set");
                    }
                    provider.sweep().expect("Failed to sweep")
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    local_provider_benchmarks,
    facade_benchmarks,
    sweep_benchmarks
);
criterion_main!(benches);
