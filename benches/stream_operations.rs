use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rxflow::ops::{chunk, combine_latest_to_array, filter, split, transform};
use rxflow::sources::from_array;
use rxflow::{to_array, ArrayOptions, ChunkOptions, RxStream, ToArrayOptions};
use std::time::Duration;
use tokio::runtime::Runtime;

fn bench_basic_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("basic_operations");

    for size in [1_000, 10_000, 100_000].iter() {
        group.bench_with_input(BenchmarkId::new("set_fan_in", size), size, |b, &size| {
            b.iter(|| {
                let stream = RxStream::new();
                let subscriptions: Vec<_> = (0..8)
                    .map(|_| {
                        stream
                            .on_value(|value: &u64| {
                                black_box(value);
                            })
                            .unwrap()
                    })
                    .collect();
                for x in 0..size {
                    stream.set(x).unwrap();
                }
                black_box(subscriptions)
            });
        });

        group.bench_with_input(BenchmarkId::new("map_filter", size), size, |b, &size| {
            b.iter(|| {
                let source = RxStream::new();
                let chain = filter(&transform(&source, |x: u64| x * 2), |x: &u64| x % 4 == 0);
                let subscription = chain
                    .on_value(|value| {
                        black_box(value);
                    })
                    .unwrap();
                for x in 0..size {
                    source.set(x).unwrap();
                }
                black_box(subscription)
            });
        });

        group.bench_with_input(BenchmarkId::new("chunk", size), size, |b, &size| {
            b.iter(|| {
                let source = RxStream::new();
                let chunks = chunk(&source, ChunkOptions::default().quantity(100)).unwrap();
                let subscription = chunks
                    .on_value(|chunk: &Vec<u64>| {
                        black_box(chunk.len());
                    })
                    .unwrap();
                for x in 0..size {
                    source.set(x).unwrap();
                }
                black_box(subscription)
            });
        });
    }

    group.finish();
}

fn bench_multi_source(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_source");

    for size in [1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::new("combine_latest", size), size, |b, &size| {
            b.iter(|| {
                let sources: Vec<RxStream<u64>> = (0..4).map(|_| RxStream::new()).collect();
                let combined = combine_latest_to_array(&sources, Default::default());
                let subscription = combined
                    .on_value(|values| {
                        black_box(values.len());
                    })
                    .unwrap();
                for x in 0..size {
                    sources[(x % 4) as usize].set(x).unwrap();
                }
                black_box(subscription)
            });
        });

        group.bench_with_input(BenchmarkId::new("split", size), size, |b, &size| {
            b.iter(|| {
                let source = RxStream::new();
                let subscriptions: Vec<_> = split(&source, 4)
                    .iter()
                    .map(|output| {
                        output
                            .on_value(|value: &u64| {
                                black_box(value);
                            })
                            .unwrap()
                    })
                    .collect();
                for x in 0..size {
                    source.set(x).unwrap();
                }
                black_box(subscriptions)
            });
        });
    }

    group.finish();
}

fn bench_async_sources(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("async_sources");
    group.measurement_time(Duration::from_secs(10));

    for size in [100, 1_000].iter() {
        group.bench_with_input(BenchmarkId::new("from_array_to_array", size), size, |b, &size| {
            b.to_async(&rt).iter(|| async move {
                let options = ArrayOptions::default().interval(Duration::ZERO);
                let stream = from_array((0..size).collect::<Vec<u64>>(), options);
                let values = to_array(&stream, ToArrayOptions::default()).await.unwrap();
                black_box(values)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_basic_operations,
    bench_multi_source,
    bench_async_sources
);
criterion_main!(benches);
