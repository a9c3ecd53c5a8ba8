mod common;
use apex_core::prelude::*;
use common::*;
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching for 10k orders");
    group.throughput(Throughput::Elements(10_000));
    group.bench_function("cross 10k resting sells against 10k buys", |b| {
        b.iter_batched(
            || {
                let mut pipeline = seeded_pipeline(2, 1_000_000_000);
                for i in 0..10_000u64 {
                    pipeline
                        .submit(gtc(i + 1, 1, Side::Ask, 1000 + (i % 500) as i64, 10))
                        .unwrap();
                }
                pipeline
            },
            |mut pipeline| {
                for i in 10_000..20_000u64 {
                    pipeline
                        .submit(gtc(i + 1, 2, Side::Bid, 1500, 10))
                        .unwrap();
                }
            },
            criterion::BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn stress_multi_thread_benchmark(c: &mut Criterion) {
    let pipeline = Arc::new(Mutex::new(seeded_pipeline(2, 1_000_000_000)));

    let insert_counter = Arc::new(AtomicU64::new(0));
    let cancel_counter = Arc::new(AtomicU64::new(0));

    let mut group = c.benchmark_group("stress matching");
    group.throughput(Throughput::Elements(1));
    group.bench_function("concurrent insert/cancel TPS", |b| {
        let running = Arc::new(AtomicBool::new(true));

        let pipeline_insert = Arc::clone(&pipeline);
        let insert_counter_clone = Arc::clone(&insert_counter);
        let insert_thread_running = running.clone();
        let insert_thread = thread::spawn(move || {
            let mut i = 0u64;
            let mut rng = rand::rng();
            while insert_thread_running.load(Ordering::Relaxed) {
                i += 1;
                let is_bid = rng.random_bool(0.5);
                let side = if is_bid { Side::Bid } else { Side::Ask };
                let price = 1000 - (i % 500) as i64;
                let mut pipeline = pipeline_insert.lock().unwrap();
                let _ = pipeline.submit(gtc(i, if is_bid { 1 } else { 2 }, side, price, 10));
                insert_counter_clone.fetch_add(1, Ordering::Relaxed);
            }
        });

        let pipeline_cancel = Arc::clone(&pipeline);
        let cancel_counter_clone = Arc::clone(&cancel_counter);
        let cancel_thread_running = running.clone();
        let cancel_thread = thread::spawn(move || {
            let mut rng = rand::rng();
            while cancel_thread_running.load(Ordering::Relaxed) {
                let order_id = rng.random_range(1..100_000u64);
                let mut pipeline = pipeline_cancel.lock().unwrap();
                let _ = pipeline.submit(Command::CancelOrder {
                    order_id,
                    uid: 1,
                    symbol_id: 1,
                });
                cancel_counter_clone.fetch_add(1, Ordering::Relaxed);
            }
        });

        b.iter(|| {
            let mut pipeline = pipeline.lock().unwrap();
            let _ = pipeline.submit(Command::NoOp);
        });

        running.store(false, Ordering::Relaxed);
        insert_thread.join().unwrap();
        cancel_thread.join().unwrap();
    });
    group.finish();
}

criterion_group!(benches, bench_matching, stress_multi_thread_benchmark);
criterion_main!(benches);
