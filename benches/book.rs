//! Engine micro-benchmarks (Criterion).
//!
//! Run: `cargo bench` or `cargo bench --bench book`.

use clob_engine::{FlowConfig, FlowEvent, MatchingEngine, OrderFlow, OrderId, Side};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};

fn bench_mixed_event_replay(c: &mut Criterion) {
    const N: usize = 1000;
    let mut group = c.benchmark_group("engine");
    group.throughput(Throughput::Elements(N as u64));
    group.bench_function("replay_1000_mixed_events", |b| {
        b.iter_batched(
            || {
                let config = FlowConfig {
                    seed: 42,
                    num_events: N,
                    ..Default::default()
                };
                let events = OrderFlow::new(config).events();
                (MatchingEngine::new(), events)
            },
            |(mut engine, events)| {
                for event in events {
                    match event {
                        FlowEvent::Add {
                            order_id,
                            side,
                            price,
                            volume,
                        } => {
                            let _ = engine.add_order(order_id, "BENCH", side, price, volume);
                        }
                        FlowEvent::Amend {
                            order_id,
                            new_price,
                            new_volume,
                        } => {
                            let _ = engine.amend_order(order_id, new_price, new_volume);
                        }
                        FlowEvent::Pull { order_id } => {
                            let _ = engine.pull_order(order_id);
                        }
                    }
                }
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_sweep_resting_levels(c: &mut Criterion) {
    const RESTING: u64 = 500;
    let mut group = c.benchmark_group("engine");
    group.throughput(Throughput::Elements(RESTING));
    group.bench_function("sweep_500_resting_sells", |b| {
        b.iter_batched(
            || {
                let mut engine = MatchingEngine::new();
                for i in 0..RESTING {
                    engine
                        .add_order(
                            OrderId(i + 1),
                            "BENCH",
                            Side::Sell,
                            100 + (i as i64 % 50),
                            1,
                        )
                        .unwrap();
                }
                engine
            },
            |mut engine| {
                engine
                    .add_order(OrderId(RESTING + 1), "BENCH", Side::Buy, 200, RESTING as i64)
                    .unwrap();
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_pull_resting_orders(c: &mut Criterion) {
    const RESTING: u64 = 500;
    const PULLS: u64 = 100;
    let mut group = c.benchmark_group("engine");
    group.throughput(Throughput::Elements(PULLS));
    group.bench_function("pull_100_after_500_resting", |b| {
        b.iter_batched(
            || {
                let mut engine = MatchingEngine::new();
                for i in 0..RESTING {
                    engine
                        .add_order(
                            OrderId(i + 1),
                            "BENCH",
                            Side::Buy,
                            50 + (i as i64 % 100),
                            10,
                        )
                        .unwrap();
                }
                engine
            },
            |mut engine| {
                for i in 0..PULLS {
                    engine.pull_order(OrderId(i + 1)).unwrap();
                }
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_mixed_event_replay,
    bench_sweep_resting_levels,
    bench_pull_resting_orders
);
criterion_main!(benches);
