//! Criterion benchmarks for resonar-core DSP primitives and buffers
//!
//! Run with: cargo bench -p resonar-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use resonar_core::{
    AllpassFilter, Biquad, BufferPool, CircularBuffer, CombFilter, DelayLine, GrowthPolicy,
    MultiParamSmoother, ParamSmoother, lowpass_coefficients, spsc_ring,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_biquad(c: &mut Criterion) {
    let mut group = c.benchmark_group("Biquad");

    let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(1000.0, 0.707, SAMPLE_RATE);

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::new("process", block_size),
            &block_size,
            |b, _| {
                let mut biquad = Biquad::new();
                biquad.set_coefficients(b0, b1, b2, a0, a1, a2);
                b.iter(|| {
                    for &sample in &input {
                        black_box(biquad.process(black_box(sample)));
                    }
                });
            },
        );
    }

    // Coefficient calculation cost
    group.bench_function("coefficient_calc", |b| {
        b.iter(|| {
            black_box(lowpass_coefficients(
                black_box(1000.0),
                black_box(0.707),
                black_box(SAMPLE_RATE),
            ))
        });
    });

    group.finish();
}

fn bench_comb(c: &mut Criterion) {
    let mut group = c.benchmark_group("CombFilter");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |b, _| {
                let mut comb = CombFilter::new(1557);
                comb.set_feedback(0.84);
                comb.set_damp(0.2);
                b.iter(|| {
                    for &sample in &input {
                        black_box(comb.process(black_box(sample)));
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_allpass(c: &mut Criterion) {
    let mut group = c.benchmark_group("AllpassFilter");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |b, _| {
                let mut allpass = AllpassFilter::new(556);
                allpass.set_feedback(0.5);
                b.iter(|| {
                    for &sample in &input {
                        black_box(allpass.process(black_box(sample)));
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("DelayLine");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |b, _| {
                let mut delay = DelayLine::new(48000);
                b.iter(|| {
                    for &sample in &input {
                        let out = delay.read_with_delay(black_box(1000));
                        delay.write(black_box(sample));
                        black_box(out);
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_param_smoother(c: &mut Criterion) {
    let mut group = c.benchmark_group("ParamSmoother");

    for &block_size in BLOCK_SIZES {
        // Ramping: flip between targets each block
        group.bench_with_input(
            BenchmarkId::new("ramping", block_size),
            &block_size,
            |b, &size| {
                let mut param = ParamSmoother::new(SAMPLE_RATE, 20.0);
                param.set_target(0.0);
                let mut high = false;
                b.iter(|| {
                    high = !high;
                    param.set_target(if high { 1.0 } else { 0.0 });
                    for _ in 0..size {
                        black_box(param.advance());
                    }
                });
            },
        );

        // Settled: already at target
        group.bench_with_input(
            BenchmarkId::new("settled", block_size),
            &block_size,
            |b, &size| {
                let mut param = ParamSmoother::new(SAMPLE_RATE, 20.0);
                param.set_target(1.0);
                for _ in 0..48000 {
                    param.advance();
                }
                b.iter(|| {
                    for _ in 0..size {
                        black_box(param.advance());
                    }
                });
            },
        );
    }

    // Named-parameter set with block advancement
    group.bench_function("multi_advance_by_256", |b| {
        let mut params = MultiParamSmoother::new(SAMPLE_RATE, 20.0);
        params.set("room_size", 0.5);
        params.set("damping", 0.5);
        params.set("wet_level", 0.3);
        params.set("dry_level", 0.7);
        let mut high = false;
        b.iter(|| {
            high = !high;
            params.set("room_size", if high { 0.9 } else { 0.1 });
            params.advance_by(black_box(256));
        });
    });

    group.finish();
}

fn bench_buffer_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("BufferPool");

    let pool = BufferPool::new(32, 256, 2, SAMPLE_RATE, GrowthPolicy::OnDemand);
    group.bench_function("acquire_release", |b| {
        b.iter(|| {
            let buffer = pool.acquire().unwrap();
            pool.release(black_box(buffer));
        });
    });

    // Mixing cost: accumulate one block into another
    for &block_size in BLOCK_SIZES {
        let pool = BufferPool::new(4, block_size, 2, SAMPLE_RATE, GrowthPolicy::OnDemand);
        let source = pool.acquire().unwrap();
        let mut dest = pool.acquire().unwrap();

        group.bench_with_input(
            BenchmarkId::new("accumulate", block_size),
            &block_size,
            |b, _| {
                b.iter(|| {
                    dest.accumulate_from(black_box(&source), black_box(0.5));
                });
            },
        );
    }

    group.finish();
}

fn bench_circular(c: &mut Criterion) {
    let mut group = c.benchmark_group("CircularBuffer");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size * 2);
        let mut output = vec![0.0f32; block_size * 2];

        group.bench_with_input(
            BenchmarkId::new("write_read", block_size),
            &block_size,
            |b, &size| {
                let mut ring = CircularBuffer::new(8192, 2);
                b.iter(|| {
                    ring.write(black_box(&input));
                    ring.read(size, &mut output);
                    black_box(&output);
                });
            },
        );
    }

    group.finish();
}

fn bench_spsc(c: &mut Criterion) {
    let mut group = c.benchmark_group("SpscRing");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);
        let mut output = vec![0.0f32; block_size];

        group.bench_with_input(
            BenchmarkId::new("write_read", block_size),
            &block_size,
            |b, _| {
                let (mut producer, mut consumer) = spsc_ring(4096);
                b.iter(|| {
                    producer.write(black_box(&input));
                    consumer.read(&mut output);
                    black_box(&output);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_biquad,
    bench_comb,
    bench_allpass,
    bench_delay,
    bench_param_smoother,
    bench_buffer_pool,
    bench_circular,
    bench_spsc,
);

criterion_main!(benches);
