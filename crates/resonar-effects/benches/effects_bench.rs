//! Criterion benchmarks for resonar effects
//!
//! Run with: cargo bench
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use resonar_core::{AudioFormat, AudioUnit, BufferPool, GrowthPolicy};
use resonar_effects::{Delay, Effect, EffectNode, Reverb, ThreeBandEq};

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

fn bench_effect<E: Effect>(c: &mut Criterion, name: &str, mut effect: E) {
    let mut group = c.benchmark_group(name);

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |b, _| {
                let mut output = vec![0.0; block_size];
                b.iter(|| {
                    effect.process_block(black_box(&input), &mut output);
                    black_box(output[0])
                })
            },
        );
    }

    group.finish();
}

fn bench_reverb(c: &mut Criterion) {
    let mut effect = Reverb::new(SAMPLE_RATE);
    effect.set_room_size(0.7);
    effect.set_damping(0.3);
    effect.set_wet_level(0.5);
    effect.set_dry_level(0.5);
    bench_effect(c, "Reverb", effect);
}

fn bench_delay(c: &mut Criterion) {
    let mut effect = Delay::new(SAMPLE_RATE);
    effect.set_delay_time_ms(375.0);
    effect.set_feedback(0.5);
    effect.set_mix(0.3);
    bench_effect(c, "Delay", effect);
}

fn bench_eq(c: &mut Criterion) {
    let mut effect = ThreeBandEq::new(SAMPLE_RATE);
    effect.set_low_gain(3.0);
    effect.set_mid_gain(-2.0);
    effect.set_high_gain(4.0);
    bench_effect(c, "ThreeBandEq", effect);
}

fn bench_effect_node(c: &mut Criterion) {
    let mut group = c.benchmark_group("EffectNode");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size * 2);

        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |b, _| {
                let pool = BufferPool::new(4, block_size, 2, SAMPLE_RATE, GrowthPolicy::OnDemand);
                let mut node = EffectNode::new(ThreeBandEq::new(SAMPLE_RATE));
                node.prepare(AudioFormat::new(SAMPLE_RATE, 2, block_size));

                b.iter(|| {
                    let mut buffer = pool.acquire().unwrap();
                    buffer.samples_mut().copy_from_slice(&input);
                    let out = node.process(Some(buffer), &pool).unwrap();
                    let first = out.samples()[0];
                    pool.release(out);
                    black_box(first)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_reverb, bench_delay, bench_eq, bench_effect_node);

criterion_main!(benches);
