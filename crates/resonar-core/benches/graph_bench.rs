//! Criterion benchmarks for the audio-node graph (`resonar-core::graph`).
//!
//! Measures graph overhead independently of DSP cost using a trivial `Gain`
//! unit. Two axes:
//!
//! - **Build**: mutation cost including the per-mutation order recompute
//! - **Execute**: `process_block()` throughput at varying block sizes
//!
//! Run with: `cargo bench -p resonar-core -- graph/`
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use resonar_core::graph::{AudioGraph, AudioNode, NodeId, NodeKind};
use resonar_core::{AudioFormat, AudioUnit, BufferPool, SampleBuffer};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZE: usize = 256;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

// ---------------------------------------------------------------------------
// Trivial units that keep DSP cost out of the graph numbers
// ---------------------------------------------------------------------------

/// Emits a constant block so the graph always has audio to move.
struct ConstSource(f32);

impl AudioUnit for ConstSource {
    fn process(&mut self, _input: Option<SampleBuffer>, pool: &BufferPool) -> Option<SampleBuffer> {
        let mut buffer = pool.acquire().ok()?;
        for sample in buffer.samples_mut() {
            *sample = self.0;
        }
        Some(buffer)
    }

    fn prepare(&mut self, _format: AudioFormat) {}

    fn reset(&mut self) {}
}

/// Multiplies each sample by a constant.
struct Gain(f32);

impl AudioUnit for Gain {
    fn process(&mut self, input: Option<SampleBuffer>, _pool: &BufferPool) -> Option<SampleBuffer> {
        let mut buffer = input?;
        for sample in buffer.samples_mut() {
            *sample *= self.0;
        }
        Some(buffer)
    }

    fn prepare(&mut self, _format: AudioFormat) {}

    fn reset(&mut self) {}
}

// ---------------------------------------------------------------------------
// Graph constructors
// ---------------------------------------------------------------------------

fn build_linear(stages: usize, block_size: usize) -> AudioGraph {
    let format = AudioFormat::new(SAMPLE_RATE, 2, block_size);
    let mut graph = AudioGraph::new();
    graph.prepare(format);

    graph
        .add_node(AudioNode::source(NodeId(0), Box::new(ConstSource(0.5))))
        .unwrap();
    let mut previous = NodeId(0);
    for stage in 0..stages {
        let id = NodeId(stage as u32 + 1);
        graph
            .add_node(AudioNode::processor(id, Box::new(Gain(0.9))))
            .unwrap();
        graph.connect(previous, id, 0, 0, format).unwrap();
        previous = id;
    }
    let output = NodeId(stages as u32 + 1);
    graph.add_node(AudioNode::output(output)).unwrap();
    graph.connect(previous, output, 0, 0, format).unwrap();
    graph
}

fn build_diamond(block_size: usize) -> AudioGraph {
    let format = AudioFormat::new(SAMPLE_RATE, 2, block_size);
    let mut graph = AudioGraph::new();
    graph.prepare(format);

    graph
        .add_node(AudioNode::new(
            NodeId(0),
            NodeKind::Source(Box::new(ConstSource(0.5))),
            0,
            2,
        ))
        .unwrap();
    graph
        .add_node(AudioNode::processor(NodeId(1), Box::new(Gain(0.8))))
        .unwrap();
    graph
        .add_node(AudioNode::processor(NodeId(2), Box::new(Gain(0.7))))
        .unwrap();
    graph.add_node(AudioNode::mixer(NodeId(3), 2)).unwrap();
    graph.add_node(AudioNode::output(NodeId(4))).unwrap();

    graph.connect(NodeId(0), NodeId(1), 0, 0, format).unwrap();
    graph.connect(NodeId(0), NodeId(2), 1, 0, format).unwrap();
    graph.connect(NodeId(1), NodeId(3), 0, 0, format).unwrap();
    graph.connect(NodeId(2), NodeId(3), 0, 1, format).unwrap();
    graph.connect(NodeId(3), NodeId(4), 0, 0, format).unwrap();
    graph
}

fn run_block(graph: &mut AudioGraph) {
    if let Some(buffer) = graph.process_block() {
        black_box(buffer.samples());
        graph.release(buffer);
    }
}

// ---------------------------------------------------------------------------
// Build benchmarks, including the per-mutation order recompute
// ---------------------------------------------------------------------------

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/build");

    group.bench_function("linear_5", |b| {
        b.iter(|| black_box(build_linear(5, BLOCK_SIZE)));
    });

    group.bench_function("linear_20", |b| {
        b.iter(|| black_box(build_linear(20, BLOCK_SIZE)));
    });

    group.bench_function("diamond", |b| {
        b.iter(|| black_box(build_diamond(BLOCK_SIZE)));
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Execute benchmarks at a fixed block size of 256
// ---------------------------------------------------------------------------

fn bench_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/execute");

    {
        let mut graph = build_linear(5, BLOCK_SIZE);
        group.bench_function("linear_5_block256", |b| {
            b.iter(|| run_block(&mut graph));
        });
    }

    {
        let mut graph = build_linear(20, BLOCK_SIZE);
        group.bench_function("linear_20_block256", |b| {
            b.iter(|| run_block(&mut graph));
        });
    }

    {
        let mut graph = build_diamond(BLOCK_SIZE);
        group.bench_function("diamond_block256", |b| {
            b.iter(|| run_block(&mut graph));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Block size sweep: 5-node chain across all standard block sizes
// ---------------------------------------------------------------------------

fn bench_block_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/block_sweep");

    for &block_size in BLOCK_SIZES {
        let mut graph = build_linear(5, block_size);

        group.bench_with_input(
            BenchmarkId::new("linear_5", block_size),
            &block_size,
            |b, _| {
                b.iter(|| run_block(&mut graph));
            },
        );
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_build, bench_execute, bench_block_sweep);
criterion_main!(benches);
