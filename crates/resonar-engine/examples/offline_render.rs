//! Offline render demo: drive the engine's callback entry point by hand.
//!
//! Builds a source -> reverb -> output graph, feeds it a short sine
//! burst, and renders block by block while the reverb tail rings out.
//!
//! Run with: cargo run -p resonar-engine --example offline_render

use resonar_core::{AudioNode, NodeId, Passthrough};
use resonar_effects::{EffectNode, Reverb};
use resonar_engine::{AudioEngine, CallbackInfo, EngineConfig, TaskPriority};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // --- Configuration ---

    let config = EngineConfig {
        channels: 1,
        ..EngineConfig::default()
    };
    println!("engine config:\n{}", config.to_toml_string().unwrap());

    let sample_rate = config.sample_rate;
    let block_size = config.block_size;
    let engine = AudioEngine::new(config).unwrap();

    // --- Graph: source -> reverb -> output ---

    let source = NodeId(1);
    let reverb = NodeId(2);
    let output = NodeId(3);
    engine
        .add_node(AudioNode::source(source, Box::new(Passthrough)))
        .unwrap();
    engine
        .add_node(AudioNode::processor(
            reverb,
            Box::new(EffectNode::new(Reverb::new(sample_rate))),
        ))
        .unwrap();
    engine.add_node(AudioNode::output(output)).unwrap();
    engine.connect(source, reverb, 0, 0).unwrap();
    engine.connect(reverb, output, 0, 0).unwrap();
    engine.set_input_node(source).unwrap();

    engine.set_parameter("room_size", 0.7);
    engine.set_parameter("wet_level", 0.5);
    engine.set_parameter("dry_level", 0.4);
    engine.activate();

    // --- Render: 0.25 s burst, then let the tail ring ---

    let total_blocks = (sample_rate as usize) / block_size;
    let burst_blocks = total_blocks / 4;
    let mut phase = 0.0f32;
    let step = 440.0 * std::f32::consts::TAU / sample_rate;
    let mut peaks = Vec::with_capacity(total_blocks);

    for index in 0..total_blocks {
        let mut block = engine.acquire().unwrap();
        if index < burst_blocks {
            for sample in block.samples_mut() {
                *sample = phase.sin() * 0.5;
                phase += step;
            }
        } else {
            block.clear();
        }

        let mut info = CallbackInfo::new(block_size, sample_rate);
        info.sample_time = (index * block_size) as f64;

        let peak = match engine.render(Some(block), &info) {
            Some(rendered) => {
                let peak = rendered
                    .samples()
                    .iter()
                    .fold(0.0f32, |acc, s| acc.max(s.abs()));
                engine.release(rendered);
                peak
            }
            None => 0.0,
        };
        peaks.push(peak);

        if index % 32 == 0 {
            let seconds = info.sample_time / f64::from(sample_rate);
            println!("t = {seconds:.3} s  peak = {peak:.4}");
        }
    }

    // --- Offload analysis to the worker pool ---

    let (summary_tx, summary_rx) = crossbeam_channel::bounded(1);
    engine
        .submit(TaskPriority::Low, move || {
            let burst_peak = peaks[..burst_blocks]
                .iter()
                .fold(0.0f32, |acc, p| acc.max(*p));
            let tail_peak = peaks[burst_blocks..]
                .iter()
                .fold(0.0f32, |acc, p| acc.max(*p));
            let final_peak = *peaks.last().unwrap();
            summary_tx.send((burst_peak, tail_peak, final_peak)).unwrap();
        })
        .unwrap();
    let (burst_peak, tail_peak, final_peak) = summary_rx.recv().unwrap();

    println!();
    println!("burst peak: {burst_peak:.4}");
    println!("tail peak after burst: {tail_peak:.4}");
    println!("peak in final block: {final_peak:.4}");

    let stats = engine.pool_stats().unwrap();
    println!(
        "pool: {} available / {} total",
        stats.available, stats.total
    );

    engine.shutdown();
}
