//! Integration tests for resonar-core primitives.
//!
//! Verifies DSP behavior with signal-level measurements (sine analysis for
//! filters, sample-accurate echo timing for combs) and checks that audio
//! routed through a processing graph matches the same DSP applied
//! directly.

use resonar_core::graph::{AudioGraph, AudioNode, NodeId};
use resonar_core::{
    AudioFormat, AudioUnit, Biquad, BufferPool, CombFilter, Passthrough, SampleBuffer,
    highpass_coefficients, lowpass_coefficients, peaking_eq_coefficients,
};

const SAMPLE_RATE: f32 = 48000.0;
const TAU: f32 = core::f32::consts::TAU;

/// Generate a sine wave buffer at the given frequency and sample rate.
fn generate_sine(freq_hz: f32, sample_rate: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|n| libm::sinf(TAU * freq_hz * n as f32 / sample_rate))
        .collect()
}

/// Measure RMS amplitude of a signal buffer.
fn rms(signal: &[f32]) -> f32 {
    let sum_sq: f32 = signal.iter().map(|&s| s * s).sum();
    libm::sqrtf(sum_sq / signal.len() as f32)
}

/// Convert linear amplitude to dB.
fn to_db(linear: f32) -> f32 {
    20.0 * libm::log10f(linear.max(1e-10))
}

/// Feed a sine wave through a filter and measure the output amplitude
/// relative to the input. Returns gain in dB.
fn measure_biquad_response(biquad: &mut Biquad, freq_hz: f32) -> f32 {
    let num_samples = 4800; // 100ms at 48kHz, enough to settle a 2nd-order filter
    let settle_samples = 2400;
    let input = generate_sine(freq_hz, SAMPLE_RATE, num_samples);
    let mut output = vec![0.0_f32; num_samples];
    biquad.clear();
    for (i, &s) in input.iter().enumerate() {
        output[i] = biquad.process(s);
    }
    let input_rms = rms(&input[settle_samples..]);
    let output_rms = rms(&output[settle_samples..]);
    to_db(output_rms / input_rms)
}

// ============================================================================
// 1. Filter frequency responses
// ============================================================================

#[test]
fn biquad_lowpass_frequency_response() {
    let cutoff = 1000.0;
    let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(cutoff, 0.707, SAMPLE_RATE);
    let mut biquad = Biquad::new();
    biquad.set_coefficients(b0, b1, b2, a0, a1, a2);

    // Frequencies well below cutoff should pass (~0 dB)
    for &freq in &[50.0, 100.0, 200.0, 500.0] {
        let gain_db = measure_biquad_response(&mut biquad, freq);
        assert!(
            gain_db.abs() < 1.0,
            "Lowpass passband: {freq} Hz should be ~0 dB, got {gain_db:.1} dB"
        );
    }

    // Frequencies well above cutoff should be attenuated
    for &freq in &[4000.0, 8000.0, 16000.0] {
        let gain_db = measure_biquad_response(&mut biquad, freq);
        assert!(
            gain_db < -6.0,
            "Lowpass stopband: {freq} Hz should be attenuated, got {gain_db:.1} dB"
        );
    }

    // At cutoff, Butterworth should be approximately -3 dB
    let gain_at_cutoff = measure_biquad_response(&mut biquad, cutoff);
    assert!(
        (gain_at_cutoff - (-3.0)).abs() < 1.5,
        "Lowpass at cutoff: expected ~-3 dB, got {gain_at_cutoff:.1} dB"
    );
}

#[test]
fn biquad_highpass_frequency_response() {
    let cutoff = 2000.0;
    let (b0, b1, b2, a0, a1, a2) = highpass_coefficients(cutoff, 0.707, SAMPLE_RATE);
    let mut biquad = Biquad::new();
    biquad.set_coefficients(b0, b1, b2, a0, a1, a2);

    for &freq in &[8000.0, 12000.0, 16000.0] {
        let gain_db = measure_biquad_response(&mut biquad, freq);
        assert!(
            gain_db.abs() < 1.0,
            "Highpass passband: {freq} Hz should be ~0 dB, got {gain_db:.1} dB"
        );
    }

    for &freq in &[100.0, 200.0, 500.0] {
        let gain_db = measure_biquad_response(&mut biquad, freq);
        assert!(
            gain_db < -6.0,
            "Highpass stopband: {freq} Hz should be attenuated, got {gain_db:.1} dB"
        );
    }
}

#[test]
fn peaking_eq_boost_and_neutrality() {
    let center = 1000.0;
    let boost_db = 6.0;
    let (b0, b1, b2, a0, a1, a2) = peaking_eq_coefficients(center, 1.0, boost_db, SAMPLE_RATE);
    let mut biquad = Biquad::new();
    biquad.set_coefficients(b0, b1, b2, a0, a1, a2);

    let gain_at_center = measure_biquad_response(&mut biquad, center);
    assert!(
        (gain_at_center - boost_db).abs() < 0.5,
        "Peaking at center: expected ~{boost_db} dB, got {gain_at_center:.1} dB"
    );

    // Far outside the band the filter should be transparent
    for &freq in &[50.0, 12000.0] {
        let gain_db = measure_biquad_response(&mut biquad, freq);
        assert!(
            gain_db.abs() < 1.0,
            "Peaking shoulder: {freq} Hz should be ~0 dB, got {gain_db:.1} dB"
        );
    }
}

// ============================================================================
// 2. Comb echo timing
// ============================================================================

#[test]
fn comb_echo_arrives_at_loop_period() {
    let period = 480; // 10ms at 48kHz
    let feedback = 0.84;
    let mut comb = CombFilter::new(period);
    comb.set_feedback(feedback);
    comb.set_damp(0.0);

    let total = period * 4 + 1;
    let mut output = vec![0.0f32; total];
    for (n, out) in output.iter_mut().enumerate() {
        let input = if n == 0 { 1.0 } else { 0.0 };
        *out = comb.process(input);
    }

    // Echoes at exact multiples of the period, decaying by the feedback
    // ratio each pass; silence everywhere else.
    for (n, &sample) in output.iter().enumerate() {
        if n > 0 && n % period == 0 {
            let pass = (n / period - 1) as i32;
            let expected = libm::powf(feedback, pass as f32);
            assert!(
                (sample - expected).abs() < 1e-3,
                "echo {pass} at sample {n}: expected {expected}, got {sample}"
            );
        } else {
            assert!(
                sample.abs() < 1e-6,
                "expected silence at sample {n}, got {sample}"
            );
        }
    }
}

// ============================================================================
// 3. Graph routing matches direct DSP
// ============================================================================

/// Runs a Biquad over every sample of the block.
struct BiquadUnit {
    filter: Biquad,
}

impl AudioUnit for BiquadUnit {
    fn process(&mut self, input: Option<SampleBuffer>, _pool: &BufferPool) -> Option<SampleBuffer> {
        let mut buffer = input?;
        for sample in buffer.samples_mut() {
            *sample = self.filter.process(*sample);
        }
        Some(buffer)
    }

    fn prepare(&mut self, _format: AudioFormat) {}

    fn reset(&mut self) {
        self.filter.clear();
    }
}

#[test]
fn graph_output_matches_direct_filtering() {
    let block_frames = 256;
    let blocks = 8;
    let format = AudioFormat::new(SAMPLE_RATE, 1, block_frames);
    let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(2000.0, 0.707, SAMPLE_RATE);

    let mut graph_filter = Biquad::new();
    graph_filter.set_coefficients(b0, b1, b2, a0, a1, a2);
    let mut reference_filter = Biquad::new();
    reference_filter.set_coefficients(b0, b1, b2, a0, a1, a2);

    let mut graph = AudioGraph::new();
    graph.prepare(format);
    let source = NodeId(0);
    let filter_node = NodeId(1);
    let sink = NodeId(2);
    graph
        .add_node(AudioNode::source(source, Box::new(Passthrough)))
        .unwrap();
    graph
        .add_node(AudioNode::processor(
            filter_node,
            Box::new(BiquadUnit {
                filter: graph_filter,
            }),
        ))
        .unwrap();
    graph.add_node(AudioNode::output(sink)).unwrap();
    graph.connect(source, filter_node, 0, 0, format).unwrap();
    graph.connect(filter_node, sink, 0, 0, format).unwrap();

    let signal = generate_sine(440.0, SAMPLE_RATE, block_frames * blocks);
    for block in signal.chunks_exact(block_frames) {
        let mut input = graph.pool().unwrap().acquire().unwrap();
        input.samples_mut().copy_from_slice(block);
        graph.publish_input(source, input).unwrap();

        let output = graph.process_block().expect("graph should produce a block");
        for (frame, (&routed, &raw)) in output.samples().iter().zip(block.iter()).enumerate() {
            let direct = reference_filter.process(raw);
            assert!(
                (routed - direct).abs() < 1e-6,
                "frame {frame}: graph produced {routed}, direct filtering {direct}"
            );
        }
        graph.release(output);
    }
}
