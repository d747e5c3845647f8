//! Adapter that hosts an [`Effect`] as a graph processing unit.

use resonar_core::{AudioFormat, AudioUnit, BufferPool, SampleBuffer};

use crate::effect::Effect;

/// Wraps an [`Effect`] so it can run inside an audio graph.
///
/// The graph hands nodes interleaved [`SampleBuffer`]s; this adapter
/// unpacks them frame by frame. Stereo buffers go through
/// [`Effect::process_stereo`]; any other channel count runs sample-wise
/// through the mono path.
///
/// # Example
///
/// ```rust
/// use resonar_core::{AudioGraph, AudioNode};
/// use resonar_effects::{EffectNode, ThreeBandEq};
///
/// let mut graph = AudioGraph::new();
/// let eq = ThreeBandEq::new(48000.0);
/// graph.add_node(AudioNode::processor(resonar_core::NodeId(1), Box::new(EffectNode::new(eq))))?;
/// # Ok::<(), resonar_core::GraphError>(())
/// ```
pub struct EffectNode<E> {
    effect: E,
    channels: usize,
}

impl<E: Effect> EffectNode<E> {
    /// Wrap an effect for graph use.
    ///
    /// The channel layout is taken from the format at prepare time.
    pub fn new(effect: E) -> Self {
        Self {
            effect,
            channels: 2,
        }
    }

    /// Borrow the wrapped effect.
    pub fn effect(&self) -> &E {
        &self.effect
    }

    /// Mutably borrow the wrapped effect, for direct parameter access.
    pub fn effect_mut(&mut self) -> &mut E {
        &mut self.effect
    }

    /// Unwrap back into the inner effect.
    pub fn into_inner(self) -> E {
        self.effect
    }
}

impl<E: Effect + Send> AudioUnit for EffectNode<E> {
    fn process(&mut self, input: Option<SampleBuffer>, _pool: &BufferPool) -> Option<SampleBuffer> {
        let mut buffer = input?;
        if self.channels == 2 {
            for frame in buffer.samples_mut().chunks_exact_mut(2) {
                let (left, right) = self.effect.process_stereo(frame[0], frame[1]);
                frame[0] = left;
                frame[1] = right;
            }
        } else {
            self.effect.process_block_inplace(buffer.samples_mut());
        }
        Some(buffer)
    }

    fn prepare(&mut self, format: AudioFormat) {
        self.channels = format.channels;
        self.effect.set_sample_rate(format.sample_rate);
        // Old state was recorded at the previous rate; start the stream clean.
        self.effect.reset();
    }

    fn reset(&mut self) {
        self.effect.reset();
    }

    fn set_param(&mut self, name: &str, value: f32) {
        self.effect.set_param(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Delay, Reverb, ThreeBandEq};
    use resonar_core::{AudioGraph, AudioNode, GrowthPolicy, NodeId, Passthrough};

    #[test]
    fn test_effect_node_processes_mono_buffer() {
        let pool = BufferPool::new(4, 64, 1, 48000.0, GrowthPolicy::OnDemand);
        let mut node = EffectNode::new(ThreeBandEq::new(48000.0));
        node.prepare(AudioFormat::new(48000.0, 1, 64));

        let mut buffer = pool.acquire().unwrap();
        for (i, sample) in buffer.samples_mut().iter_mut().enumerate() {
            *sample = (i as f32 * 0.1).sin() * 0.5;
        }
        let reference: Vec<f32> = buffer.samples().to_vec();

        let out = node.process(Some(buffer), &pool).unwrap();
        for (got, want) in out.samples().iter().zip(&reference) {
            assert!(
                (got - want).abs() < 1e-4,
                "Flat EQ node should be transparent: got {}, want {}",
                got,
                want
            );
        }
    }

    #[test]
    fn test_effect_node_processes_stereo_frames() {
        let pool = BufferPool::new(4, 64, 2, 48000.0, GrowthPolicy::OnDemand);
        let mut delay = Delay::new(48000.0);
        delay.set_delay_time_ms(1.0); // 48 samples
        delay.set_feedback(0.0);
        delay.set_mix(1.0);

        let mut node = EffectNode::new(delay);
        node.prepare(AudioFormat::new(48000.0, 2, 64));

        let mut buffer = pool.acquire().unwrap();
        buffer.samples_mut()[0] = 1.0;
        buffer.samples_mut()[1] = -1.0;

        let out = node.process(Some(buffer), &pool).unwrap();
        let samples = out.samples();

        // The impulse frame comes out 48 frames later, channels intact
        assert_eq!(samples[48 * 2], 1.0);
        assert_eq!(samples[48 * 2 + 1], -1.0);
        // Before the echo there is nothing
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[47 * 2], 0.0);
    }

    #[test]
    fn test_effect_node_without_input_is_silent() {
        let pool = BufferPool::new(4, 64, 2, 48000.0, GrowthPolicy::OnDemand);
        let mut node = EffectNode::new(Reverb::new(48000.0));
        assert!(node.process(None, &pool).is_none());
    }

    #[test]
    fn test_effect_node_forwards_parameters() {
        let mut node = EffectNode::new(Reverb::new(48000.0));
        node.set_param("room_size", 0.9);
        node.set_param("wet_level", 0.6);
        assert_eq!(node.effect().room_size(), 0.9);
        assert_eq!(node.effect().wet_level(), 0.6);
    }

    #[test]
    fn test_effect_node_runs_inside_graph() {
        let format = AudioFormat::new(48000.0, 1, 32);
        let mut graph = AudioGraph::new();
        let input = NodeId(1);
        let eq = NodeId(2);
        let output = NodeId(3);

        graph
            .add_node(AudioNode::source(input, Box::new(Passthrough)))
            .unwrap();
        graph
            .add_node(AudioNode::processor(
                eq,
                Box::new(EffectNode::new(ThreeBandEq::new(48000.0))),
            ))
            .unwrap();
        graph.add_node(AudioNode::output(output)).unwrap();
        graph.connect(input, eq, 0, 0, format).unwrap();
        graph.connect(eq, output, 0, 0, format).unwrap();

        graph.prepare(format);

        let mut block = graph.pool().unwrap().acquire().unwrap();
        for (i, sample) in block.samples_mut().iter_mut().enumerate() {
            *sample = (i as f32 * 0.2).sin() * 0.4;
        }
        let reference: Vec<f32> = block.samples().to_vec();
        graph.publish_input(input, block).unwrap();

        let out = graph.process_block().expect("graph should produce a block");
        for (got, want) in out.samples().iter().zip(&reference) {
            assert!((got - want).abs() < 1e-4);
        }
        graph.release(out);
    }
}
