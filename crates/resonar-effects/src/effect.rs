//! Core effect trait for audio processing.
//!
//! Every processor in this crate implements [`Effect`]: a mono per-sample
//! interface with stereo and block entry points layered on top as default
//! methods. Effects that keep per-channel state (like [`Delay`]) override
//! [`Effect::process_stereo`]; the rest inherit the shared-state default.
//!
//! [`Delay`]: crate::Delay

/// A real-time audio effect.
///
/// Implementors provide the mono path plus sample-rate and reset handling;
/// everything else has a default. None of the methods allocate, so any
/// `Effect` is safe to drive from an audio callback once constructed.
///
/// # Example
///
/// ```
/// use resonar_effects::Effect;
///
/// struct Gain {
///     amount: f32,
/// }
///
/// impl Effect for Gain {
///     fn process(&mut self, input: f32) -> f32 {
///         input * self.amount
///     }
///
///     fn set_sample_rate(&mut self, _sample_rate: f32) {}
///
///     fn reset(&mut self) {}
/// }
///
/// let mut gain = Gain { amount: 0.5 };
/// assert_eq!(gain.process(1.0), 0.5);
/// ```
pub trait Effect {
    /// Process a single mono sample.
    fn process(&mut self, input: f32) -> f32;

    /// Process one stereo frame.
    ///
    /// The default routes each channel through the mono path, which means
    /// internal state is shared between channels. Effects that keep
    /// per-channel state should override this.
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        (self.process(left), self.process(right))
    }

    /// Process a block of samples from `input` into `output`.
    ///
    /// Both slices must have the same length.
    fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), output.len());
        for (inp, out) in input.iter().zip(output.iter_mut()) {
            *out = self.process(*inp);
        }
    }

    /// Process a block of samples in place.
    fn process_block_inplace(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Update the sample rate.
    ///
    /// Implementations rescale rate-dependent state here (delay lengths,
    /// filter coefficients, smoothing times).
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Clear all internal state (delay lines, filter histories) without
    /// changing parameter targets.
    fn reset(&mut self);

    /// Processing latency introduced by this effect, in samples.
    fn latency_samples(&self) -> usize {
        0
    }

    /// Whether the stereo path does genuine cross-channel processing.
    ///
    /// `false` means `process_stereo` is two independent (or shared-state)
    /// mono passes, so a host may freely substitute the mono path.
    fn is_true_stereo(&self) -> bool {
        false
    }

    /// Set a named parameter.
    ///
    /// Unknown names are ignored so hosts can broadcast parameter changes
    /// to a heterogeneous set of effects.
    fn set_param(&mut self, name: &str, value: f32) {
        let _ = (name, value);
    }
}
