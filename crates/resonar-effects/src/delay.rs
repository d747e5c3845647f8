//! Classic delay effect with feedback control.

use resonar_core::{DelayLine, ParamSmoother, flush_denormal};

use crate::effect::Effect;

/// Default maximum delay time in milliseconds.
const DEFAULT_MAX_DELAY_MS: f32 = 2000.0;

/// Classic delay effect with feedback and wet/dry mix.
///
/// A single delay line per channel with the feedback signal written back
/// through a denormal flush. Delay time, feedback, and mix are smoothed so
/// parameter changes do not click.
///
/// # Example
///
/// ```rust
/// use resonar_effects::{Delay, Effect};
///
/// let mut delay = Delay::new(48000.0);
/// delay.set_delay_time_ms(375.0);
/// delay.set_feedback(0.5);
/// delay.set_mix(0.3);
///
/// let output = delay.process(0.5);
/// ```
pub struct Delay {
    delay_line: DelayLine,
    delay_line_r: DelayLine,
    max_delay_ms: f32,
    max_delay_samples: f32,
    delay_time: ParamSmoother,
    feedback: ParamSmoother,
    mix: ParamSmoother,
    sample_rate: f32,
}

impl Delay {
    /// Create a new delay with 2-second maximum delay.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_max_delay_ms(sample_rate, DEFAULT_MAX_DELAY_MS)
    }

    /// Create a new delay with custom maximum delay time.
    pub fn with_max_delay_ms(sample_rate: f32, max_delay_ms: f32) -> Self {
        let max_delay_samples = (((max_delay_ms / 1000.0) * sample_rate).ceil() as usize).max(2);
        let max_delay_samples_f32 = max_delay_samples as f32;
        let default_delay_samples = ((500.0 / 1000.0) * sample_rate).min(max_delay_samples_f32 - 1.0);

        Self {
            delay_line: DelayLine::new(max_delay_samples),
            delay_line_r: DelayLine::new(max_delay_samples),
            max_delay_ms,
            max_delay_samples: max_delay_samples_f32,
            delay_time: ParamSmoother::with_initial(default_delay_samples, sample_rate, 50.0),
            feedback: ParamSmoother::with_initial(0.3, sample_rate, 10.0),
            mix: ParamSmoother::with_initial(0.5, sample_rate, 10.0),
            sample_rate,
        }
    }

    /// Set delay time in milliseconds.
    pub fn set_delay_time_ms(&mut self, delay_ms: f32) {
        let delay_samples = (delay_ms / 1000.0) * self.sample_rate;
        let clamped = delay_samples.clamp(1.0, self.max_delay_samples - 1.0);
        self.delay_time.set_target(clamped);
    }

    /// Get the current delay time in milliseconds.
    pub fn delay_time_ms(&self) -> f32 {
        self.delay_time.target() / self.sample_rate * 1000.0
    }

    /// Set feedback amount (0-0.95).
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback.set_target(feedback.clamp(0.0, 0.95));
    }

    /// Get the current feedback amount.
    pub fn feedback(&self) -> f32 {
        self.feedback.target()
    }

    /// Set wet/dry mix (0-1).
    pub fn set_mix(&mut self, mix: f32) {
        self.mix.set_target(mix.clamp(0.0, 1.0));
    }

    /// Get the current mix value.
    pub fn mix(&self) -> f32 {
        self.mix.target()
    }
}

impl Effect for Delay {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delay_samples = self.delay_time.advance();
        let feedback = self.feedback.advance();
        let mix = self.mix.advance();

        let delayed = self.delay_line.read_with_delay(delay_samples.round() as usize);
        let feedback_signal = flush_denormal(input + (delayed * feedback));
        self.delay_line.write(feedback_signal);

        input * (1.0 - mix) + delayed * mix
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let delay_samples = self.delay_time.advance();
        let feedback = self.feedback.advance();
        let mix = self.mix.advance();

        let tap = delay_samples.round() as usize;
        let delayed_l = self.delay_line.read_with_delay(tap);
        let delayed_r = self.delay_line_r.read_with_delay(tap);

        let feedback_l = flush_denormal(left + (delayed_l * feedback));
        let feedback_r = flush_denormal(right + (delayed_r * feedback));
        self.delay_line.write(feedback_l);
        self.delay_line_r.write(feedback_r);

        let out_l = left * (1.0 - mix) + delayed_l * mix;
        let out_r = right * (1.0 - mix) + delayed_r * mix;
        (out_l, out_r)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        // Preserve the delay time in milliseconds across the rate change
        let time_ms = self.delay_time.target() / self.sample_rate * 1000.0;
        self.sample_rate = sample_rate;

        let max_delay_samples =
            (((self.max_delay_ms / 1000.0) * sample_rate).ceil() as usize).max(2);
        self.max_delay_samples = max_delay_samples as f32;
        self.delay_line = DelayLine::new(max_delay_samples);
        self.delay_line_r = DelayLine::new(max_delay_samples);

        self.delay_time.set_sample_rate(sample_rate);
        self.feedback.set_sample_rate(sample_rate);
        self.mix.set_sample_rate(sample_rate);

        let delay_samples = (time_ms / 1000.0) * sample_rate;
        self.delay_time
            .set_immediate(delay_samples.clamp(1.0, self.max_delay_samples - 1.0));
    }

    fn reset(&mut self) {
        self.delay_line.clear();
        self.delay_line_r.clear();
        self.delay_time.snap_to_target();
        self.feedback.snap_to_target();
        self.mix.snap_to_target();
    }

    fn set_param(&mut self, name: &str, value: f32) {
        match name {
            "delay_time" => self.set_delay_time_ms(value),
            "feedback" => self.set_feedback(value),
            "mix" => self.set_mix(value),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settled_delay(delay_ms: f32, feedback: f32, mix: f32) -> Delay {
        let mut delay = Delay::new(48000.0);
        delay.set_delay_time_ms(delay_ms);
        delay.set_feedback(feedback);
        delay.set_mix(mix);
        delay.reset();
        delay
    }

    #[test]
    fn test_delay_impulse_timing() {
        // 100ms at 48kHz = 4800 samples
        let mut delay = settled_delay(100.0, 0.0, 1.0);

        assert_eq!(delay.process(1.0), 0.0);

        for i in 1..=4800 {
            let out = delay.process(0.0);
            if i == 4800 {
                assert_eq!(out, 1.0, "Echo should land exactly 4800 samples late");
            } else {
                assert_eq!(out, 0.0, "No output expected at sample {}", i);
            }
        }
    }

    #[test]
    fn test_delay_feedback_repeats() {
        let mut delay = settled_delay(100.0, 0.5, 1.0);

        delay.process(1.0);

        let mut echoes = Vec::new();
        for i in 1..=14400 {
            let out = delay.process(0.0);
            if i % 4800 == 0 {
                echoes.push(out);
            } else {
                assert_eq!(out, 0.0);
            }
        }
        assert_eq!(echoes, vec![1.0, 0.5, 0.25]);
    }

    #[test]
    fn test_delay_mix_zero_is_dry() {
        let mut delay = settled_delay(250.0, 0.5, 0.0);

        for i in 0..2000 {
            let input = (i as f32 * 0.1).sin() * 0.5;
            assert_eq!(delay.process(input), input);
        }
    }

    #[test]
    fn test_delay_reset_clears_line() {
        let mut delay = settled_delay(50.0, 0.5, 1.0);

        for _ in 0..5000 {
            delay.process(0.7);
        }
        delay.reset();

        for _ in 0..100 {
            assert_eq!(delay.process(0.0), 0.0);
        }
    }

    #[test]
    fn test_delay_stereo_channels_are_independent() {
        let mut delay = settled_delay(10.0, 0.0, 1.0);

        // Impulse on the left channel only
        delay.process_stereo(1.0, 0.0);

        for i in 1..=480 {
            let (l, r) = delay.process_stereo(0.0, 0.0);
            assert_eq!(r, 0.0, "Right channel must stay silent");
            if i == 480 {
                assert_eq!(l, 1.0, "Left echo expected at 480 samples");
            } else {
                assert_eq!(l, 0.0);
            }
        }
    }

    #[test]
    fn test_delay_time_clamps_to_maximum() {
        let mut delay = Delay::with_max_delay_ms(48000.0, 100.0);
        delay.set_delay_time_ms(500.0);

        let reported = delay.delay_time_ms();
        assert!(
            (reported - 100.0).abs() < 0.5,
            "Delay should clamp to the 100ms maximum, got {}ms",
            reported
        );
    }

    #[test]
    fn test_delay_set_param_names() {
        let mut delay = Delay::new(48000.0);
        delay.set_param("delay_time", 125.0);
        delay.set_param("feedback", 0.6);
        delay.set_param("mix", 0.25);
        delay.set_param("unknown", 9.0);

        assert!((delay.delay_time_ms() - 125.0).abs() < 1e-3);
        assert_eq!(delay.feedback(), 0.6);
        assert_eq!(delay.mix(), 0.25);
    }

    #[test]
    fn test_delay_sample_rate_change_preserves_time() {
        let mut delay = Delay::new(48000.0);
        delay.set_delay_time_ms(200.0);
        delay.set_sample_rate(96000.0);

        assert!((delay.delay_time_ms() - 200.0).abs() < 0.1);
    }
}
