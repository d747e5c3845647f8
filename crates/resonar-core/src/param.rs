//! Parameter handling with smoothing for zipper-free changes.
//!
//! Audio parameters (gain, frequency, etc.) need smooth transitions to avoid
//! audible "zipper noise" when values change. [`ParamSmoother`] ramps a single
//! value exponentially; [`MultiParamSmoother`] coordinates a named set of
//! parameters with per-name smoothing times.
//!
//! ## Usage
//!
//! ```rust
//! use resonar_core::ParamSmoother;
//!
//! let mut gain = ParamSmoother::with_initial(1.0, 48000.0, 10.0);
//!
//! // Set new target - smoothing happens automatically
//! gain.set_target(0.5);
//!
//! // In audio processing, get the smoothed value each sample
//! for _ in 0..480 { // 10ms at 48kHz
//!     let smoothed_gain = gain.advance();
//!     // Use smoothed_gain for processing...
//! }
//! ```

use std::collections::HashMap;

use libm::{expf, powf};

/// Residual below which the ramp snaps to its target.
const SETTLE_EPSILON: f32 = 1e-6;

/// A parameter with built-in exponential smoothing.
///
/// Uses a one-pole lowpass recurrence:
///
/// ```text
/// current += coeff * (target - current)
/// coeff = 1 - exp(-1 / (sample_rate * smoothing_time))
/// ```
///
/// The very first [`set_target`](Self::set_target) on a smoother created
/// with [`new`](Self::new) snaps instead of ramping, so startup never fades
/// in from zero.
#[derive(Debug, Clone)]
pub struct ParamSmoother {
    /// Current smoothed value
    current: f32,
    /// Target value we're smoothing towards
    target: f32,
    /// Smoothing coefficient (1 = instant, ~0 = very slow)
    coeff: f32,
    /// Sample rate in Hz
    sample_rate: f32,
    /// Smoothing time in milliseconds
    smoothing_time_ms: f32,
    /// False until the first target arrives
    initialized: bool,
}

impl ParamSmoother {
    /// Create a smoother with no initial value.
    ///
    /// The first call to [`set_target`](Self::set_target) snaps directly to
    /// the given value. Subsequent calls ramp.
    pub fn new(sample_rate: f32, smoothing_time_ms: f32) -> Self {
        let mut param = Self {
            current: 0.0,
            target: 0.0,
            coeff: 1.0,
            sample_rate,
            smoothing_time_ms,
            initialized: false,
        };
        param.recalculate_coeff();
        param
    }

    /// Create a smoother pre-initialized to `initial`.
    ///
    /// The first `set_target` after this ramps like any other.
    pub fn with_initial(initial: f32, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        let mut param = Self::new(sample_rate, smoothing_time_ms);
        param.current = initial;
        param.target = initial;
        param.initialized = true;
        param
    }

    /// Set the target value (parameter will smooth towards this).
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
        if !self.initialized {
            self.current = target;
            self.initialized = true;
        }
    }

    /// Set target and immediately snap to it (no smoothing).
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
        self.initialized = true;
    }

    /// Update sample rate and recalculate the smoothing coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Set smoothing time in milliseconds.
    ///
    /// Typical values:
    /// - 0.0 ms: No smoothing (instant)
    /// - 5-10 ms: Fast, good for gain/pan
    /// - 20-50 ms: Medium, good for filter cutoff
    /// - 100+ ms: Slow, for gradual transitions
    pub fn set_smoothing_time_ms(&mut self, time_ms: f32) {
        self.smoothing_time_ms = time_ms;
        self.recalculate_coeff();
    }

    /// Get the configured smoothing time in milliseconds.
    #[inline]
    pub fn smoothing_time_ms(&self) -> f32 {
        self.smoothing_time_ms
    }

    /// Get the next smoothed value (advances by one sample).
    ///
    /// Once the residual falls below epsilon the value snaps to the target,
    /// so [`is_smoothing`](Self::is_smoothing) turns false exactly when
    /// convergence is reached.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.current += self.coeff * (self.target - self.current);
        if (self.current - self.target).abs() < SETTLE_EPSILON {
            self.current = self.target;
        }
        self.current
    }

    /// Advance the ramp by `samples` steps in one call.
    ///
    /// Applies the closed form of the recurrence,
    /// `current += (1 - (1-coeff)^n) * (target - current)`,
    /// so block-rate callers pay one `powf` instead of n multiplies.
    pub fn advance_by(&mut self, samples: usize) -> f32 {
        if samples == 0 || !self.is_smoothing() {
            return self.current;
        }
        let remaining = powf(1.0 - self.coeff, samples as f32);
        self.current += (1.0 - remaining) * (self.target - self.current);
        if (self.current - self.target).abs() < SETTLE_EPSILON {
            self.current = self.target;
        }
        self.current
    }

    /// Fill `output` with smoothed values, one per frame.
    ///
    /// Short-circuits to a constant fill once the ramp has converged.
    pub fn process_block(&mut self, output: &mut [f32]) {
        if !self.is_smoothing() {
            output.fill(self.current);
            return;
        }
        for sample in output.iter_mut() {
            *sample = self.advance();
        }
    }

    /// Get the current smoothed value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Get the target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// True while the ramp is still moving toward its target.
    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.current != self.target
    }

    /// Skip ahead to the target value immediately.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    /// Recalculate the smoothing coefficient from sample rate and smoothing time.
    ///
    /// The one-pole recurrence `y[n] = y[n-1] + coeff * (target - y[n-1])`
    /// has time constant tau (time to reach 63.2% of target) related to the
    /// coefficient by `coeff = 1 - exp(-1 / (tau * sample_rate))` where
    /// `tau = smoothing_time_ms / 1000`. After 5*tau the parameter has
    /// reached 99.3% of the target.
    ///
    /// When smoothing_time_ms is 0, coeff is 1.0 for instant response.
    fn recalculate_coeff(&mut self) {
        if self.smoothing_time_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.coeff = 1.0;
        } else {
            let time_constant = self.smoothing_time_ms / 1000.0;
            let samples = time_constant * self.sample_rate;
            self.coeff = 1.0 - expf(-1.0 / samples);
        }
    }
}

/// Change magnitude above which the smoothing time doubles.
const LARGE_JUMP: f32 = 0.5;
/// Change magnitude below which the smoothing time quarters.
const FINE_CHANGE: f32 = 0.01;

/// A named set of smoothed parameters with per-name smoothing times.
///
/// Each parameter keeps its own [`ParamSmoother`] and a base smoothing time.
/// When a new target arrives the effective smoothing time adapts to the size
/// of the jump: large jumps smooth twice as slowly to avoid audible clicks,
/// sub-threshold nudges smooth four times faster so automation tracks
/// tightly.
///
/// Unknown names are registered on first use with the default smoothing
/// time, and their first value snaps rather than ramping in from zero.
#[derive(Debug, Clone)]
pub struct MultiParamSmoother {
    params: HashMap<String, NamedParam>,
    sample_rate: f32,
    default_time_ms: f32,
}

#[derive(Debug, Clone)]
struct NamedParam {
    smoother: ParamSmoother,
    base_time_ms: f32,
}

impl MultiParamSmoother {
    /// Create an empty parameter set.
    ///
    /// `default_time_ms` is used for names that were never explicitly
    /// registered.
    pub fn new(sample_rate: f32, default_time_ms: f32) -> Self {
        Self {
            params: HashMap::new(),
            sample_rate,
            default_time_ms,
        }
    }

    /// Register a parameter with an initial value and base smoothing time.
    pub fn register(&mut self, name: &str, initial: f32, base_time_ms: f32) {
        self.params.insert(
            name.to_string(),
            NamedParam {
                smoother: ParamSmoother::with_initial(initial, self.sample_rate, base_time_ms),
                base_time_ms,
            },
        );
    }

    /// Set a new target for `name`, adapting the smoothing time to the
    /// size of the change.
    pub fn set(&mut self, name: &str, value: f32) {
        let sample_rate = self.sample_rate;
        let default_time_ms = self.default_time_ms;
        let param = self
            .params
            .entry(name.to_string())
            .or_insert_with(|| NamedParam {
                smoother: ParamSmoother::new(sample_rate, default_time_ms),
                base_time_ms: default_time_ms,
            });

        let delta = (value - param.smoother.target()).abs();
        let time_ms = if delta > LARGE_JUMP {
            param.base_time_ms * 2.0
        } else if delta < FINE_CHANGE {
            param.base_time_ms * 0.25
        } else {
            param.base_time_ms
        };

        param.smoother.set_smoothing_time_ms(time_ms);
        param.smoother.set_target(value);
    }

    /// Get the current smoothed value of `name`, if registered.
    pub fn get(&self, name: &str) -> Option<f32> {
        self.params.get(name).map(|p| p.smoother.get())
    }

    /// Get the target value of `name`, if registered.
    pub fn target(&self, name: &str) -> Option<f32> {
        self.params.get(name).map(|p| p.smoother.target())
    }

    /// Advance every ramp by `samples` steps.
    pub fn advance_by(&mut self, samples: usize) {
        for param in self.params.values_mut() {
            param.smoother.advance_by(samples);
        }
    }

    /// Iterate over `(name, current value)` pairs.
    pub fn current_values(&self) -> impl Iterator<Item = (&str, f32)> {
        self.params
            .iter()
            .map(|(name, p)| (name.as_str(), p.smoother.get()))
    }

    /// True if any parameter is still ramping.
    pub fn is_any_smoothing(&self) -> bool {
        self.params.values().any(|p| p.smoother.is_smoothing())
    }

    /// Update the sample rate for every parameter.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        for param in self.params.values_mut() {
            param.smoother.set_sample_rate(sample_rate);
        }
    }
}
