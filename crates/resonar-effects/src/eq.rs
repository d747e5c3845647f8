//! Three-band parametric equalizer.
//!
//! Uses cascaded biquad filters in peaking EQ mode. Each band has an
//! independent center frequency, gain, and Q, all smoothed to avoid
//! zipper noise; coefficients recompute only while a parameter is moving.

use resonar_core::{Biquad, ParamSmoother, peaking_eq_coefficients};

use crate::effect::Effect;

/// Three-band parametric EQ.
///
/// Low, mid, and high bands are peaking filters applied in series. A band
/// at 0 dB gain is the identity filter, so the default configuration
/// passes audio through untouched.
///
/// # Example
///
/// ```rust
/// use resonar_effects::{Effect, ThreeBandEq};
///
/// let mut eq = ThreeBandEq::new(48000.0);
///
/// // Boost low mids, cut highs
/// eq.set_low_freq(150.0);
/// eq.set_low_gain(3.0);
///
/// eq.set_high_freq(4000.0);
/// eq.set_high_gain(-4.0);
///
/// let output = eq.process(0.5);
/// ```
#[derive(Debug, Clone)]
pub struct ThreeBandEq {
    /// Low band biquad filter
    low_filter: Biquad,
    /// Mid band biquad filter
    mid_filter: Biquad,
    /// High band biquad filter
    high_filter: Biquad,

    // Low band parameters
    low_freq: ParamSmoother,
    low_gain: ParamSmoother,
    low_q: ParamSmoother,

    // Mid band parameters
    mid_freq: ParamSmoother,
    mid_gain: ParamSmoother,
    mid_q: ParamSmoother,

    // High band parameters
    high_freq: ParamSmoother,
    high_gain: ParamSmoother,
    high_q: ParamSmoother,

    sample_rate: f32,

    /// Flags for coefficient updates
    low_needs_update: bool,
    mid_needs_update: bool,
    high_needs_update: bool,
}

impl Default for ThreeBandEq {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl ThreeBandEq {
    /// Create a new 3-band EQ with default settings.
    ///
    /// Defaults:
    /// - Low: 100 Hz, 0 dB, Q=1.0
    /// - Mid: 1000 Hz, 0 dB, Q=1.0
    /// - High: 5000 Hz, 0 dB, Q=1.0
    pub fn new(sample_rate: f32) -> Self {
        let mut eq = Self {
            low_filter: Biquad::new(),
            mid_filter: Biquad::new(),
            high_filter: Biquad::new(),

            low_freq: ParamSmoother::with_initial(100.0, sample_rate, 20.0),
            low_gain: ParamSmoother::with_initial(0.0, sample_rate, 10.0),
            low_q: ParamSmoother::with_initial(1.0, sample_rate, 20.0),

            mid_freq: ParamSmoother::with_initial(1000.0, sample_rate, 20.0),
            mid_gain: ParamSmoother::with_initial(0.0, sample_rate, 10.0),
            mid_q: ParamSmoother::with_initial(1.0, sample_rate, 20.0),

            high_freq: ParamSmoother::with_initial(5000.0, sample_rate, 20.0),
            high_gain: ParamSmoother::with_initial(0.0, sample_rate, 10.0),
            high_q: ParamSmoother::with_initial(1.0, sample_rate, 20.0),

            sample_rate,
            low_needs_update: true,
            mid_needs_update: true,
            high_needs_update: true,
        };

        eq.update_all_coefficients();
        eq
    }

    // Low band setters

    /// Set low band center frequency in Hz (20-500).
    pub fn set_low_freq(&mut self, freq: f32) {
        self.low_freq.set_target(freq.clamp(20.0, 500.0));
        self.low_needs_update = true;
    }

    /// Get low band frequency.
    pub fn low_freq(&self) -> f32 {
        self.low_freq.target()
    }

    /// Set low band gain in dB (-12 to +12).
    pub fn set_low_gain(&mut self, gain_db: f32) {
        self.low_gain.set_target(gain_db.clamp(-12.0, 12.0));
        self.low_needs_update = true;
    }

    /// Get low band gain.
    pub fn low_gain(&self) -> f32 {
        self.low_gain.target()
    }

    /// Set low band Q (0.5-5.0).
    pub fn set_low_q(&mut self, q: f32) {
        self.low_q.set_target(q.clamp(0.5, 5.0));
        self.low_needs_update = true;
    }

    /// Get low band Q.
    pub fn low_q(&self) -> f32 {
        self.low_q.target()
    }

    // Mid band setters

    /// Set mid band center frequency in Hz (200-5000).
    pub fn set_mid_freq(&mut self, freq: f32) {
        self.mid_freq.set_target(freq.clamp(200.0, 5000.0));
        self.mid_needs_update = true;
    }

    /// Get mid band frequency.
    pub fn mid_freq(&self) -> f32 {
        self.mid_freq.target()
    }

    /// Set mid band gain in dB (-12 to +12).
    pub fn set_mid_gain(&mut self, gain_db: f32) {
        self.mid_gain.set_target(gain_db.clamp(-12.0, 12.0));
        self.mid_needs_update = true;
    }

    /// Get mid band gain.
    pub fn mid_gain(&self) -> f32 {
        self.mid_gain.target()
    }

    /// Set mid band Q (0.5-5.0).
    pub fn set_mid_q(&mut self, q: f32) {
        self.mid_q.set_target(q.clamp(0.5, 5.0));
        self.mid_needs_update = true;
    }

    /// Get mid band Q.
    pub fn mid_q(&self) -> f32 {
        self.mid_q.target()
    }

    // High band setters

    /// Set high band center frequency in Hz (1000-15000).
    pub fn set_high_freq(&mut self, freq: f32) {
        self.high_freq.set_target(freq.clamp(1000.0, 15000.0));
        self.high_needs_update = true;
    }

    /// Get high band frequency.
    pub fn high_freq(&self) -> f32 {
        self.high_freq.target()
    }

    /// Set high band gain in dB (-12 to +12).
    pub fn set_high_gain(&mut self, gain_db: f32) {
        self.high_gain.set_target(gain_db.clamp(-12.0, 12.0));
        self.high_needs_update = true;
    }

    /// Get high band gain.
    pub fn high_gain(&self) -> f32 {
        self.high_gain.target()
    }

    /// Set high band Q (0.5-5.0).
    pub fn set_high_q(&mut self, q: f32) {
        self.high_q.set_target(q.clamp(0.5, 5.0));
        self.high_needs_update = true;
    }

    /// Get high band Q.
    pub fn high_q(&self) -> f32 {
        self.high_q.target()
    }

    /// Clamp frequency to stay below Nyquist (with margin) to prevent
    /// unstable biquad coefficients when sample rate is low.
    fn clamp_to_nyquist(&self, freq: f32) -> f32 {
        let max_freq = self.sample_rate * 0.475;
        if freq > max_freq { max_freq } else { freq }
    }

    fn update_low_coefficients(&mut self) {
        let freq = self.clamp_to_nyquist(self.low_freq.get());
        let gain = self.low_gain.get();
        let q = self.low_q.get();

        let (b0, b1, b2, a0, a1, a2) = peaking_eq_coefficients(freq, q, gain, self.sample_rate);
        self.low_filter.set_coefficients(b0, b1, b2, a0, a1, a2);
        self.low_needs_update = false;
    }

    fn update_mid_coefficients(&mut self) {
        let freq = self.clamp_to_nyquist(self.mid_freq.get());
        let gain = self.mid_gain.get();
        let q = self.mid_q.get();

        let (b0, b1, b2, a0, a1, a2) = peaking_eq_coefficients(freq, q, gain, self.sample_rate);
        self.mid_filter.set_coefficients(b0, b1, b2, a0, a1, a2);
        self.mid_needs_update = false;
    }

    fn update_high_coefficients(&mut self) {
        let freq = self.clamp_to_nyquist(self.high_freq.get());
        let gain = self.high_gain.get();
        let q = self.high_q.get();

        let (b0, b1, b2, a0, a1, a2) = peaking_eq_coefficients(freq, q, gain, self.sample_rate);
        self.high_filter.set_coefficients(b0, b1, b2, a0, a1, a2);
        self.high_needs_update = false;
    }

    fn update_all_coefficients(&mut self) {
        self.update_low_coefficients();
        self.update_mid_coefficients();
        self.update_high_coefficients();
    }

    fn advance_params(&mut self) {
        self.low_freq.advance();
        self.low_gain.advance();
        self.low_q.advance();
        self.mid_freq.advance();
        self.mid_gain.advance();
        self.mid_q.advance();
        self.high_freq.advance();
        self.high_gain.advance();
        self.high_q.advance();
    }

    fn refresh_coefficients(&mut self) {
        if self.low_needs_update
            || self.low_freq.is_smoothing()
            || self.low_gain.is_smoothing()
            || self.low_q.is_smoothing()
        {
            self.update_low_coefficients();
        }
        if self.mid_needs_update
            || self.mid_freq.is_smoothing()
            || self.mid_gain.is_smoothing()
            || self.mid_q.is_smoothing()
        {
            self.update_mid_coefficients();
        }
        if self.high_needs_update
            || self.high_freq.is_smoothing()
            || self.high_gain.is_smoothing()
            || self.high_q.is_smoothing()
        {
            self.update_high_coefficients();
        }
    }
}

impl Effect for ThreeBandEq {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.advance_params();
        self.refresh_coefficients();

        // Process through cascaded filters
        let after_low = self.low_filter.process(input);
        let after_mid = self.mid_filter.process(after_low);
        self.high_filter.process(after_mid)
    }

    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        // Dual-mono through one cascade. The biquads share state, so the
        // channels interleave; per-channel filter instances would be needed
        // for true dual-mono EQ.
        self.advance_params();
        self.refresh_coefficients();

        let left_low = self.low_filter.process(left);
        let left_mid = self.mid_filter.process(left_low);
        let left_out = self.high_filter.process(left_mid);

        let right_low = self.low_filter.process(right);
        let right_mid = self.mid_filter.process(right_low);
        let right_out = self.high_filter.process(right_mid);

        (left_out, right_out)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;

        self.low_freq.set_sample_rate(sample_rate);
        self.low_gain.set_sample_rate(sample_rate);
        self.low_q.set_sample_rate(sample_rate);
        self.mid_freq.set_sample_rate(sample_rate);
        self.mid_gain.set_sample_rate(sample_rate);
        self.mid_q.set_sample_rate(sample_rate);
        self.high_freq.set_sample_rate(sample_rate);
        self.high_gain.set_sample_rate(sample_rate);
        self.high_q.set_sample_rate(sample_rate);

        self.update_all_coefficients();
    }

    fn reset(&mut self) {
        self.low_filter.clear();
        self.mid_filter.clear();
        self.high_filter.clear();

        self.low_freq.snap_to_target();
        self.low_gain.snap_to_target();
        self.low_q.snap_to_target();
        self.mid_freq.snap_to_target();
        self.mid_gain.snap_to_target();
        self.mid_q.snap_to_target();
        self.high_freq.snap_to_target();
        self.high_gain.snap_to_target();
        self.high_q.snap_to_target();

        self.update_all_coefficients();
    }

    fn set_param(&mut self, name: &str, value: f32) {
        match name {
            "low_freq" => self.set_low_freq(value),
            "low_gain" => self.set_low_gain(value),
            "low_q" => self.set_low_q(value),
            "mid_freq" => self.set_mid_freq(value),
            "mid_gain" => self.set_mid_gain(value),
            "mid_q" => self.set_mid_q(value),
            "high_freq" => self.set_high_freq(value),
            "high_gain" => self.set_high_gain(value),
            "high_q" => self.set_high_q(value),
            _ => {}
        }
    }
}
