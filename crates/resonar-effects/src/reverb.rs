//! Algorithmic reverb effect.
//!
//! A Freeverb-style reverb using parallel comb filters and series allpass
//! filters. Suitable for room and hall simulations.

use resonar_core::{AllpassFilter, CombFilter, ParamSmoother};

use crate::effect::Effect;

/// Freeverb comb filter delay times (at 44.1kHz reference).
/// These are mutually prime to avoid resonances.
const COMB_TUNINGS_44K: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];

/// Freeverb allpass filter delay times (at 44.1kHz reference).
const ALLPASS_TUNINGS_44K: [usize; 4] = [556, 441, 341, 225];

/// Reference sample rate for tuning constants.
const REFERENCE_RATE: f32 = 44100.0;

/// Scale delay times from reference rate to target rate.
fn scale_to_rate(samples: usize, target_rate: f32) -> usize {
    ((samples as f32 * target_rate / REFERENCE_RATE).round() as usize).max(1)
}

/// Algorithmic reverb effect.
///
/// Based on the Freeverb algorithm with 8 parallel comb filters and
/// 4 series allpass filters. Wet and dry levels are independent, so the
/// effect can run as a pure send (`dry_level = 0`) or inline.
///
/// # Parameters
///
/// - `room_size`: 0.0-1.0, scales comb feedback (tail length)
/// - `damping`: 0.0-1.0, high-frequency absorption (0=bright, 1=dark)
/// - `wet_level`: 0.0-1.0, reverberated signal level
/// - `dry_level`: 0.0-1.0, unprocessed signal level
///
/// # Example
///
/// ```rust
/// use resonar_effects::{Effect, Reverb};
///
/// let mut reverb = Reverb::new(48000.0);
/// reverb.set_room_size(0.7);
/// reverb.set_damping(0.3);
/// reverb.set_wet_level(0.4);
///
/// let output = reverb.process(0.5);
/// ```
pub struct Reverb {
    // Freeverb structure
    combs: [CombFilter; 8],
    allpasses: [AllpassFilter; 4],

    // Smoothed parameters
    room_size: ParamSmoother,
    damping: ParamSmoother,
    wet_level: ParamSmoother,
    dry_level: ParamSmoother,

    sample_rate: f32,

    // Cached values for comb filter updates
    cached_room: f32,
    cached_damp: f32,
}

impl Reverb {
    /// Create a new reverb at the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        // Create comb filters with scaled delay times
        let combs = core::array::from_fn(|i| {
            let delay = scale_to_rate(COMB_TUNINGS_44K[i], sample_rate);
            CombFilter::new(delay)
        });

        // Create allpass filters with scaled delay times
        let allpasses = core::array::from_fn(|i| {
            let delay = scale_to_rate(ALLPASS_TUNINGS_44K[i], sample_rate);
            let mut ap = AllpassFilter::new(delay);
            ap.set_feedback(0.5);
            ap
        });

        let mut reverb = Self {
            combs,
            allpasses,
            room_size: ParamSmoother::with_initial(0.5, sample_rate, 20.0),
            damping: ParamSmoother::with_initial(0.5, sample_rate, 20.0),
            wet_level: ParamSmoother::with_initial(0.33, sample_rate, 10.0),
            dry_level: ParamSmoother::with_initial(0.7, sample_rate, 10.0),
            sample_rate,
            cached_room: -1.0,
            cached_damp: -1.0,
        };

        reverb.update_comb_params();
        reverb
    }

    /// Set the room size (0.0 to 1.0).
    ///
    /// Higher values create longer reverb tails.
    pub fn set_room_size(&mut self, size: f32) {
        self.room_size.set_target(size.clamp(0.0, 1.0));
    }

    /// Get the current room size.
    pub fn room_size(&self) -> f32 {
        self.room_size.target()
    }

    /// Set the damping amount (0.0 to 1.0).
    ///
    /// - 0.0 = bright (no HF absorption)
    /// - 1.0 = dark (high HF absorption)
    pub fn set_damping(&mut self, damping: f32) {
        self.damping.set_target(damping.clamp(0.0, 1.0));
    }

    /// Get the current damping value.
    pub fn damping(&self) -> f32 {
        self.damping.target()
    }

    /// Set the wet (reverberated) output level (0.0 to 1.0).
    pub fn set_wet_level(&mut self, level: f32) {
        self.wet_level.set_target(level.clamp(0.0, 1.0));
    }

    /// Get the current wet level.
    pub fn wet_level(&self) -> f32 {
        self.wet_level.target()
    }

    /// Set the dry (unprocessed) output level (0.0 to 1.0).
    pub fn set_dry_level(&mut self, level: f32) {
        self.dry_level.set_target(level.clamp(0.0, 1.0));
    }

    /// Get the current dry level.
    pub fn dry_level(&self) -> f32 {
        self.dry_level.target()
    }

    /// Update comb filter parameters from room size and damping.
    fn update_comb_params(&mut self) {
        let room = self.room_size.get();
        let damp = self.damping.get();

        // Only update if parameters changed significantly
        if (room - self.cached_room).abs() < 0.001 && (damp - self.cached_damp).abs() < 0.001 {
            return;
        }

        self.cached_room = room;
        self.cached_damp = damp;

        // Freeverb scaling: feedback 0.7..0.98, damping 0..0.4
        let feedback = room * 0.28 + 0.7;
        let comb_damp = damp * 0.4;

        for comb in &mut self.combs {
            comb.set_feedback(feedback);
            comb.set_damp(comb_damp);
        }
    }
}

impl Effect for Reverb {
    fn process(&mut self, input: f32) -> f32 {
        // Advance smoothed parameters
        self.room_size.advance();
        self.damping.advance();
        let wet = self.wet_level.advance();
        let dry = self.dry_level.advance();

        // Update comb filter coefficients if needed
        self.update_comb_params();

        // Process through parallel comb filters
        let mut comb_sum = 0.0f32;
        for comb in &mut self.combs {
            comb_sum += comb.process(input);
        }
        comb_sum *= 0.125; // Scale by 1/8

        // Process through series allpass filters
        let mut diffused = comb_sum;
        for allpass in &mut self.allpasses {
            diffused = allpass.process(diffused);
        }

        dry * input + wet * diffused
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;

        // Recreate delay structures at the new rate
        self.combs = core::array::from_fn(|i| {
            let delay = scale_to_rate(COMB_TUNINGS_44K[i], sample_rate);
            CombFilter::new(delay)
        });

        self.allpasses = core::array::from_fn(|i| {
            let delay = scale_to_rate(ALLPASS_TUNINGS_44K[i], sample_rate);
            let mut ap = AllpassFilter::new(delay);
            ap.set_feedback(0.5);
            ap
        });

        // Update parameter sample rates
        self.room_size.set_sample_rate(sample_rate);
        self.damping.set_sample_rate(sample_rate);
        self.wet_level.set_sample_rate(sample_rate);
        self.dry_level.set_sample_rate(sample_rate);

        // Force parameter update
        self.cached_room = -1.0;
        self.update_comb_params();
    }

    fn reset(&mut self) {
        for comb in &mut self.combs {
            comb.clear();
        }
        for allpass in &mut self.allpasses {
            allpass.clear();
        }

        self.room_size.snap_to_target();
        self.damping.snap_to_target();
        self.wet_level.snap_to_target();
        self.dry_level.snap_to_target();

        self.cached_room = -1.0;
        self.update_comb_params();
    }

    fn set_param(&mut self, name: &str, value: f32) {
        match name {
            "room_size" => self.set_room_size(value),
            "damping" => self.set_damping(value),
            "wet_level" => self.set_wet_level(value),
            "dry_level" => self.set_dry_level(value),
            _ => {}
        }
    }
}
