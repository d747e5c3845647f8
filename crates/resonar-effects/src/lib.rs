//! Resonar Effects - audio effect implementations
//!
//! This crate provides the send and insert effects built on resonar-core:
//!
//! - [`Reverb`] - Freeverb-style algorithmic reverb
//! - [`Delay`] - Feedback delay with wet/dry mix
//! - [`ThreeBandEq`] - Three-band parametric EQ
//!
//! All effects implement the [`Effect`] trait: a per-sample mono path with
//! stereo and block processing layered on top. [`EffectNode`] adapts any
//! effect into a graph processing unit so the same DSP runs standalone or
//! inside an audio graph.
//!
//! ## Example
//!
//! ```rust
//! use resonar_effects::{Delay, Effect, Reverb};
//!
//! let mut reverb = Reverb::new(48000.0);
//! reverb.set_room_size(0.7);
//! reverb.set_wet_level(0.4);
//!
//! let mut delay = Delay::new(48000.0);
//! delay.set_delay_time_ms(375.0);
//! delay.set_feedback(0.5);
//!
//! // Series processing: delay into reverb
//! let fed = delay.process(0.5);
//! let output = reverb.process(fed);
//! assert!(output.is_finite());
//! ```

pub mod delay;
pub mod effect;
pub mod eq;
pub mod node;
pub mod reverb;

// Re-export main types at crate root
pub use delay::Delay;
pub use effect::Effect;
pub use eq::ThreeBandEq;
pub use node::EffectNode;
pub use reverb::Reverb;
