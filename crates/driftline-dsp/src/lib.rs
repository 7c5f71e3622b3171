#![deny(unsafe_op_in_unsafe_fn)]

pub mod delay;
pub mod filter;
pub mod lfo;
pub mod math;
pub mod smoothing;

pub use delay::FracDelayLine;
pub use filter::{Damper, HighpassOnePole};
pub use lfo::Lfo;
pub use smoothing::{BlockRamp, OnePole};
