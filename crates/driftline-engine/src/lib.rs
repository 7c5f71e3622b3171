//! Driftline Engine
//! ================
//!
//! The host-facing substrate of the Driftline effect framework: the audio
//! buffer model, the [`AudioEffect`] processing contract, the
//! [`AlgorithmCore`] capability interface that DSP kernels implement, and the
//! lock-free shared parameter bank consumed by the render thread.

mod buffer;
mod effect;
pub mod rt;

pub use buffer::{AudioBuffer, BufferConfig, ChannelLayout};
pub use effect::{AlgorithmCore, AudioEffect, EffectInfo};
pub use rt::{ParamValues, ParamWriteQueue, ParamWriter, SharedParams};
