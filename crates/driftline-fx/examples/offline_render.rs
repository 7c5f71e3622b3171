//! Renders a short burst through the drift delay and prints block peaks.
//!
//! Run with `cargo run -p driftline-fx --example offline_render`.

use driftline_engine::{AudioBuffer, AudioEffect, BufferConfig, ChannelLayout};
use driftline_fx::drift_delay::{PARAM_FEEDBACK, PARAM_TIME, PARAM_WET};
use driftline_fx::DriftDelay;
use driftline_fx_sdk::NativeEffect;

fn main() -> anyhow::Result<()> {
    let config = BufferConfig::new(48_000.0, 512, ChannelLayout::Stereo);
    let mut delay = DriftDelay::new();
    delay.set_parameter(PARAM_TIME, 180.0)?;
    delay.set_parameter(PARAM_FEEDBACK, 0.55)?;
    delay.set_parameter(PARAM_WET, 0.8)?;
    delay.prepare(&config)?;

    let mut buffer = AudioBuffer::from_config(&config);
    for block in 0..32 {
        buffer.clear();
        if block == 0 {
            // One cycle of a 440 Hz burst in the first block.
            for frame in 0..110 {
                let sample = (frame as f32 / 110.0 * std::f32::consts::TAU).sin() * 0.8;
                buffer.channel_mut(0)[frame] = sample;
                buffer.channel_mut(1)[frame] = sample;
            }
        }
        delay.process(&mut buffer)?;
        let peak = buffer
            .channel(0)
            .iter()
            .fold(0.0f32, |acc, s| acc.max(s.abs()));
        println!("block {block:>2}: peak {peak:.4}");
    }
    Ok(())
}
