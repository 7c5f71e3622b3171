//! Bloom Chorus: two modulated voices per channel around a short base delay.
//!
//! The parameter encoding has never changed, so its streaming history is
//! empty and records from any revision load as-is.

use std::sync::Arc;

use once_cell::sync::Lazy;

use driftline_dsp::math::crossfade;
use driftline_dsp::{FracDelayLine, Lfo};
use driftline_engine::{
    AlgorithmCore, AudioBuffer, AudioEffect, BufferConfig, ChannelLayout, EffectInfo, SharedParams,
};
use driftline_fx_sdk::{
    DescriptorTable, DescriptorTableBuilder, EffectAdapter, EffectFactory, GroupDef, GroupId,
    GroupTable, HostPort, NativeEffect, ParamCurve, ParamDescriptor, ParamError, ParamId,
    ParamKind,
};
use driftline_stream::{RevisionHistory, StreamedEffectFactory};

pub const EFFECT_ID: &str = "driftline.fx.bloom_chorus";

pub const PARAM_RATE: ParamId = ParamId::new(0);
pub const PARAM_DEPTH: ParamId = ParamId::new(1);
pub const PARAM_FEEDBACK: ParamId = ParamId::new(2);
pub const PARAM_MIX: ParamId = ParamId::new(3);

pub const GROUP_MODULATION: GroupId = GroupId::new(0);
pub const GROUP_OUTPUT: GroupId = GroupId::new(1);

const VOICES: usize = 2;
const BASE_DELAY_MS: f32 = 15.0;
const MAX_DEPTH_MS: f32 = 12.0;

static TABLE: Lazy<Arc<DescriptorTable>> = Lazy::new(|| {
    Arc::new(
        DescriptorTableBuilder::new()
            .push(
                ParamDescriptor::new(
                    PARAM_RATE,
                    "Rate",
                    ParamKind::float_curved(0.05..=8.0, 0.9, ParamCurve::Exponential),
                )
                .with_unit("Hz")
                .in_group(GROUP_MODULATION),
            )
            .push(
                ParamDescriptor::new(
                    PARAM_DEPTH,
                    "Depth",
                    ParamKind::float(0.5..=MAX_DEPTH_MS, 5.0),
                )
                .with_unit("ms")
                .in_group(GROUP_MODULATION),
            )
            .push(
                ParamDescriptor::new(
                    PARAM_FEEDBACK,
                    "Feedback",
                    ParamKind::float(0.0..=0.9, 0.2),
                )
                .in_group(GROUP_OUTPUT),
            )
            .push(
                ParamDescriptor::new(PARAM_MIX, "Mix", ParamKind::float(0.0..=1.0, 0.5))
                    .in_group(GROUP_OUTPUT),
            )
            .finish(),
    )
});

static GROUPS: Lazy<Arc<GroupTable>> = Lazy::new(|| {
    Arc::new(GroupTable::new(vec![
        GroupDef::new(GROUP_MODULATION, "Modulation", 0),
        GroupDef::new(GROUP_OUTPUT, "Output", 1),
    ]))
});

struct BloomChorusKernel {
    sample_rate: f32,
    lines: [FracDelayLine; 2],
    lfos: [[Lfo; VOICES]; 2],
    base_samples: f32,
    depth_samples: f32,
    feedback: f32,
    mix: f32,
}

impl BloomChorusKernel {
    fn new() -> Self {
        Self {
            sample_rate: 48_000.0,
            lines: [FracDelayLine::new(2), FracDelayLine::new(2)],
            lfos: [[Lfo::new(48_000.0, 0.9); VOICES]; 2],
            base_samples: 1.0,
            depth_samples: 0.0,
            feedback: 0.2,
            mix: 0.5,
        }
    }

    fn spread_phases(&mut self) {
        for (channel, lfos) in self.lfos.iter_mut().enumerate() {
            for (voice, lfo) in lfos.iter_mut().enumerate() {
                lfo.set_phase(voice as f32 / VOICES as f32 + channel as f32 * 0.25);
            }
        }
    }
}

impl AlgorithmCore for BloomChorusKernel {
    fn prepare(&mut self, config: &BufferConfig) {
        self.sample_rate = config.sample_rate.max(1.0);
        let max_samples =
            ((BASE_DELAY_MS + MAX_DEPTH_MS + 5.0) * 0.001 * self.sample_rate).ceil() as usize;
        for line in &mut self.lines {
            line.prepare(max_samples);
        }
        self.base_samples = BASE_DELAY_MS * 0.001 * self.sample_rate;
        self.spread_phases();
    }

    fn set_parameters(&mut self, values: &[f32]) {
        let &[rate, depth_ms, feedback, mix] = values else {
            debug_assert!(false, "bloom chorus expects 4 parameters");
            return;
        };
        for lfos in &mut self.lfos {
            for lfo in lfos {
                lfo.set_rate(self.sample_rate, rate);
            }
        }
        self.depth_samples = depth_ms * 0.001 * self.sample_rate;
        self.feedback = feedback;
        self.mix = mix;
    }

    fn render(&mut self, buffer: &mut AudioBuffer) {
        let scale = 1.0 / VOICES as f32;
        for (channel_index, channel) in buffer.channels_mut().enumerate() {
            let slot = channel_index.min(1);
            for sample in channel.iter_mut() {
                let input = *sample;
                let mut wet = 0.0;
                for lfo in &mut self.lfos[slot] {
                    let delay = self.base_samples + self.depth_samples * lfo.next_unipolar();
                    wet += self.lines[slot].read(delay);
                }
                wet *= scale;
                self.lines[slot].write(input + wet * self.feedback);
                *sample = crossfade(input, wet, self.mix);
            }
        }
    }

    fn reset(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
        self.spread_phases();
    }
}

pub struct BloomChorus {
    adapter: EffectAdapter<BloomChorusKernel>,
}

impl BloomChorus {
    pub fn new() -> Self {
        Self {
            adapter: EffectAdapter::new(
                info(),
                Arc::clone(&TABLE),
                Arc::clone(&GROUPS),
                BloomChorusKernel::new(),
            ),
        }
    }

    pub fn take_host_port(&mut self) -> Option<HostPort> {
        self.adapter.take_host_port()
    }
}

impl Default for BloomChorus {
    fn default() -> Self {
        Self::new()
    }
}

fn info() -> EffectInfo {
    EffectInfo::new(EFFECT_ID, "Bloom Chorus", "Driftline")
        .with_description("Two-voice chorus with feedback")
}

impl AudioEffect for BloomChorus {
    fn info(&self) -> EffectInfo {
        self.adapter.info()
    }

    fn prepare(&mut self, config: &BufferConfig) -> anyhow::Result<()> {
        self.adapter.prepare(config)
    }

    fn process(&mut self, buffer: &mut AudioBuffer) -> anyhow::Result<()> {
        self.adapter.process(buffer)
    }

    fn supports_layout(&self, layout: ChannelLayout) -> bool {
        matches!(layout, ChannelLayout::Mono | ChannelLayout::Stereo)
    }
}

impl NativeEffect for BloomChorus {
    fn descriptor_table(&self) -> Arc<DescriptorTable> {
        self.adapter.descriptor_table()
    }

    fn group_table(&self) -> Arc<GroupTable> {
        self.adapter.group_table()
    }

    fn shared_params(&self) -> SharedParams {
        self.adapter.shared_params()
    }

    fn set_parameter(&mut self, id: ParamId, value: f32) -> Result<(), ParamError> {
        self.adapter.set_parameter(id, value)
    }

    fn parameter_value(&self, id: ParamId) -> Result<f32, ParamError> {
        self.adapter.parameter_value(id)
    }

    fn reset_to_defaults(&mut self) {
        self.adapter.reset_to_defaults();
    }

    fn install_values(&mut self, values: Vec<f32>) -> Result<(), ParamError> {
        self.adapter.install_values(values)
    }
}

pub struct BloomChorusFactory;

impl EffectFactory for BloomChorusFactory {
    fn info(&self) -> EffectInfo {
        info()
    }

    fn descriptor_table(&self) -> Arc<DescriptorTable> {
        Arc::clone(&TABLE)
    }

    fn group_table(&self) -> Arc<GroupTable> {
        Arc::clone(&GROUPS)
    }

    fn create(&self) -> Box<dyn NativeEffect> {
        Box::new(BloomChorus::new())
    }
}

impl StreamedEffectFactory for BloomChorusFactory {
    fn revision_history(&self) -> &'static RevisionHistory {
        &RevisionHistory::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftline_stream::{migrate, PatchEntry, PatchRecord, StreamRevision};

    fn config() -> BufferConfig {
        BufferConfig::new(48_000.0, 64, ChannelLayout::Stereo)
    }

    #[test]
    fn empty_history_loads_old_records_unchanged() {
        let record = PatchRecord {
            effect_id: EFFECT_ID.into(),
            revision: StreamRevision(1),
            entries: vec![
                PatchEntry {
                    id: PARAM_RATE,
                    value: 2.5,
                },
                PatchEntry {
                    id: PARAM_MIX,
                    value: 0.8,
                },
            ],
        };
        let (values, report) = migrate(&record, &RevisionHistory::EMPTY, &TABLE);
        assert_eq!(values[TABLE.index_of(PARAM_RATE).unwrap()], 2.5);
        assert_eq!(values[TABLE.index_of(PARAM_MIX).unwrap()], 0.8);
        assert!(report.applied_steps.is_empty());
        assert!(report.dropped.is_empty());
    }

    #[test]
    fn processing_produces_finite_output() {
        let mut chorus = BloomChorus::new();
        chorus.prepare(&config()).unwrap();
        let mut buffer = AudioBuffer::new(2, 512);
        for (i, sample) in buffer.channel_mut(0).iter_mut().enumerate() {
            *sample = (i as f32 * 0.1).sin() * 0.5;
        }
        for (i, sample) in buffer.channel_mut(1).iter_mut().enumerate() {
            *sample = (i as f32 * 0.1).cos() * 0.5;
        }
        for _ in 0..8 {
            chorus.process(&mut buffer).unwrap();
        }
        assert!(buffer.channel(0).iter().all(|s| s.is_finite()));
        assert!(buffer.channel(1).iter().all(|s| s.is_finite()));
    }

    #[test]
    fn dry_mix_passes_input_through() {
        let mut chorus = BloomChorus::new();
        chorus.prepare(&config()).unwrap();
        chorus.set_parameter(PARAM_MIX, 0.0).unwrap();
        chorus.set_parameter(PARAM_FEEDBACK, 0.0).unwrap();
        let mut buffer = AudioBuffer::new(2, 64);
        buffer.channel_mut(0).fill(0.25);
        buffer.channel_mut(1).fill(-0.25);
        chorus.process(&mut buffer).unwrap();
        assert!(buffer.channel(0).iter().all(|s| (*s - 0.25).abs() < 1e-6));
        assert!(buffer.channel(1).iter().all(|s| (*s + 0.25).abs() < 1e-6));
    }
}
