//! Orbit Phaser: four allpass stages swept around a center frequency.
//!
//! Revision 2 replaced the original normalized "Sweep" control with an
//! explicit center frequency in Hz; old records are remapped and rescaled
//! onto the new id.

use std::f32::consts::PI;
use std::sync::Arc;

use once_cell::sync::Lazy;

use driftline_dsp::math::crossfade;
use driftline_dsp::Lfo;
use driftline_engine::{
    AlgorithmCore, AudioBuffer, AudioEffect, BufferConfig, ChannelLayout, EffectInfo, SharedParams,
};
use driftline_fx_sdk::{
    DescriptorTable, DescriptorTableBuilder, EffectAdapter, EffectFactory, GroupDef, GroupId,
    GroupTable, HostPort, NativeEffect, ParamCurve, ParamDescriptor, ParamError, ParamId,
    ParamKind,
};
use driftline_stream::{RevisionHistory, RevisionStep, Rule, StreamRevision, StreamedEffectFactory};

pub const EFFECT_ID: &str = "driftline.fx.orbit_phaser";

// Id 2 was the normalized sweep position, retired in revision 2.
pub const PARAM_RATE: ParamId = ParamId::new(0);
pub const PARAM_DEPTH: ParamId = ParamId::new(1);
pub const PARAM_FEEDBACK: ParamId = ParamId::new(3);
pub const PARAM_MIX: ParamId = ParamId::new(4);
pub const PARAM_CENTER: ParamId = ParamId::new(5);

const RETIRED_SWEEP: ParamId = ParamId::new(2);

pub const GROUP_MOTION: GroupId = GroupId::new(0);
pub const GROUP_TONE: GroupId = GroupId::new(1);
pub const GROUP_OUTPUT: GroupId = GroupId::new(2);

const STAGES: usize = 4;
const CENTER_MIN_HZ: f32 = 100.0;
const CENTER_MAX_HZ: f32 = 4_000.0;

static TABLE: Lazy<Arc<DescriptorTable>> = Lazy::new(|| {
    Arc::new(
        DescriptorTableBuilder::new()
            .push(
                ParamDescriptor::new(
                    PARAM_RATE,
                    "Rate",
                    ParamKind::float_curved(0.02..=5.0, 0.4, ParamCurve::Exponential),
                )
                .with_unit("Hz")
                .in_group(GROUP_MOTION),
            )
            .push(
                ParamDescriptor::new(PARAM_DEPTH, "Depth", ParamKind::float(0.0..=1.0, 0.7))
                    .in_group(GROUP_MOTION),
            )
            .push(
                ParamDescriptor::new(
                    PARAM_FEEDBACK,
                    "Feedback",
                    ParamKind::float(0.0..=0.95, 0.3),
                )
                .in_group(GROUP_TONE),
            )
            .push(
                ParamDescriptor::new(PARAM_MIX, "Mix", ParamKind::float(0.0..=1.0, 0.5))
                    .in_group(GROUP_OUTPUT),
            )
            .push(
                ParamDescriptor::new(
                    PARAM_CENTER,
                    "Center",
                    ParamKind::float_curved(
                        CENTER_MIN_HZ..=CENTER_MAX_HZ,
                        800.0,
                        ParamCurve::Exponential,
                    ),
                )
                .with_unit("Hz")
                .in_group(GROUP_TONE),
            )
            .finish(),
    )
});

static GROUPS: Lazy<Arc<GroupTable>> = Lazy::new(|| {
    Arc::new(GroupTable::new(vec![
        GroupDef::new(GROUP_MOTION, "Motion", 0),
        GroupDef::new(GROUP_TONE, "Tone", 1),
        GroupDef::new(GROUP_OUTPUT, "Output", 2),
    ]))
});

// Revision 2: "Sweep" (normalized 0..1) became "Center" in Hz. The remap
// moves the stored value onto the new id, then the rescale reinterprets the
// normalized position geometrically across the new range.
const HISTORY: RevisionHistory = RevisionHistory::new(&[RevisionStep {
    revision: StreamRevision(2),
    rules: &[
        Rule::Remap {
            from: RETIRED_SWEEP,
            to: PARAM_CENTER,
        },
        Rule::Rescale {
            id: PARAM_CENTER,
            apply: |pos| {
                let pos = pos.clamp(0.0, 1.0);
                CENTER_MIN_HZ * (CENTER_MAX_HZ / CENTER_MIN_HZ).powf(pos)
            },
        },
    ],
}]);

#[derive(Clone, Copy, Default)]
struct AllpassStage {
    z1: f32,
}

impl AllpassStage {
    #[inline]
    fn process(&mut self, input: f32, coeff: f32) -> f32 {
        let output = -coeff * input + self.z1;
        self.z1 = input + coeff * output;
        output
    }
}

struct OrbitPhaserKernel {
    sample_rate: f32,
    stages: [[AllpassStage; STAGES]; 2],
    feedback_state: [f32; 2],
    lfo: Lfo,
    depth: f32,
    center: f32,
    feedback: f32,
    mix: f32,
}

impl OrbitPhaserKernel {
    fn new() -> Self {
        Self {
            sample_rate: 48_000.0,
            stages: [[AllpassStage::default(); STAGES]; 2],
            feedback_state: [0.0; 2],
            lfo: Lfo::new(48_000.0, 0.4),
            depth: 0.7,
            center: 800.0,
            feedback: 0.3,
            mix: 0.5,
        }
    }
}

impl AlgorithmCore for OrbitPhaserKernel {
    fn prepare(&mut self, config: &BufferConfig) {
        self.sample_rate = config.sample_rate.max(1.0);
        self.reset();
    }

    fn set_parameters(&mut self, values: &[f32]) {
        let &[rate, depth, feedback, mix, center] = values else {
            debug_assert!(false, "orbit phaser expects 5 parameters");
            return;
        };
        self.lfo.set_rate(self.sample_rate, rate);
        self.depth = depth;
        self.feedback = feedback;
        self.mix = mix;
        self.center = center;
    }

    fn render(&mut self, buffer: &mut AudioBuffer) {
        let min_freq = (self.center * (1.0 - 0.8 * self.depth)).max(40.0);
        let max_freq = (self.center * (1.0 + 0.8 * self.depth)).min(self.sample_rate * 0.45);
        let frames = buffer.len();
        for frame in 0..frames {
            let sweep = self.lfo.next_unipolar();
            let freq = min_freq + (max_freq - min_freq) * sweep;
            let omega = (PI * freq / self.sample_rate).tan().min(10.0);
            let coeff = (1.0 - omega) / (1.0 + omega);
            for (channel_index, channel) in buffer.channels_mut().enumerate() {
                let slot = channel_index.min(1);
                let input = channel[frame];
                let mut stage_io = input + self.feedback_state[slot] * self.feedback;
                for stage in &mut self.stages[slot] {
                    stage_io = stage.process(stage_io, coeff);
                }
                self.feedback_state[slot] = stage_io;
                channel[frame] = crossfade(input, stage_io, self.mix);
            }
        }
    }

    fn reset(&mut self) {
        self.stages = [[AllpassStage::default(); STAGES]; 2];
        self.feedback_state = [0.0; 2];
        self.lfo.reset();
    }
}

pub struct OrbitPhaser {
    adapter: EffectAdapter<OrbitPhaserKernel>,
}

impl OrbitPhaser {
    pub fn new() -> Self {
        Self {
            adapter: EffectAdapter::new(
                info(),
                Arc::clone(&TABLE),
                Arc::clone(&GROUPS),
                OrbitPhaserKernel::new(),
            ),
        }
    }

    pub fn take_host_port(&mut self) -> Option<HostPort> {
        self.adapter.take_host_port()
    }
}

impl Default for OrbitPhaser {
    fn default() -> Self {
        Self::new()
    }
}

fn info() -> EffectInfo {
    EffectInfo::new(EFFECT_ID, "Orbit Phaser", "Driftline")
        .with_description("Four-stage phaser swept around a center frequency")
}

impl AudioEffect for OrbitPhaser {
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

impl NativeEffect for OrbitPhaser {
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

pub struct OrbitPhaserFactory;

impl EffectFactory for OrbitPhaserFactory {
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
        Box::new(OrbitPhaser::new())
    }
}

impl StreamedEffectFactory for OrbitPhaserFactory {
    fn revision_history(&self) -> &'static RevisionHistory {
        &HISTORY
    }
}
