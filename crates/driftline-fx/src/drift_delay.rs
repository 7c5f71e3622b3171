//! Drift Delay: a tape-style delay whose read head drifts.
//!
//! An LFO warps the delay time around the dialed value, the playrate control
//! slews the effective tape speed, and the feedback path runs through a
//! resonant damper plus a DC blocker. The parameter encoding has been
//! through two revisions: feedback was stored in percent before revision 2
//! (which also retired the stereo spread control), and revision 3 split the
//! single mix control into independent wet and dry levels.

use std::sync::Arc;

use once_cell::sync::Lazy;

use driftline_dsp::math::semitones_to_ratio;
use driftline_dsp::{Damper, FracDelayLine, HighpassOnePole, Lfo, OnePole};
use driftline_engine::{
    AlgorithmCore, AudioBuffer, AudioEffect, BufferConfig, EffectInfo, SharedParams,
};
use driftline_fx_sdk::{
    DescriptorTable, DescriptorTableBuilder, EffectAdapter, EffectFactory, GroupDef, GroupId,
    GroupTable, HostPort, NativeEffect, PanelSurface, ParamCurve, ParamDescriptor, ParamError,
    ParamId, ParamKind,
};
use driftline_stream::{RevisionHistory, RevisionStep, Rule, StreamRevision, StreamedEffectFactory};

pub const EFFECT_ID: &str = "driftline.fx.drift_delay";

// Live controls. Ids 3 (mix) and 6 (spread) are retired and must not be
// reused.
pub const PARAM_TIME: ParamId = ParamId::new(0);
pub const PARAM_PLAYRATE: ParamId = ParamId::new(1);
pub const PARAM_FEEDBACK: ParamId = ParamId::new(2);
pub const PARAM_WARP_RATE: ParamId = ParamId::new(4);
pub const PARAM_WARP_WIDTH: ParamId = ParamId::new(5);
pub const PARAM_CUTOFF: ParamId = ParamId::new(7);
pub const PARAM_RESONANCE: ParamId = ParamId::new(8);
pub const PARAM_WET: ParamId = ParamId::new(9);
pub const PARAM_DRY: ParamId = ParamId::new(10);
pub const PARAM_WARP_PITCH: ParamId = ParamId::new(11);

const RETIRED_MIX: ParamId = ParamId::new(3);
const RETIRED_SPREAD: ParamId = ParamId::new(6);

pub const GROUP_DELAY: GroupId = GroupId::new(0);
pub const GROUP_WARP: GroupId = GroupId::new(1);
pub const GROUP_DAMPING: GroupId = GroupId::new(2);
pub const GROUP_OUTPUT: GroupId = GroupId::new(3);

// Longest reachable delay: 2 s of dialed time at quarter playrate, plus warp
// headroom.
const MAX_DELAY_SECONDS: f32 = 9.0;

static TABLE: Lazy<Arc<DescriptorTable>> = Lazy::new(|| {
    Arc::new(
        DescriptorTableBuilder::new()
            .push(
                ParamDescriptor::new(
                    PARAM_TIME,
                    "Time",
                    ParamKind::float_curved(10.0..=2_000.0, 420.0, ParamCurve::Exponential),
                )
                .with_unit("ms")
                .in_group(GROUP_DELAY),
            )
            .push(
                ParamDescriptor::new(
                    PARAM_PLAYRATE,
                    "Playrate",
                    ParamKind::float_curved(0.25..=4.0, 1.0, ParamCurve::Exponential),
                )
                .in_group(GROUP_DELAY),
            )
            .push(
                ParamDescriptor::new(
                    PARAM_FEEDBACK,
                    "Feedback",
                    ParamKind::float(0.0..=0.95, 0.35),
                )
                .in_group(GROUP_DELAY),
            )
            .push(
                ParamDescriptor::new(
                    PARAM_WARP_RATE,
                    "Warp Rate",
                    ParamKind::float_curved(0.02..=8.0, 0.5, ParamCurve::Exponential),
                )
                .with_unit("Hz")
                .in_group(GROUP_WARP),
            )
            .push(
                ParamDescriptor::new(
                    PARAM_WARP_WIDTH,
                    "Warp Width",
                    ParamKind::float(0.0..=25.0, 4.0),
                )
                .with_unit("ms")
                .in_group(GROUP_WARP),
            )
            .push(
                ParamDescriptor::new(
                    PARAM_CUTOFF,
                    "Cutoff",
                    ParamKind::float_curved(200.0..=18_000.0, 6_500.0, ParamCurve::Exponential),
                )
                .with_unit("Hz")
                .in_group(GROUP_DAMPING),
            )
            .push(
                ParamDescriptor::new(
                    PARAM_RESONANCE,
                    "Resonance",
                    ParamKind::float(0.1..=2.0, 0.707),
                )
                .in_group(GROUP_DAMPING),
            )
            .push(
                ParamDescriptor::new(
                    PARAM_WET,
                    "Wet",
                    ParamKind::float_curved(0.0..=1.0, 0.35, ParamCurve::Decibel),
                )
                .in_group(GROUP_OUTPUT),
            )
            .push(
                ParamDescriptor::new(
                    PARAM_DRY,
                    "Dry",
                    ParamKind::float_curved(0.0..=1.0, 0.65, ParamCurve::Decibel),
                )
                .in_group(GROUP_OUTPUT),
            )
            .push(
                ParamDescriptor::new(
                    PARAM_WARP_PITCH,
                    "Warp Pitch",
                    ParamKind::float(0.0..=7.0, 0.0),
                )
                .with_unit("st")
                .in_group(GROUP_WARP),
            )
            .finish(),
    )
});

static GROUPS: Lazy<Arc<GroupTable>> = Lazy::new(|| {
    Arc::new(GroupTable::new(vec![
        GroupDef::new(GROUP_DELAY, "Delay", 0),
        GroupDef::new(GROUP_WARP, "Warp", 1),
        GroupDef::new(GROUP_DAMPING, "Damping", 2),
        GroupDef::new(GROUP_OUTPUT, "Output", 3),
    ]))
});

// Revision 2: feedback moved from percent to a fraction, spread retired.
// Revision 3: mix split into wet/dry; the old default mix was 0.35.
const HISTORY: RevisionHistory = RevisionHistory::new(&[
    RevisionStep {
        revision: StreamRevision(2),
        rules: &[
            Rule::Rescale {
                id: PARAM_FEEDBACK,
                apply: |v| v * 0.01,
            },
            Rule::Retire { id: RETIRED_SPREAD },
        ],
    },
    RevisionStep {
        revision: StreamRevision(3),
        rules: &[
            Rule::Synthesize {
                id: PARAM_WET,
                sources: &[RETIRED_MIX],
                combine: |inputs| inputs[0].unwrap_or(0.35),
            },
            Rule::Synthesize {
                id: PARAM_DRY,
                sources: &[RETIRED_MIX],
                combine: |inputs| 1.0 - inputs[0].unwrap_or(0.35),
            },
            Rule::Retire { id: RETIRED_MIX },
        ],
    },
]);

/// The delay algorithm itself. Receives the dense parameter vector in table
/// order and knows nothing about ids, hosts or persistence.
struct DriftDelayKernel {
    sample_rate: f32,
    lines: [FracDelayLine; 2],
    dampers: [Damper; 2],
    dc_blockers: [HighpassOnePole; 2],
    time_smooth: OnePole,
    warp: Lfo,
    base_delay_samples: f32,
    warp_depth_samples: f32,
    feedback: f32,
    wet: f32,
    dry: f32,
    snap_pending: bool,
}

impl DriftDelayKernel {
    fn new() -> Self {
        Self {
            sample_rate: 48_000.0,
            lines: [FracDelayLine::new(2), FracDelayLine::new(2)],
            dampers: [Damper::new(48_000.0, 6_500.0, 0.707); 2],
            dc_blockers: [HighpassOnePole::new(48_000.0, 20.0); 2],
            time_smooth: OnePole::new(48_000.0, 30.0),
            warp: Lfo::new(48_000.0, 0.5),
            base_delay_samples: 1.0,
            warp_depth_samples: 0.0,
            feedback: 0.35,
            wet: 0.35,
            dry: 0.65,
            snap_pending: true,
        }
    }
}

impl AlgorithmCore for DriftDelayKernel {
    fn prepare(&mut self, config: &BufferConfig) {
        self.sample_rate = config.sample_rate.max(1.0);
        let max_samples = (self.sample_rate * MAX_DELAY_SECONDS).ceil() as usize;
        for line in &mut self.lines {
            line.prepare(max_samples);
        }
        for blocker in &mut self.dc_blockers {
            blocker.set(self.sample_rate, 20.0);
            blocker.reset();
        }
        self.time_smooth.set_time_ms(self.sample_rate, 30.0);
        self.snap_pending = true;
        self.warp.reset();
    }

    fn set_parameters(&mut self, values: &[f32]) {
        let &[time_ms, playrate, feedback, warp_rate, warp_width, cutoff, resonance, wet, dry, warp_pitch] =
            values
        else {
            debug_assert!(false, "drift delay expects 10 parameters");
            return;
        };
        self.base_delay_samples = (time_ms * 0.001 * self.sample_rate) / playrate.max(0.01);
        self.feedback = feedback;
        self.wet = wet;
        self.dry = dry;
        self.warp.set_rate(self.sample_rate, warp_rate);
        let width_samples = warp_width * 0.001 * self.sample_rate;
        let pitch_samples = (semitones_to_ratio(warp_pitch) - 1.0) * 0.01 * self.base_delay_samples;
        self.warp_depth_samples = width_samples + pitch_samples;
        for damper in &mut self.dampers {
            damper.set(self.sample_rate, cutoff, resonance);
        }
        // First vector after (re)preparation jumps straight to the target so
        // activation does not sweep the delay time audibly.
        if self.snap_pending {
            self.time_smooth.snap(self.base_delay_samples);
            self.snap_pending = false;
        }
    }

    fn render(&mut self, buffer: &mut AudioBuffer) {
        let Some((left, right)) = buffer.stereo_pair_mut() else {
            return;
        };
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let base = self.time_smooth.next(self.base_delay_samples);
            let delay = (base + self.warp.next() * self.warp_depth_samples).max(1.0);
            for (sample, channel) in [(l, 0usize), (r, 1usize)] {
                let input = *sample;
                let delayed = self.lines[channel].read(delay);
                let damped = self.dampers[channel].process(delayed);
                let injected = self.dc_blockers[channel].process(input + damped * self.feedback);
                self.lines[channel].write(injected);
                *sample = input * self.dry + damped * self.wet;
            }
        }
    }

    fn reset(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
        for damper in &mut self.dampers {
            damper.reset();
        }
        for blocker in &mut self.dc_blockers {
            blocker.reset();
        }
        self.warp.reset();
    }
}

pub struct DriftDelay {
    adapter: EffectAdapter<DriftDelayKernel>,
}

impl DriftDelay {
    pub fn new() -> Self {
        Self {
            adapter: EffectAdapter::new(
                info(),
                Arc::clone(&TABLE),
                Arc::clone(&GROUPS),
                DriftDelayKernel::new(),
            ),
        }
    }

    pub fn take_host_port(&mut self) -> Option<HostPort> {
        self.adapter.take_host_port()
    }
}

impl Default for DriftDelay {
    fn default() -> Self {
        Self::new()
    }
}

fn info() -> EffectInfo {
    EffectInfo::new(EFFECT_ID, "Drift Delay", "Driftline")
        .with_description("Tape-style delay with a drifting read head")
}

impl AudioEffect for DriftDelay {
    fn info(&self) -> EffectInfo {
        self.adapter.info()
    }

    fn prepare(&mut self, config: &BufferConfig) -> anyhow::Result<()> {
        self.adapter.prepare(config)
    }

    fn process(&mut self, buffer: &mut AudioBuffer) -> anyhow::Result<()> {
        self.adapter.process(buffer)
    }

    fn supports_layout(&self, layout: driftline_engine::ChannelLayout) -> bool {
        matches!(layout, driftline_engine::ChannelLayout::Stereo)
    }
}

impl NativeEffect for DriftDelay {
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

impl PanelSurface for DriftDelay {
    fn is_repositionable(&self) -> bool {
        true
    }

    fn anchor_key(&self) -> Option<&str> {
        Some("panel.drift_delay.position")
    }
}

pub struct DriftDelayFactory;

impl EffectFactory for DriftDelayFactory {
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
        Box::new(DriftDelay::new())
    }
}

impl StreamedEffectFactory for DriftDelayFactory {
    fn revision_history(&self) -> &'static RevisionHistory {
        &HISTORY
    }
}
