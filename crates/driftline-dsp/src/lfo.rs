use once_cell::sync::Lazy;

const TABLE_SIZE: usize = 1024;

static SINE_TABLE: Lazy<[f32; TABLE_SIZE]> = Lazy::new(|| {
    let mut table = [0.0f32; TABLE_SIZE];
    for (i, slot) in table.iter_mut().enumerate() {
        let phase = i as f32 / TABLE_SIZE as f32;
        *slot = (phase * core::f32::consts::TAU).sin();
    }
    table
});

/// Table-driven sine LFO used to warp delay read positions and filter
/// cutoffs. Phase runs 0..1 and wraps.
#[derive(Clone, Copy, Debug)]
pub struct Lfo {
    phase: f32,
    increment: f32,
}

impl Lfo {
    #[inline]
    pub fn new(sample_rate: f32, rate_hz: f32) -> Self {
        let mut lfo = Self {
            phase: 0.0,
            increment: 0.0,
        };
        lfo.set_rate(sample_rate, rate_hz);
        lfo
    }

    #[inline]
    pub fn set_rate(&mut self, sample_rate: f32, rate_hz: f32) {
        self.increment = rate_hz.max(0.0) / sample_rate.max(1.0);
    }

    #[inline]
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Places the phase directly, used to spread voices across the cycle.
    #[inline]
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = phase.rem_euclid(1.0);
    }

    /// Advances one sample and returns the bipolar sine value.
    #[inline]
    pub fn next(&mut self) -> f32 {
        let pos = self.phase * TABLE_SIZE as f32;
        let idx0 = pos as usize % TABLE_SIZE;
        let idx1 = (idx0 + 1) % TABLE_SIZE;
        let frac = pos - pos.floor();
        let value = SINE_TABLE[idx0] * (1.0 - frac) + SINE_TABLE[idx1] * frac;
        self.phase += self.increment;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        value
    }

    /// Unipolar variant in 0..1.
    #[inline]
    pub fn next_unipolar(&mut self) -> f32 {
        self.next() * 0.5 + 0.5
    }
}
