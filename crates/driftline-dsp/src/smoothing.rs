/// One-pole lowpass smoother for de-zippering parameter changes.
#[derive(Clone, Copy, Debug)]
pub struct OnePole {
    coeff: f32,
    state: f32,
}

impl OnePole {
    #[inline]
    pub fn new(sample_rate: f32, time_ms: f32) -> Self {
        let mut smoother = Self {
            coeff: 1.0,
            state: 0.0,
        };
        smoother.set_time_ms(sample_rate, time_ms);
        smoother
    }

    #[inline]
    pub fn set_time_ms(&mut self, sample_rate: f32, time_ms: f32) {
        let rate = sample_rate.max(1.0);
        let tau = time_ms.max(0.01) * 0.001 * rate;
        self.coeff = if tau <= 1.0 {
            1.0
        } else {
            (1.0 - (-1.0 / tau).exp()).clamp(0.0, 1.0)
        };
    }

    /// Jumps the internal state without smoothing, used when a whole new
    /// value set is installed at once.
    #[inline]
    pub fn snap(&mut self, value: f32) {
        self.state = value;
    }

    #[inline]
    pub fn next(&mut self, target: f32) -> f32 {
        self.state += self.coeff * (target - self.state);
        self.state
    }

    #[inline]
    pub fn state(&self) -> f32 {
        self.state
    }
}

/// Linear per-block ramp between two parameter values.
///
/// `begin` fixes the endpoints for one render block; `at` yields the
/// interpolated value for a frame index within that block.
#[derive(Clone, Copy, Debug)]
pub struct BlockRamp {
    from: f32,
    step: f32,
}

impl BlockRamp {
    #[inline]
    pub fn begin(from: f32, to: f32, frames: usize) -> Self {
        let step = if frames > 1 {
            (to - from) / (frames - 1) as f32
        } else {
            0.0
        };
        Self { from, step }
    }

    #[inline]
    pub fn at(&self, frame: usize) -> f32 {
        self.from + self.step * frame as f32
    }
}
