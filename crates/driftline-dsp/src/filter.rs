/// Resonant lowpass damper in the feedback path of delay-type effects.
///
/// Two-pole state-variable topology; cutoff and resonance can be retuned
/// per block without resetting filter state.
#[derive(Clone, Copy, Debug)]
pub struct Damper {
    a1: f32,
    a2: f32,
    a3: f32,
    ic1eq: f32,
    ic2eq: f32,
}

impl Damper {
    #[inline]
    pub fn new(sample_rate: f32, cutoff_hz: f32, resonance: f32) -> Self {
        let mut damper = Self {
            a1: 0.0,
            a2: 0.0,
            a3: 0.0,
            ic1eq: 0.0,
            ic2eq: 0.0,
        };
        damper.set(sample_rate, cutoff_hz, resonance);
        damper
    }

    #[inline]
    pub fn set(&mut self, sample_rate: f32, cutoff_hz: f32, resonance: f32) {
        let sr = sample_rate.max(1.0);
        let cutoff = cutoff_hz.clamp(10.0, 0.45 * sr);
        let g = (core::f32::consts::PI * (cutoff / sr)).tan();
        let k = 1.0 / resonance.max(0.05);
        let a1 = 1.0 / (1.0 + g * (g + k));
        self.a1 = a1;
        self.a2 = g * a1;
        self.a3 = g * self.a2;
    }

    #[inline]
    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let v3 = input - self.ic2eq;
        let v1 = self.a1 * self.ic1eq + self.a2 * v3;
        let v2 = self.ic2eq + self.a2 * self.ic1eq + self.a3 * v3;
        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;
        v2
    }
}

/// One-pole highpass, mainly for keeping DC and rumble out of feedback loops.
#[derive(Clone, Copy, Debug)]
pub struct HighpassOnePole {
    coeff: f32,
    state: f32,
}

impl HighpassOnePole {
    #[inline]
    pub fn new(sample_rate: f32, cutoff_hz: f32) -> Self {
        let mut hp = Self {
            coeff: 0.0,
            state: 0.0,
        };
        hp.set(sample_rate, cutoff_hz);
        hp
    }

    #[inline]
    pub fn set(&mut self, sample_rate: f32, cutoff_hz: f32) {
        let sr = sample_rate.max(1.0);
        let cutoff = cutoff_hz.clamp(1.0, 0.45 * sr);
        let x = (-2.0 * core::f32::consts::PI * cutoff / sr).exp();
        self.coeff = x.clamp(0.0, 1.0);
    }

    #[inline]
    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state = input + self.coeff * (self.state - input);
        input - self.state
    }
}
