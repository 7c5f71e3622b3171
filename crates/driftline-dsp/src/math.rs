#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db * 0.05)
}

#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    20.0 * linear.max(1e-9).log10()
}

/// Converts a pitch offset in semitones to a playback-rate ratio.
#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    2.0_f32.powf(semitones / 12.0)
}

/// Linear crossfade between a dry and wet sample, amount in 0..1.
#[inline]
pub fn crossfade(dry: f32, wet: f32, amount: f32) -> f32 {
    let amount = amount.clamp(0.0, 1.0);
    dry * (1.0 - amount) + wet * amount
}
