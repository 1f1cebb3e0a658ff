//! Conversions from human-facing units to render-facing units.

use crate::{Error, Result};

pub const MIN_BPM: f64 = 20.0;
pub const MAX_BPM: f64 = 999.0;

/// Decibels to linear gain: `10^(dB/20)`.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Linear gain to decibels. Silence maps to negative infinity.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Integer beat length: `round(60 / bpm * sample_rate)`.
///
/// Never returns zero so beat scheduling always makes progress.
#[inline]
pub fn frames_per_beat(bpm: f64, sample_rate: f64) -> u64 {
    ((60.0 / bpm) * sample_rate).round().max(1.0) as u64
}

pub fn validate_bpm(bpm: f64) -> Result<()> {
    if !bpm.is_finite() || !(MIN_BPM..=MAX_BPM).contains(&bpm) {
        return Err(Error::InvalidTempo(bpm));
    }
    Ok(())
}
