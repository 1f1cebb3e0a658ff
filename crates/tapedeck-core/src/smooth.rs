//! Smoothed gain values for click-free level changes.
//!
//! Gain changes approach their target exponentially with a configurable time
//! constant, the same curve a hardware fader's RC network would produce. After
//! one time constant the value has covered ~63% of the distance.
//!
//! # Example
//!
//! ```
//! use tapedeck_core::SmoothedValue;
//!
//! // 50ms time constant at 48kHz
//! let mut gain = SmoothedValue::new(1.0, 0.050, 48000.0);
//!
//! gain.set_target(0.5);
//!
//! # let mut buffer = [1.0f32; 128];
//! for sample in buffer.iter_mut() {
//!     *sample *= gain.next_sample();
//! }
//! assert!(gain.current() < 1.0 && gain.current() > 0.5);
//! ```

/// Distance from the target below which the value snaps onto it.
const SNAP_EPSILON: f32 = 1.0e-5;

/// One-pole smoothed parameter.
///
/// Call [`next_sample()`](SmoothedValue::next_sample) once per frame in the
/// render callback.
#[derive(Debug, Clone)]
pub struct SmoothedValue {
    current: f32,
    target: f32,
    coeff: f32,
    time_constant: f32,
    sample_rate: f32,
}

impl SmoothedValue {
    pub fn new(initial: f32, time_constant_secs: f32, sample_rate: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: Self::coefficient(time_constant_secs, sample_rate),
            time_constant: time_constant_secs,
            sample_rate,
        }
    }

    pub fn immediate(initial: f32) -> Self {
        Self::new(initial, 0.0, 1.0)
    }

    #[inline]
    fn coefficient(time_constant_secs: f32, sample_rate: f32) -> f32 {
        let samples = time_constant_secs * sample_rate;
        if samples <= f32::EPSILON {
            0.0
        } else {
            (-1.0 / samples).exp()
        }
    }

    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Retarget with a new time constant. Recomputes the coefficient only when
    /// the time constant changes.
    #[inline]
    pub fn set_target_with(&mut self, target: f32, time_constant_secs: f32) {
        if (time_constant_secs - self.time_constant).abs() > f32::EPSILON {
            self.time_constant = time_constant_secs;
            self.coeff = Self::coefficient(time_constant_secs, self.sample_rate);
        }
        self.target = target;
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if self.current != self.target {
            self.current = self.target + (self.current - self.target) * self.coeff;
            if (self.current - self.target).abs() < SNAP_EPSILON {
                self.current = self.target;
            }
        }
        self.current
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.current != self.target
    }

    /// Multiply a stereo block in place by the smoothed gain.
    #[inline]
    pub fn apply_gain_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let gain = self.next_sample();
            *l *= gain;
            *r *= gain;
        }
    }
}

impl Default for SmoothedValue {
    fn default() -> Self {
        Self::new(1.0, 0.05, 48000.0)
    }
}
