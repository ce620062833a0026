//! Indicator light brightness with smoothed decay.

/// Decay rate (per second) used by the gate lights.
pub const LIGHT_DECAY_RATE: f32 = 15.0;

/// Brightness in 0.0..=1.0.
///
/// Rising changes are immediate so short triggers stay visible; falling
/// changes glide down at `rate` per second.
#[derive(Debug, Clone, Copy, Default)]
pub struct Light {
    value: f32,
}

impl Light {
    pub fn new() -> Self {
        Self { value: 0.0 }
    }

    #[inline]
    pub fn set(&mut self, brightness: f32) {
        self.value = brightness.clamp(0.0, 1.0);
    }

    /// Move toward `target`, decaying smoothly when it is darker.
    #[inline]
    pub fn set_smooth(&mut self, target: f32, rate: f32, sample_time: f32) {
        let target = target.clamp(0.0, 1.0);
        if target >= self.value {
            self.value = target;
        } else {
            let step = (rate * sample_time).min(1.0);
            self.value += (target - self.value) * step;
        }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }
}
