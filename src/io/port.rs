//! Host port values.

/// One input jack as seen by a module for a single sample.
///
/// Hosts report whether anything is patched into the jack; modules use
/// that to fall back to a documented default instead of a floating value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Input {
    pub voltage: f32,
    pub connected: bool,
}

impl Input {
    /// A patched jack carrying `voltage`.
    pub fn patched(voltage: f32) -> Self {
        Self {
            voltage,
            connected: true,
        }
    }

    /// An empty jack.
    pub fn unpatched() -> Self {
        Self::default()
    }

    /// The patched voltage, or 0 V when nothing is connected.
    #[inline]
    pub fn voltage(&self) -> f32 {
        self.normalize(0.0)
    }

    /// The patched voltage, or `default` when nothing is connected.
    ///
    /// Non-finite voltages from a misbehaving host also fall back, so a
    /// NaN can never reach a module's state.
    #[inline]
    pub fn normalize(&self, default: f32) -> f32 {
        if self.connected && self.voltage.is_finite() {
            self.voltage
        } else {
            default
        }
    }
}
