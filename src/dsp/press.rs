//! Short/long press detection for a single momentary button.

use super::trigger::BooleanTrigger;

/// Hold time (seconds) after which a press counts as long.
pub const LONG_PRESS_SECONDS: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    None,
    /// Released before the long-press time elapsed.
    Short,
    /// Held for the long-press time. Fires while the button is still down.
    Long,
}

/*
Timeline of a long press:

    button   ‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾╲____
    held     0 ─────────────→ 1.0 s     (disarmed: -1)
    event                         ↑ Long                ↑ nothing on release

A short press reports on release instead, since only then do we know the
long-press time was not reached.
*/

#[derive(Debug, Clone, Copy)]
pub struct PressDetector {
    /// Seconds held so far, or negative once the long press has fired.
    held: f32,
    release: BooleanTrigger,
}

impl PressDetector {
    pub fn new() -> Self {
        Self {
            held: 0.0,
            release: BooleanTrigger::new(),
        }
    }

    /// Advance by one sample.
    pub fn process(&mut self, pressed: bool, sample_time: f32) -> Press {
        let mut result = Press::None;

        if pressed && self.held >= 0.0 {
            self.held += sample_time;
            if self.held >= LONG_PRESS_SECONDS {
                self.held = -1.0;
                result = Press::Long;
            }
        }

        if self.release.process(!pressed) {
            if self.held > 0.0 {
                result = Press::Short;
            }
            self.held = 0.0;
        }

        result
    }

    pub fn reset(&mut self) {
        self.held = 0.0;
        self.release.reset();
    }
}

impl Default for PressDetector {
    fn default() -> Self {
        Self::new()
    }
}
