//! Hysteresis edge detection for gates, clocks and momentary buttons.

/*
Schmitt Trigger
===============

A gate input is an analog voltage, not a boolean. Comparing it against a
single threshold makes a slow or noisy edge "chatter": the signal hovers
around the threshold and produces a burst of rising edges instead of one.

A Schmitt trigger uses TWO thresholds:

    Voltage
      high ┤- - - - - - - -╭──────╮- - - - - - - - -
           │              ╱        ╲
      low  ┤- - - - - - -╱- - - - - ╲- - - - - - - -
           │   ╱╲╱╲╱╲   ╱            ╲
           └──────────────────────────────────→ Time
                          ↑          ↑
                        rising     falling

  - While LOW, the state only flips once the input reaches `high`.
  - While HIGH, the state only flips once the input drops to `low`.

Anything between the two thresholds keeps the previous state, so noise
inside the band cannot create extra edges.

Defaults follow the usual modular convention: low = 0 V, high = 1 V. A
momentary button reporting 0.0 / 1.0 can be fed straight into the same
trigger.
*/

/// Edge reported by [`SchmittTrigger::process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    None,
    Rising,
    Falling,
}

#[derive(Debug, Clone, Copy)]
pub struct SchmittTrigger {
    low: f32,
    high: f32,
    state: bool,
}

impl SchmittTrigger {
    pub const DEFAULT_LOW: f32 = 0.0;
    pub const DEFAULT_HIGH: f32 = 1.0;

    pub fn new() -> Self {
        Self::with_thresholds(Self::DEFAULT_LOW, Self::DEFAULT_HIGH)
    }

    /// Build a trigger with a custom hysteresis band.
    ///
    /// If the thresholds are passed in the wrong order they are swapped, so
    /// the band always has `low <= high`.
    pub fn with_thresholds(low: f32, high: f32) -> Self {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        Self {
            low,
            high,
            state: false,
        }
    }

    /// Feed one sample. Returns the edge crossed by this sample, if any.
    #[inline]
    pub fn process(&mut self, input: f32) -> Edge {
        if self.state {
            if input <= self.low {
                self.state = false;
                return Edge::Falling;
            }
        } else if input >= self.high {
            self.state = true;
            return Edge::Rising;
        }
        Edge::None
    }

    /// Convenience wrapper for callers that only care about rising edges.
    #[inline]
    pub fn rising(&mut self, input: f32) -> bool {
        self.process(input) == Edge::Rising
    }

    pub fn is_high(&self) -> bool {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = false;
    }
}

impl Default for SchmittTrigger {
    fn default() -> Self {
        Self::new()
    }
}

/// Edge detector for values that are already boolean (button states).
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanTrigger {
    previous: bool,
}

impl BooleanTrigger {
    pub fn new() -> Self {
        Self { previous: false }
    }

    /// True on the first sample where `state` becomes true.
    #[inline]
    pub fn process(&mut self, state: bool) -> bool {
        let triggered = state && !self.previous;
        self.previous = state;
        triggered
    }

    pub fn reset(&mut self) {
        self.previous = false;
    }
}
