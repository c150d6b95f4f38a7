// Lag Simulation Module
// Computes the artificial "thinking time" delays applied to canned answers.

use rand::Rng;
use std::time::Duration;

/// Default lag factor (larger = faster)
pub const DEFAULT_LAG_FACTOR: f64 = 10.0;

/// Lag profile for simulating model response timing.
///
/// Delays scale with answer length and inversely with `factor`:
/// one character costs `1 / (factor * 10)` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LagProfile {
    /// Whether any delay is applied at all
    pub enabled: bool,
    /// Inverse speed; must be finite and positive
    pub factor: f64,
}

impl LagProfile {
    pub fn new(enabled: bool, factor: f64) -> Self {
        Self { enabled, factor }
    }

    /// Disabled profile - no delay (for fast tests)
    pub fn instant() -> Self {
        Self {
            enabled: false,
            factor: DEFAULT_LAG_FACTOR,
        }
    }

    /// Seconds a single character costs
    fn per_char_secs(&self) -> f64 {
        1.0 / (self.factor * 10.0)
    }

    /// Delay before a complete (non-streamed) answer of `chars` characters
    pub fn response_delay(&self, chars: usize) -> Duration {
        if !self.enabled {
            return Duration::ZERO;
        }
        secs(chars as f64 * self.per_char_secs())
    }

    /// Delay before a fixed-size chunk of `chars` characters
    pub fn chunk_delay(&self, chars: usize) -> Duration {
        // Same rate as a whole answer, applied per chunk
        self.response_delay(chars)
    }

    /// Delay before a single streamed character, jittered by up to half the
    /// base delay in either direction
    pub fn char_delay(&self) -> Duration {
        if !self.enabled {
            return Duration::ZERO;
        }
        let base = self.per_char_secs();
        let variation = rand::rng().random_range(-0.5..=0.5) * base;
        secs(base + variation)
    }
}

impl Default for LagProfile {
    fn default() -> Self {
        Self::instant()
    }
}

fn secs(value: f64) -> Duration {
    if value.is_nan() || value <= 0.0 {
        return Duration::ZERO;
    }
    // Past Duration's range; tokio clamps the sleep to its far-future deadline
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}
