//! The fundamental unit of time in the emulator.

/// A count of sample ticks.
///
/// One tick is one output sample at the component's configured sample
/// rate. Sub-circuits that run faster or slower than the sample rate keep
/// their own fractional accumulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticks(pub u64);

impl Ticks {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Ticks covering `seconds` of output at `sample_rate` (truncated).
    #[must_use]
    pub fn from_seconds(seconds: f64, sample_rate: u32) -> Self {
        if seconds <= 0.0 {
            return Self::ZERO;
        }
        Self((seconds * f64::from(sample_rate)) as u64)
    }
}

impl core::ops::Add for Ticks {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl core::ops::AddAssign for Ticks {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl core::ops::Sub for Ticks {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}
