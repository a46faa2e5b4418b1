//! Noise generator and its Schmitt-triggered lowpass filter.
//!
//! Raw noise comes from a 31-bit LFSR clocked either by an internal clock
//! (pin 4 resistor) or by rising edges on the external clock line (pin 3).
//! The filter capacitor (pins 5-6) integrates the raw bit, and a pair of
//! thresholds turns the result back into a digital signal.

use crate::rates::{
    NOISE_CAP_HIGH_THRESHOLD, NOISE_CAP_LOW_THRESHOLD, NOISE_CAP_VOLTAGE_MAX,
    NOISE_CAP_VOLTAGE_MIN,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bits 0-4 and 28. When all are clear the feedback is forced to 1.
const LOCKUP_MASK: u32 = 0x1000_001F;

/// 31-bit shift register with taps at bits 28 and 0.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lfsr {
    register: u32,
}

impl Lfsr {
    /// An empty register. The lock-up rule feeds ones in from the start.
    #[must_use]
    pub const fn new() -> Self {
        Self { register: 0 }
    }

    #[must_use]
    pub const fn register(&self) -> u32 {
        self.register
    }

    /// Shift once and return the bit fed back in at position 30.
    pub fn step(&mut self) -> bool {
        let mut bit = ((self.register >> 28) ^ self.register) & 1;
        if self.register & LOCKUP_MASK == 0 {
            bit = 1;
        }
        self.register = (self.register >> 1) | (bit << 30);
        bit != 0
    }
}

/// LFSR plus the clock that drives it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoiseGenerator {
    pub lfsr: Lfsr,
    /// Last bit shifted out.
    pub bit: bool,
    /// Internal clock accumulator, in sample-rate units.
    pub count: u64,
}

impl NoiseGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lfsr: Lfsr::new(),
            bit: false,
            count: 0,
        }
    }

    /// Advance the internal clock by one output sample.
    ///
    /// The accumulator gains `sample_rate` per LFSR step and loses
    /// `frequency` per sample, so the average step rate is exactly
    /// `frequency` with no floating-point drift. A zero sample rate is
    /// treated as 1 Hz, matching [`Rates::compute`](crate::rates::Rates::compute).
    pub fn clock_internal(&mut self, frequency: u32, sample_rate: u32) {
        let frequency = u64::from(frequency);
        let sample_rate = u64::from(sample_rate.max(1));
        while self.count <= frequency {
            self.count += sample_rate;
            self.bit = self.lfsr.step();
        }
        self.count -= frequency;
    }

    /// Rising edge on the external clock line.
    pub fn clock_edge(&mut self) {
        self.bit = self.lfsr.step();
    }
}

/// Noise filter capacitor and its hysteresis output.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseFilter {
    pub voltage: f64,
    pub out: bool,
}

impl NoiseFilter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            voltage: NOISE_CAP_VOLTAGE_MIN,
            out: false,
        }
    }

    pub fn step(&mut self, raw_bit: bool, charge: f64, discharge: f64, external: Option<f64>) {
        match external {
            Some(v) => self.voltage = v,
            None if raw_bit => self.voltage = (self.voltage + charge).min(NOISE_CAP_VOLTAGE_MAX),
            None => self.voltage = (self.voltage - discharge).max(NOISE_CAP_VOLTAGE_MIN),
        }

        if self.voltage >= NOISE_CAP_HIGH_THRESHOLD {
            self.out = false;
        } else if self.voltage <= NOISE_CAP_LOW_THRESHOLD {
            self.out = true;
        }
    }
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self::new()
    }
}
