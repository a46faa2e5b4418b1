//! Capacitor-based timers: one-shot, SLF and VCO.
//!
//! Each sub-circuit is a capacitor ramping between two thresholds with a
//! flip-flop recording which way it is heading. A step takes precomputed
//! per-sample voltage deltas from [`Rates`](crate::rates::Rates). An
//! external override voltage, when present, replaces the capacitor voltage
//! outright and the flip-flop logic reads that instead.

use crate::config::VcoSource;
use crate::rates::{
    ONE_SHOT_CAP_VOLTAGE_MAX, ONE_SHOT_CAP_VOLTAGE_MIN, SLF_CAP_VOLTAGE_MAX, SLF_CAP_VOLTAGE_MIN,
    VCO_CAP_VOLTAGE_MAX, VCO_CAP_VOLTAGE_MIN, VCO_TO_SLF_VOLTAGE_DIFF,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One-shot timer (pins 23-24).
///
/// Charges once after the inhibit line is released; when the capacitor
/// reaches its threshold the timer stops running and the cap drains.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OneShot {
    pub voltage: f64,
    pub running: bool,
}

impl OneShot {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            voltage: ONE_SHOT_CAP_VOLTAGE_MIN,
            running: false,
        }
    }

    /// Restart the timer from an empty capacitor.
    pub fn trigger(&mut self) {
        self.voltage = ONE_SHOT_CAP_VOLTAGE_MIN;
        self.running = true;
    }

    pub fn step(&mut self, charge: f64, discharge: f64, external: Option<f64>) {
        match external {
            Some(v) => self.voltage = v,
            None if self.running => {
                self.voltage = (self.voltage + charge).min(ONE_SHOT_CAP_VOLTAGE_MAX);
            }
            None => self.voltage = (self.voltage - discharge).max(ONE_SHOT_CAP_VOLTAGE_MIN),
        }

        if self.voltage >= ONE_SHOT_CAP_VOLTAGE_MAX {
            self.running = false;
        }
    }
}

impl Default for OneShot {
    fn default() -> Self {
        Self::new()
    }
}

/// Super-low-frequency triangle oscillator (pins 20-21).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slf {
    pub voltage: f64,
    /// High while discharging.
    pub out: bool,
}

impl Slf {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            voltage: SLF_CAP_VOLTAGE_MIN,
            out: false,
        }
    }

    pub fn step(&mut self, charge: f64, discharge: f64, external: Option<f64>) {
        match external {
            Some(v) => self.voltage = v,
            None if self.out => {
                self.voltage = (self.voltage - discharge).max(SLF_CAP_VOLTAGE_MIN);
            }
            None => self.voltage = (self.voltage + charge).min(SLF_CAP_VOLTAGE_MAX),
        }

        if self.voltage >= SLF_CAP_VOLTAGE_MAX {
            self.out = true;
        } else if self.voltage <= SLF_CAP_VOLTAGE_MIN {
            self.out = false;
        }
    }
}

impl Default for Slf {
    fn default() -> Self {
        Self::new()
    }
}

/// Voltage the VCO charges up to this sample.
///
/// The ceiling tracks the control voltage (SLF triangle or pin 16) plus a
/// fixed offset. A disconnected external control pins it at the floor, so
/// the VCO latches instead of oscillating.
#[must_use]
pub fn vco_ceiling(source: VcoSource, slf_voltage: f64, ext_voltage: Option<f64>) -> f64 {
    let control = match source {
        VcoSource::Slf => Some(slf_voltage),
        VcoSource::External => ext_voltage,
    };
    control.map_or(VCO_CAP_VOLTAGE_MIN, |v| {
        (v + VCO_TO_SLF_VOLTAGE_DIFF).max(VCO_CAP_VOLTAGE_MIN)
    })
}

/// Voltage-controlled triangle oscillator (pins 16-19, 22).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vco {
    pub voltage: f64,
    /// High while discharging.
    pub out: bool,
    /// Flips on every rising edge of `out`.
    pub alt_edge: bool,
}

impl Vco {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            voltage: VCO_CAP_VOLTAGE_MIN,
            out: false,
            alt_edge: false,
        }
    }

    pub fn step(&mut self, charge: f64, discharge: f64, ceiling: f64, external: Option<f64>) {
        match external {
            Some(v) => self.voltage = v,
            None if self.out => {
                self.voltage = (self.voltage - discharge).max(VCO_CAP_VOLTAGE_MIN);
            }
            None => self.voltage = (self.voltage + charge).min(ceiling),
        }

        if self.voltage >= ceiling {
            if !self.out {
                self.alt_edge = !self.alt_edge;
            }
            self.out = true;
        } else if self.voltage <= VCO_CAP_VOLTAGE_MIN {
            self.out = false;
        }
    }

    /// Above the highest ceiling the SLF can produce. Only an external
    /// control voltage past saturation gets here, and it silences the chip.
    #[must_use]
    pub fn saturated(&self) -> bool {
        self.voltage > VCO_CAP_VOLTAGE_MAX
    }
}

impl Default for Vco {
    fn default() -> Self {
        Self::new()
    }
}
