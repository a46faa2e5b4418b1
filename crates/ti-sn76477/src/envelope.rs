//! Attack/decay envelope (pins 1, 7, 8, 10, 28).

use crate::config::EnvelopeMode;
use crate::rates::{AD_CAP_VOLTAGE_MAX, AD_CAP_VOLTAGE_MIN};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Signals the envelope mode chooses between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Gates {
    pub vco_out: bool,
    pub vco_alt_edge: bool,
    pub one_shot_running: bool,
}

/// Whether the attack/decay capacitor is in its attack phase.
#[must_use]
pub const fn charging(mode: EnvelopeMode, gates: Gates) -> bool {
    match mode {
        EnvelopeMode::Vco => gates.vco_out,
        EnvelopeMode::OneShot => gates.one_shot_running,
        EnvelopeMode::MixerOnly => true,
        EnvelopeMode::VcoAlternating => gates.vco_out && gates.vco_alt_edge,
    }
}

/// Attack/decay capacitor.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub voltage: f64,
}

impl Envelope {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            voltage: AD_CAP_VOLTAGE_MIN,
        }
    }

    pub fn reset(&mut self) {
        self.voltage = AD_CAP_VOLTAGE_MIN;
    }

    /// A zero step means the path has no components at all; the voltage
    /// snaps to the bound instead of stalling.
    pub fn step(&mut self, charging: bool, attack: f64, decay: f64, external: Option<f64>) {
        self.voltage = match external {
            Some(v) => v,
            None if charging && attack > 0.0 => (self.voltage + attack).min(AD_CAP_VOLTAGE_MAX),
            None if charging => AD_CAP_VOLTAGE_MAX,
            None if decay > 0.0 => (self.voltage - decay).max(AD_CAP_VOLTAGE_MIN),
            None => AD_CAP_VOLTAGE_MIN,
        };
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}
