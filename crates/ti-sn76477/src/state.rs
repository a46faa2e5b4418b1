//! Persistent per-chip state and the per-sample advance.

use crate::config::ChipConfig;
use crate::envelope::{self, Envelope, Gates};
use crate::mixer::{self, MixerInputs};
use crate::noise::{NoiseFilter, NoiseGenerator};
use crate::oscillator::{self, OneShot, Slf, Vco};
use crate::output::{self, OUT_CENTER_LEVEL_VOLTAGE};
use crate::rates::Rates;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Everything that evolves from one sample to the next.
///
/// Capacitor voltages stay inside their sub-circuit's range unless an
/// external override forces them elsewhere.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChipState {
    pub one_shot: OneShot,
    pub slf: Slf,
    pub vco: Vco,
    pub noise: NoiseGenerator,
    pub noise_filter: NoiseFilter,
    pub envelope: Envelope,
    /// Output voltage of the last sample.
    pub out_voltage: f64,
}

impl ChipState {
    /// Power-on state: every capacitor empty, every flip-flop clear.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            one_shot: OneShot::new(),
            slf: Slf::new(),
            vco: Vco::new(),
            noise: NoiseGenerator::new(),
            noise_filter: NoiseFilter::new(),
            envelope: Envelope::new(),
            out_voltage: OUT_CENTER_LEVEL_VOLTAGE,
        }
    }

    /// Inhibit released: restart the one-shot and empty the envelope.
    pub fn trigger(&mut self) {
        self.one_shot.trigger();
        self.envelope.reset();
    }

    /// Advance every sub-circuit by one sample and return the output.
    ///
    /// Order matters: the VCO reads this sample's SLF voltage, the filter
    /// reads this sample's noise bit and the envelope reads this sample's
    /// VCO and one-shot.
    pub fn tick(&mut self, config: &ChipConfig, rates: &Rates) -> i16 {
        self.one_shot.step(
            rates.one_shot_charge,
            rates.one_shot_discharge,
            config.one_shot.cap_voltage,
        );
        self.slf
            .step(rates.slf_charge, rates.slf_discharge, config.slf.cap_voltage);

        let ceiling = oscillator::vco_ceiling(config.vco.source, self.slf.voltage, config.vco.ext_voltage);
        self.vco.step(
            rates.vco_charge,
            rates.vco_discharge,
            ceiling,
            config.vco.network.cap_voltage,
        );

        if !config.noise_clock.external {
            self.noise.clock_internal(rates.noise_frequency, config.sample_rate);
        }
        self.noise_filter.step(
            self.noise.bit,
            rates.noise_filter_charge,
            rates.noise_filter_discharge,
            config.noise_filter.cap_voltage,
        );

        let charging = envelope::charging(
            config.envelope.mode,
            Gates {
                vco_out: self.vco.out,
                vco_alt_edge: self.vco.alt_edge,
                one_shot_running: self.one_shot.running,
            },
        );
        self.envelope
            .step(charging, rates.attack, rates.decay, config.envelope.cap_voltage);

        let enabled = !config.inhibit && !self.vco.saturated();
        let mixed = mixer::mix(
            config.mixer_mode,
            MixerInputs {
                vco: self.vco.out,
                slf: self.slf.out,
                noise: self.noise_filter.out,
            },
        );
        self.out_voltage = output::output_voltage(enabled, mixed, self.envelope.voltage, rates.center_to_peak);
        output::voltage_to_sample(self.out_voltage)
    }
}

impl Default for ChipState {
    fn default() -> Self {
        Self::new()
    }
}
