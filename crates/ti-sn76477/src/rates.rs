//! Calibrated charge rates and frequencies.
//!
//! Every timing sub-circuit charges a capacitor through a resistor at a
//! rate (volts per second) given by a curve fitted to measurements of real
//! chips. These functions are pure: they read a [`ChipConfig`] and nothing
//! else.
//!
//! Zero components follow one policy wherever a path has a single RC pair:
//!
//! | resistor | capacitor | rate |
//! |----------|-----------|------|
//! | > 0      | > 0       | calibrated curve |
//! | 0        | > 0       | 1e-30 (no current flows) |
//! | > 0      | 0         | 1e30 (instantaneous) |
//! | 0        | 0         | 0 |

#![allow(clippy::suboptimal_flops)]

use crate::config::{ChipConfig, RcNetwork};
use crate::output::{OUT_CENTER_LEVEL_VOLTAGE, OUT_NEG_GAIN, OUT_POS_GAIN};

pub const ONE_SHOT_CAP_VOLTAGE_MIN: f64 = 0.0;
pub const ONE_SHOT_CAP_VOLTAGE_MAX: f64 = 2.5;
pub const ONE_SHOT_CAP_VOLTAGE_RANGE: f64 = ONE_SHOT_CAP_VOLTAGE_MAX - ONE_SHOT_CAP_VOLTAGE_MIN;

pub const SLF_CAP_VOLTAGE_MIN: f64 = 0.33;
pub const SLF_CAP_VOLTAGE_MAX: f64 = 2.37;
pub const SLF_CAP_VOLTAGE_RANGE: f64 = SLF_CAP_VOLTAGE_MAX - SLF_CAP_VOLTAGE_MIN;

/// Highest external control voltage that still lets the VCO oscillate.
pub const VCO_MAX_EXT_VOLTAGE: f64 = 2.35;
/// Offset between the control voltage and the VCO charging ceiling.
pub const VCO_TO_SLF_VOLTAGE_DIFF: f64 = 0.35;
pub const VCO_CAP_VOLTAGE_MIN: f64 = SLF_CAP_VOLTAGE_MIN;
pub const VCO_CAP_VOLTAGE_MAX: f64 = SLF_CAP_VOLTAGE_MAX + VCO_TO_SLF_VOLTAGE_DIFF;
pub const VCO_CAP_VOLTAGE_RANGE: f64 = VCO_CAP_VOLTAGE_MAX - VCO_CAP_VOLTAGE_MIN;
/// Pitch voltage giving a 50% duty cycle.
pub const VCO_DUTY_CYCLE_50: f64 = 5.0;
pub const VCO_MIN_DUTY_CYCLE: f64 = 0.18;

pub const NOISE_MIN_CLOCK_RES: f64 = 10_000.0;
pub const NOISE_MAX_CLOCK_RES: f64 = 3_300_000.0;

pub const NOISE_CAP_VOLTAGE_MIN: f64 = 0.0;
pub const NOISE_CAP_VOLTAGE_MAX: f64 = 5.0;
pub const NOISE_CAP_VOLTAGE_RANGE: f64 = NOISE_CAP_VOLTAGE_MAX - NOISE_CAP_VOLTAGE_MIN;
/// Filter voltage at or above which the filtered bit drops to 0.
pub const NOISE_CAP_HIGH_THRESHOLD: f64 = 3.35;
/// Filter voltage at or below which the filtered bit rises to 1.
pub const NOISE_CAP_LOW_THRESHOLD: f64 = 0.74;

pub const AD_CAP_VOLTAGE_MIN: f64 = 0.0;
pub const AD_CAP_VOLTAGE_MAX: f64 = 4.44;
pub const AD_CAP_VOLTAGE_RANGE: f64 = AD_CAP_VOLTAGE_MAX - AD_CAP_VOLTAGE_MIN;

/// Rate used when a resistor is present but its capacitor is not.
pub const INSTANT_RATE: f64 = 1e30;
/// Rate used when a capacitor is present but its resistor is not.
pub const NO_CURRENT_RATE: f64 = 1e-30;

/// Noise filter rate at which filtering is considered disabled.
pub const NOISE_FILTER_DISABLED_RATE: f64 = 1e6;

fn rc_rate(res: f64, cap: f64, curve: impl FnOnce(f64, f64) -> f64) -> f64 {
    if res > 0.0 && cap > 0.0 {
        curve(res, cap)
    } else if cap > 0.0 {
        NO_CURRENT_RATE
    } else if res > 0.0 {
        INSTANT_RATE
    } else {
        0.0
    }
}

fn plain_rate(net: &RcNetwork, curve: impl FnOnce(f64, f64) -> f64) -> f64 {
    let res = net.resistor.ohms();
    if res > 0.0 && net.cap > 0.0 {
        curve(res, net.cap)
    } else {
        0.0
    }
}

#[must_use]
pub fn one_shot_charging_rate(config: &ChipConfig) -> f64 {
    let net = &config.one_shot;
    rc_rate(net.resistor.ohms(), net.cap, |r, c| {
        ONE_SHOT_CAP_VOLTAGE_RANGE / (0.8024 * r * c + 0.002_079)
    })
}

/// The one-shot discharges through an internal path, so only the
/// capacitor shapes the curve.
#[must_use]
pub fn one_shot_discharging_rate(config: &ChipConfig) -> f64 {
    let net = &config.one_shot;
    rc_rate(net.resistor.ohms(), net.cap, |_, c| {
        ONE_SHOT_CAP_VOLTAGE_RANGE / (854.7 * c + 0.000_017_95)
    })
}

#[must_use]
pub fn slf_charging_rate(config: &ChipConfig) -> f64 {
    plain_rate(&config.slf, |r, c| {
        SLF_CAP_VOLTAGE_RANGE / (0.5885 * r * c + 0.001_300)
    })
}

#[must_use]
pub fn slf_discharging_rate(config: &ChipConfig) -> f64 {
    plain_rate(&config.slf, |r, c| {
        SLF_CAP_VOLTAGE_RANGE / (0.5413 * r * c + 0.001_343)
    })
}

/// VCO charge rate in volts per second. The duty cycle skews it into
/// separate charge and discharge steps in [`Rates::compute`].
#[must_use]
pub fn vco_rate(config: &ChipConfig) -> f64 {
    plain_rate(&config.vco.network, |r, c| {
        0.64 * 2.0 * VCO_CAP_VOLTAGE_RANGE / (r * c)
    })
}

/// Fraction of the VCO period spent charging.
#[must_use]
pub fn vco_duty_cycle(config: &ChipConfig) -> f64 {
    let pitch = config.vco.pitch_voltage;
    match config.vco.ext_voltage {
        Some(ext) if ext > 0.0 && pitch != VCO_DUTY_CYCLE_50 => {
            (0.5 * pitch / ext).clamp(VCO_MIN_DUTY_CYCLE, 1.0)
        }
        _ => 0.5,
    }
}

/// Internal noise clock in Hz. Zero outside the usable resistor range.
#[must_use]
pub fn noise_gen_frequency(config: &ChipConfig) -> u32 {
    let res = config.noise_clock.resistor.ohms();
    if (NOISE_MIN_CLOCK_RES..=NOISE_MAX_CLOCK_RES).contains(&res) {
        (339_100_000.0 * res.powf(-0.8849)) as u32
    } else {
        0
    }
}

#[must_use]
pub fn noise_filter_charging_rate(config: &ChipConfig) -> f64 {
    let net = &config.noise_filter;
    rc_rate(net.resistor.ohms(), net.cap, |r, c| {
        NOISE_CAP_VOLTAGE_RANGE / (0.1571 * r * c + 0.000_014_30)
    })
}

#[must_use]
pub fn noise_filter_discharging_rate(config: &ChipConfig) -> f64 {
    let net = &config.noise_filter;
    rc_rate(net.resistor.ohms(), net.cap, |r, c| {
        NOISE_CAP_VOLTAGE_RANGE / (0.1331 * r * c + 0.000_017_34)
    })
}

#[must_use]
pub fn attack_rate(config: &ChipConfig) -> f64 {
    let env = &config.envelope;
    rc_rate(env.attack.ohms(), env.cap, |r, c| {
        AD_CAP_VOLTAGE_RANGE / (r * c)
    })
}

#[must_use]
pub fn decay_rate(config: &ChipConfig) -> f64 {
    let env = &config.envelope;
    rc_rate(env.decay.ohms(), env.cap, |r, c| {
        AD_CAP_VOLTAGE_RANGE / (r * c)
    })
}

/// Peak swing of the output around its center level, in volts.
#[must_use]
pub fn center_to_peak_voltage(config: &ChipConfig) -> f64 {
    if config.amplitude_res > 0.0 {
        3.818 * (config.feedback_res / config.amplitude_res) + 0.03
    } else {
        0.0
    }
}

/// Output voltage range `(min, max)` at full envelope.
#[must_use]
pub fn output_voltage_range(config: &ChipConfig) -> (f64, f64) {
    let ctp = center_to_peak_voltage(config);
    (
        OUT_CENTER_LEVEL_VOLTAGE + ctp * OUT_NEG_GAIN[OUT_NEG_GAIN.len() - 1],
        OUT_CENTER_LEVEL_VOLTAGE + ctp * OUT_POS_GAIN[OUT_POS_GAIN.len() - 1],
    )
}

/// Per-sample voltage steps for one generation call.
///
/// Computed once from the configuration at the start of each call; all
/// fields except `noise_frequency` are volts per sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    pub one_shot_charge: f64,
    pub one_shot_discharge: f64,
    pub slf_charge: f64,
    pub slf_discharge: f64,
    pub vco_charge: f64,
    pub vco_discharge: f64,
    /// Internal noise clock in Hz.
    pub noise_frequency: u32,
    pub noise_filter_charge: f64,
    pub noise_filter_discharge: f64,
    pub attack: f64,
    pub decay: f64,
    pub center_to_peak: f64,
}

impl Rates {
    #[must_use]
    pub fn compute(config: &ChipConfig) -> Self {
        let sample_rate = f64::from(config.sample_rate.max(1));
        let per_sample = |rate: f64| rate / sample_rate;

        // The duty cycle splits one VCO period unevenly: a duty above 50%
        // slows charging and speeds discharging by the same factor.
        let vco = vco_rate(config);
        let multiplier = (1.0 - vco_duty_cycle(config)) * 2.0;
        let (vco_charge, vco_discharge) = if vco == 0.0 {
            (0.0, 0.0)
        } else if multiplier > 0.0 {
            (vco / multiplier / sample_rate, vco * multiplier / sample_rate)
        } else {
            (f64::INFINITY, 0.0)
        };

        Self {
            one_shot_charge: per_sample(one_shot_charging_rate(config)),
            one_shot_discharge: per_sample(one_shot_discharging_rate(config)),
            slf_charge: per_sample(slf_charging_rate(config)),
            slf_discharge: per_sample(slf_discharging_rate(config)),
            vco_charge,
            vco_discharge,
            noise_frequency: noise_gen_frequency(config),
            noise_filter_charge: per_sample(noise_filter_charging_rate(config)),
            noise_filter_discharge: per_sample(noise_filter_discharging_rate(config)),
            attack: per_sample(attack_rate(config)),
            decay: per_sample(decay_rate(config)),
            center_to_peak: center_to_peak_voltage(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{cap_n, cap_u, res_k};

    fn close(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() <= tolerance * b.abs().max(1e-12)
    }

    #[test]
    fn sentinel_policy_for_single_pair_paths() {
        let mut config = ChipConfig::default();
        assert_eq!(attack_rate(&config), 0.0, "no components");

        config.envelope.cap = cap_u(1.0);
        assert_eq!(attack_rate(&config), NO_CURRENT_RATE, "cap only");

        config.envelope.cap = 0.0;
        config.envelope.attack.base = res_k(10.0);
        assert_eq!(attack_rate(&config), INSTANT_RATE, "resistor only");

        config.one_shot.resistor.base = res_k(10.0);
        assert_eq!(one_shot_discharging_rate(&config), INSTANT_RATE);
        config.one_shot.resistor.base = 0.0;
        config.one_shot.cap = cap_u(1.0);
        assert_eq!(one_shot_discharging_rate(&config), NO_CURRENT_RATE);
    }

    #[test]
    fn noise_filter_sentinels() {
        let mut config = ChipConfig::default();
        assert_eq!(noise_filter_charging_rate(&config), 0.0, "no components");
        assert_eq!(noise_filter_discharging_rate(&config), 0.0, "no components");

        config.noise_filter.cap = cap_n(1.0);
        assert_eq!(noise_filter_charging_rate(&config), NO_CURRENT_RATE, "cap only");
        assert_eq!(noise_filter_discharging_rate(&config), NO_CURRENT_RATE, "cap only");

        config.noise_filter.cap = 0.0;
        config.noise_filter.resistor.base = res_k(10.0);
        assert_eq!(noise_filter_charging_rate(&config), INSTANT_RATE, "resistor only");
        assert_eq!(noise_filter_discharging_rate(&config), INSTANT_RATE, "resistor only");
    }

    #[test]
    fn one_shot_charge_sentinels() {
        let mut config = ChipConfig::default();
        assert_eq!(one_shot_charging_rate(&config), 0.0, "no components");
        config.one_shot.cap = cap_u(1.0);
        assert_eq!(one_shot_charging_rate(&config), NO_CURRENT_RATE, "cap only");
        config.one_shot.cap = 0.0;
        config.one_shot.resistor.base = res_k(100.0);
        assert_eq!(one_shot_charging_rate(&config), INSTANT_RATE, "resistor only");
    }

    #[test]
    fn oscillators_stall_without_components() {
        let mut config = ChipConfig::default();
        config.slf.cap = cap_u(1.0);
        assert_eq!(slf_charging_rate(&config), 0.0);
        assert_eq!(slf_discharging_rate(&config), 0.0);
        config.vco.network.resistor.base = res_k(100.0);
        assert_eq!(vco_rate(&config), 0.0);
    }

    #[test]
    fn slf_rates_follow_calibration() {
        let mut config = ChipConfig::default();
        config.slf = RcNetwork::new(res_k(47.0), cap_u(1.0));
        let rc = 47_000.0 * 1e-6;
        assert!(close(slf_charging_rate(&config), 2.04 / (0.5885 * rc + 0.0013), 1e-9));
        assert!(close(slf_discharging_rate(&config), 2.04 / (0.5413 * rc + 0.001_343), 1e-9));
    }

    #[test]
    fn duty_cycle_defaults_to_half() {
        let mut config = ChipConfig::default();
        assert_eq!(vco_duty_cycle(&config), 0.5, "disconnected control");
        config.vco.ext_voltage = Some(2.0);
        assert_eq!(vco_duty_cycle(&config), 0.5, "pitch at 5 V");
    }

    #[test]
    fn duty_cycle_is_clamped() {
        let mut config = ChipConfig::default();
        config.vco.ext_voltage = Some(2.0);
        config.vco.pitch_voltage = 2.0;
        assert!(close(vco_duty_cycle(&config), 0.25, 1e-12));
        config.vco.pitch_voltage = 0.1;
        assert_eq!(vco_duty_cycle(&config), VCO_MIN_DUTY_CYCLE);
        config.vco.pitch_voltage = 4.9;
        config.vco.ext_voltage = Some(1.0);
        assert_eq!(vco_duty_cycle(&config), 1.0);
    }

    #[test]
    fn noise_frequency_outside_resistor_range_is_zero() {
        let mut config = ChipConfig::default();
        config.noise_clock.resistor.base = res_k(9.0);
        assert_eq!(noise_gen_frequency(&config), 0);
        config.noise_clock.resistor.base = 3_400_000.0;
        assert_eq!(noise_gen_frequency(&config), 0);
        config.noise_clock.resistor.base = res_k(10.0);
        let expected = (339_100_000.0 * 10_000f64.powf(-0.8849)) as u32;
        assert_eq!(noise_gen_frequency(&config), expected);
        assert!(expected > 0);
    }

    #[test]
    fn variable_resistor_adds_to_base() {
        let mut config = ChipConfig::default();
        config.envelope.cap = cap_n(100.0);
        config.envelope.decay.base = res_k(100.0);
        let fixed = decay_rate(&config);
        config.envelope.decay.variable = res_k(100.0);
        assert!(decay_rate(&config) < fixed);
    }

    #[test]
    fn center_to_peak_default_resistors() {
        let config = ChipConfig::default();
        assert!(close(center_to_peak_voltage(&config), 3.818 * 0.22 + 0.03, 1e-12));
        let (min, max) = output_voltage_range(&config);
        assert!(min < OUT_CENTER_LEVEL_VOLTAGE && max > OUT_CENTER_LEVEL_VOLTAGE);
    }

    #[test]
    fn steps_are_per_sample() {
        let mut config = ChipConfig::default();
        config.slf = RcNetwork::new(res_k(47.0), cap_u(1.0));
        config.sample_rate = 1000;
        let rates = Rates::compute(&config);
        assert!(close(rates.slf_charge, slf_charging_rate(&config) / 1000.0, 1e-12));
    }

    #[test]
    fn vco_steps_split_by_duty() {
        let mut config = ChipConfig::default();
        config.vco.network = RcNetwork::new(res_k(100.0), cap_n(10.0));
        let even = Rates::compute(&config);
        assert!(close(even.vco_charge, even.vco_discharge, 1e-12));

        config.vco.ext_voltage = Some(2.0);
        config.vco.pitch_voltage = 3.0;
        let skewed = Rates::compute(&config);
        assert!(skewed.vco_charge > skewed.vco_discharge);
    }

    #[test]
    fn vco_steps_stay_finite_without_rate() {
        let mut config = ChipConfig::default();
        config.vco.ext_voltage = Some(1.0);
        config.vco.pitch_voltage = 4.0;
        let rates = Rates::compute(&config);
        assert_eq!(rates.vco_charge, 0.0);
        assert_eq!(rates.vco_discharge, 0.0);
    }
}
