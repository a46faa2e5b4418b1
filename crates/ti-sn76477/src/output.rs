//! Output amplifier: envelope-scaled gain tables and sample conversion.
//!
//! The output swings around a fixed center level. How far it swings is the
//! center-to-peak voltage (set by the amplitude and feedback resistors)
//! scaled by a measured gain curve indexed by the envelope voltage in 0.1 V
//! steps. Positive and negative excursions have separate curves and clip at
//! different levels.

#![allow(clippy::unreadable_literal)]

/// Output voltage with the mixer silent or the chip disabled.
pub const OUT_CENTER_LEVEL_VOLTAGE: f64 = 2.57;
/// Highest voltage the output stage can reach.
pub const OUT_HIGH_CLIP_THRESHOLD: f64 = 3.51;
/// Lowest voltage the output stage can reach.
pub const OUT_LOW_CLIP_THRESHOLD: f64 = 0.715;

/// Number of entries in each gain table.
pub const GAIN_STEPS: usize = 45;

/// Gain for a high mixer output, indexed by envelope voltage x 10.
pub static OUT_POS_GAIN: [f64; GAIN_STEPS] = [
    0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 0.01, // 0.0 - 0.9 V
    0.03, 0.11, 0.15, 0.19, 0.21, 0.23, 0.26, 0.29, 0.31, 0.33, // 1.0 - 1.9 V
    0.36, 0.38, 0.41, 0.43, 0.46, 0.49, 0.52, 0.54, 0.57, 0.60, // 2.0 - 2.9 V
    0.62, 0.65, 0.68, 0.70, 0.73, 0.76, 0.80, 0.82, 0.84, 0.87, // 3.0 - 3.9 V
    0.90, 0.93, 0.96, 0.98, 1.00, // 4.0 - 4.4 V
];

/// Gain for a low mixer output, indexed by envelope voltage x 10.
pub static OUT_NEG_GAIN: [f64; GAIN_STEPS] = [
    0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 0.00, 0.00, -0.01, // 0.0 - 0.9 V
    -0.02, -0.09, -0.13, -0.15, -0.17, -0.19, -0.22, -0.24, -0.26, -0.28, // 1.0 - 1.9 V
    -0.30, -0.32, -0.34, -0.37, -0.39, -0.41, -0.44, -0.46, -0.48, -0.51, // 2.0 - 2.9 V
    -0.53, -0.56, -0.58, -0.60, -0.62, -0.65, -0.67, -0.69, -0.72, -0.74, // 3.0 - 3.9 V
    -0.76, -0.78, -0.81, -0.84, -0.85, // 4.0 - 4.4 V
];

/// Table index for an envelope voltage, clamped to the table.
///
/// Negative and NaN voltages (only reachable through an external override)
/// map to entry 0.
#[must_use]
pub fn gain_index(envelope_voltage: f64) -> usize {
    // float-to-int casts saturate, and NaN becomes 0
    ((envelope_voltage * 10.0).floor() as usize).min(GAIN_STEPS - 1)
}

/// Output stage voltage for one sample.
///
/// `enabled` is false while the chip is inhibited or the VCO has
/// saturated; the output then sits at the center level.
#[must_use]
pub fn output_voltage(enabled: bool, mixer_out: bool, envelope_voltage: f64, center_to_peak: f64) -> f64 {
    if !enabled {
        return OUT_CENTER_LEVEL_VOLTAGE;
    }
    let index = gain_index(envelope_voltage);
    if mixer_out {
        (OUT_CENTER_LEVEL_VOLTAGE + center_to_peak * OUT_POS_GAIN[index]).min(OUT_HIGH_CLIP_THRESHOLD)
    } else {
        (OUT_CENTER_LEVEL_VOLTAGE + center_to_peak * OUT_NEG_GAIN[index]).max(OUT_LOW_CLIP_THRESHOLD)
    }
}

/// Map an output voltage onto a signed 16-bit sample.
///
/// The low clip maps to -32767 and the center level to 0. The high clip
/// lands around +16900 since the stage swings further down than up.
#[must_use]
pub fn voltage_to_sample(voltage: f64) -> i16 {
    let normalized = (voltage - OUT_LOW_CLIP_THRESHOLD) / (OUT_CENTER_LEVEL_VOLTAGE - OUT_LOW_CLIP_THRESHOLD) - 1.0;
    (normalized * 32767.0) as i16
}
