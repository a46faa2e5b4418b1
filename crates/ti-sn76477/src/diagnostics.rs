//! Derived characteristics for humans: frequencies, times, voltage ranges.
//!
//! Nothing here touches the sample path. [`Diagnostics`] computes values
//! from a configuration on demand, and the chip's configuration setters
//! report which [`Characteristic`]s a change affected to an optional
//! [`DiagnosticObserver`].

use log::info;

use crate::config::ChipConfig;
use crate::rates::{
    self, AD_CAP_VOLTAGE_RANGE, NOISE_CAP_VOLTAGE_RANGE, NOISE_FILTER_DISABLED_RATE,
    ONE_SHOT_CAP_VOLTAGE_RANGE, SLF_CAP_VOLTAGE_RANGE, VCO_CAP_VOLTAGE_RANGE, VCO_MAX_EXT_VOLTAGE,
    VCO_TO_SLF_VOLTAGE_DIFF,
};

/// Outcome of a diagnostic query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading<T> {
    Available(T),
    /// The capacitor is driven by an external voltage.
    External,
    /// Missing components.
    NotAvailable,
    /// Configured, but switched off (saturated VCO, unfiltered noise).
    Disabled,
}

impl<T> Reading<T> {
    #[must_use]
    pub fn value(self) -> Option<T> {
        match self {
            Self::Available(v) => Some(v),
            _ => None,
        }
    }

    /// Transform the available value, keeping the other variants.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reading<U> {
        match self {
            Self::Available(v) => Reading::Available(f(v)),
            Self::External => Reading::External,
            Self::NotAvailable => Reading::NotAvailable,
            Self::Disabled => Reading::Disabled,
        }
    }
}

impl Reading<f64> {
    /// Numeric encoding for flat consumers: -1 for external, 0 when there
    /// is nothing to report.
    #[must_use]
    pub fn sentinel(self) -> f64 {
        match self {
            Self::Available(v) => v,
            Self::External => -1.0,
            Self::NotAvailable | Self::Disabled => 0.0,
        }
    }
}

fn available_if_positive(value: f64) -> Reading<f64> {
    if value > 0.0 {
        Reading::Available(value)
    } else {
        Reading::NotAvailable
    }
}

/// Read-only view computing human-facing characteristics.
#[derive(Debug, Clone, Copy)]
pub struct Diagnostics<'a> {
    config: &'a ChipConfig,
}

impl<'a> Diagnostics<'a> {
    #[must_use]
    pub const fn new(config: &'a ChipConfig) -> Self {
        Self { config }
    }

    /// Seconds the one-shot stays active after the inhibit line drops.
    #[must_use]
    pub fn one_shot_time(&self) -> Reading<f64> {
        if self.config.one_shot.cap_voltage.is_some() {
            return Reading::External;
        }
        let rate = rates::one_shot_charging_rate(self.config);
        available_if_positive(rate).map(|r| ONE_SHOT_CAP_VOLTAGE_RANGE / r)
    }

    #[must_use]
    pub fn slf_frequency(&self) -> Reading<f64> {
        if self.config.slf.cap_voltage.is_some() {
            return Reading::External;
        }
        let charge = rates::slf_charging_rate(self.config);
        let discharge = rates::slf_discharging_rate(self.config);
        if charge > 0.0 && discharge > 0.0 {
            let period = SLF_CAP_VOLTAGE_RANGE / charge + SLF_CAP_VOLTAGE_RANGE / discharge;
            Reading::Available(1.0 / period)
        } else {
            Reading::NotAvailable
        }
    }

    /// `(min, max)` frequency over the full control range.
    #[must_use]
    pub fn vco_frequency_range(&self) -> Reading<(f64, f64)> {
        if self.config.vco.network.cap_voltage.is_some() {
            return Reading::External;
        }
        let rate = rates::vco_rate(self.config);
        if rate > 0.0 {
            Reading::Available((
                rate / (2.0 * VCO_CAP_VOLTAGE_RANGE),
                rate / (2.0 * VCO_TO_SLF_VOLTAGE_DIFF),
            ))
        } else {
            Reading::NotAvailable
        }
    }

    /// Frequency the external control voltage selects.
    #[must_use]
    pub fn vco_ext_voltage_frequency(&self) -> Reading<f64> {
        let Some(voltage) = self.config.vco.ext_voltage else {
            return Reading::NotAvailable;
        };
        if voltage > VCO_MAX_EXT_VOLTAGE {
            return Reading::Disabled;
        }
        match self.vco_frequency_range() {
            Reading::Available((min, max)) => {
                Reading::Available(min + (max - min) * voltage / VCO_MAX_EXT_VOLTAGE)
            }
            other => other.map(|(min, _)| min),
        }
    }

    /// Duty cycle in percent.
    #[must_use]
    pub fn vco_duty_cycle(&self) -> f64 {
        rates::vco_duty_cycle(self.config) * 100.0
    }

    #[must_use]
    pub fn noise_generator_frequency(&self) -> Reading<f64> {
        if self.config.noise_clock.external {
            return Reading::External;
        }
        available_if_positive(f64::from(rates::noise_gen_frequency(self.config)))
    }

    /// Corner frequency of the noise filter.
    #[must_use]
    pub fn noise_filter_frequency(&self) -> Reading<f64> {
        if self.config.noise_filter.cap_voltage.is_some() {
            return Reading::External;
        }
        let rate = rates::noise_filter_charging_rate(self.config);
        if rate <= 0.0 {
            Reading::NotAvailable
        } else if rate >= NOISE_FILTER_DISABLED_RATE {
            Reading::Disabled
        } else {
            Reading::Available(1.0 / (2.0 * NOISE_CAP_VOLTAGE_RANGE / rate))
        }
    }

    #[must_use]
    pub fn attack_time(&self) -> Reading<f64> {
        if self.config.envelope.cap_voltage.is_some() {
            return Reading::External;
        }
        available_if_positive(rates::attack_rate(self.config)).map(|r| AD_CAP_VOLTAGE_RANGE / r)
    }

    #[must_use]
    pub fn decay_time(&self) -> Reading<f64> {
        if self.config.envelope.cap_voltage.is_some() {
            return Reading::External;
        }
        available_if_positive(rates::decay_rate(self.config)).map(|r| AD_CAP_VOLTAGE_RANGE / r)
    }

    /// `(min, max)` output voltage at full envelope.
    #[must_use]
    pub fn output_voltage_range(&self) -> (f64, f64) {
        rates::output_voltage_range(self.config)
    }
}

fn describe_seconds(reading: Reading<f64>, external: &str) -> String {
    match reading {
        Reading::Available(t) => format!("{t:.4} sec"),
        Reading::External => external.to_string(),
        Reading::NotAvailable | Reading::Disabled => "N/A".to_string(),
    }
}

fn describe_hz(reading: Reading<f64>, external: &str) -> String {
    match reading {
        Reading::Available(f) => format!("{f:.2} Hz"),
        Reading::External => external.to_string(),
        Reading::NotAvailable | Reading::Disabled => "N/A".to_string(),
    }
}

fn describe_cap(voltage: Option<f64>) -> String {
    voltage.map_or_else(String::new, |v| format!("External (cap = {v:.2}V)"))
}

/// A human-facing characteristic, labelled with the pins that set it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Characteristic {
    EnableLine,
    MixerMode,
    EnvelopeMode,
    VcoMode,
    OneShotTime,
    SlfFrequency,
    VcoFrequency,
    VcoExtVoltage,
    VcoPitchVoltage,
    VcoDutyCycle,
    NoiseGeneratorFrequency,
    NoiseFilterFrequency,
    AttackTime,
    DecayTime,
    OutputVoltage,
}

impl Characteristic {
    pub const ALL: [Self; 15] = [
        Self::EnableLine,
        Self::MixerMode,
        Self::EnvelopeMode,
        Self::VcoMode,
        Self::OneShotTime,
        Self::SlfFrequency,
        Self::VcoFrequency,
        Self::VcoExtVoltage,
        Self::VcoPitchVoltage,
        Self::VcoDutyCycle,
        Self::NoiseGeneratorFrequency,
        Self::NoiseFilterFrequency,
        Self::AttackTime,
        Self::DecayTime,
        Self::OutputVoltage,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::EnableLine => "Enable line (9)",
            Self::MixerMode => "Mixer mode (25-27)",
            Self::EnvelopeMode => "Envelope mode (1,28)",
            Self::VcoMode => "VCO mode (22)",
            Self::OneShotTime => "One-shot time (23,24)",
            Self::SlfFrequency => "SLF frequency (20,21)",
            Self::VcoFrequency => "VCO frequency (17,18)",
            Self::VcoExtVoltage => "VCO ext. voltage (16)",
            Self::VcoPitchVoltage => "VCO pitch voltage (19)",
            Self::VcoDutyCycle => "VCO duty cycle (16,19)",
            Self::NoiseGeneratorFrequency => "Noise gen frequency (4)",
            Self::NoiseFilterFrequency => "Noise filter frequency (5,6)",
            Self::AttackTime => "Attack time (8,10)",
            Self::DecayTime => "Decay time (7,8)",
            Self::OutputVoltage => "Voltage OUT range (11,12)",
        }
    }

    /// Whether moving from `old` to `new` changes this characteristic's
    /// inputs.
    #[must_use]
    pub fn affected(self, old: &ChipConfig, new: &ChipConfig) -> bool {
        match self {
            Self::EnableLine => old.inhibit != new.inhibit,
            Self::MixerMode => old.mixer_mode != new.mixer_mode,
            Self::EnvelopeMode => old.envelope.mode != new.envelope.mode,
            Self::VcoMode => old.vco.source != new.vco.source,
            Self::OneShotTime => old.one_shot != new.one_shot,
            Self::SlfFrequency => old.slf != new.slf,
            Self::VcoFrequency => old.vco.network != new.vco.network,
            Self::VcoExtVoltage => {
                old.vco.ext_voltage != new.vco.ext_voltage || old.vco.network != new.vco.network
            }
            Self::VcoPitchVoltage => old.vco.pitch_voltage != new.vco.pitch_voltage,
            Self::VcoDutyCycle => {
                old.vco.ext_voltage != new.vco.ext_voltage
                    || old.vco.pitch_voltage != new.vco.pitch_voltage
            }
            Self::NoiseGeneratorFrequency => {
                old.noise_clock.resistor != new.noise_clock.resistor
                    || old.noise_clock.external != new.noise_clock.external
            }
            Self::NoiseFilterFrequency => old.noise_filter != new.noise_filter,
            Self::AttackTime => {
                old.envelope.attack != new.envelope.attack
                    || old.envelope.cap != new.envelope.cap
                    || old.envelope.cap_voltage != new.envelope.cap_voltage
            }
            Self::DecayTime => {
                old.envelope.decay != new.envelope.decay
                    || old.envelope.cap != new.envelope.cap
                    || old.envelope.cap_voltage != new.envelope.cap_voltage
            }
            Self::OutputVoltage => {
                old.amplitude_res != new.amplitude_res || old.feedback_res != new.feedback_res
            }
        }
    }

    /// Every characteristic whose inputs differ between two configurations.
    #[must_use]
    pub fn changed_between(old: &ChipConfig, new: &ChipConfig) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|c| c.affected(old, new))
            .collect()
    }

    /// Current value as text, without the label.
    #[must_use]
    pub fn value_text(self, diag: &Diagnostics<'_>) -> String {
        let config = diag.config;
        match self {
            Self::EnableLine => {
                if config.inhibit {
                    "Inhibited".to_string()
                } else {
                    "Enabled".to_string()
                }
            }
            Self::MixerMode => config.mixer_mode.label().to_string(),
            Self::EnvelopeMode => config.envelope.mode.label().to_string(),
            Self::VcoMode => config.vco.source.label().to_string(),
            Self::OneShotTime => {
                describe_seconds(diag.one_shot_time(), &describe_cap(config.one_shot.cap_voltage))
            }
            Self::SlfFrequency => {
                describe_hz(diag.slf_frequency(), &describe_cap(config.slf.cap_voltage))
            }
            Self::VcoFrequency => match diag.vco_frequency_range() {
                Reading::Available((min, max)) => format!("{min:.2} Hz - {max:.2} Hz"),
                Reading::External => describe_cap(config.vco.network.cap_voltage),
                Reading::NotAvailable | Reading::Disabled => "N/A".to_string(),
            },
            Self::VcoExtVoltage => match (config.vco.ext_voltage, diag.vco_ext_voltage_frequency()) {
                (None, _) => "External (disconnected)".to_string(),
                (Some(v), Reading::Available(f)) => format!("{v:.2} V ({f:.2} Hz)"),
                (Some(v), Reading::Disabled) => format!("{v:.2} V (saturated, no output)"),
                (Some(v), _) => format!("{v:.2} V"),
            },
            Self::VcoPitchVoltage => format!("{:.2} V", config.vco.pitch_voltage),
            Self::VcoDutyCycle => format!("{:.0}%", diag.vco_duty_cycle()),
            Self::NoiseGeneratorFrequency => {
                describe_hz(diag.noise_generator_frequency(), "External (diode)")
            }
            Self::NoiseFilterFrequency => match diag.noise_filter_frequency() {
                Reading::Disabled => "Very Large (Filtering Disabled)".to_string(),
                other => describe_hz(other, &describe_cap(config.noise_filter.cap_voltage)),
            },
            Self::AttackTime => {
                describe_seconds(diag.attack_time(), &describe_cap(config.envelope.cap_voltage))
            }
            Self::DecayTime => {
                describe_seconds(diag.decay_time(), &describe_cap(config.envelope.cap_voltage))
            }
            Self::OutputVoltage => {
                let (min, max) = diag.output_voltage_range();
                format!("{min:.4} V - {max:.4} V")
            }
        }
    }

    /// `"<label>: <value>"`.
    #[must_use]
    pub fn describe(self, diag: &Diagnostics<'_>) -> String {
        format!("{}: {}", self.label(), self.value_text(diag))
    }
}

/// Receives characteristics as configuration changes them.
pub trait DiagnosticObserver: Send {
    fn on_change(&mut self, chip: &str, characteristic: Characteristic, diag: &Diagnostics<'_>);
}

impl<F> DiagnosticObserver for F
where
    F: FnMut(&str, Characteristic, &Diagnostics<'_>) + Send,
{
    fn on_change(&mut self, chip: &str, characteristic: Characteristic, diag: &Diagnostics<'_>) {
        self(chip, characteristic, diag);
    }
}

/// Writes each change to the `log` facade at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl DiagnosticObserver for LogObserver {
    fn on_change(&mut self, chip: &str, characteristic: Characteristic, diag: &Diagnostics<'_>) {
        info!("SN76477 '{chip}': {}", characteristic.describe(diag));
    }
}
