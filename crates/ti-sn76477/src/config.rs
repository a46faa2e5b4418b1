//! SN76477 external component configuration.
//!
//! Everything the chip reads from its pins: the resistors and capacitors
//! hung off each sub-circuit, optional external voltages driving a timing
//! capacitor directly, and the digital select lines. All values are SI
//! units (ohms, farads, volts). This is plain data; changing a field does
//! nothing until the next generation call reads it.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default maximum of every variable (trim) resistor, in ohms.
pub const VARIABLE_RESISTOR_MAX: f64 = 1_000_000.0;

/// Output sample rate used when none is configured.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Kilohms to ohms.
#[must_use]
pub const fn res_k(res: f64) -> f64 {
    res * 1e3
}

/// Megohms to ohms.
#[must_use]
pub const fn res_m(res: f64) -> f64 {
    res * 1e6
}

/// Microfarads to farads.
#[must_use]
pub const fn cap_u(cap: f64) -> f64 {
    cap * 1e-6
}

/// Nanofarads to farads.
#[must_use]
pub const fn cap_n(cap: f64) -> f64 {
    cap * 1e-9
}

/// Picofarads to farads.
#[must_use]
pub const fn cap_p(cap: f64) -> f64 {
    cap * 1e-12
}

/// Mixer select inputs (pins 25–27).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MixerMode {
    #[default]
    Vco,
    Slf,
    Noise,
    VcoNoise,
    SlfNoise,
    SlfVcoNoise,
    SlfVco,
    Inhibit,
}

impl MixerMode {
    /// Decode the three select pins (bit 0 = A, bit 1 = B, bit 2 = C).
    #[must_use]
    pub const fn from_pins(pins: u8) -> Self {
        match pins & 0x07 {
            0 => Self::Vco,
            1 => Self::Slf,
            2 => Self::Noise,
            3 => Self::VcoNoise,
            4 => Self::SlfNoise,
            5 => Self::SlfVcoNoise,
            6 => Self::SlfVco,
            _ => Self::Inhibit,
        }
    }

    #[must_use]
    pub const fn pins(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Vco => "VCO",
            Self::Slf => "SLF",
            Self::Noise => "Noise",
            Self::VcoNoise => "VCO/Noise",
            Self::SlfNoise => "SLF/Noise",
            Self::SlfVcoNoise => "SLF/VCO/Noise",
            Self::SlfVco => "SLF/VCO",
            Self::Inhibit => "Inhibit",
        }
    }
}

/// Envelope select inputs (pins 1 and 28).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnvelopeMode {
    #[default]
    Vco,
    OneShot,
    MixerOnly,
    VcoAlternating,
}

impl EnvelopeMode {
    /// Decode the two select pins (bit 0 = pin 1, bit 1 = pin 28).
    #[must_use]
    pub const fn from_pins(pins: u8) -> Self {
        match pins & 0x03 {
            0 => Self::Vco,
            1 => Self::OneShot,
            2 => Self::MixerOnly,
            _ => Self::VcoAlternating,
        }
    }

    #[must_use]
    pub const fn pins(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Vco => "VCO",
            Self::OneShot => "One-Shot",
            Self::MixerOnly => "Mixer Only",
            Self::VcoAlternating => "VCO with Alternating Polarity",
        }
    }
}

/// What sets the VCO's charging ceiling (pin 22).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VcoSource {
    /// External control voltage on pin 16.
    External,
    /// The SLF triangle.
    #[default]
    Slf,
}

impl VcoSource {
    /// Decode the select pin: high selects the SLF.
    #[must_use]
    pub const fn from_pin(level: bool) -> Self {
        if level { Self::Slf } else { Self::External }
    }

    #[must_use]
    pub const fn pin(self) -> bool {
        matches!(self, Self::Slf)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::External => "External (Pin 16)",
            Self::Slf => "Internal (SLF)",
        }
    }
}

/// A fixed resistor in series with a trim pot.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resistor {
    /// Fixed part, in ohms.
    pub base: f64,
    /// Current setting of the variable part, in ohms.
    pub variable: f64,
    /// Full-scale value of the variable part, in ohms.
    pub variable_max: f64,
}

impl Resistor {
    /// A plain resistor with no trim.
    #[must_use]
    pub const fn fixed(ohms: f64) -> Self {
        Self {
            base: ohms,
            variable: 0.0,
            variable_max: VARIABLE_RESISTOR_MAX,
        }
    }

    /// Total series resistance.
    #[must_use]
    pub fn ohms(&self) -> f64 {
        self.base + self.variable
    }
}

impl Default for Resistor {
    fn default() -> Self {
        Self::fixed(0.0)
    }
}

/// Resistor/capacitor pair of one timing sub-circuit.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RcNetwork {
    pub resistor: Resistor,
    /// Capacitance, in farads.
    pub cap: f64,
    /// External voltage forced onto the capacitor. `None` lets the chip
    /// charge and discharge it internally.
    pub cap_voltage: Option<f64>,
}

impl RcNetwork {
    #[must_use]
    pub const fn new(res: f64, cap: f64) -> Self {
        Self {
            resistor: Resistor::fixed(res),
            cap,
            cap_voltage: None,
        }
    }
}

/// Voltage-controlled oscillator components and control inputs.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VcoConfig {
    /// Pins 17 (cap) and 18 (res).
    pub network: RcNetwork,
    pub source: VcoSource,
    /// External control voltage on pin 16. `None` = disconnected.
    pub ext_voltage: Option<f64>,
    /// Pitch control voltage on pin 19.
    pub pitch_voltage: f64,
}

impl Default for VcoConfig {
    fn default() -> Self {
        Self {
            network: RcNetwork::default(),
            source: VcoSource::Slf,
            ext_voltage: None,
            pitch_voltage: 5.0,
        }
    }
}

/// Noise generator clock.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NoiseClockConfig {
    /// Clock resistor on pin 4.
    pub resistor: Resistor,
    /// Internal clock disabled; the LFSR steps on rising edges of `level`.
    pub external: bool,
    /// Level of the external clock line (pin 3).
    pub level: bool,
}

/// Attack/decay envelope components.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnvelopeConfig {
    pub mode: EnvelopeMode,
    /// Attack resistor (pin 10).
    pub attack: Resistor,
    /// Decay resistor (pin 7).
    pub decay: Resistor,
    /// Attack/decay capacitor (pin 8), in farads.
    pub cap: f64,
    /// External voltage forced onto the attack/decay capacitor.
    pub cap_voltage: Option<f64>,
}

/// Complete external configuration of one SN76477.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChipConfig {
    /// Inhibit line (pin 9). High silences the output.
    pub inhibit: bool,
    pub mixer_mode: MixerMode,
    /// Pins 23 (cap) and 24 (res).
    pub one_shot: RcNetwork,
    /// Super-low-frequency oscillator, pins 20 (res) and 21 (cap).
    pub slf: RcNetwork,
    pub vco: VcoConfig,
    pub noise_clock: NoiseClockConfig,
    /// Pins 5 (res) and 6 (cap).
    pub noise_filter: RcNetwork,
    pub envelope: EnvelopeConfig,
    /// Amplitude resistor (pin 11), in ohms.
    pub amplitude_res: f64,
    /// Feedback resistor (pin 12), in ohms.
    pub feedback_res: f64,
    /// Output sample rate, in Hz.
    pub sample_rate: u32,
}

impl Default for ChipConfig {
    fn default() -> Self {
        Self {
            inhibit: false,
            mixer_mode: MixerMode::Vco,
            one_shot: RcNetwork::default(),
            slf: RcNetwork::default(),
            vco: VcoConfig::default(),
            noise_clock: NoiseClockConfig::default(),
            noise_filter: RcNetwork::default(),
            envelope: EnvelopeConfig::default(),
            amplitude_res: res_k(100.0),
            feedback_res: res_k(22.0),
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

/// Reason a configuration was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A resistance or capacitance below zero.
    Negative { component: &'static str, value: f64 },
    /// NaN or infinite value.
    NotFinite { component: &'static str },
    /// Trim pot set beyond its full-scale value.
    VariableOutOfRange {
        component: &'static str,
        value: f64,
        max: f64,
    },
    ZeroSampleRate,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative { component, value } => {
                write!(f, "{component} must not be negative (got {value})")
            }
            Self::NotFinite { component } => write!(f, "{component} must be a finite number"),
            Self::VariableOutOfRange {
                component,
                value,
                max,
            } => write!(
                f,
                "{component} variable resistor set to {value} ohms, above its {max} ohm maximum"
            ),
            Self::ZeroSampleRate => write!(f, "sample rate must be non-zero"),
        }
    }
}

impl std::error::Error for ConfigError {}

fn check_magnitude(component: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { component });
    }
    if value < 0.0 {
        return Err(ConfigError::Negative { component, value });
    }
    Ok(())
}

fn check_voltage(component: &'static str, value: Option<f64>) -> Result<(), ConfigError> {
    match value {
        Some(v) if !v.is_finite() => Err(ConfigError::NotFinite { component }),
        _ => Ok(()),
    }
}

fn check_resistor(component: &'static str, res: &Resistor) -> Result<(), ConfigError> {
    check_magnitude(component, res.base)?;
    check_magnitude(component, res.variable)?;
    check_magnitude(component, res.variable_max)?;
    if res.variable > res.variable_max {
        return Err(ConfigError::VariableOutOfRange {
            component,
            value: res.variable,
            max: res.variable_max,
        });
    }
    Ok(())
}

fn check_network(component: &'static str, net: &RcNetwork) -> Result<(), ConfigError> {
    check_resistor(component, &net.resistor)?;
    check_magnitude(component, net.cap)?;
    check_voltage(component, net.cap_voltage)
}

impl ChipConfig {
    /// Reject values the calibrated formulas are undefined for.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_network("one-shot", &self.one_shot)?;
        check_network("SLF", &self.slf)?;
        check_network("VCO", &self.vco.network)?;
        check_voltage("VCO external voltage", self.vco.ext_voltage)?;
        check_voltage("VCO pitch voltage", Some(self.vco.pitch_voltage))?;
        check_resistor("noise clock", &self.noise_clock.resistor)?;
        check_network("noise filter", &self.noise_filter)?;
        check_resistor("attack", &self.envelope.attack)?;
        check_resistor("decay", &self.envelope.decay)?;
        check_magnitude("attack/decay capacitor", self.envelope.cap)?;
        check_voltage("attack/decay capacitor", self.envelope.cap_voltage)?;
        check_magnitude("amplitude resistor", self.amplitude_res)?;
        check_magnitude("feedback resistor", self.feedback_res)?;
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        Ok(())
    }
}
