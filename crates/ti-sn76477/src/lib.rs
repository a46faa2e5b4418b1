//! Texas Instruments SN76477 complex sound generator emulator.
//!
//! The SN76477 is an analog chip: almost everything it does is set by the
//! resistors and capacitors wired to its pins. Five sub-circuits each ramp a
//! capacitor between calibrated thresholds (one-shot, SLF, VCO, noise
//! filter and attack/decay envelope), a 31-bit LFSR supplies raw noise, a
//! digital mixer picks a combination of the square outputs, and the output
//! amplifier scales the result by the envelope. Charge rates come from
//! curves fitted to measurements of real chips rather than from circuit
//! equations.
//!
//! Generation is sample-accurate: one tick is one output sample, rates are
//! recomputed once per generation call, and identical configuration and
//! state always produce identical samples.
//!
//! # Pins
//!
//! | Pin   | Function                          | Field                         |
//! |-------|-----------------------------------|-------------------------------|
//! | 1, 28 | Envelope select                   | `envelope.mode`               |
//! | 3     | External noise clock              | `noise_clock.level`           |
//! | 4     | Noise clock resistor              | `noise_clock.resistor`        |
//! | 5, 6  | Noise filter resistor, capacitor  | `noise_filter`                |
//! | 7     | Decay resistor                    | `envelope.decay`              |
//! | 8     | Attack/decay capacitor            | `envelope.cap`                |
//! | 9     | Inhibit                           | `inhibit`                     |
//! | 10    | Attack resistor                   | `envelope.attack`             |
//! | 11    | Amplitude resistor                | `amplitude_res`               |
//! | 12    | Feedback resistor                 | `feedback_res`                |
//! | 13    | Audio out                         | generated samples             |
//! | 16    | VCO external control voltage      | `vco.ext_voltage`             |
//! | 17, 18| VCO capacitor, resistor           | `vco.network`                 |
//! | 19    | Pitch control voltage             | `vco.pitch_voltage`           |
//! | 20, 21| SLF resistor, capacitor           | `slf`                         |
//! | 22    | VCO select                        | `vco.source`                  |
//! | 23, 24| One-shot capacitor, resistor      | `one_shot`                    |
//! | 25–27 | Mixer select                      | `mixer_mode`                  |
//!
//! # Example
//!
//! ```
//! use ti_sn76477::{ChipConfig, MixerMode, RcNetwork, Sn76477, cap_u, res_k};
//!
//! let mut config = ChipConfig::default();
//! config.mixer_mode = MixerMode::Slf;
//! config.slf = RcNetwork::new(res_k(47.0), cap_u(1.0));
//! let mut chip = Sn76477::new(config)?;
//! let samples = chip.generate(44_100);
//! assert_eq!(samples.len(), 44_100);
//! # Ok::<(), ti_sn76477::ConfigError>(())
//! ```

mod chip;
pub mod config;
pub mod diagnostics;
mod envelope;
mod mixer;
mod noise;
mod oscillator;
pub mod output;
pub mod rates;
pub mod sink;
mod state;
#[cfg(feature = "wav")]
pub mod wav;

pub use chip::{SampleStream, Sn76477};
pub use config::{
    ChipConfig, ConfigError, EnvelopeConfig, EnvelopeMode, MixerMode, NoiseClockConfig,
    RcNetwork, Resistor, VcoConfig, VcoSource, cap_n, cap_p, cap_u, res_k, res_m,
};
pub use diagnostics::{Characteristic, DiagnosticObserver, Diagnostics, LogObserver, Reading};
pub use envelope::Envelope;
pub use mixer::MixerInputs;
pub use noise::{Lfsr, NoiseFilter, NoiseGenerator};
pub use oscillator::{OneShot, Slf, Vco};
pub use rates::Rates;
pub use sink::{SampleSink, SinkError, SinkReport};
pub use state::ChipState;
#[cfg(feature = "wav")]
pub use wav::WavSink;
