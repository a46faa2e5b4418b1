//! Digital mixer (pins 25-27).

use crate::config::MixerMode;

/// The three digital sources the mixer can combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MixerInputs {
    pub vco: bool,
    pub slf: bool,
    /// Filtered noise.
    pub noise: bool,
}

/// Combine the selected sources. Multi-source modes AND their inputs.
#[must_use]
pub const fn mix(mode: MixerMode, inputs: MixerInputs) -> bool {
    let MixerInputs { vco, slf, noise } = inputs;
    match mode {
        MixerMode::Vco => vco,
        MixerMode::Slf => slf,
        MixerMode::Noise => noise,
        MixerMode::VcoNoise => vco && noise,
        MixerMode::SlfNoise => slf && noise,
        MixerMode::SlfVcoNoise => vco && slf && noise,
        MixerMode::SlfVco => vco && slf,
        MixerMode::Inhibit => false,
    }
}
