//! The SN76477 chip: configuration layer plus sample generation.

use std::fmt;
use std::iter::FusedIterator;

use emu_core::{Observable, Tickable, Ticks, Value};
use log::{debug, warn};

use crate::config::{ChipConfig, ConfigError, EnvelopeMode, MixerMode, VcoSource};
use crate::diagnostics::{Characteristic, DiagnosticObserver, Diagnostics, LogObserver};
use crate::output;
use crate::rates::Rates;
use crate::sink::{SampleSink, SinkReport};
use crate::state::ChipState;

/// Samples generated between writes to a sink.
const SINK_BLOCK: usize = 4096;

/// One SN76477 instance.
///
/// Owns its configuration and state exclusively. Instances share nothing,
/// so separate chips can run on separate threads.
pub struct Sn76477 {
    name: String,
    config: ChipConfig,
    state: ChipState,
    /// Samples produced by [`Tickable::tick`], drained by `take_buffer`.
    buffer: Vec<i16>,
    observer: Option<Box<dyn DiagnosticObserver>>,
}

impl Sn76477 {
    /// Create a chip at power-on state. Diagnostics go to the `log` facade.
    pub fn new(config: ChipConfig) -> Result<Self, ConfigError> {
        Self::with_name("SN76477", config)
    }

    pub fn with_name(name: impl Into<String>, config: ChipConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            name: name.into(),
            config,
            state: ChipState::new(),
            buffer: Vec::new(),
            observer: Some(Box::new(LogObserver)),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn config(&self) -> &ChipConfig {
        &self.config
    }

    #[must_use]
    pub const fn state(&self) -> &ChipState {
        &self.state
    }

    #[must_use]
    pub const fn diagnostics(&self) -> Diagnostics<'_> {
        Diagnostics::new(&self.config)
    }

    /// Replace the diagnostic observer. `None` silences diagnostics.
    pub fn set_observer(&mut self, observer: Option<Box<dyn DiagnosticObserver>>) {
        self.observer = observer;
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl DiagnosticObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Report every characteristic to the observer.
    pub fn log_complete_state(&mut self) {
        self.notify(&Characteristic::ALL);
    }

    /// Return to power-on state. Configuration is kept.
    pub fn reset(&mut self) {
        self.state = ChipState::new();
        self.buffer.clear();
    }

    // Configuration layer

    /// Replace the whole configuration.
    ///
    /// Edges are detected against the previous configuration: releasing
    /// inhibit triggers the one-shot, and a rising noise clock steps the
    /// LFSR when the external clock is selected.
    pub fn set_config(&mut self, config: ChipConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.apply(config);
        Ok(())
    }

    /// Edit a copy of the configuration and apply it if it validates.
    pub fn update_config(&mut self, edit: impl FnOnce(&mut ChipConfig)) -> Result<(), ConfigError> {
        let mut config = self.config;
        edit(&mut config);
        self.set_config(config)
    }

    /// Inhibit line (pin 9). Dropping it restarts the one-shot and empties
    /// the envelope capacitor.
    pub fn set_inhibit(&mut self, level: bool) {
        let mut config = self.config;
        config.inhibit = level;
        self.apply(config);
    }

    /// External noise clock line (pin 3).
    pub fn set_noise_clock(&mut self, level: bool) {
        let mut config = self.config;
        config.noise_clock.level = level;
        self.apply(config);
    }

    pub fn set_mixer_mode(&mut self, mode: MixerMode) {
        let mut config = self.config;
        config.mixer_mode = mode;
        self.apply(config);
    }

    pub fn set_envelope_mode(&mut self, mode: EnvelopeMode) {
        let mut config = self.config;
        config.envelope.mode = mode;
        self.apply(config);
    }

    pub fn set_vco_source(&mut self, source: VcoSource) {
        let mut config = self.config;
        config.vco.source = source;
        self.apply(config);
    }

    /// External VCO control voltage (pin 16). `None` disconnects it.
    pub fn set_vco_voltage(&mut self, voltage: Option<f64>) -> Result<(), ConfigError> {
        self.update_config(|c| c.vco.ext_voltage = voltage)
    }

    /// Pitch control voltage (pin 19).
    pub fn set_pitch_voltage(&mut self, voltage: f64) -> Result<(), ConfigError> {
        self.update_config(|c| c.vco.pitch_voltage = voltage)
    }

    pub fn set_amplitude_res(&mut self, ohms: f64) -> Result<(), ConfigError> {
        self.update_config(|c| c.amplitude_res = ohms)
    }

    pub fn set_feedback_res(&mut self, ohms: f64) -> Result<(), ConfigError> {
        self.update_config(|c| c.feedback_res = ohms)
    }

    fn apply(&mut self, config: ChipConfig) {
        let changed = Characteristic::changed_between(&self.config, &config);
        let released = self.config.inhibit && !config.inhibit;
        let clock_edge =
            config.noise_clock.external && !self.config.noise_clock.level && config.noise_clock.level;

        self.config = config;

        if released {
            debug!("SN76477 '{}': inhibit released, one-shot triggered", self.name);
            self.state.trigger();
        }
        if clock_edge {
            self.state.noise.clock_edge();
        }
        self.notify(&changed);
    }

    fn notify(&mut self, changed: &[Characteristic]) {
        if let Some(observer) = self.observer.as_mut() {
            let diag = Diagnostics::new(&self.config);
            for &characteristic in changed {
                observer.on_change(&self.name, characteristic, &diag);
            }
        }
    }

    // Generation

    /// Generate `count` samples, continuing from the current state.
    pub fn generate(&mut self, count: usize) -> Vec<i16> {
        self.samples(count).collect()
    }

    /// Lazily generate `count` samples.
    ///
    /// Rates are computed when the stream is created; the configuration
    /// cannot change while it is borrowed.
    pub fn samples(&mut self, count: usize) -> SampleStream<'_> {
        SampleStream {
            rates: Rates::compute(&self.config),
            config: &self.config,
            state: &mut self.state,
            remaining: count,
        }
    }

    /// Fill `out` with the next samples.
    pub fn generate_into(&mut self, out: &mut [i16]) {
        let rates = Rates::compute(&self.config);
        for slot in out {
            *slot = self.state.tick(&self.config, &rates);
        }
    }

    /// Generate `count` samples and stream them into `sink`.
    ///
    /// A failing sink does not stop generation: the first error is logged
    /// and reported, later blocks are not written, and every sample is
    /// still returned.
    pub fn generate_to_sink<S>(&mut self, count: usize, sink: &mut S) -> SinkReport
    where
        S: SampleSink + ?Sized,
    {
        let rates = Rates::compute(&self.config);
        let mut samples = Vec::with_capacity(count);
        let mut written = 0;
        let mut error = None;

        let mut remaining = count;
        while remaining > 0 {
            let start = samples.len();
            let block = remaining.min(SINK_BLOCK);
            for _ in 0..block {
                samples.push(self.state.tick(&self.config, &rates));
            }
            remaining -= block;

            if error.is_none() {
                match sink.write_samples(&samples[start..]) {
                    Ok(()) => written += block,
                    Err(e) => {
                        warn!("SN76477 '{}': sink failed after {written} samples: {e}", self.name);
                        error = Some(e);
                    }
                }
            }
        }

        SinkReport {
            samples,
            written,
            error,
        }
    }

    /// Drain samples produced by [`Tickable::tick`].
    pub fn take_buffer(&mut self) -> Vec<i16> {
        std::mem::take(&mut self.buffer)
    }

    #[must_use]
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for Sn76477 {
    fn default() -> Self {
        Self {
            name: "SN76477".to_string(),
            config: ChipConfig::default(),
            state: ChipState::new(),
            buffer: Vec::new(),
            observer: Some(Box::new(LogObserver)),
        }
    }
}

impl fmt::Debug for Sn76477 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sn76477")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("state", &self.state)
            .field("buffered", &self.buffer.len())
            .finish_non_exhaustive()
    }
}

impl Tickable for Sn76477 {
    fn tick(&mut self) {
        let rates = Rates::compute(&self.config);
        let sample = self.state.tick(&self.config, &rates);
        self.buffer.push(sample);
    }

    fn tick_n(&mut self, count: Ticks) {
        let rates = Rates::compute(&self.config);
        for _ in 0..count.get() {
            let sample = self.state.tick(&self.config, &rates);
            self.buffer.push(sample);
        }
    }
}

/// Single-pass iterator over generated samples. See [`Sn76477::samples`].
pub struct SampleStream<'a> {
    rates: Rates,
    config: &'a ChipConfig,
    state: &'a mut ChipState,
    remaining: usize,
}

impl Iterator for SampleStream<'_> {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.state.tick(self.config, &self.rates))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for SampleStream<'_> {}

impl FusedIterator for SampleStream<'_> {}

const QUERY_PATHS: &[&str] = &[
    "one_shot.voltage",
    "one_shot.running",
    "slf.voltage",
    "slf.out",
    "vco.voltage",
    "vco.out",
    "vco.alt_edge",
    "vco.saturated",
    "noise.lfsr",
    "noise.bit",
    "noise.filtered",
    "noise.filter_voltage",
    "envelope.voltage",
    "out.voltage",
    "out.sample",
    "inhibit",
    "mixer_mode",
    "envelope_mode",
    "vco_source",
    "sample_rate",
    "diag.one_shot_time",
    "diag.slf_frequency",
    "diag.vco_frequency_min",
    "diag.vco_frequency_max",
    "diag.vco_ext_voltage_frequency",
    "diag.vco_duty_cycle",
    "diag.noise_frequency",
    "diag.noise_filter_frequency",
    "diag.attack_time",
    "diag.decay_time",
    "diag.out_voltage_min",
    "diag.out_voltage_max",
];

impl Observable for Sn76477 {
    fn query(&self, path: &str) -> Option<Value> {
        let state = &self.state;
        if let Some(diag_path) = path.strip_prefix("diag.") {
            let diag = self.diagnostics();
            return match diag_path {
                "one_shot_time" => diag.one_shot_time().value().map(Value::F64),
                "slf_frequency" => diag.slf_frequency().value().map(Value::F64),
                "vco_frequency_min" => diag.vco_frequency_range().value().map(|(min, _)| Value::F64(min)),
                "vco_frequency_max" => diag.vco_frequency_range().value().map(|(_, max)| Value::F64(max)),
                "vco_ext_voltage_frequency" => diag.vco_ext_voltage_frequency().value().map(Value::F64),
                "vco_duty_cycle" => Some(Value::F64(diag.vco_duty_cycle())),
                "noise_frequency" => diag.noise_generator_frequency().value().map(Value::F64),
                "noise_filter_frequency" => diag.noise_filter_frequency().value().map(Value::F64),
                "attack_time" => diag.attack_time().value().map(Value::F64),
                "decay_time" => diag.decay_time().value().map(Value::F64),
                "out_voltage_min" => Some(Value::F64(diag.output_voltage_range().0)),
                "out_voltage_max" => Some(Value::F64(diag.output_voltage_range().1)),
                _ => None,
            };
        }

        match path {
            "one_shot.voltage" => Some(state.one_shot.voltage.into()),
            "one_shot.running" => Some(state.one_shot.running.into()),
            "slf.voltage" => Some(state.slf.voltage.into()),
            "slf.out" => Some(state.slf.out.into()),
            "vco.voltage" => Some(state.vco.voltage.into()),
            "vco.out" => Some(state.vco.out.into()),
            "vco.alt_edge" => Some(state.vco.alt_edge.into()),
            "vco.saturated" => Some(state.vco.saturated().into()),
            "noise.lfsr" => Some(state.noise.lfsr.register().into()),
            "noise.bit" => Some(state.noise.bit.into()),
            "noise.filtered" => Some(state.noise_filter.out.into()),
            "noise.filter_voltage" => Some(state.noise_filter.voltage.into()),
            "envelope.voltage" => Some(state.envelope.voltage.into()),
            "out.voltage" => Some(state.out_voltage.into()),
            "out.sample" => Some(output::voltage_to_sample(state.out_voltage).into()),
            "inhibit" => Some(self.config.inhibit.into()),
            "mixer_mode" => Some(Value::String(self.config.mixer_mode.label().to_string())),
            "envelope_mode" => Some(Value::String(self.config.envelope.mode.label().to_string())),
            "vco_source" => Some(Value::String(self.config.vco.source.label().to_string())),
            "sample_rate" => Some(self.config.sample_rate.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        QUERY_PATHS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RcNetwork, cap_n, cap_u, res_k};
    use crate::rates::{AD_CAP_VOLTAGE_MIN, ONE_SHOT_CAP_VOLTAGE_MIN};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<(String, Characteristic)>>>);

    impl DiagnosticObserver for Recorder {
        fn on_change(&mut self, chip: &str, c: Characteristic, _: &Diagnostics<'_>) {
            self.0.lock().expect("recorder lock").push((chip.to_string(), c));
        }
    }

    impl Recorder {
        fn seen(&self) -> Vec<Characteristic> {
            self.0.lock().expect("recorder lock").iter().map(|(_, c)| *c).collect()
        }
    }

    fn vco_chip() -> Sn76477 {
        let mut config = ChipConfig::default();
        config.vco.network = RcNetwork::new(res_k(100.0), cap_n(10.0));
        config.envelope.mode = EnvelopeMode::MixerOnly;
        Sn76477::new(config).expect("valid config")
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut config = ChipConfig::default();
        config.feedback_res = -1.0;
        assert!(matches!(
            Sn76477::new(config),
            Err(ConfigError::Negative { component: "feedback resistor", .. })
        ));
    }

    #[test]
    fn generate_is_deterministic() {
        let mut a = vco_chip();
        let mut b = vco_chip();
        assert_eq!(a.generate(2000), b.generate(2000));
    }

    #[test]
    fn generate_into_matches_generate() {
        let mut a = vco_chip();
        let mut b = vco_chip();
        let mut out = [0i16; 777];
        b.generate_into(&mut out);
        assert_eq!(a.generate(777), out.to_vec());
    }

    #[test]
    fn tick_n_matches_generate() {
        let mut a = vco_chip();
        let mut b = vco_chip();
        b.tick_n(Ticks::new(300));
        b.tick();
        assert_eq!(b.buffer_len(), 301);
        assert_eq!(a.generate(301), b.take_buffer());
        assert_eq!(b.buffer_len(), 0);
    }

    #[test]
    fn sample_stream_is_exact_size() {
        let mut chip = vco_chip();
        let mut stream = chip.samples(3);
        assert_eq!(stream.len(), 3);
        stream.next();
        assert_eq!(stream.len(), 2);
        assert_eq!(stream.by_ref().count(), 2);
        assert_eq!(stream.next(), None);
    }

    #[test]
    fn reset_restores_power_on() {
        let mut chip = vco_chip();
        let first = chip.generate(500);
        chip.tick();
        chip.reset();
        assert_eq!(chip.buffer_len(), 0);
        assert_eq!(chip.generate(500), first);
    }

    #[test]
    fn inhibit_release_triggers_one_shot() {
        let mut config = ChipConfig::default();
        config.one_shot = RcNetwork::new(res_k(100.0), cap_u(1.0));
        config.inhibit = true;
        let mut chip = Sn76477::new(config).expect("valid config");
        chip.generate(10);
        assert!(!chip.state().one_shot.running);

        chip.set_inhibit(false);
        assert!(chip.state().one_shot.running);
        assert_eq!(chip.state().one_shot.voltage, ONE_SHOT_CAP_VOLTAGE_MIN);
        assert_eq!(chip.state().envelope.voltage, AD_CAP_VOLTAGE_MIN);

        chip.generate(100);
        assert!(chip.state().one_shot.running, "about 80 ms one-shot");
    }

    #[test]
    fn raising_inhibit_does_not_trigger() {
        let mut chip = vco_chip();
        chip.set_inhibit(true);
        assert!(!chip.state().one_shot.running);
        chip.set_inhibit(true);
        assert!(!chip.state().one_shot.running);
    }

    #[test]
    fn external_noise_clock_steps_on_rising_edge() {
        let mut chip = Sn76477::default();
        chip.update_config(|c| c.noise_clock.external = true)
            .expect("valid config");
        chip.set_noise_clock(true);
        assert_eq!(chip.state().noise.lfsr.register(), 1 << 30);
        chip.set_noise_clock(true);
        chip.set_noise_clock(false);
        assert_eq!(chip.state().noise.lfsr.register(), 1 << 30, "only rising edges");
        chip.set_noise_clock(true);
        assert_eq!(chip.state().noise.lfsr.register(), 3 << 29);
    }

    #[test]
    fn internal_clock_ignores_clock_line() {
        let mut chip = Sn76477::default();
        chip.set_noise_clock(true);
        assert_eq!(chip.state().noise.lfsr.register(), 0);
    }

    #[test]
    fn numeric_setters_validate() {
        let mut chip = Sn76477::default();
        assert!(chip.set_amplitude_res(-5.0).is_err());
        assert!(chip.set_vco_voltage(Some(f64::INFINITY)).is_err());
        assert!(chip.set_pitch_voltage(f64::NAN).is_err());
        assert_eq!(chip.config().amplitude_res, res_k(100.0), "rejected value not applied");
        chip.set_feedback_res(res_k(47.0)).expect("valid");
        assert_eq!(chip.config().feedback_res, res_k(47.0));
    }

    #[test]
    fn observer_sees_affected_characteristics() {
        let recorder = Recorder::default();
        let mut chip = Sn76477::with_name("ufo", ChipConfig::default())
            .expect("valid config")
            .with_observer(recorder.clone());

        chip.set_mixer_mode(MixerMode::Noise);
        chip.set_vco_voltage(Some(1.5)).expect("valid");
        assert_eq!(
            recorder.seen(),
            vec![
                Characteristic::MixerMode,
                Characteristic::VcoExtVoltage,
                Characteristic::VcoDutyCycle
            ]
        );
        assert!(recorder.0.lock().expect("lock").iter().all(|(name, _)| name == "ufo"));

        chip.log_complete_state();
        assert_eq!(recorder.seen().len(), 3 + Characteristic::ALL.len());
    }

    #[test]
    fn silenced_observer() {
        let recorder = Recorder::default();
        let mut chip = Sn76477::default().with_observer(recorder.clone());
        chip.set_observer(None);
        chip.set_envelope_mode(EnvelopeMode::OneShot);
        assert!(recorder.seen().is_empty());
    }

    #[test]
    fn observable_paths_answer() {
        let mut chip = vco_chip();
        chip.generate(10);
        assert_eq!(chip.query("mixer_mode"), Some(Value::String("VCO".into())));
        assert_eq!(chip.query("inhibit"), Some(Value::Bool(false)));
        assert!(matches!(chip.query("vco.voltage"), Some(Value::F64(_))));
        assert!(matches!(chip.query("diag.vco_frequency_max"), Some(Value::F64(_))));
        assert_eq!(chip.query("diag.slf_frequency"), None, "SLF unconfigured");
        assert_eq!(chip.query("bogus"), None);
        assert_eq!(chip.query("diag.bogus"), None);
        for path in chip.query_paths() {
            let _ = chip.query(path);
        }
    }

    #[test]
    fn generating_does_not_notify() {
        let recorder = Recorder::default();
        let mut chip = vco_chip().with_observer(recorder.clone());
        chip.generate(1000);
        chip.tick_n(Ticks::new(10));
        assert!(recorder.seen().is_empty());
    }
}
