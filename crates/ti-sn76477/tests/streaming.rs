//! Generation is a continuous stream: splitting it across calls, entry
//! points or sinks must not change a single sample.

use emu_core::{Tickable, Ticks};
use ti_sn76477::{
    ChipConfig, EnvelopeMode, MixerMode, RcNetwork, Resistor, SampleSink, SinkError, Sn76477,
    VcoSource, cap_n, cap_u, res_k,
};

/// SLF-swept VCO mixed with filtered noise under a VCO envelope.
fn siren() -> ChipConfig {
    let mut config = ChipConfig::default();
    config.mixer_mode = MixerMode::VcoNoise;
    config.envelope.mode = EnvelopeMode::Vco;
    config.slf = RcNetwork::new(res_k(200.0), cap_u(1.0));
    config.vco.network = RcNetwork::new(res_k(47.0), cap_n(47.0));
    config.vco.source = VcoSource::Slf;
    config.noise_clock.resistor = Resistor::fixed(res_k(33.0));
    config.noise_filter = RcNetwork::new(res_k(100.0), cap_n(1.0));
    config.envelope.attack = Resistor::fixed(res_k(4.7));
    config.envelope.decay = Resistor::fixed(res_k(22.0));
    config.envelope.cap = cap_n(100.0);
    config
}

fn chip() -> Sn76477 {
    let mut chip = Sn76477::new(siren()).expect("valid config");
    chip.set_observer(None);
    chip
}

#[test]
fn split_calls_match_single_call() {
    let whole = chip().generate(10_000);

    let mut split = chip();
    let mut joined = split.generate(1);
    joined.extend(split.generate(4_095));
    joined.extend(split.generate(0));
    joined.extend(split.generate(5_904));
    assert_eq!(whole, joined);
}

#[test]
fn every_entry_point_agrees() {
    let reference = chip().generate(6_000);

    let mut streamed = chip();
    let from_stream: Vec<i16> = streamed.samples(6_000).collect();
    assert_eq!(reference, from_stream);

    let mut filled = chip();
    let mut out = vec![0i16; 6_000];
    filled.generate_into(&mut out[..2_000]);
    filled.generate_into(&mut out[2_000..]);
    assert_eq!(reference, out);

    let mut ticked = chip();
    ticked.tick_n(Ticks::new(5_999));
    ticked.tick();
    assert_eq!(reference, ticked.take_buffer());

    let mut sunk = chip();
    let mut sink = Vec::new();
    let report = sunk.generate_to_sink(6_000, &mut sink);
    assert!(report.is_complete());
    assert_eq!(reference, report.samples);
    assert_eq!(reference, sink);
}

#[test]
fn partially_consumed_stream_keeps_position() {
    let reference = chip().generate(100);
    let mut chip = chip();
    let first: Vec<i16> = chip.samples(100).take(40).collect();
    // Dropping the stream early only produces the samples consumed
    let rest = chip.generate(60);
    assert_eq!(&reference[..40], first.as_slice());
    assert_eq!(&reference[40..], rest.as_slice());
}

struct FailingSink {
    accept: usize,
    received: Vec<i16>,
}

impl SampleSink for FailingSink {
    fn write_samples(&mut self, samples: &[i16]) -> Result<(), SinkError> {
        if self.received.len() + samples.len() > self.accept {
            return Err(SinkError::Format("disk full".into()));
        }
        self.received.extend_from_slice(samples);
        Ok(())
    }
}

#[test]
fn failing_sink_does_not_interrupt_generation() {
    let reference = chip().generate(20_000);

    let mut chip = chip();
    let mut sink = FailingSink {
        accept: 8_192,
        received: Vec::new(),
    };
    let report = chip.generate_to_sink(20_000, &mut sink);

    assert_eq!(report.samples, reference, "all samples still produced");
    assert_eq!(report.written, 8_192);
    assert_eq!(sink.received, reference[..8_192]);
    assert!(matches!(report.error, Some(SinkError::Format(_))));
    assert!(!report.is_complete());

    // The chip carries on from where the failed call stopped
    let next = chip.generate(10);
    let mut continuous = self::chip();
    continuous.generate(20_000);
    assert_eq!(next, continuous.generate(10));
}

/// Takes what fits, then fails on the rest of the block.
struct PartialSink {
    capacity: usize,
    received: Vec<i16>,
}

impl SampleSink for PartialSink {
    fn write_samples(&mut self, samples: &[i16]) -> Result<(), SinkError> {
        let room = self.capacity - self.received.len();
        self.received.extend_from_slice(&samples[..room.min(samples.len())]);
        if samples.len() > room {
            return Err(SinkError::Format("short write".into()));
        }
        Ok(())
    }
}

#[test]
fn written_counts_whole_blocks_only() {
    let mut chip = chip();
    let mut sink = PartialSink {
        capacity: 5_000,
        received: Vec::new(),
    };
    let report = chip.generate_to_sink(10_000, &mut sink);
    assert_eq!(report.written, 4_096, "second block failed partway");
    assert_eq!(sink.received.len(), 5_000);
    assert_eq!(sink.received, report.samples[..5_000]);
    assert!(report.error.is_some());
}

#[test]
fn config_change_between_calls_takes_effect_next_call() {
    let mut chip = chip();
    let before = chip.generate(2_000);
    assert!(before.iter().any(|&s| s != 0));
    chip.set_mixer_mode(MixerMode::Inhibit);
    assert!(chip.generate(2_000).iter().all(|&s| s == 0));
}

#[test]
fn chips_run_on_separate_threads() {
    let reference = chip().generate(5_000);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let mut chip = chip();
            std::thread::spawn(move || chip.generate(5_000))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().expect("generator thread"), reference);
    }
}
