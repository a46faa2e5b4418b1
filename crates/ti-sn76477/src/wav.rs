//! Mono 16-bit linear-PCM WAV output via `hound`.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use crate::sink::{SampleSink, SinkError};

impl From<hound::Error> for SinkError {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(io) => Self::Io(io),
            other => Self::Format(other.to_string()),
        }
    }
}

/// Header for the chip's output format.
#[must_use]
pub fn wav_spec(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

/// WAV writer accepting generated samples.
///
/// Call [`finalize`](Self::finalize) to patch the header lengths and see
/// any final I/O error; dropping the sink finalizes silently.
pub struct WavSink<W: Write + Seek = BufWriter<File>> {
    writer: hound::WavWriter<W>,
    written: usize,
}

impl WavSink<BufWriter<File>> {
    /// Create (or truncate) a WAV file.
    pub fn create(path: impl AsRef<Path>, sample_rate: u32) -> Result<Self, SinkError> {
        let writer = hound::WavWriter::create(path, wav_spec(sample_rate))?;
        Ok(Self { writer, written: 0 })
    }
}

impl<W: Write + Seek> WavSink<W> {
    /// Write WAV data into any seekable writer.
    pub fn new(inner: W, sample_rate: u32) -> Result<Self, SinkError> {
        let writer = hound::WavWriter::new(inner, wav_spec(sample_rate))?;
        Ok(Self { writer, written: 0 })
    }

    /// Samples written so far.
    #[must_use]
    pub const fn written(&self) -> usize {
        self.written
    }

    pub fn finalize(self) -> Result<(), SinkError> {
        self.writer.finalize()?;
        Ok(())
    }
}

impl<W: Write + Seek> SampleSink for WavSink<W> {
    fn write_samples(&mut self, samples: &[i16]) -> Result<(), SinkError> {
        for &sample in samples {
            self.writer.write_sample(sample)?;
            self.written += 1;
        }
        Ok(())
    }
}
