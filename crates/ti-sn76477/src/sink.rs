//! Destinations for generated samples.
//!
//! The chip only knows it is handing off blocks of `i16`. Container
//! formats live behind [`SampleSink`]; see [`WavSink`](crate::wav::WavSink)
//! for the linear-PCM implementation.

use std::fmt;
use std::io;

/// Failure writing to a sink.
#[derive(Debug)]
pub enum SinkError {
    Io(io::Error),
    /// Container-level error (bad header, unsupported format).
    Format(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "sink I/O error: {e}"),
            Self::Format(msg) => write!(f, "sink format error: {msg}"),
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Format(_) => None,
        }
    }
}

impl From<io::Error> for SinkError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Anything that accepts mono 16-bit samples.
pub trait SampleSink {
    fn write_samples(&mut self, samples: &[i16]) -> Result<(), SinkError>;
}

impl SampleSink for Vec<i16> {
    fn write_samples(&mut self, samples: &[i16]) -> Result<(), SinkError> {
        self.extend_from_slice(samples);
        Ok(())
    }
}

/// Result of generating into a sink.
///
/// Generation always completes; `error` records the first sink failure,
/// after which the sink is no longer written.
#[derive(Debug)]
pub struct SinkReport {
    pub samples: Vec<i16>,
    /// Samples in the blocks the sink accepted whole before any failure.
    /// A sink that fails partway through a block may hold a few more.
    pub written: usize,
    pub error: Option<SinkError>,
}

impl SinkReport {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.error.is_none() && self.written == self.samples.len()
    }
}
