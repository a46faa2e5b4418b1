//! Observability trait for inspecting component state.
//!
//! Every emulated chip exposes its internal state (capacitor voltages,
//! flip-flops, shift registers) and its derived characteristics for
//! debugging. Queries never affect emulation state.

use std::fmt;

/// A dynamically-typed value for state queries.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean value (flip-flops, digital lines).
    Bool(bool),
    /// 8-bit unsigned integer (mode pin encodings).
    U8(u8),
    /// 32-bit unsigned integer (shift registers, counters).
    U32(u32),
    /// Signed 16-bit output sample.
    I16(i16),
    /// Voltage, frequency or time.
    F64(f64),
    /// String value.
    String(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v:#010X}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v:.4}"),
            Value::String(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::I16(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// A component whose state can be inspected.
///
/// At any tick, you can inspect any component. Queries never affect
/// emulation state.
pub trait Observable {
    /// Query a specific property by path.
    ///
    /// Paths are hierarchical, separated by dots:
    /// - `vco.voltage` - VCO capacitor voltage
    /// - `noise.lfsr` - Noise shift register
    /// - `diag.slf_frequency` - Derived SLF frequency
    ///
    /// Returns `None` if the path is not recognised or the value is
    /// currently unavailable.
    fn query(&self, path: &str) -> Option<Value>;

    /// List all available query paths.
    ///
    /// Returns paths that can be passed to `query()`.
    fn query_paths(&self) -> &'static [&'static str];

    /// Query every path that currently has a value, in `query_paths()` order.
    fn snapshot(&self) -> Vec<(&'static str, Value)> {
        self.query_paths()
            .iter()
            .filter_map(|&path| self.query(path).map(|v| (path, v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        level: f64,
    }

    impl Observable for Probe {
        fn query(&self, path: &str) -> Option<Value> {
            match path {
                "level" => Some(self.level.into()),
                "high" => Some((self.level > 1.0).into()),
                _ => None,
            }
        }

        fn query_paths(&self) -> &'static [&'static str] {
            &["level", "high", "missing"]
        }
    }

    #[test]
    fn snapshot_skips_unanswered_paths() {
        let probe = Probe { level: 2.5 };
        let snap = probe.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0], ("level", Value::F64(2.5)));
        assert_eq!(snap[1], ("high", Value::Bool(true)));
    }

    #[test]
    fn display_formats() {
        assert_eq!(Value::U32(0x4000_0000).to_string(), "0x40000000");
        assert_eq!(Value::F64(2.57).to_string(), "2.5700");
        assert_eq!(Value::I16(-32767).to_string(), "-32767");
        assert_eq!(Value::U8(7).to_string(), "7");
    }
}
