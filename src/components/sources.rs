//! Independent voltage and current sources.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of excitation a source provides.
///
/// A source's magnitude may be any finite real number, zero included.
/// Positive values drive terminal `a` positive with respect to terminal `b`
/// (voltage) or push current from `a` to `b` through the source (current).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Ideal voltage source
    Voltage,
    /// Ideal current source
    Current,
}

impl SourceKind {
    /// Display unit of the source magnitude.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Voltage => "V",
            Self::Current => "A",
        }
    }

    /// Default display-name prefix for newly placed sources.
    pub fn name_prefix(&self) -> &'static str {
        match self {
            Self::Voltage => "V",
            Self::Current => "I",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Voltage => write!(f, "voltage"),
            Self::Current => write!(f, "current"),
        }
    }
}

/// Check a source magnitude.
pub fn is_valid_magnitude(value: f64) -> bool {
    value.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_units() {
        assert_eq!(SourceKind::Voltage.unit(), "V");
        assert_eq!(SourceKind::Current.name_prefix(), "I");
        assert!(is_valid_magnitude(0.0));
        assert!(is_valid_magnitude(-3.3));
        assert!(!is_valid_magnitude(f64::NAN));
    }
}
