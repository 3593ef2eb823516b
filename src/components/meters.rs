//! Measuring instruments: voltmeters, ammeters and general meters.
//!
//! None of these exist in a real solver deck. The synthesizer swaps them for
//! probe resistors sized so they barely disturb the circuit:
//! voltmeters look like [`PROBE_HIGH_OHMS`](crate::PROBE_HIGH_OHMS), ammeters
//! like [`PROBE_LOW_OHMS`](crate::PROBE_LOW_OHMS). A general meter is left
//! out of the deck entirely and only reads the voltage across its nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{PROBE_HIGH_OHMS, PROBE_LOW_OHMS};

/// What a two-terminal meter measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeterKind {
    /// High-impedance voltage reading
    Voltmeter,
    /// Near-short current reading
    Ammeter,
    /// Unloaded voltage reading, not inserted into the deck
    General,
}

impl MeterKind {
    /// Resistance of the probe element standing in for this meter, if any.
    pub fn probe_resistance(&self) -> Option<f64> {
        match self {
            Self::Voltmeter => Some(PROBE_HIGH_OHMS),
            Self::Ammeter => Some(PROBE_LOW_OHMS),
            Self::General => None,
        }
    }

    /// Default display-name prefix for newly placed meters.
    pub fn name_prefix(&self) -> &'static str {
        match self {
            Self::Voltmeter => "V",
            Self::Ammeter => "A",
            Self::General => "M",
        }
    }
}

impl fmt::Display for MeterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Voltmeter => write!(f, "voltmeter"),
            Self::Ammeter => write!(f, "ammeter"),
            Self::General => write!(f, "meter"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_resistance() {
        assert_eq!(MeterKind::Voltmeter.probe_resistance(), Some(1e6));
        assert_eq!(MeterKind::Ammeter.probe_resistance(), Some(1e-6));
        assert_eq!(MeterKind::General.probe_resistance(), None);
    }
}
